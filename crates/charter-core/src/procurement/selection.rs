//! Deterministic supplier selection.
//!
//! All three mechanisms are pure functions of the feasible set (and a
//! caller-supplied seed), so any award can be reproduced from the event
//! log alone. The seed feeds SHA-256; the digest is reduced modulo the
//! set size as a big-endian integer, matching what an external auditor
//! computes from the recorded seed.

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use super::SupplierState;

/// ROTATION: least `total_value_awarded`, ties by lexicographic id.
#[must_use]
pub fn select_rotation<'a>(feasible: &[&'a SupplierState]) -> Option<&'a SupplierState> {
    feasible
        .iter()
        .min_by(|a, b| {
            a.total_value_awarded
                .cmp(&b.total_value_awarded)
                .then_with(|| a.supplier_id.cmp(&b.supplier_id))
        })
        .copied()
}

/// RANDOM: sort by id, index with `SHA256(seed) mod n`.
#[must_use]
pub fn select_random<'a>(feasible: &[&'a SupplierState], seed: &str) -> Option<&'a SupplierState> {
    if feasible.is_empty() {
        return None;
    }
    let mut sorted: Vec<&SupplierState> = feasible.to_vec();
    sorted.sort_by(|a, b| a.supplier_id.cmp(&b.supplier_id));
    Some(sorted[sha256_index(seed, sorted.len())])
}

/// HYBRID: restrict to suppliers within 10% of the least-loaded, then
/// RANDOM over the remainder.
#[must_use]
pub fn select_hybrid<'a>(feasible: &[&'a SupplierState], seed: &str) -> Option<&'a SupplierState> {
    let min_awarded = feasible
        .iter()
        .map(|s| s.total_value_awarded)
        .min()?;
    let threshold = min_awarded * Decimal::new(11, 1); // 1.1

    let low_loaded: Vec<&SupplierState> = feasible
        .iter()
        .filter(|s| s.total_value_awarded <= threshold)
        .copied()
        .collect();

    select_random(&low_loaded, seed)
}

/// Reduces `SHA256(seed)`, read as a big-endian 256-bit integer, modulo
/// `n`. Folding byte by byte keeps the arithmetic in `u128`.
pub(crate) fn sha256_index(seed: &str, n: usize) -> usize {
    debug_assert!(n > 0);
    let digest = Sha256::digest(seed.as_bytes());
    let modulus = n as u128;
    let mut acc: u128 = 0;
    for byte in digest {
        acc = ((acc << 8) | u128::from(byte)) % modulus;
    }
    acc as usize
}
