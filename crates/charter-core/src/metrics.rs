//! Concentration metrics and the freedom-health scorecard.
//!
//! The Gini coefficient summarizes inequality in a non-negative
//! distribution: 0 is perfect equality, 1 is full concentration. It is
//! computed on demand from projections and never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::SafetyPolicy;

/// Gini coefficient of a non-negative distribution.
///
/// `G = (2·Σᵢ i·xᵢ) / (n·Σ xᵢ) − (n+1)/n` over the ascending sort, with
/// `i` starting at 1. Empty and all-zero distributions score 0; the
/// result is clamped to `[0, 1]`.
#[must_use]
pub fn gini_coefficient(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let total: f64 = values.iter().sum();
    if total == 0.0 {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len() as f64;
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (i as f64 + 1.0) * x)
        .sum();

    let gini = (2.0 * weighted) / (n * total) - (n + 1.0) / n;
    gini.clamp(0.0, 1.0)
}

/// Overall system risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// All safeguards within normal bounds.
    Green,
    /// A warning threshold is breached.
    Yellow,
    /// A halt threshold is breached; automatic safeguards engaged.
    Red,
}

impl RiskLevel {
    /// Gauge encoding for external sinks: 0 green, 1 yellow, 2 red.
    #[must_use]
    pub const fn as_gauge(self) -> u8 {
        match self {
            Self::Green => 0,
            Self::Yellow => 1,
            Self::Red => 2,
        }
    }
}

/// Delegation concentration metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationMetrics {
    /// Gini coefficient over delegate in-degrees.
    pub gini_coefficient: f64,
    /// Largest in-degree of any single actor.
    pub max_in_degree: u64,
    /// Total active delegations.
    pub total_active_delegations: u64,
    /// Number of distinct actors receiving delegations.
    pub unique_delegates: u64,
}

impl ConcentrationMetrics {
    /// Computes metrics from an in-degree distribution.
    #[must_use]
    pub fn from_in_degrees<'a, I>(in_degrees: I) -> Self
    where
        I: Iterator<Item = &'a u64>,
    {
        let degrees: Vec<u64> = in_degrees.copied().collect();
        let as_floats: Vec<f64> = degrees.iter().map(|&d| d as f64).collect();
        Self {
            gini_coefficient: gini_coefficient(&as_floats),
            max_in_degree: degrees.iter().copied().max().unwrap_or(0),
            total_active_delegations: degrees.iter().sum(),
            unique_delegates: degrees.iter().filter(|&&d| d > 0).count() as u64,
        }
    }
}

/// Law review checkpoint health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawReviewHealth {
    /// Laws currently in effect.
    pub total_active_laws: u64,
    /// Laws with overdue reviews.
    pub overdue_reviews: u64,
    /// Reviews due in the next 7 days.
    pub upcoming_reviews_7d: u64,
    /// Reviews due in the next 30 days.
    pub upcoming_reviews_30d: u64,
}

/// The on-demand freedom-health scorecard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreedomHealth {
    /// Overall risk level.
    pub risk_level: RiskLevel,
    /// Delegation concentration metrics.
    pub concentration: ConcentrationMetrics,
    /// Law review health.
    pub law_review: LawReviewHealth,
    /// Machine-readable reasons behind the risk level.
    pub reasons: Vec<String>,
    /// When the scorecard was computed.
    pub computed_at: DateTime<Utc>,
}

/// Synthesizes the scorecard from concentration and review inputs.
#[must_use]
pub fn compute_freedom_health(
    concentration: ConcentrationMetrics,
    law_review: LawReviewHealth,
    policy: &SafetyPolicy,
    now: DateTime<Utc>,
) -> FreedomHealth {
    let mut reasons = Vec::new();
    let mut halt = false;
    let mut warn = false;

    if concentration.gini_coefficient >= policy.delegation_gini_halt {
        halt = true;
        reasons.push(format!(
            "delegation_gini_halt: {:.3} >= {}",
            concentration.gini_coefficient, policy.delegation_gini_halt
        ));
    } else if concentration.gini_coefficient >= policy.delegation_gini_warn {
        warn = true;
        reasons.push(format!(
            "delegation_gini_warn: {:.3} >= {}",
            concentration.gini_coefficient, policy.delegation_gini_warn
        ));
    }

    if concentration.max_in_degree >= policy.delegation_in_degree_halt {
        halt = true;
        reasons.push(format!(
            "delegation_in_degree_halt: {} >= {}",
            concentration.max_in_degree, policy.delegation_in_degree_halt
        ));
    } else if concentration.max_in_degree >= policy.delegation_in_degree_warn {
        warn = true;
        reasons.push(format!(
            "delegation_in_degree_warn: {} >= {}",
            concentration.max_in_degree, policy.delegation_in_degree_warn
        ));
    }

    if law_review.overdue_reviews > 0 {
        warn = true;
        reasons.push(format!(
            "law_reviews_overdue: {} laws",
            law_review.overdue_reviews
        ));
    }

    let risk_level = if halt {
        RiskLevel::Red
    } else if warn {
        RiskLevel::Yellow
    } else {
        reasons.push("all safeguards within normal bounds".to_string());
        RiskLevel::Green
    };

    FreedomHealth {
        risk_level,
        concentration,
        law_review,
        reasons,
        computed_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Gini coefficient
    // =========================================================================

    #[test]
    fn empty_distribution_scores_zero() {
        assert_eq!(gini_coefficient(&[]), 0.0);
        assert_eq!(gini_coefficient(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn equal_distribution_scores_zero() {
        let g = gini_coefficient(&[5.0, 5.0, 5.0, 5.0]);
        assert!(g.abs() < 1e-12, "expected 0, got {g}");
    }

    #[test]
    fn single_holder_approaches_the_limit() {
        // One actor holds everything: G = (n-1)/n.
        let mut values = vec![0.0; 9];
        values.push(100.0);
        let g = gini_coefficient(&values);
        assert!((g - 0.9).abs() < 1e-12, "expected 0.9, got {g}");
    }

    #[test]
    fn sort_order_does_not_matter() {
        let a = gini_coefficient(&[1.0, 2.0, 3.0, 4.0]);
        let b = gini_coefficient(&[4.0, 2.0, 1.0, 3.0]);
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn result_is_clamped() {
        let g = gini_coefficient(&[1.0]);
        assert!((0.0..=1.0).contains(&g));
    }

    // =========================================================================
    // Risk evaluation
    // =========================================================================

    fn quiet_review_health() -> LawReviewHealth {
        LawReviewHealth {
            total_active_laws: 3,
            overdue_reviews: 0,
            upcoming_reviews_7d: 0,
            upcoming_reviews_30d: 1,
        }
    }

    #[test]
    fn green_when_quiet() {
        let concentration = ConcentrationMetrics::from_in_degrees([1u64, 1, 2].iter());
        let health = compute_freedom_health(
            concentration,
            quiet_review_health(),
            &SafetyPolicy::default(),
            DateTime::UNIX_EPOCH,
        );
        assert_eq!(health.risk_level, RiskLevel::Green);
        assert_eq!(health.risk_level.as_gauge(), 0);
    }

    #[test]
    fn overdue_reviews_escalate_to_yellow() {
        let concentration = ConcentrationMetrics::from_in_degrees([1u64, 1].iter());
        let health = compute_freedom_health(
            concentration,
            LawReviewHealth {
                overdue_reviews: 2,
                ..quiet_review_health()
            },
            &SafetyPolicy::default(),
            DateTime::UNIX_EPOCH,
        );
        assert_eq!(health.risk_level, RiskLevel::Yellow);
    }

    #[test]
    fn in_degree_halt_escalates_to_red() {
        let concentration = ConcentrationMetrics {
            gini_coefficient: 0.1,
            max_in_degree: 2000,
            total_active_delegations: 2000,
            unique_delegates: 1,
        };
        let health = compute_freedom_health(
            concentration,
            quiet_review_health(),
            &SafetyPolicy::default(),
            DateTime::UNIX_EPOCH,
        );
        assert_eq!(health.risk_level, RiskLevel::Red);
        assert_eq!(health.risk_level.as_gauge(), 2);
    }
}
