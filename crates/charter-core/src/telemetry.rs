//! Tracing setup and log redaction.
//!
//! Log lines never carry actor identities or monetary amounts in the
//! clear: a fixed field list is redacted before any context map reaches a
//! subscriber. Production builds do not log stack traces; callers attach
//! a correlation id instead.

use std::collections::BTreeMap;

use tracing_subscriber::EnvFilter;

/// Placeholder written in place of a redacted value.
pub const REDACTED: &str = "[redacted]";

/// Fields whose values are always redacted from log context.
pub const REDACTED_FIELDS: &[&str] = &["actor_id", "from_actor", "to_actor", "amount"];

/// Substrings that mark a field name as sensitive regardless of the
/// fixed list (tokens, keys, secrets).
const SENSITIVE_MARKERS: &[&str] = &["token", "secret", "key", "password"];

/// Whether a context field must be redacted before logging.
#[must_use]
pub fn is_sensitive_field(name: &str) -> bool {
    if REDACTED_FIELDS.contains(&name) {
        return true;
    }
    let lowered = name.to_ascii_lowercase();
    SENSITIVE_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Returns a copy of `context` with sensitive values replaced.
#[must_use]
pub fn redact_context(context: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    context
        .iter()
        .map(|(k, v)| {
            if is_sensitive_field(k) {
                (k.clone(), REDACTED.to_string())
            } else {
                (k.clone(), v.clone())
            }
        })
        .collect()
}

/// Installs a global tracing subscriber honouring the configured level.
///
/// `RUST_LOG` takes precedence over `log_level` when set, which matches
/// how operators override logging in the field. Calling this twice is a
/// no-op: the second install fails quietly rather than panicking.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_fields_are_sensitive() {
        for field in REDACTED_FIELDS {
            assert!(is_sensitive_field(field), "{field} should be sensitive");
        }
    }

    #[test]
    fn marker_substrings_are_sensitive() {
        assert!(is_sensitive_field("api_token"));
        assert!(is_sensitive_field("PRIVATE_KEY"));
        assert!(is_sensitive_field("db_password"));
        assert!(!is_sensitive_field("workspace_id"));
    }

    #[test]
    fn redaction_preserves_benign_fields() {
        let mut context = BTreeMap::new();
        context.insert("actor_id".to_string(), "alice".to_string());
        context.insert("operation".to_string(), "delegate".to_string());

        let redacted = redact_context(&context);
        assert_eq!(redacted["actor_id"], REDACTED);
        assert_eq!(redacted["operation"], "delegate");
    }
}
