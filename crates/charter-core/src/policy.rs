//! Safety policy: the constitutional parameter set.
//!
//! Every numeric threshold the kernel enforces lives here. The policy is
//! an immutable value passed explicitly to handlers and the tick engine;
//! there is no global configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Budget balance enforcement mode.
///
/// Only strict (zero-sum) balancing is supported; the variant exists so
/// the mode is explicit in configuration and payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BalanceMode {
    /// Total allocated must equal the budget total at all times.
    #[default]
    Strict,
}

/// Default visibility for delegation edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Visible to the two actors only.
    #[default]
    Private,
    /// Visible within the owning organisation.
    OrgOnly,
    /// Publicly visible.
    Public,
}

/// Per-flex-class step-size ceilings for budget adjustments.
///
/// Ceilings are exact decimals so the boundary (`5.000000%` accepted,
/// `5.000001%` rejected) holds without epsilon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlexLimits {
    /// Ceiling for `CRITICAL` items.
    #[serde(default = "default_critical_limit")]
    pub critical: Decimal,
    /// Ceiling for `IMPORTANT` items.
    #[serde(default = "default_important_limit")]
    pub important: Decimal,
    /// Ceiling for `ASPIRATIONAL` items.
    #[serde(default = "default_aspirational_limit")]
    pub aspirational: Decimal,
}

fn default_critical_limit() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

fn default_important_limit() -> Decimal {
    Decimal::new(15, 2) // 0.15
}

fn default_aspirational_limit() -> Decimal {
    Decimal::new(50, 2) // 0.50
}

impl Default for FlexLimits {
    fn default() -> Self {
        Self {
            critical: default_critical_limit(),
            important: default_important_limit(),
            aspirational: default_aspirational_limit(),
        }
    }
}

/// Immutable constitutional safety parameters.
///
/// Defaults are the conservative thresholds the system ships with;
/// operators override them through the configuration surface, never at
/// runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyPolicy {
    /// Gini warning threshold for delegation concentration.
    #[serde(default = "default_delegation_gini_warn")]
    pub delegation_gini_warn: f64,

    /// Gini halt threshold for delegation concentration.
    #[serde(default = "default_delegation_gini_halt")]
    pub delegation_gini_halt: f64,

    /// Warning threshold for the maximum in-degree of a single actor.
    #[serde(default = "default_in_degree_warn")]
    pub delegation_in_degree_warn: u64,

    /// Halt threshold for the maximum in-degree of a single actor.
    #[serde(default = "default_in_degree_halt")]
    pub delegation_in_degree_halt: u64,

    /// Maximum delegation TTL in days.
    #[serde(default = "default_max_ttl_days")]
    pub max_delegation_ttl_days: u32,

    /// Default visibility for new delegation edges.
    #[serde(default)]
    pub delegation_visibility_default: Visibility,

    /// Step-size ceilings by flex class.
    #[serde(default)]
    pub budget_flex_limits: FlexLimits,

    /// Budget balance enforcement mode.
    #[serde(default)]
    pub budget_balance_mode: BalanceMode,

    /// Gini warning threshold for supplier concentration.
    #[serde(default = "default_supplier_gini_warn")]
    pub supplier_gini_warn: f64,

    /// Gini halt threshold for supplier concentration.
    #[serde(default = "default_supplier_gini_halt")]
    pub supplier_gini_halt: f64,

    /// Default checkpoint schedule (days after activation) offered to
    /// laws that do not specify their own.
    #[serde(default = "default_checkpoints")]
    pub default_checkpoints: Vec<u32>,

    /// Latest permitted first checkpoint, in days, for laws classified
    /// irreversible.
    #[serde(default = "default_irreversible_first_checkpoint")]
    pub irreversible_first_checkpoint_max_days: u32,
}

fn default_delegation_gini_warn() -> f64 {
    0.55
}

fn default_delegation_gini_halt() -> f64 {
    0.70
}

const fn default_in_degree_warn() -> u64 {
    500
}

const fn default_in_degree_halt() -> u64 {
    2000
}

const fn default_max_ttl_days() -> u32 {
    365
}

fn default_supplier_gini_warn() -> f64 {
    0.3
}

fn default_supplier_gini_halt() -> f64 {
    0.5
}

fn default_checkpoints() -> Vec<u32> {
    vec![30, 90, 180, 365]
}

const fn default_irreversible_first_checkpoint() -> u32 {
    30
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            delegation_gini_warn: default_delegation_gini_warn(),
            delegation_gini_halt: default_delegation_gini_halt(),
            delegation_in_degree_warn: default_in_degree_warn(),
            delegation_in_degree_halt: default_in_degree_halt(),
            max_delegation_ttl_days: default_max_ttl_days(),
            delegation_visibility_default: Visibility::default(),
            budget_flex_limits: FlexLimits::default(),
            budget_balance_mode: BalanceMode::default(),
            supplier_gini_warn: default_supplier_gini_warn(),
            supplier_gini_halt: default_supplier_gini_halt(),
            default_checkpoints: default_checkpoints(),
            irreversible_first_checkpoint_max_days: default_irreversible_first_checkpoint(),
        }
    }
}
