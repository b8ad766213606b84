//! Numeric policies for stock and cost adjustments
//!
//! Adjustments that would drive a quantity below zero are handled per
//! field according to [`NegativePolicy`]. The default allows them, which
//! keeps existing ledgers replayable.

use recordchain_core::{RecordError, RecordResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What to do when an adjustment result is negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NegativePolicy {
    /// Store the negative value as is
    #[default]
    Allow,

    /// Fail the operation with a validation error
    Reject,

    /// Store zero instead
    Clamp,
}

impl NegativePolicy {
    /// Apply the policy to an adjustment result for `field`
    pub fn apply(self, field: &str, value: Decimal) -> RecordResult<Decimal> {
        if !value.is_sign_negative() || value.is_zero() {
            return Ok(value);
        }
        match self {
            NegativePolicy::Allow => Ok(value),
            NegativePolicy::Reject => Err(RecordError::validation(format!(
                "{} cannot become negative: {}",
                field, value
            ))),
            NegativePolicy::Clamp => Ok(Decimal::ZERO),
        }
    }
}

/// Per-field negative policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NumericPolicy {
    /// Category stock and goods remains
    #[serde(default)]
    pub stock: NegativePolicy,

    /// Accumulated user cost
    #[serde(default)]
    pub cost: NegativePolicy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_non_negative_passes_every_policy() {
        for policy in [NegativePolicy::Allow, NegativePolicy::Reject, NegativePolicy::Clamp] {
            assert_eq!(policy.apply("Stock", dec!(3)).unwrap(), dec!(3));
            assert_eq!(policy.apply("Stock", Decimal::ZERO).unwrap(), Decimal::ZERO);
        }
    }

    #[test]
    fn test_negative_result() {
        assert_eq!(NegativePolicy::Allow.apply("Stock", dec!(-2)).unwrap(), dec!(-2));
        assert_eq!(NegativePolicy::Clamp.apply("Stock", dec!(-2)).unwrap(), Decimal::ZERO);

        let err = NegativePolicy::Reject.apply("Stock", dec!(-2)).unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));
        assert!(err.to_string().contains("Stock"));
    }

    #[test]
    fn test_policy_from_config() {
        let policy: NumericPolicy = serde_json::from_str(r#"{"stock":"reject"}"#).unwrap();
        assert_eq!(policy.stock, NegativePolicy::Reject);
        assert_eq!(policy.cost, NegativePolicy::Allow);
    }
}
