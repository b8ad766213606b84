//! Decimal helpers for string-typed numeric fields
//!
//! Prices, stock and cost travel and persist as decimal strings. They are
//! parsed into `Decimal` before any arithmetic and formatted back after.

use crate::error::{RecordError, RecordResult};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Parse a decimal field, accepting plain (`12.5`) and scientific (`1.25e1`) forms.
pub fn parse_decimal(field: &str, value: &str) -> RecordResult<Decimal> {
    let trimmed = value.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| RecordError::parse(field, value))
}

/// `a + b`, failing instead of overflowing the decimal range
pub fn checked_add(field: &str, a: Decimal, b: Decimal) -> RecordResult<Decimal> {
    a.checked_add(b).ok_or_else(|| out_of_range(field, a, "+", b))
}

/// `a - b`, failing instead of overflowing the decimal range
pub fn checked_sub(field: &str, a: Decimal, b: Decimal) -> RecordResult<Decimal> {
    a.checked_sub(b).ok_or_else(|| out_of_range(field, a, "-", b))
}

fn out_of_range(field: &str, a: Decimal, op: &str, b: Decimal) -> RecordError {
    RecordError::validation(format!("{} out of range: {} {} {}", field, a, op, b))
}

/// Format with a fixed number of fractional digits, rounding half away from zero.
pub fn format_fixed(value: Decimal, dp: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded.to_string()
}

/// Shortest representation without trailing zeros
pub fn format_plain(value: Decimal) -> String {
    value.normalize().to_string()
}
