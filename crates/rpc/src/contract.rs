//! Contract dispatch boundary
//!
//! A contract receives an operation name and its string arguments, runs
//! against the ledger of one invocation and returns the success payload.

use recordchain_core::{RecordError, RecordResult};
use recordchain_store::Ledger;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub trait Contract {
    /// Name callers use to address this contract
    fn name(&self) -> &'static str;

    /// Operation names accepted by `invoke`
    fn operations(&self) -> &'static [&'static str];

    fn invoke(&self, ledger: &mut dyn Ledger, function: &str, args: &[String]) -> RecordResult<Vec<u8>>;
}

/// Exactly `count` arguments
pub fn expect_args(function: &str, args: &[String], count: usize) -> RecordResult<()> {
    if args.len() != count {
        return Err(RecordError::validation(format!(
            "{} expects {} argument(s), got {}",
            function,
            count,
            args.len()
        )));
    }
    Ok(())
}

/// At least `count` arguments
pub fn expect_min_args(function: &str, args: &[String], count: usize) -> RecordResult<()> {
    if args.len() < count {
        return Err(RecordError::validation(format!(
            "{} expects at least {} argument(s), got {}",
            function,
            count,
            args.len()
        )));
    }
    Ok(())
}

/// Decode a JSON argument
pub fn decode_arg<T: DeserializeOwned>(function: &str, arg: &str) -> RecordResult<T> {
    serde_json::from_str(arg)
        .map_err(|e| RecordError::Encoding(format!("{} cannot decode its argument: {}", function, e)))
}

/// Serialize a query result as the success payload
pub fn to_payload<T: Serialize>(value: &T) -> RecordResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub fn unknown_action(contract: &str, function: &str) -> RecordError {
    RecordError::validation(format!("Unknown action: {}.{}", contract, function))
}
