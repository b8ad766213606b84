//! Typed record access over a [`Ledger`]

use crate::ledger::Ledger;
use recordchain_core::keys::{composite_key, split_composite_key};
use recordchain_core::{RecordError, RecordResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Load and decode the record at `key`
pub fn get_json<T: DeserializeOwned>(ledger: &dyn Ledger, key: &str) -> RecordResult<Option<T>> {
    match ledger.get_state(key)? {
        Some(bytes) => decode(key, &bytes).map(Some),
        None => Ok(None),
    }
}

/// Encode and store `record` at `key`
pub fn put_json<T: Serialize>(ledger: &mut dyn Ledger, key: &str, record: &T) -> RecordResult<()> {
    let bytes = serde_json::to_vec(record)?;
    ledger.put_state(key, bytes)?;
    Ok(())
}

pub fn exists(ledger: &dyn Ledger, key: &str) -> RecordResult<bool> {
    Ok(ledger.get_state(key)?.is_some())
}

pub fn delete(ledger: &mut dyn Ledger, key: &str) -> RecordResult<()> {
    ledger.del_state(key)?;
    Ok(())
}

/// Entries under a composite namespace whose leading segments equal
/// `partial`, as `(segments, value)` pairs in key order.
pub fn scan_composite<S: AsRef<str>>(
    ledger: &dyn Ledger,
    namespace: &str,
    partial: &[S],
) -> RecordResult<Vec<(Vec<String>, Vec<u8>)>> {
    let prefix = composite_key(namespace, partial)?;
    ledger
        .scan_prefix(&prefix)?
        .map(|(key, value)| -> RecordResult<(Vec<String>, Vec<u8>)> {
            let (_, segments) = split_composite_key(&key)?;
            Ok((segments, value))
        })
        .collect()
}

pub(crate) fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> RecordResult<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| RecordError::Encoding(format!("cannot decode record at {:?}: {}", key, e)))
}
