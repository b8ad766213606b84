//! History Reconstructor
//!
//! Replays the versions of one key into typed snapshots for audit
//! queries. Deletions stay in the trail as default (empty) snapshots.

use crate::ledger::Ledger;
use crate::record::decode;
use recordchain_core::RecordResult;
use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Record kinds that appear in history items
pub trait HistoryRecord {
    /// Key of the snapshot inside each serialized history item
    const HISTORY_FIELD: &'static str = "record";
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryItem<T> {
    #[serde(rename = "txId")]
    pub tx_id: String,

    #[serde(default)]
    pub timestamp: i64,

    #[serde(rename = "isDelete", default)]
    pub is_delete: bool,

    #[serde(rename = "record", alias = "bill")]
    pub record: T,
}

impl<T: Serialize + HistoryRecord> Serialize for HistoryItem<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut item = serializer.serialize_struct("HistoryItem", 4)?;
        item.serialize_field("txId", &self.tx_id)?;
        item.serialize_field("timestamp", &self.timestamp)?;
        item.serialize_field("isDelete", &self.is_delete)?;
        item.serialize_field(T::HISTORY_FIELD, &self.record)?;
        item.end()
    }
}

/// A record together with its version history, the shape returned by
/// history-bearing queries. The history is a read-time projection and
/// is never persisted with the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize + HistoryRecord"))]
pub struct WithHistory<T> {
    #[serde(flatten)]
    pub record: T,

    #[serde(rename = "History", default)]
    pub history: Vec<HistoryItem<T>>,
}

/// Typed version history of `key`, oldest first
pub fn reconstruct<T>(ledger: &dyn Ledger, key: &str) -> RecordResult<Vec<HistoryItem<T>>>
where
    T: DeserializeOwned + Default,
{
    ledger
        .history_for_key(key)?
        .map(|modification| -> RecordResult<HistoryItem<T>> {
            let record = match &modification.value {
                Some(bytes) => decode(key, bytes)?,
                None => T::default(),
            };
            Ok(HistoryItem {
                is_delete: modification.is_delete(),
                tx_id: modification.tx_id,
                timestamp: modification.timestamp,
                record,
            })
        })
        .collect()
}

/// Attach the history of `key` to `record`
pub fn with_history<T>(ledger: &dyn Ledger, key: &str, record: T) -> RecordResult<WithHistory<T>>
where
    T: DeserializeOwned + Default,
{
    let history = reconstruct(ledger, key)?;
    Ok(WithHistory { record, history })
}
