//! Ledger boundary
//!
//! The view one invocation has of the ledger. Backends guarantee that all
//! writes made through one `Ledger` value become visible together or not
//! at all, and that reads observe the state committed before the
//! invocation started.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};

/// One version of a key: the value written by a transaction, or `None`
/// when that transaction deleted the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyModification {
    pub tx_id: String,
    pub timestamp: i64,
    pub value: Option<Vec<u8>>,
}

impl KeyModification {
    pub fn is_delete(&self) -> bool {
        self.value.is_none()
    }
}

/// Lazily produced `(key, value)` pairs, ascending by key bytes
pub type KvIter<'a> = Box<dyn Iterator<Item = (String, Vec<u8>)> + 'a>;

/// Versions of one key, oldest first
pub type HistoryIter<'a> = Box<dyn Iterator<Item = KeyModification> + 'a>;

pub trait Ledger {
    /// Id of the enclosing transaction
    fn tx_id(&self) -> &str;

    /// Unix seconds assigned to the enclosing transaction
    fn tx_timestamp(&self) -> i64;

    /// Current value, `None` if never written or deleted
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Unconditional overwrite; creates a new version on commit
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Remove the current value. Deleting an absent key is a no-op.
    fn del_state(&mut self, key: &str) -> Result<(), StoreError>;

    /// All current entries whose key starts with `prefix`
    fn scan_prefix<'a>(&'a self, prefix: &str) -> Result<KvIter<'a>, StoreError>;

    /// Every version of `key`, oldest to newest, including deletions
    fn history_for_key<'a>(&'a self, key: &str) -> Result<HistoryIter<'a>, StoreError>;
}
