//! In-process versioned store
//!
//! Holds the committed keyspace in an ordered map and every version of
//! every key. Each call to [`VersionedStore::invoke`] is one transaction:
//! the closure reads committed state through a [`TxContext`], its writes
//! are buffered, and they are applied together only if it returns `Ok`.

use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::journal::{CommittedTx, TxJournal, WriteOp};
use crate::ledger::{HistoryIter, KeyModification, KvIter, Ledger};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, Span};

#[derive(Debug, Default)]
struct State {
    current: BTreeMap<String, Vec<u8>>,
    history: HashMap<String, Vec<KeyModification>>,
    sequence: u64,
}

impl State {
    fn apply(&mut self, tx: &CommittedTx) {
        for write in &tx.writes {
            let applied = match &write.value {
                Some(value) => {
                    self.current.insert(write.key.clone(), value.clone());
                    true
                }
                None => self.current.remove(&write.key).is_some(),
            };
            if applied {
                self.history
                    .entry(write.key.clone())
                    .or_default()
                    .push(KeyModification {
                        tx_id: tx.tx_id.clone(),
                        timestamp: tx.timestamp,
                        value: write.value.clone(),
                    });
            }
        }
        self.sequence = tx.sequence;
    }
}

/// Versioned key-value store with per-invocation atomicity
pub struct VersionedStore {
    state: State,
    clock: Arc<dyn Clock>,
    journal: Option<TxJournal>,
    span: Span,
}

impl VersionedStore {
    /// Volatile store on the wall clock
    pub fn in_memory() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Volatile store on the given clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: State::default(),
            clock,
            journal: None,
            span: tracing::info_span!("versioned_store"),
        }
    }

    /// Journal-backed store. Replays every committed transaction found in
    /// the journal before accepting new ones.
    pub fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let (journal, committed) = TxJournal::open(path)?;
        let mut store = Self::with_clock(clock);

        for tx in &committed {
            store.state.apply(tx);
        }
        store.journal = Some(journal);

        info!(
            parent: &store.span,
            transactions = committed.len(),
            keys = store.state.current.len(),
            "Replayed journal"
        );
        Ok(store)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Run `f` as one transaction named `operation`.
    ///
    /// Writes made through the context are committed atomically when `f`
    /// returns `Ok` and discarded when it returns `Err`. With a journal
    /// attached the write set is made durable before it is applied.
    pub fn invoke<T, E, F>(&mut self, operation: &str, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut TxContext<'_>) -> Result<T, E>,
    {
        let span = self.span.clone();
        let _guard = span.enter();

        let sequence = self.state.sequence + 1;
        let timestamp = self.clock.now();
        let mut ctx = TxContext {
            committed: &self.state,
            writes: BTreeMap::new(),
            tx_id: transaction_id(sequence, timestamp, operation),
            timestamp,
        };

        let output = match f(&mut ctx) {
            Ok(output) => output,
            Err(e) => {
                debug!(operation, tx_id = %ctx.tx_id, "Invocation failed, writes discarded");
                return Err(e);
            }
        };

        let TxContext { writes, tx_id, .. } = ctx;
        let writes: Vec<WriteOp> = writes
            .into_iter()
            .filter(|(key, value)| value.is_some() || self.state.current.contains_key(key))
            .map(|(key, value)| WriteOp { key, value })
            .collect();

        if writes.is_empty() {
            return Ok(output);
        }

        let tx = CommittedTx {
            sequence,
            tx_id,
            timestamp,
            operation: operation.to_string(),
            writes,
        };

        if let Some(journal) = self.journal.as_mut() {
            journal.append(&tx)?;
        }
        self.state.apply(&tx);

        debug!(operation, tx_id = %tx.tx_id, writes = tx.writes.len(), "Committed");
        Ok(output)
    }

    /// Committed value of `key`
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.state.current.get(key).map(Vec::as_slice)
    }

    /// Committed versions of `key`, oldest first
    pub fn history(&self, key: &str) -> &[KeyModification] {
        self.state
            .history
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of committed transactions
    pub fn sequence(&self) -> u64 {
        self.state.sequence
    }

    pub fn len(&self) -> usize {
        self.state.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.current.is_empty()
    }
}

impl Default for VersionedStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Hex SHA-256 of (sequence, timestamp, operation)
fn transaction_id(sequence: u64, timestamp: i64, operation: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sequence.to_be_bytes());
    hasher.update(timestamp.to_be_bytes());
    hasher.update(operation.as_bytes());
    hex::encode(hasher.finalize())
}

/// The ledger as seen by one invocation
pub struct TxContext<'a> {
    committed: &'a State,
    writes: BTreeMap<String, Option<Vec<u8>>>,
    tx_id: String,
    timestamp: i64,
}

impl TxContext<'_> {
    /// Keys written so far in this invocation
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }
}

impl Ledger for TxContext<'_> {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn tx_timestamp(&self) -> i64 {
        self.timestamp
    }

    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.committed.current.get(key).cloned())
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.writes.insert(key.to_string(), Some(value));
        Ok(())
    }

    fn del_state(&mut self, key: &str) -> Result<(), StoreError> {
        self.writes.insert(key.to_string(), None);
        Ok(())
    }

    fn scan_prefix<'a>(&'a self, prefix: &str) -> Result<KvIter<'a>, StoreError> {
        let prefix = prefix.to_string();
        let iter = self
            .committed
            .current
            .range(prefix.clone()..)
            .take_while(move |(key, _)| key.starts_with(&prefix))
            .map(|(key, value)| (key.clone(), value.clone()));
        Ok(Box::new(iter))
    }

    fn history_for_key<'a>(&'a self, key: &str) -> Result<HistoryIter<'a>, StoreError> {
        let versions = self
            .committed
            .history
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        Ok(Box::new(versions.iter().cloned()))
    }
}
