//! JSONL transaction journal - append-only log of committed invocations
//!
//! One line per committed transaction, written and synced before the
//! transaction's writes become visible. Replaying the journal from the
//! first line rebuilds current state and the full per-key history.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// A single key write inside a committed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOp {
    pub key: String,
    /// `None` records a deletion
    #[serde(with = "hex_value")]
    pub value: Option<Vec<u8>>,
}

/// Write set of one committed invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedTx {
    pub sequence: u64,
    pub tx_id: String,
    pub timestamp: i64,
    pub operation: String,
    pub writes: Vec<WriteOp>,
}

/// Append-only JSONL journal
pub struct TxJournal {
    path: PathBuf,
    writer: BufWriter<File>,
    /// Set when a failed append could not be truncated away
    poisoned: Option<String>,
    #[cfg(test)]
    pub(crate) fail_next_sync: bool,
}

impl TxJournal {
    /// Open (or create) the journal, returning it with every transaction
    /// already recorded, in commit order.
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, Vec<CommittedTx>), StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let committed = if path.exists() {
            Self::read_all(&path)?
        } else {
            Vec::new()
        };

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok((
            Self {
                path,
                writer: BufWriter::new(file),
                poisoned: None,
                #[cfg(test)]
                fail_next_sync: false,
            },
            committed,
        ))
    }

    /// Read every transaction in the journal at `path`
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<CommittedTx>, StoreError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut transactions: Vec<CommittedTx> = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let line_no = index + 1;
            let tx: CommittedTx =
                serde_json::from_str(&line).map_err(|e| StoreError::CorruptJournal {
                    line: line_no,
                    reason: e.to_string(),
                })?;

            let expected = transactions.last().map_or(1, |prev| prev.sequence + 1);
            if tx.sequence != expected {
                return Err(StoreError::SequenceGap {
                    line: line_no,
                    expected,
                    actual: tx.sequence,
                });
            }
            transactions.push(tx);
        }

        Ok(transactions)
    }

    /// Append one transaction and sync it to disk.
    ///
    /// On failure the file is truncated back to its length before the
    /// append, so a later append cannot land behind a partial line. If the
    /// truncation fails too, the journal refuses every further append.
    pub fn append(&mut self, tx: &CommittedTx) -> Result<(), StoreError> {
        if let Some(reason) = &self.poisoned {
            return Err(StoreError::JournalPoisoned(reason.clone()));
        }

        let json = serde_json::to_string(tx)?;
        let len = self.writer.get_ref().metadata()?.len();

        if let Err(e) = self.write_line(&json) {
            warn!(sequence = tx.sequence, error = %e, "Journal append failed, truncating");
            if let Err(rollback) = self.rollback(len) {
                error!(sequence = tx.sequence, error = %rollback, "Journal truncation failed");
                self.poisoned = Some(format!(
                    "append of sequence {} failed ({}) and truncation failed ({})",
                    tx.sequence, e, rollback
                ));
            }
            return Err(e.into());
        }
        Ok(())
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    fn write_line(&mut self, json: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", json)?;
        self.writer.flush()?;
        self.sync()
    }

    fn sync(&mut self) -> io::Result<()> {
        #[cfg(test)]
        if std::mem::take(&mut self.fail_next_sync) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected sync failure"));
        }
        self.writer.get_ref().sync_data()
    }

    /// Swap in a fresh writer, dropping unflushed bytes, and cut the file
    /// back to `len`
    fn rollback(&mut self, len: u64) -> io::Result<()> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let (stale, _unflushed) = std::mem::replace(&mut self.writer, BufWriter::new(file)).into_parts();
        stale.set_len(len)?;
        stale.sync_data()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Values are stored hex-encoded so arbitrary bytes survive the JSON line.
mod hex_value {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tx(sequence: u64, writes: Vec<WriteOp>) -> CommittedTx {
        CommittedTx {
            sequence,
            tx_id: format!("tx-{}", sequence),
            timestamp: 1_700_000_000 + sequence as i64,
            operation: "test".to_string(),
            writes,
        }
    }

    #[test]
    fn test_append_and_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal").join("ledger.jsonl");

        {
            let (mut journal, existing) = TxJournal::open(&path).unwrap();
            assert!(existing.is_empty());
            journal
                .append(&tx(1, vec![WriteOp { key: "a".into(), value: Some(vec![0x00, 0xff]) }]))
                .unwrap();
            journal
                .append(&tx(2, vec![WriteOp { key: "a".into(), value: None }]))
                .unwrap();
        }

        let (_journal, existing) = TxJournal::open(&path).unwrap();
        assert_eq!(existing.len(), 2);
        assert_eq!(existing[0].writes[0].value, Some(vec![0x00, 0xff]));
        assert_eq!(existing[1].writes[0].value, None);
    }

    #[test]
    fn test_failed_append_is_truncated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.jsonl");

        {
            let (mut journal, _) = TxJournal::open(&path).unwrap();
            journal.append(&tx(1, vec![])).unwrap();

            journal.fail_next_sync = true;
            let failed = journal.append(&tx(2, vec![WriteOp { key: "lost".into(), value: None }]));
            assert!(matches!(failed, Err(StoreError::Io(_))));
            assert!(!journal.is_poisoned());

            journal
                .append(&tx(2, vec![WriteOp { key: "kept".into(), value: None }]))
                .unwrap();
        }

        let (_journal, existing) = TxJournal::open(&path).unwrap();
        assert_eq!(existing.len(), 2);
        assert_eq!(existing[1].sequence, 2);
        assert_eq!(existing[1].writes[0].key, "kept");
    }

    #[test]
    fn test_poisoned_journal_refuses_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let (mut journal, _) = TxJournal::open(&path).unwrap();
        journal.poisoned = Some("truncation failed".into());

        let result = journal.append(&tx(1, vec![]));
        assert!(matches!(result, Err(StoreError::JournalPoisoned(_))));
        assert!(TxJournal::read_all(&path).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_line_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let good = serde_json::to_string(&tx(1, vec![])).unwrap();
        fs::write(&path, format!("{}\n{{\"sequence\":2,\"tx_", good)).unwrap();

        let result = TxJournal::read_all(&path);
        assert!(matches!(result, Err(StoreError::CorruptJournal { line: 2, .. })));
    }

    #[test]
    fn test_sequence_gap_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let lines = [tx(1, vec![]), tx(3, vec![])]
            .iter()
            .map(|t| serde_json::to_string(t).unwrap())
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(&path, lines).unwrap();

        let result = TxJournal::read_all(&path);
        assert!(matches!(
            result,
            Err(StoreError::SequenceGap { expected: 2, actual: 3, .. })
        ));
    }
}
