//! RecordChain Store - versioned key-value records over a ledger
//!
//! # Key Types
//! - `Ledger`: the per-invocation view of the external ledger (get/put/delete,
//!   prefix scan, key history, transaction timestamp)
//! - `VersionedStore`: in-process ledger keeping every version of every key,
//!   running each invocation as one atomic unit
//! - `TxJournal`: append-only JSONL log of committed invocations
//! - `IndexManager`: membership indexes as empty-valued composite keys
//! - `history::reconstruct`: typed replay of a key's version history

pub mod clock;
pub mod error;
pub mod history;
pub mod index;
pub mod journal;
pub mod ledger;
pub mod memory;
pub mod record;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::StoreError;
pub use history::{reconstruct, with_history, HistoryItem, HistoryRecord, WithHistory};
pub use index::{IndexManager, INDEX_SENTINEL};
pub use journal::{CommittedTx, TxJournal, WriteOp};
pub use ledger::{KeyModification, Ledger};
pub use memory::{TxContext, VersionedStore};
