//! Secondary Index Manager
//!
//! Membership indexes are composite keys `(namespace, participant, entity)`
//! holding a one-byte sentinel. Only the existence of the key carries
//! meaning, so adding or removing an entry twice leaves the same state.

use crate::ledger::Ledger;
use crate::record;
use recordchain_core::keys::composite_key;
use recordchain_core::RecordResult;
use tracing::{debug, Span};

/// Value stored under every index key
pub const INDEX_SENTINEL: [u8; 1] = [0x00];

#[derive(Debug, Clone)]
pub struct IndexManager {
    namespace: String,
    span: Span,
}

impl IndexManager {
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let span = tracing::debug_span!("index", namespace = %namespace);
        Self { namespace, span }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn entry_key(&self, participant: &str, entity_id: &str) -> RecordResult<String> {
        Ok(composite_key(&self.namespace, &[participant, entity_id])?)
    }

    pub fn add_membership(&self, ledger: &mut dyn Ledger, participant: &str, entity_id: &str) -> RecordResult<()> {
        let _guard = self.span.enter();
        let key = self.entry_key(participant, entity_id)?;
        ledger.put_state(&key, INDEX_SENTINEL.to_vec())?;
        debug!(participant, entity_id, "Index entry added");
        Ok(())
    }

    pub fn remove_membership(&self, ledger: &mut dyn Ledger, participant: &str, entity_id: &str) -> RecordResult<()> {
        let _guard = self.span.enter();
        let key = self.entry_key(participant, entity_id)?;
        ledger.del_state(&key)?;
        debug!(participant, entity_id, "Index entry removed");
        Ok(())
    }

    pub fn has_membership(&self, ledger: &dyn Ledger, participant: &str, entity_id: &str) -> RecordResult<bool> {
        let key = self.entry_key(participant, entity_id)?;
        record::exists(ledger, &key)
    }

    /// Entity ids the participant is linked to, ascending by key bytes
    pub fn list_by_participant(&self, ledger: &dyn Ledger, participant: &str) -> RecordResult<Vec<String>> {
        let entries = record::scan_composite(ledger, &self.namespace, &[participant])?;
        Ok(entries
            .into_iter()
            .filter_map(|(mut segments, _)| if segments.len() == 2 { segments.pop() } else { None })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::VersionedStore;
    use recordchain_core::RecordError;

    const NS: &str = "holderId~billNo";

    fn run<T>(store: &mut VersionedStore, f: impl FnOnce(&mut crate::TxContext<'_>) -> RecordResult<T>) -> T {
        store.invoke::<T, RecordError, _>("test", f).unwrap()
    }

    #[test]
    fn test_add_and_list() {
        let mut store = VersionedStore::in_memory();
        let index = IndexManager::new(NS);

        run(&mut store, |ctx| {
            index.add_membership(ctx, "D1", "B2")?;
            index.add_membership(ctx, "D1", "B1")?;
            index.add_membership(ctx, "T1", "B1")
        });

        assert_eq!(run(&mut store, |ctx| index.list_by_participant(ctx, "D1")), vec!["B1", "B2"]);
        assert_eq!(run(&mut store, |ctx| index.list_by_participant(ctx, "T1")), vec!["B1"]);
        assert!(run(&mut store, |ctx| index.list_by_participant(ctx, "X")).is_empty());
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut store = VersionedStore::in_memory();
        let index = IndexManager::new(NS);

        run(&mut store, |ctx| index.add_membership(ctx, "D1", "B1"));
        run(&mut store, |ctx| index.add_membership(ctx, "D1", "B1"));

        assert_eq!(run(&mut store, |ctx| index.list_by_participant(ctx, "D1")), vec!["B1"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = VersionedStore::in_memory();
        let index = IndexManager::new(NS);

        run(&mut store, |ctx| index.add_membership(ctx, "D1", "B1"));
        run(&mut store, |ctx| index.remove_membership(ctx, "D1", "B1"));
        run(&mut store, |ctx| index.remove_membership(ctx, "D1", "B1"));
        run(&mut store, |ctx| index.remove_membership(ctx, "nobody", "B9"));

        assert!(!run(&mut store, |ctx| index.has_membership(ctx, "D1", "B1")));
        assert!(run(&mut store, |ctx| index.list_by_participant(ctx, "D1")).is_empty());
    }

    #[test]
    fn test_participant_is_not_prefix_matched() {
        let mut store = VersionedStore::in_memory();
        let index = IndexManager::new(NS);

        run(&mut store, |ctx| {
            index.add_membership(ctx, "T1", "B1")?;
            index.add_membership(ctx, "T10", "B2")
        });

        assert_eq!(run(&mut store, |ctx| index.list_by_participant(ctx, "T1")), vec!["B1"]);
    }
}
