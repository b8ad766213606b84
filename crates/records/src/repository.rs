//! Generic Entity Repository
//!
//! Every record kind shares the same contract: insert fails on an existing
//! key, update and delete require one, and `CreateTime` is assigned by the
//! repository from the transaction timestamp. Kinds differ only in their
//! key scheme, which [`Entity`] describes.

use crate::policy::NegativePolicy;
use recordchain_core::decimal::{checked_add, checked_sub, format_plain, parse_decimal};
use recordchain_core::keys::{composite_key, primary_key};
use recordchain_core::{RecordError, RecordResult};
use recordchain_store::history::{with_history, HistoryRecord, WithHistory};
use recordchain_store::record;
use recordchain_store::Ledger;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use strum_macros::{Display, EnumString};
use tracing::{debug, info, Span};

/// How an entity kind maps to store keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScheme {
    /// `prefix + id`
    Flat { prefix: &'static str },

    /// Composite key `(namespace, id_prefix + id, tenant...)`, unique per tenant
    Composite {
        namespace: &'static str,
        id_prefix: &'static str,
    },
}

impl KeyScheme {
    pub fn key<S: AsRef<str>>(&self, id: &str, tenant: &[S]) -> RecordResult<String> {
        match self {
            KeyScheme::Flat { prefix } => Ok(primary_key(prefix, id)),
            KeyScheme::Composite { namespace, id_prefix } => {
                let mut segments = Vec::with_capacity(1 + tenant.len());
                segments.push(primary_key(id_prefix, id));
                segments.extend(tenant.iter().map(|s| s.as_ref().to_string()));
                Ok(composite_key(namespace, segments.as_slice())?)
            }
        }
    }
}

/// A record kind stored through [`Repository`]
pub trait Entity: Serialize + DeserializeOwned + Default + Clone + HistoryRecord {
    /// Name used in error messages and logs
    const KIND: &'static str;
    const SCHEME: KeyScheme;

    fn id(&self) -> &str;

    /// Discriminator segments following the id in composite schemes
    fn tenant(&self) -> Vec<String> {
        Vec::new()
    }

    fn create_time(&self) -> &str;
    fn set_create_time(&mut self, create_time: String);

    /// Adjust a record just before its first write
    fn prepare_insert(&mut self) {}

    fn key(&self) -> RecordResult<String> {
        Self::SCHEME.key(self.id(), &self.tenant())
    }
}

/// Entities carrying a decimal quantity adjusted by add/reduce
pub trait Stocked: Entity {
    /// Field name reported in parse errors
    const STOCK_FIELD: &'static str;

    fn stock(&self) -> &str;
    fn set_stock(&mut self, stock: String);
}

/// Direction of a stock adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum StockDirection {
    Add,
    Reduce,
}

impl StockDirection {
    pub fn parse(direction: &str) -> RecordResult<Self> {
        direction.parse().map_err(|_| {
            RecordError::validation(format!(
                "direction should be add or reduce, got {:?}",
                direction
            ))
        })
    }
}

/// Typed load/save/delete for one entity kind
#[derive(Debug, Clone)]
pub struct Repository<E> {
    span: Span,
    _kind: PhantomData<fn() -> E>,
}

impl<E: Entity> Default for Repository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Repository<E> {
    pub fn new() -> Self {
        Self::with_span(tracing::info_span!("repository", kind = E::KIND))
    }

    pub fn with_span(span: Span) -> Self {
        Self {
            span,
            _kind: PhantomData,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Store a new record. Fails if its key is already present.
    pub fn insert(&self, ledger: &mut dyn Ledger, mut entity: E) -> RecordResult<E> {
        let _guard = self.span.enter();
        validate_id::<E>(entity.id())?;

        let key = entity.key()?;
        if record::exists(ledger, &key)? {
            return Err(RecordError::already_exists(E::KIND, entity.id()));
        }

        entity.prepare_insert();
        entity.set_create_time(ledger.tx_timestamp().to_string());
        record::put_json(ledger, &key, &entity)?;

        info!(id = entity.id(), "Inserted");
        Ok(entity)
    }

    pub fn find<S: AsRef<str>>(&self, ledger: &dyn Ledger, id: &str, tenant: &[S]) -> RecordResult<Option<E>> {
        let key = E::SCHEME.key(id, tenant)?;
        record::get_json(ledger, &key)
    }

    pub fn get<S: AsRef<str>>(&self, ledger: &dyn Ledger, id: &str, tenant: &[S]) -> RecordResult<E> {
        self.find(ledger, id, tenant)?
            .ok_or_else(|| RecordError::not_found(E::KIND, id))
    }

    /// The record with its full version history
    pub fn query_with_history<S: AsRef<str>>(
        &self,
        ledger: &dyn Ledger,
        id: &str,
        tenant: &[S],
    ) -> RecordResult<WithHistory<E>> {
        let key = E::SCHEME.key(id, tenant)?;
        let entity: E =
            record::get_json(ledger, &key)?.ok_or_else(|| RecordError::not_found(E::KIND, id))?;
        with_history(ledger, &key, entity)
    }

    /// Every record with this id, whatever its tenant
    pub fn query_across_tenants(&self, ledger: &dyn Ledger, id: &str) -> RecordResult<Vec<E>> {
        match E::SCHEME {
            KeyScheme::Flat { .. } => Ok(self.find::<&str>(ledger, id, &[])?.into_iter().collect()),
            KeyScheme::Composite { namespace, id_prefix } => {
                let partial = [primary_key(id_prefix, id)];
                let mut found = Vec::new();
                for (segments, bytes) in record::scan_composite(ledger, namespace, &partial)? {
                    let entity: E = serde_json::from_slice(&bytes).map_err(|e| {
                        RecordError::Encoding(format!("cannot decode {} {:?}: {}", E::KIND, segments, e))
                    })?;
                    if entity.id() == id {
                        found.push(entity);
                    }
                }
                debug!(id, matches = found.len(), "Scanned across tenants");
                Ok(found)
            }
        }
    }

    /// Full overwrite of an existing record. `CreateTime` keeps its stored value.
    pub fn update(&self, ledger: &mut dyn Ledger, mut entity: E) -> RecordResult<E> {
        let _guard = self.span.enter();
        validate_id::<E>(entity.id())?;

        let key = entity.key()?;
        let existing: E =
            record::get_json(ledger, &key)?.ok_or_else(|| RecordError::not_found(E::KIND, entity.id()))?;

        entity.set_create_time(existing.create_time().to_string());
        record::put_json(ledger, &key, &entity)?;

        info!(id = entity.id(), "Updated");
        Ok(entity)
    }

    /// Load, mutate and store an existing record
    pub fn modify<S, F>(&self, ledger: &mut dyn Ledger, id: &str, tenant: &[S], f: F) -> RecordResult<E>
    where
        S: AsRef<str>,
        F: FnOnce(&mut E) -> RecordResult<()>,
    {
        let _guard = self.span.enter();
        let key = E::SCHEME.key(id, tenant)?;
        let mut entity: E =
            record::get_json(ledger, &key)?.ok_or_else(|| RecordError::not_found(E::KIND, id))?;

        f(&mut entity)?;
        record::put_json(ledger, &key, &entity)?;

        debug!(id, "Modified");
        Ok(entity)
    }

    /// Remove a record, returning its last state
    pub fn delete<S: AsRef<str>>(&self, ledger: &mut dyn Ledger, id: &str, tenant: &[S]) -> RecordResult<E> {
        let _guard = self.span.enter();
        let key = E::SCHEME.key(id, tenant)?;
        let entity: E =
            record::get_json(ledger, &key)?.ok_or_else(|| RecordError::not_found(E::KIND, id))?;

        record::delete(ledger, &key)?;

        info!(id, "Deleted");
        Ok(entity)
    }
}

impl<E: Stocked> Repository<E> {
    /// Add to or reduce the stock of an existing record
    pub fn adjust_stock<S: AsRef<str>>(
        &self,
        ledger: &mut dyn Ledger,
        id: &str,
        tenant: &[S],
        delta: &str,
        direction: StockDirection,
        policy: NegativePolicy,
    ) -> RecordResult<E> {
        let delta = parse_decimal(E::STOCK_FIELD, delta)?;
        self.modify(ledger, id, tenant, |entity| {
            let current = parse_decimal(E::STOCK_FIELD, entity.stock())?;
            let next = match direction {
                StockDirection::Add => checked_add(E::STOCK_FIELD, current, delta)?,
                StockDirection::Reduce => checked_sub(E::STOCK_FIELD, current, delta)?,
            };
            let next = policy.apply(E::STOCK_FIELD, next)?;
            entity.set_stock(format_plain(next));
            Ok(())
        })
    }
}

fn validate_id<E: Entity>(id: &str) -> RecordResult<()> {
    if id.is_empty() {
        return Err(RecordError::validation(format!("{} ID must not be empty", E::KIND)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordchain_store::{FixedClock, VersionedStore};
    use serde::Deserialize;
    use std::sync::Arc;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Shelf {
        #[serde(rename = "ID")]
        id: String,
        #[serde(rename = "StoreID")]
        store_id: String,
        count: String,
        create_time: String,
    }

    impl Entity for Shelf {
        const KIND: &'static str = "Shelf";
        const SCHEME: KeyScheme = KeyScheme::Composite {
            namespace: "storeID~ShelfID",
            id_prefix: "Shelf_",
        };

        fn id(&self) -> &str {
            &self.id
        }

        fn tenant(&self) -> Vec<String> {
            vec![self.store_id.clone()]
        }

        fn create_time(&self) -> &str {
            &self.create_time
        }

        fn set_create_time(&mut self, create_time: String) {
            self.create_time = create_time;
        }

        fn prepare_insert(&mut self) {
            if self.count.is_empty() {
                self.count = "0".to_string();
            }
        }
    }

    impl HistoryRecord for Shelf {}

    impl Stocked for Shelf {
        const STOCK_FIELD: &'static str = "Count";

        fn stock(&self) -> &str {
            &self.count
        }

        fn set_stock(&mut self, stock: String) {
            self.count = stock;
        }
    }

    fn shelf(id: &str, store: &str) -> Shelf {
        Shelf {
            id: id.into(),
            store_id: store.into(),
            ..Default::default()
        }
    }

    fn setup() -> (VersionedStore, Repository<Shelf>) {
        let clock = Arc::new(FixedClock::new(1_700_000_000));
        (VersionedStore::with_clock(clock), Repository::new())
    }

    #[test]
    fn test_insert_assigns_create_time() {
        let (mut store, repo) = setup();
        let inserted = store
            .invoke("insert", |ctx| repo.insert(ctx, shelf("1", "S1")))
            .unwrap();

        assert_eq!(inserted.create_time, "1700000000");
        assert_eq!(inserted.count, "0");

        let loaded = store.invoke("get", |ctx| repo.get(ctx, "1", &["S1"])).unwrap();
        assert_eq!(loaded, inserted);
    }

    #[test]
    fn test_insert_twice_fails() {
        let (mut store, repo) = setup();
        store.invoke("insert", |ctx| repo.insert(ctx, shelf("1", "S1"))).unwrap();

        let result = store.invoke("insert", |ctx| repo.insert(ctx, shelf("1", "S1")));
        assert!(matches!(result, Err(RecordError::AlreadyExists { .. })));

        // same id under another tenant is a different record
        store.invoke("insert", |ctx| repo.insert(ctx, shelf("1", "S2"))).unwrap();
    }

    #[test]
    fn test_empty_id_rejected() {
        let (mut store, repo) = setup();
        let result = store.invoke("insert", |ctx| repo.insert(ctx, shelf("", "S1")));
        assert!(matches!(result, Err(RecordError::Validation(_))));
    }

    #[test]
    fn test_query_across_tenants_matches_exact_id() {
        let (mut store, repo) = setup();
        store
            .invoke("seed", |ctx| {
                repo.insert(ctx, shelf("1", "S1"))?;
                repo.insert(ctx, shelf("1", "S2"))?;
                repo.insert(ctx, shelf("10", "S1"))
            })
            .unwrap();

        let found = store.invoke("scan", |ctx| repo.query_across_tenants(ctx, "1")).unwrap();
        let stores: Vec<&str> = found.iter().map(|s| s.store_id.as_str()).collect();
        assert_eq!(stores, vec!["S1", "S2"]);
    }

    #[test]
    fn test_update_requires_existing_and_keeps_create_time() {
        let (mut store, repo) = setup();
        let missing = store.invoke("update", |ctx| repo.update(ctx, shelf("1", "S1")));
        assert!(matches!(missing, Err(RecordError::NotFound { .. })));

        store.invoke("insert", |ctx| repo.insert(ctx, shelf("1", "S1"))).unwrap();
        let mut changed = shelf("1", "S1");
        changed.count = "9".into();
        changed.create_time = "42".into();
        let updated = store.invoke("update", |ctx| repo.update(ctx, changed)).unwrap();

        assert_eq!(updated.count, "9");
        assert_eq!(updated.create_time, "1700000000");
    }

    #[test]
    fn test_delete_returns_snapshot_and_keeps_history() {
        let (mut store, repo) = setup();
        store.invoke("insert", |ctx| repo.insert(ctx, shelf("1", "S1"))).unwrap();

        let removed = store.invoke("delete", |ctx| repo.delete(ctx, "1", &["S1"])).unwrap();
        assert_eq!(removed.id, "1");

        let again = store.invoke("delete", |ctx| repo.delete(ctx, "1", &["S1"]));
        assert!(matches!(again, Err(RecordError::NotFound { .. })));

        let key = Shelf::SCHEME.key("1", &["S1"]).unwrap();
        assert_eq!(store.history(&key).len(), 2);
    }

    #[test]
    fn test_query_with_history() {
        let (mut store, repo) = setup();
        store.invoke("insert", |ctx| repo.insert(ctx, shelf("1", "S1"))).unwrap();
        let mut changed = shelf("1", "S1");
        changed.count = "3".into();
        store.invoke("update", |ctx| repo.update(ctx, changed)).unwrap();

        let view = store
            .invoke("query", |ctx| repo.query_with_history(ctx, "1", &["S1"]))
            .unwrap();
        assert_eq!(view.record.count, "3");
        assert_eq!(view.history.len(), 2);
        assert_eq!(view.history[0].record.count, "0");
    }

    #[test]
    fn test_adjust_stock() {
        let (mut store, repo) = setup();
        store.invoke("insert", |ctx| repo.insert(ctx, shelf("1", "S1"))).unwrap();

        let added = store
            .invoke("add", |ctx| {
                repo.adjust_stock(ctx, "1", &["S1"], "10.5", StockDirection::Add, NegativePolicy::Allow)
            })
            .unwrap();
        assert_eq!(added.count, "10.5");

        let reduced = store
            .invoke("reduce", |ctx| {
                repo.adjust_stock(ctx, "1", &["S1"], "12", StockDirection::Reduce, NegativePolicy::Allow)
            })
            .unwrap();
        assert_eq!(reduced.count, "-1.5");
    }

    #[test]
    fn test_adjust_stock_errors() {
        let (mut store, repo) = setup();
        let missing = store.invoke("add", |ctx| {
            repo.adjust_stock(ctx, "1", &["S1"], "1", StockDirection::Add, NegativePolicy::Allow)
        });
        assert!(matches!(missing, Err(RecordError::NotFound { .. })));

        store.invoke("insert", |ctx| repo.insert(ctx, shelf("1", "S1"))).unwrap();
        let bad_delta = store.invoke("add", |ctx| {
            repo.adjust_stock(ctx, "1", &["S1"], "lots", StockDirection::Add, NegativePolicy::Allow)
        });
        assert!(matches!(bad_delta, Err(RecordError::Parse { .. })));

        let rejected = store.invoke("reduce", |ctx| {
            repo.adjust_stock(ctx, "1", &["S1"], "1", StockDirection::Reduce, NegativePolicy::Reject)
        });
        assert!(matches!(rejected, Err(RecordError::Validation(_))));
    }

    #[test]
    fn test_adjust_stock_out_of_range() {
        let (mut store, repo) = setup();
        let mut full = shelf("1", "S1");
        full.count = "79228162514264337593543950335".into();
        store.invoke("insert", |ctx| repo.insert(ctx, full)).unwrap();

        let overflow = store.invoke("add", |ctx| {
            repo.adjust_stock(ctx, "1", &["S1"], "1", StockDirection::Add, NegativePolicy::Allow)
        });
        assert!(matches!(overflow, Err(RecordError::Validation(_))));

        let underflow = store.invoke("reduce", |ctx| {
            repo.adjust_stock(
                ctx,
                "1",
                &["S1"],
                "-79228162514264337593543950335",
                StockDirection::Reduce,
                NegativePolicy::Allow,
            )
        });
        assert!(matches!(underflow, Err(RecordError::Validation(_))));

        let loaded = store.invoke("get", |ctx| repo.get(ctx, "1", &["S1"])).unwrap();
        assert_eq!(loaded.count, "79228162514264337593543950335");
    }

    #[test]
    fn test_stock_direction_parse() {
        assert_eq!(StockDirection::parse("add").unwrap(), StockDirection::Add);
        assert_eq!(StockDirection::parse("reduce").unwrap(), StockDirection::Reduce);
        assert!(matches!(StockDirection::parse("double"), Err(RecordError::Validation(_))));
    }
}
