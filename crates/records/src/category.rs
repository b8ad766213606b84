//! Categories: product lines stocked per store
//!
//! A category is unique per `(id, store)` and lives under the
//! `storeID~CateID` namespace. Its stock is kept on the record and
//! mirrored under a `Stock_` key in the same namespace.

use crate::policy::NegativePolicy;
use crate::repository::{Entity, KeyScheme, Repository, StockDirection, Stocked};
use recordchain_core::decimal::{format_plain, parse_decimal};
use recordchain_core::keys::{composite_key, namespace, prefix, primary_key};
use recordchain_core::{RecordError, RecordResult};
use recordchain_store::history::{HistoryRecord, WithHistory};
use recordchain_store::{record, Ledger};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Category {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    #[serde(rename = "StoreID")]
    pub store_id: String,
    pub store_name: String,
    pub bar_code: String,
    pub mea_unit: String,
    pub unit_price: String,
    pub shelf_life: String,
    pub stock: String,
    pub create_time: String,
}

impl HistoryRecord for Category {}

impl Entity for Category {
    const KIND: &'static str = "Category";
    const SCHEME: KeyScheme = KeyScheme::Composite {
        namespace: namespace::STORE_CATEGORY,
        id_prefix: prefix::CATEGORY,
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

    /// New categories start empty; stock is set through `insert_stock`.
    fn prepare_insert(&mut self) {
        self.stock = "0".to_string();
    }
}

impl Stocked for Category {
    const STOCK_FIELD: &'static str = "Stock";

    fn stock(&self) -> &str {
        &self.stock
    }

    fn set_stock(&mut self, stock: String) {
        self.stock = stock;
    }
}

/// Key of the stock mirror for `(id, store)`
pub fn stock_key(id: &str, store_id: &str) -> RecordResult<String> {
    Ok(composite_key(
        namespace::STORE_CATEGORY,
        &[primary_key(prefix::STOCK, id), store_id.to_string()],
    )?)
}

/// Category operations, including stock bookkeeping
#[derive(Debug, Clone, Default)]
pub struct Categories {
    repo: Repository<Category>,
    stock_policy: NegativePolicy,
}

impl Categories {
    pub fn new(stock_policy: NegativePolicy) -> Self {
        Self {
            repo: Repository::new(),
            stock_policy,
        }
    }

    pub fn repository(&self) -> &Repository<Category> {
        &self.repo
    }

    pub fn insert(&self, ledger: &mut dyn Ledger, category: Category) -> RecordResult<Category> {
        self.repo.insert(ledger, category)
    }

    /// Every store's record for this category id
    pub fn query_by_id(&self, ledger: &dyn Ledger, id: &str) -> RecordResult<Vec<Category>> {
        self.repo.query_across_tenants(ledger, id)
    }

    pub fn query(&self, ledger: &dyn Ledger, id: &str, store_id: &str) -> RecordResult<WithHistory<Category>> {
        self.repo.query_with_history(ledger, id, &[store_id])
    }

    pub fn change(&self, ledger: &mut dyn Ledger, category: Category) -> RecordResult<Category> {
        self.repo.update(ledger, category)
    }

    /// Remove the record and its stock mirror
    pub fn delete(&self, ledger: &mut dyn Ledger, id: &str, store_id: &str) -> RecordResult<Category> {
        let removed = self.repo.delete(ledger, id, &[store_id])?;
        record::delete(ledger, &stock_key(id, store_id)?)?;
        Ok(removed)
    }

    /// Initialise the stock of an existing category
    pub fn insert_stock(
        &self,
        ledger: &mut dyn Ledger,
        id: &str,
        store_id: &str,
        quantity: &str,
    ) -> RecordResult<Category> {
        let quantity = format_plain(parse_decimal(Category::STOCK_FIELD, quantity)?);

        let mirror = stock_key(id, store_id)?;
        if record::exists(ledger, &mirror)? {
            return Err(RecordError::already_exists("Stock", id));
        }

        let category = self.repo.modify(ledger, id, &[store_id], |category| {
            category.stock = quantity.clone();
            Ok(())
        })?;
        ledger.put_state(&mirror, quantity.into_bytes())?;

        info!(id, store_id, stock = %category.stock, "Stock initialised");
        Ok(category)
    }

    /// Add to or reduce the stock of an existing category
    pub fn change_stock(
        &self,
        ledger: &mut dyn Ledger,
        id: &str,
        store_id: &str,
        quantity: &str,
        direction: &str,
    ) -> RecordResult<Category> {
        let direction = StockDirection::parse(direction)?;
        let category =
            self.repo
                .adjust_stock(ledger, id, &[store_id], quantity, direction, self.stock_policy)?;
        ledger.put_state(&stock_key(id, store_id)?, category.stock.clone().into_bytes())?;

        info!(id, store_id, %direction, stock = %category.stock, "Stock changed");
        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordchain_store::VersionedStore;

    fn category(id: &str, store: &str) -> Category {
        Category {
            id: id.into(),
            name: format!("Category {}", id),
            store_id: store.into(),
            stock: "99".into(),
            ..Default::default()
        }
    }

    fn seeded(policy: NegativePolicy) -> (VersionedStore, Categories) {
        let mut store = VersionedStore::in_memory();
        let categories = Categories::new(policy);
        store
            .invoke("insert", |ctx| categories.insert(ctx, category("1", "S1")))
            .unwrap();
        (store, categories)
    }

    #[test]
    fn test_insert_forces_zero_stock() {
        let (mut store, categories) = seeded(NegativePolicy::Allow);
        let found = store.invoke("query", |ctx| categories.query_by_id(ctx, "1")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].stock, "0");
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(category("1", "S1")).unwrap();
        assert_eq!(json["ID"], "1");
        assert_eq!(json["StoreID"], "S1");
        assert!(json.get("MeaUnit").is_some());
    }

    #[test]
    fn test_insert_stock_then_change() {
        let (mut store, categories) = seeded(NegativePolicy::Allow);

        let initialised = store
            .invoke("insertStock", |ctx| categories.insert_stock(ctx, "1", "S1", "20"))
            .unwrap();
        assert_eq!(initialised.stock, "20");

        let reduced = store
            .invoke("changeStock", |ctx| categories.change_stock(ctx, "1", "S1", "5", "reduce"))
            .unwrap();
        assert_eq!(reduced.stock, "15");

        let mirror = stock_key("1", "S1").unwrap();
        assert_eq!(store.get(&mirror), Some(b"15".as_slice()));

        let view = store.invoke("query", |ctx| categories.query(ctx, "1", "S1")).unwrap();
        assert_eq!(view.record.stock, "15");
        assert_eq!(view.history.len(), 3);
    }

    #[test]
    fn test_insert_stock_preconditions() {
        let (mut store, categories) = seeded(NegativePolicy::Allow);

        let missing = store.invoke("insertStock", |ctx| categories.insert_stock(ctx, "2", "S1", "1"));
        assert!(matches!(missing, Err(RecordError::NotFound { .. })));

        store
            .invoke("insertStock", |ctx| categories.insert_stock(ctx, "1", "S1", "1"))
            .unwrap();
        let twice = store.invoke("insertStock", |ctx| categories.insert_stock(ctx, "1", "S1", "1"));
        assert!(matches!(twice, Err(RecordError::AlreadyExists { .. })));

        let bad = store.invoke("insertStock", |ctx| categories.insert_stock(ctx, "1", "S2", "many"));
        assert!(matches!(bad, Err(RecordError::Parse { .. })));
    }

    #[test]
    fn test_change_stock_rejects_unknown_direction() {
        let (mut store, categories) = seeded(NegativePolicy::Allow);
        let result = store.invoke("changeStock", |ctx| categories.change_stock(ctx, "1", "S1", "1", "double"));
        assert!(matches!(result, Err(RecordError::Validation(_))));
    }

    #[test]
    fn test_change_stock_clamp_policy() {
        let (mut store, categories) = seeded(NegativePolicy::Clamp);
        let result = store
            .invoke("changeStock", |ctx| categories.change_stock(ctx, "1", "S1", "3", "reduce"))
            .unwrap();
        assert_eq!(result.stock, "0");
    }

    #[test]
    fn test_delete_removes_mirror() {
        let (mut store, categories) = seeded(NegativePolicy::Allow);
        store
            .invoke("insertStock", |ctx| categories.insert_stock(ctx, "1", "S1", "4"))
            .unwrap();

        let removed = store.invoke("delete", |ctx| categories.delete(ctx, "1", "S1")).unwrap();
        assert_eq!(removed.stock, "4");
        assert!(store.get(&stock_key("1", "S1").unwrap()).is_none());
        assert!(store.invoke("query", |ctx| categories.query_by_id(ctx, "1")).unwrap().is_empty());
    }
}
