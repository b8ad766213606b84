//! Goods: shelf items with a remaining quantity

use crate::repository::{Entity, KeyScheme, Stocked};
use recordchain_core::keys::prefix;
use recordchain_store::HistoryRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Goods {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    #[serde(rename = "StoreID")]
    pub store_id: String,
    pub store_name: String,
    pub remains: String,
    pub bar_code: String,
    pub mea_unit: String,
    pub unit_price: String,
    pub shelf_life: String,
    pub create_time: String,
}

impl HistoryRecord for Goods {}

impl Entity for Goods {
    const KIND: &'static str = "Goods";
    const SCHEME: KeyScheme = KeyScheme::Flat { prefix: prefix::GOODS };

    fn id(&self) -> &str {
        &self.id
    }

    fn create_time(&self) -> &str {
        &self.create_time
    }

    fn set_create_time(&mut self, create_time: String) {
        self.create_time = create_time;
    }

    fn prepare_insert(&mut self) {
        if self.remains.trim().is_empty() {
            self.remains = "0".to_string();
        }
    }
}

impl Stocked for Goods {
    const STOCK_FIELD: &'static str = "Remains";

    fn stock(&self) -> &str {
        &self.remains
    }

    fn set_stock(&mut self, stock: String) {
        self.remains = stock;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::NegativePolicy;
    use crate::repository::{Repository, StockDirection};
    use recordchain_store::VersionedStore;

    #[test]
    fn test_insert_defaults_remains_and_adjusts() {
        let mut store = VersionedStore::in_memory();
        let repo: Repository<Goods> = Repository::new();
        let goods = Goods {
            id: "g1".into(),
            name: "Milk".into(),
            ..Default::default()
        };

        let inserted = store.invoke("insert", |ctx| repo.insert(ctx, goods)).unwrap();
        assert_eq!(inserted.remains, "0");

        let adjusted = store
            .invoke("adjust", |ctx| {
                repo.adjust_stock::<&str>(ctx, "g1", &[], "2.50", StockDirection::Add, NegativePolicy::Allow)
            })
            .unwrap();
        assert_eq!(adjusted.remains, "2.5");

        let view = store
            .invoke("queryByID", |ctx| repo.query_with_history::<&str>(ctx, "g1", &[]))
            .unwrap();
        assert_eq!(view.history.len(), 2);
    }
}
