//! Commodities: catalogue entries, one per id

use crate::repository::{Entity, KeyScheme};
use recordchain_core::keys::prefix;
use recordchain_store::HistoryRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Commodity {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    /// Category id this commodity belongs to
    #[serde(rename = "Commodity", alias = "Category")]
    pub category: String,
    #[serde(rename = "StoreID")]
    pub store_id: String,
    pub store_name: String,
    pub supplier: String,
    /// Place of production
    pub place: String,
    /// Date of production
    pub date: String,
    pub create_time: String,
}

impl HistoryRecord for Commodity {}

impl Entity for Commodity {
    const KIND: &'static str = "Commodity";
    const SCHEME: KeyScheme = KeyScheme::Flat {
        prefix: prefix::COMMODITY,
    };

    fn id(&self) -> &str {
        &self.id
    }

    fn create_time(&self) -> &str {
        &self.create_time
    }

    fn set_create_time(&mut self, create_time: String) {
        self.create_time = create_time;
    }
}
