//! Index records: where a record id is published (channel, chaincode)

use crate::repository::{Entity, KeyScheme};
use recordchain_core::keys::namespace;
use recordchain_store::HistoryRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct IndexRecord {
    #[serde(rename = "ID")]
    pub id: String,
    pub channel: String,
    pub chaincode: String,
    pub create_time: String,
}

impl HistoryRecord for IndexRecord {}

impl Entity for IndexRecord {
    const KIND: &'static str = "Index";
    const SCHEME: KeyScheme = KeyScheme::Composite {
        namespace: namespace::ID_CHANNEL_CHAINCODE,
        id_prefix: "",
    };

    fn id(&self) -> &str {
        &self.id
    }

    fn tenant(&self) -> Vec<String> {
        vec![self.channel.clone(), self.chaincode.clone()]
    }

    fn create_time(&self) -> &str {
        &self.create_time
    }

    fn set_create_time(&mut self, create_time: String) {
        self.create_time = create_time;
    }
}
