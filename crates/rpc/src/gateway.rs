//! Gateway - routes calls to contracts, one atomic invocation each

use crate::config::AppConfig;
use crate::contract::Contract;
use crate::contracts::{crud, BillContract, CategoryContract, UsersContract};
use recordchain_core::{Envelope, RecordError, Response};
use recordchain_store::{Clock, KeyModification, StoreError, SystemClock, VersionedStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn, Span};

pub struct Gateway {
    store: VersionedStore,
    contracts: BTreeMap<&'static str, Box<dyn Contract>>,
    span: Span,
}

impl Gateway {
    /// Journal-backed gateway under `config.data_dir`
    pub fn open(config: &AppConfig) -> Result<Self, StoreError> {
        let store = VersionedStore::open(config.journal_path(), Arc::new(SystemClock))?;
        Ok(Self::with_store(store, config))
    }

    /// Volatile gateway, mainly for tests
    pub fn in_memory(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_store(VersionedStore::with_clock(clock), config)
    }

    /// Gateway over `store` with every built-in contract registered
    pub fn with_store(store: VersionedStore, config: &AppConfig) -> Self {
        let mut gateway = Self {
            store,
            contracts: BTreeMap::new(),
            span: tracing::info_span!("gateway"),
        };
        gateway.register(Box::new(BillContract::new(config.workflow.clone())));
        gateway.register(Box::new(CategoryContract::new(config.numeric.stock)));
        gateway.register(Box::new(UsersContract::new(config.numeric.cost)));
        gateway.register(Box::new(crud::commodity()));
        gateway.register(Box::new(crud::goods()));
        gateway.register(Box::new(crud::index()));
        gateway
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Add or replace a contract
    pub fn register(&mut self, contract: Box<dyn Contract>) {
        self.contracts.insert(contract.name(), contract);
    }

    /// Registered contracts, by name
    pub fn contracts(&self) -> impl Iterator<Item = &dyn Contract> + '_ {
        self.contracts.values().map(|c| c.as_ref())
    }

    /// Run one operation. Its writes commit together on success and are
    /// discarded on failure.
    pub fn invoke(&mut self, contract: &str, function: &str, args: &[String]) -> Response {
        let span = self.span.clone();
        let _guard = span.enter();

        let Some(target) = self.contracts.get(contract) else {
            let err = RecordError::validation(format!("Unknown contract: {}", contract));
            warn!(contract, "Unknown contract");
            return Response::Failure(Envelope::from(&err));
        };

        let operation = format!("{}.{}", contract, function);
        let result = self
            .store
            .invoke(&operation, |ctx| target.invoke(ctx, function, args));

        match &result {
            Ok(payload) => debug!(%operation, bytes = payload.len(), "Invocation succeeded"),
            Err(e) => warn!(%operation, kind = %e.kind(), error = %e, "Invocation failed"),
        }
        Response::from(result)
    }

    /// Raw committed versions of a key
    pub fn history(&self, key: &str) -> &[KeyModification] {
        self.store.history(key)
    }

    pub fn store(&self) -> &VersionedStore {
        &self.store
    }
}
