//! Plain record contracts: `commodity`, `goods`, `index`
//!
//! These kinds only need insert / queryByID / change / delete, so one
//! generic contract serves all of them. `delete` takes the id followed by
//! the tenant segments of composite-keyed kinds.

use crate::contract::{decode_arg, expect_args, expect_min_args, to_payload, unknown_action, Contract};
use recordchain_core::envelope::success_payload;
use recordchain_core::RecordResult;
use recordchain_records::{Commodity, Entity, Goods, IndexRecord, Repository};
use recordchain_store::Ledger;

const OPERATIONS: &[&str] = &["insert", "queryByID", "change", "delete"];

/// What `queryByID` returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    /// The single record
    Record,
    /// The record with its version history
    WithHistory,
    /// Every record sharing the id, across tenants
    AcrossTenants,
}

pub struct CrudContract<E> {
    name: &'static str,
    query: QueryShape,
    repo: Repository<E>,
}

impl<E: Entity> CrudContract<E> {
    pub fn new(name: &'static str, query: QueryShape) -> Self {
        Self {
            name,
            query,
            repo: Repository::new(),
        }
    }
}

pub fn commodity() -> CrudContract<Commodity> {
    CrudContract::new("commodity", QueryShape::Record)
}

pub fn goods() -> CrudContract<Goods> {
    CrudContract::new("goods", QueryShape::WithHistory)
}

pub fn index() -> CrudContract<IndexRecord> {
    CrudContract::new("index", QueryShape::AcrossTenants)
}

impl<E: Entity> Contract for CrudContract<E> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn operations(&self) -> &'static [&'static str] {
        OPERATIONS
    }

    fn invoke(&self, ledger: &mut dyn Ledger, function: &str, args: &[String]) -> RecordResult<Vec<u8>> {
        match function {
            "insert" => {
                expect_args(function, args, 1)?;
                let entity: E = decode_arg(function, &args[0])?;
                self.repo.insert(ledger, entity)?;
                success_payload("invoke insert success")
            }
            "queryByID" => {
                expect_args(function, args, 1)?;
                let id = &args[0];
                match self.query {
                    QueryShape::Record => to_payload(&self.repo.get::<&str>(ledger, id, &[])?),
                    QueryShape::WithHistory => to_payload(&self.repo.query_with_history::<&str>(ledger, id, &[])?),
                    QueryShape::AcrossTenants => to_payload(&self.repo.query_across_tenants(ledger, id)?),
                }
            }
            "change" => {
                expect_args(function, args, 1)?;
                let entity: E = decode_arg(function, &args[0])?;
                self.repo.update(ledger, entity)?;
                success_payload("invoke change success")
            }
            "delete" => {
                expect_min_args(function, args, 1)?;
                to_payload(&self.repo.delete(ledger, &args[0], &args[1..])?)
            }
            other => Err(unknown_action(self.name, other)),
        }
    }
}
