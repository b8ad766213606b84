//! `category` contract: per-store categories and their stock

use crate::contract::{decode_arg, expect_args, to_payload, unknown_action, Contract};
use recordchain_core::envelope::success_payload;
use recordchain_core::RecordResult;
use recordchain_records::{Categories, Category, NegativePolicy};
use recordchain_store::Ledger;

const OPERATIONS: &[&str] = &[
    "insert",
    "queryByID",
    "query",
    "change",
    "delete",
    "insertStock",
    "changeStock",
];

pub struct CategoryContract {
    categories: Categories,
}

impl CategoryContract {
    pub fn new(stock_policy: NegativePolicy) -> Self {
        Self {
            categories: Categories::new(stock_policy),
        }
    }
}

impl Contract for CategoryContract {
    fn name(&self) -> &'static str {
        "category"
    }

    fn operations(&self) -> &'static [&'static str] {
        OPERATIONS
    }

    fn invoke(&self, ledger: &mut dyn Ledger, function: &str, args: &[String]) -> RecordResult<Vec<u8>> {
        match function {
            "insert" => {
                expect_args(function, args, 1)?;
                let category: Category = decode_arg(function, &args[0])?;
                self.categories.insert(ledger, category)?;
                success_payload("invoke insert success")
            }
            "queryByID" => {
                expect_args(function, args, 1)?;
                to_payload(&self.categories.query_by_id(ledger, &args[0])?)
            }
            // args: category id, store id
            "query" => {
                expect_args(function, args, 2)?;
                to_payload(&self.categories.query(ledger, &args[0], &args[1])?)
            }
            "change" => {
                expect_args(function, args, 1)?;
                let category: Category = decode_arg(function, &args[0])?;
                self.categories.change(ledger, category)?;
                success_payload("invoke change success")
            }
            "delete" => {
                expect_args(function, args, 2)?;
                to_payload(&self.categories.delete(ledger, &args[0], &args[1])?)
            }
            // args: category id, store id, quantity
            "insertStock" => {
                expect_args(function, args, 3)?;
                self.categories.insert_stock(ledger, &args[0], &args[1], &args[2])?;
                success_payload("invoke insertStock success")
            }
            // args: category id, store id, quantity, add|reduce
            "changeStock" => {
                expect_args(function, args, 4)?;
                self.categories
                    .change_stock(ledger, &args[0], &args[1], &args[2], &args[3])?;
                success_payload("invoke changeStock success")
            }
            other => Err(unknown_action(self.name(), other)),
        }
    }
}
