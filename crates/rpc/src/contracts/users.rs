//! `users` contract: accounts, credentials and field-level changes

use crate::contract::{decode_arg, expect_args, to_payload, unknown_action, Contract};
use recordchain_core::envelope::success_payload;
use recordchain_core::RecordResult;
use recordchain_records::{NegativePolicy, User, Users};
use recordchain_store::Ledger;

const OPERATIONS: &[&str] = &["insert", "queryByID", "change", "delete", "login"];

pub struct UsersContract {
    users: Users,
}

impl UsersContract {
    pub fn new(cost_policy: NegativePolicy) -> Self {
        Self {
            users: Users::new(cost_policy),
        }
    }
}

impl Contract for UsersContract {
    fn name(&self) -> &'static str {
        "users"
    }

    fn operations(&self) -> &'static [&'static str] {
        OPERATIONS
    }

    fn invoke(&self, ledger: &mut dyn Ledger, function: &str, args: &[String]) -> RecordResult<Vec<u8>> {
        match function {
            "insert" => {
                expect_args(function, args, 1)?;
                let user: User = decode_arg(function, &args[0])?;
                self.users.insert(ledger, user)?;
                success_payload("invoke insert success")
            }
            "queryByID" => {
                expect_args(function, args, 1)?;
                to_payload(&self.users.query_by_id(ledger, &args[0])?)
            }
            // args: user id, field, value
            "change" => {
                expect_args(function, args, 3)?;
                self.users.change(ledger, &args[0], &args[1], &args[2])?;
                success_payload("invoke change success")
            }
            "delete" => {
                expect_args(function, args, 1)?;
                to_payload(&self.users.delete(ledger, &args[0])?)
            }
            // args: user id, password
            "login" => {
                expect_args(function, args, 2)?;
                let outcome = self.users.login(ledger, &args[0], &args[1])?;
                success_payload(outcome.to_string())
            }
            other => Err(unknown_action(self.name(), other)),
        }
    }
}
