//! `bill` contract: endorsement workflow operations

use crate::contract::{decode_arg, expect_args, expect_min_args, to_payload, unknown_action, Contract};
use recordchain_core::envelope::success_payload;
use recordchain_core::RecordResult;
use recordchain_store::Ledger;
use recordchain_workflow::{Bill, BillState, EndorsementWorkflow, WorkflowConfig};

const OPERATIONS: &[&str] = &[
    "issue",
    "accept_teacher",
    "accept_school",
    "reject",
    "queryMyBill",
    "queryMyWaitBill",
    "queryByBillNo",
    "checkDue",
];

pub struct BillContract {
    workflow: EndorsementWorkflow,
}

impl BillContract {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            workflow: EndorsementWorkflow::new(config),
        }
    }
}

impl Contract for BillContract {
    fn name(&self) -> &'static str {
        "bill"
    }

    fn operations(&self) -> &'static [&'static str] {
        OPERATIONS
    }

    fn invoke(&self, ledger: &mut dyn Ledger, function: &str, args: &[String]) -> RecordResult<Vec<u8>> {
        match function {
            "issue" => {
                expect_args(function, args, 1)?;
                let bill: Bill = decode_arg(function, &args[0])?;
                self.workflow.issue(ledger, bill)?;
                success_payload("invoke issue success")
            }
            // args: bill no, endorser id, endorser name
            "accept_teacher" => {
                expect_min_args(function, args, 3)?;
                self.workflow.accept_teacher(ledger, &args[0], &args[1], &args[2])?;
                success_payload("invoke accept success")
            }
            "accept_school" => {
                expect_min_args(function, args, 3)?;
                let bill = self.workflow.accept_school(ledger, &args[0], &args[1], &args[2])?;
                if bill.state == Some(BillState::OverDue) {
                    success_payload("This bill is overdue")
                } else {
                    success_payload("invoke accept success")
                }
            }
            "reject" => {
                expect_min_args(function, args, 3)?;
                self.workflow.reject(ledger, &args[0], &args[1], &args[2])?;
                success_payload("invoke reject success")
            }
            "queryMyBill" => {
                expect_args(function, args, 1)?;
                to_payload(&self.workflow.query_by_participant(ledger, &args[0])?)
            }
            "queryMyWaitBill" => {
                expect_args(function, args, 1)?;
                to_payload(&self.workflow.query_waiting(ledger, &args[0])?)
            }
            "queryByBillNo" => {
                expect_args(function, args, 1)?;
                to_payload(&self.workflow.query_by_bill_no(ledger, &args[0])?)
            }
            "checkDue" => {
                expect_args(function, args, 1)?;
                to_payload(&self.workflow.check_due(ledger, &args[0])?)
            }
            other => Err(unknown_action(self.name(), other)),
        }
    }
}
