//! Endorsement Workflow Engine
//!
//! Drives a bill from issue through teacher and school endorsement. Every
//! transition updates the bill and the `holderId~billNo` index in the same
//! invocation, so the index never disagrees with a committed bill:
//!
//! ```text
//! issue -> AwaitingFrom(Teacher) --accept_teacher--> AwaitingFrom(School)
//!              |                                        |
//!            reject                       accept_school / check_due / reject
//!              v                                        v
//!        TeacherReject             SchoolSigned | OverDue | SchoolReject
//! ```
//!
//! The drawer's index entry is never removed, so drawers keep seeing the
//! bills they issued, including bills on which they are also an endorser.

use crate::bill::{bill_key, Bill, BillState, Role};
use crate::config::WorkflowConfig;
use recordchain_core::keys::{namespace, prefix, primary_key};
use recordchain_core::{RecordError, RecordResult};
use recordchain_store::history::{with_history, HistoryItem, WithHistory};
use recordchain_store::{record, IndexManager, Ledger};
use tracing::{info, warn, Span};

pub struct EndorsementWorkflow {
    config: WorkflowConfig,
    index: IndexManager,
    span: Span,
}

impl Default for EndorsementWorkflow {
    fn default() -> Self {
        Self::new(WorkflowConfig::default())
    }
}

impl EndorsementWorkflow {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            index: IndexManager::new(namespace::HOLDER_BILL),
            span: tracing::info_span!("endorsement_workflow"),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Key of the penalty marker for a drawer
    pub fn penalty_key(drawer_id: &str) -> String {
        primary_key(prefix::OVERDUE, drawer_id)
    }

    /// Store a new bill awaiting the teacher and index it for the drawer
    /// and the first endorser.
    pub fn issue(&self, ledger: &mut dyn Ledger, mut bill: Bill) -> RecordResult<Bill> {
        let _guard = self.span.enter();

        if bill.id.is_empty() {
            return Err(RecordError::validation("BillInfoID must not be empty"));
        }
        if bill.wait_endorser_id.is_empty() {
            return Err(RecordError::validation("WaitEndorserCmID must not be empty"));
        }
        bill.due_at()?;

        let key = bill.key();
        if record::exists(ledger, &key)? {
            return Err(RecordError::already_exists("Bill", &bill.id));
        }

        bill.issue_date = ledger.tx_timestamp().to_string();
        bill.state = Some(BillState::ISSUED);
        bill.reject_endorser_id.clear();
        bill.reject_endorser_name.clear();

        record::put_json(ledger, &key, &bill)?;
        self.index.add_membership(ledger, &bill.drawer_id, &bill.id)?;
        self.index.add_membership(ledger, &bill.wait_endorser_id, &bill.id)?;

        info!(bill = %bill.id, drawer = %bill.drawer_id, endorser = %bill.wait_endorser_id, "Bill issued");
        Ok(bill)
    }

    /// Teacher accepts; the bill moves on to wait for the school.
    pub fn accept_teacher(
        &self,
        ledger: &mut dyn Ledger,
        bill_id: &str,
        endorser_id: &str,
        endorser_name: &str,
    ) -> RecordResult<Bill> {
        let _guard = self.span.enter();
        let mut bill = self.load(ledger, bill_id)?;
        self.require_turn(&bill, Role::Teacher, endorser_id)?;

        self.release(ledger, &bill, &bill.wait_endorser_id)?;

        bill.wait_endorser_id = self.config.school_id.clone();
        bill.wait_endorser_name = self.config.school_name.clone();
        bill.state = Some(BillState::AwaitingFrom(Role::School));

        record::put_json(ledger, &bill.key(), &bill)?;
        self.index.add_membership(ledger, &bill.wait_endorser_id, &bill.id)?;

        info!(bill = %bill.id, endorser = endorser_id, name = endorser_name, "Teacher accepted");
        Ok(bill)
    }

    /// School accepts. A bill past its due date goes overdue instead.
    pub fn accept_school(
        &self,
        ledger: &mut dyn Ledger,
        bill_id: &str,
        endorser_id: &str,
        endorser_name: &str,
    ) -> RecordResult<Bill> {
        let _guard = self.span.enter();
        let mut bill = self.load(ledger, bill_id)?;
        self.require_turn(&bill, Role::School, endorser_id)?;

        self.release(ledger, &bill, &bill.wait_endorser_id)?;

        if bill.is_overdue(ledger.tx_timestamp())? {
            self.mark_overdue(ledger, &mut bill)?;
        } else {
            bill.clear_wait();
            bill.state = Some(BillState::SchoolSigned);
            info!(bill = %bill.id, endorser = endorser_id, name = endorser_name, "School accepted");
        }

        record::put_json(ledger, &bill.key(), &bill)?;
        Ok(bill)
    }

    /// The acting endorser refuses the bill.
    pub fn reject(
        &self,
        ledger: &mut dyn Ledger,
        bill_id: &str,
        rejector_id: &str,
        rejector_name: &str,
    ) -> RecordResult<Bill> {
        let _guard = self.span.enter();
        let mut bill = self.load(ledger, bill_id)?;

        let role = bill
            .state
            .and_then(|s| s.awaiting())
            .ok_or_else(|| self.not_awaiting(&bill))?;
        self.require_turn(&bill, role, rejector_id)?;

        self.release(ledger, &bill, rejector_id)?;
        if bill.wait_endorser_id != rejector_id {
            self.release(ledger, &bill, &bill.wait_endorser_id)?;
        }

        bill.reject_endorser_id = rejector_id.to_string();
        bill.reject_endorser_name = rejector_name.to_string();
        bill.clear_wait();
        bill.state = Some(if rejector_id == self.config.school_id {
            BillState::SchoolReject
        } else {
            BillState::TeacherReject
        });

        record::put_json(ledger, &bill.key(), &bill)?;

        info!(bill = %bill.id, rejector = rejector_id, state = ?bill.state, "Bill rejected");
        Ok(bill)
    }

    /// Pollable overdue check. Returns the bill with its history; a bill
    /// still awaiting endorsement past its due date is moved to `OverDue`.
    ///
    /// The `OverDue` version written by this call is the last history item,
    /// so the returned history always ends with the returned state.
    pub fn check_due(&self, ledger: &mut dyn Ledger, bill_id: &str) -> RecordResult<WithHistory<Bill>> {
        let _guard = self.span.enter();
        let mut bill = self.load(ledger, bill_id)?;
        let key = bill.key();

        let mut pending = None;
        if bill.is_awaiting() && bill.is_overdue(ledger.tx_timestamp())? {
            self.release(ledger, &bill, &bill.wait_endorser_id)?;
            self.mark_overdue(ledger, &mut bill)?;
            record::put_json(ledger, &key, &bill)?;
            pending = Some(HistoryItem {
                tx_id: ledger.tx_id().to_string(),
                timestamp: ledger.tx_timestamp(),
                is_delete: false,
                record: bill.clone(),
            });
        }

        let mut view = with_history(ledger, &key, bill)?;
        view.history.extend(pending);
        Ok(view)
    }

    /// Bills the participant is indexed against, drawer or endorser
    pub fn query_by_participant(&self, ledger: &dyn Ledger, participant: &str) -> RecordResult<Vec<Bill>> {
        let ids = self.index.list_by_participant(ledger, participant)?;
        let mut bills = Vec::with_capacity(ids.len());
        for id in ids {
            match record::get_json::<Bill>(ledger, &bill_key(&id))? {
                Some(bill) => bills.push(bill),
                None => warn!(parent: &self.span, bill = %id, participant, "Index entry without bill"),
            }
        }
        Ok(bills)
    }

    /// Bills currently waiting on `endorser_id`
    pub fn query_waiting(&self, ledger: &dyn Ledger, endorser_id: &str) -> RecordResult<Vec<Bill>> {
        Ok(self
            .query_by_participant(ledger, endorser_id)?
            .into_iter()
            .filter(|bill| bill.is_waiting_on(endorser_id))
            .collect())
    }

    /// One bill with its full endorsement history
    pub fn query_by_bill_no(&self, ledger: &dyn Ledger, bill_id: &str) -> RecordResult<WithHistory<Bill>> {
        let bill = self.load(ledger, bill_id)?;
        with_history(ledger, &bill.key(), bill)
    }

    /// Penalty marker recorded for a drawer, if any
    pub fn penalty(&self, ledger: &dyn Ledger, drawer_id: &str) -> RecordResult<Option<String>> {
        Ok(ledger
            .get_state(&Self::penalty_key(drawer_id))?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn load(&self, ledger: &dyn Ledger, bill_id: &str) -> RecordResult<Bill> {
        record::get_json(ledger, &bill_key(bill_id))?.ok_or_else(|| RecordError::not_found("Bill", bill_id))
    }

    /// Drop the participant's index entry, keeping the drawer's
    fn release(&self, ledger: &mut dyn Ledger, bill: &Bill, participant: &str) -> RecordResult<()> {
        if participant == bill.drawer_id {
            return Ok(());
        }
        self.index.remove_membership(ledger, participant, &bill.id)
    }

    fn require_turn(&self, bill: &Bill, role: Role, endorser_id: &str) -> RecordResult<()> {
        if bill.state != Some(BillState::AwaitingFrom(role)) {
            return Err(self.not_awaiting_role(bill, role));
        }
        if self.config.enforce_endorser_identity && bill.wait_endorser_id != endorser_id {
            return Err(RecordError::InvalidTransition(format!(
                "bill {} is waiting on {}, not {}",
                bill.id, bill.wait_endorser_id, endorser_id
            )));
        }
        Ok(())
    }

    fn mark_overdue(&self, ledger: &mut dyn Ledger, bill: &mut Bill) -> RecordResult<()> {
        bill.clear_wait();
        bill.state = Some(BillState::OverDue);
        ledger.put_state(
            &Self::penalty_key(&bill.drawer_id),
            self.config.penalty_marker.clone().into_bytes(),
        )?;
        warn!(bill = %bill.id, drawer = %bill.drawer_id, due = %bill.due_date, "Bill overdue");
        Ok(())
    }

    fn not_awaiting(&self, bill: &Bill) -> RecordError {
        RecordError::InvalidTransition(format!("bill {} is {}", bill.id, describe(bill.state)))
    }

    fn not_awaiting_role(&self, bill: &Bill, role: Role) -> RecordError {
        RecordError::InvalidTransition(format!(
            "bill {} is {}, not waiting on {}",
            bill.id,
            describe(bill.state),
            role
        ))
    }
}

fn describe(state: Option<BillState>) -> &'static str {
    state.map_or("without state", |s| s.as_str())
}
