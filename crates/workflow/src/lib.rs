//! RecordChain Workflow - bill endorsement
//!
//! A bill is issued by a drawer, accepted or rejected by a teacher, then
//! by the school. Bills past their due date become overdue and leave a
//! penalty marker for the drawer.

pub mod bill;
pub mod config;
pub mod workflow;

pub use bill::{Bill, BillState, Role};
pub use config::WorkflowConfig;
pub use workflow::EndorsementWorkflow;
