//! Contracts exposed by the gateway

pub mod bill;
pub mod category;
pub mod crud;
pub mod users;

pub use bill::BillContract;
pub use category::CategoryContract;
pub use crud::{CrudContract, QueryShape};
pub use users::UsersContract;
