//! RecordChain Records - entity kinds over the versioned store
//!
//! All kinds share one [`Repository`] contract; they differ in key scheme
//! (flat prefix or per-tenant composite key) and in the few operations
//! specific to them (stock bookkeeping, credentials, field-level change).

pub mod category;
pub mod commodity;
pub mod goods;
pub mod index_record;
pub mod policy;
pub mod repository;
pub mod user;

pub use category::{Categories, Category};
pub use commodity::Commodity;
pub use goods::Goods;
pub use index_record::IndexRecord;
pub use policy::{NegativePolicy, NumericPolicy};
pub use repository::{Entity, KeyScheme, Repository, StockDirection, Stocked};
pub use user::{LoginOutcome, User, UserField, Users, VipLevel};
