//! RecordChain Core - shared building blocks
//!
//! This crate contains the pieces every record module depends on:
//! - `keys`: primary and composite key encoding over a shared keyspace
//! - `RecordError` / `ErrorKind`: the error taxonomy surfaced to callers
//! - `Envelope`: the `{Code, Des}` response contract
//! - `decimal`: parsing of string-typed numeric fields

pub mod decimal;
pub mod envelope;
pub mod error;
pub mod keys;

pub use envelope::{Envelope, Response};
pub use error::{ErrorKind, RecordError, RecordResult};
pub use keys::{composite_key, primary_key, split_composite_key, CompositeKey, KeyError};
