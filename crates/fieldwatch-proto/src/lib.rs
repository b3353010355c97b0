//! Change record and wire-form types for fieldwatch.
//!
//! This crate defines the leaf types the routing engine passes around:
//!
//! - [`op`] - The kind of mutation a record describes
//! - [`key`] - Primary-key shapes (single, composite, or none)
//! - [`change`] - The immutable change record and its external wire form
//! - [`error`] - Protocol error types
//!
//! Everything here is plain data. A record is built once per committed
//! mutation, is never mutated afterwards, and serializes with serde into
//! the JSON mapping the emission collaborator consumes.

pub mod change;
pub mod error;
pub mod key;
pub mod op;

pub use change::{ChangeRecord, ExternalChange, FieldDelta};
pub use error::Error;
pub use key::PrimaryKey;
pub use op::ChangeOp;
