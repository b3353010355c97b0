//! fieldwatch-core - The change-routing engine.
//!
//! Application code declares interest in database-backed tables and fields;
//! committed mutations arrive as immutable change records; the registry
//! fans each record out to exactly the watchers whose declared interest
//! overlaps it.
//!
//! # Modules
//!
//! - [`field_spec`] - Canonical field-interest specifications
//! - [`watch`] - Watchers and the fan-out registry
//! - [`schema`] - Schema-metadata and record-lookup boundary traits
//! - [`capture`] - Attribute diffing and transactional change buffering
//! - [`config`] / [`monitor`] - Configuration and the engine facade
//! - [`error`] - Core error types
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use fieldwatch_core::{Monitor, Watcher};
//! use fieldwatch_proto::{ChangeOp, ChangeRecord};
//!
//! let monitor = Monitor::new();
//! monitor.register(Arc::new(
//!     Watcher::builder()
//!         .fields("orders", ["status"])
//!         .only([ChangeOp::Update])
//!         .callback(|record| {
//!             println!("{} -> {:?}", record.table(), record.new_value("status"));
//!             Ok(())
//!         })
//!         .build()?,
//! ));
//!
//! let record = ChangeRecord::new("orders", ChangeOp::Update)
//!     .with_change("status", "new", "paid");
//! let outcome = monitor.consume(&record);
//! assert_eq!(outcome.delivered, 1);
//! # Ok::<(), fieldwatch_core::Error>(())
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod field_spec;
pub mod monitor;
pub mod schema;
pub mod watch;

pub use capture::{create_changes, destroy_changes, diff_attributes, ChangeBuffer};
pub use config::{Config, EmitFn};
pub use error::Error;
pub use field_spec::{FieldSpec, Interest};
pub use monitor::Monitor;
pub use schema::{record_from_entity, resolve_record, Entity, RecordStore, Row};
pub use watch::{Callback, DispatchFailure, DispatchOutcome, OpFilter, Registry, Watcher, WatcherBuilder};

/// Re-export protocol types.
pub use fieldwatch_proto as proto;
