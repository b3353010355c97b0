//! Watchers and the dispatch registry.

mod registry;
mod watcher;

pub use registry::{DispatchFailure, DispatchOutcome, Registry};
pub use watcher::{Callback, OpFilter, Watcher, WatcherBuilder};
