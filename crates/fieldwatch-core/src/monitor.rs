//! The monitor: one configuration plus one registry.

use std::sync::Arc;

use fieldwatch_proto::ChangeRecord;

use crate::config::Config;
use crate::watch::{DispatchOutcome, Registry, Watcher};

/// An explicitly constructed engine instance.
///
/// A monitor owns one [`Config`] and one [`Registry`] and is passed around
/// by the host application instead of living in global state. Construct it
/// at start-up, register watchers, then hand committed records to
/// [`emit`](Monitor::emit) (outbound, to the configured transport hook)
/// and [`consume`](Monitor::consume) (inbound, to the local watchers).
#[derive(Debug, Default)]
pub struct Monitor {
    config: Config,
    registry: Registry,
}

impl Monitor {
    /// Create a monitor with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a monitor with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            registry: Registry::new(),
        }
    }

    /// The configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The watcher registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register a watcher. Idempotent; returns whether it was added.
    pub fn register(&self, watcher: Arc<Watcher>) -> bool {
        self.registry.register(watcher)
    }

    /// Drop every registered watcher (test/reset hook).
    pub fn clear_watchers(&self) {
        self.registry.clear();
    }

    /// Hand a committed record's external form to the configured emitter.
    /// A monitor without an emitter emits nowhere.
    pub fn emit(&self, record: &ChangeRecord) {
        if let Some(emitter) = self.config.emitter() {
            let external = record.to_external_form(self.config.publisher_name());
            emitter(&external);
        }
    }

    /// Fan a record out to every interested watcher.
    pub fn consume(&self, record: &ChangeRecord) -> DispatchOutcome {
        self.registry.dispatch(record)
    }
}
