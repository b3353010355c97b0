//! The watcher registry: an ordered, duplicate-free fan-out dispatcher.

use std::sync::Arc;

use parking_lot::RwLock;

use fieldwatch_proto::ChangeRecord;

use crate::error::Error;
use crate::watch::watcher::Watcher;

/// One watcher's failure during a dispatch call.
#[derive(Debug)]
pub struct DispatchFailure {
    /// Registration-order index of the failing watcher.
    pub watcher: usize,
    /// The callback error.
    pub error: Error,
}

/// The result of fanning one record out to every registered watcher.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// How many watchers were interested and ran successfully.
    pub delivered: usize,
    /// Every callback failure, in registration order.
    pub failures: Vec<DispatchFailure>,
}

impl DispatchOutcome {
    /// Whether every interested watcher ran without error.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold to abort-style reporting: the delivered count, or the first
    /// failure.
    pub fn into_result(mut self) -> Result<usize, Error> {
        if self.failures.is_empty() {
            Ok(self.delivered)
        } else {
            Err(self.failures.remove(0).error)
        }
    }
}

/// Ordered, duplicate-free collection of watchers.
///
/// Registration order is dispatch order. The list is guarded so runtime
/// registration and dispatch may race; dispatch itself is a synchronous
/// in-process fan-out on the calling thread.
#[derive(Debug, Default)]
pub struct Registry {
    watchers: RwLock<Vec<Arc<Watcher>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a watcher.
    ///
    /// Registering the same watcher twice is a no-op the second time;
    /// returns whether the watcher was added.
    pub fn register(&self, watcher: Arc<Watcher>) -> bool {
        let mut watchers = self.watchers.write();
        if watchers.iter().any(|w| Arc::ptr_eq(w, &watcher)) {
            tracing::debug!("watcher already registered, skipping");
            return false;
        }
        tracing::debug!(position = watchers.len(), "watcher registered");
        watchers.push(watcher);
        true
    }

    /// Fan a record out to every registered watcher, in registration
    /// order.
    ///
    /// Each watcher is isolated: a failing callback is captured in the
    /// outcome and the remaining watchers still run. Callers wanting
    /// abort-on-first-failure semantics fold the outcome with
    /// [`DispatchOutcome::into_result`].
    pub fn dispatch(&self, record: &ChangeRecord) -> DispatchOutcome {
        let watchers = self.watchers.read().clone();
        let mut outcome = DispatchOutcome::default();

        for (index, watcher) in watchers.iter().enumerate() {
            match watcher.execute_if_interested(record) {
                Ok(true) => outcome.delivered += 1,
                Ok(false) => {}
                Err(error) => outcome.failures.push(DispatchFailure {
                    watcher: index,
                    error,
                }),
            }
        }

        tracing::trace!(
            table = record.table(),
            operation = %record.op(),
            delivered = outcome.delivered,
            failed = outcome.failures.len(),
            "dispatched change record"
        );
        outcome
    }

    /// Drop every registered watcher.
    pub fn clear(&self) {
        self.watchers.write().clear();
    }

    /// Number of registered watchers.
    pub fn len(&self) -> usize {
        self.watchers.read().len()
    }

    /// Whether no watchers are registered.
    pub fn is_empty(&self) -> bool {
        self.watchers.read().is_empty()
    }
}
