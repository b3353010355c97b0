//! A watcher binds a field spec and an operation filter to a callback.

use std::collections::BTreeSet;
use std::fmt;

use fieldwatch_proto::{ChangeOp, ChangeRecord};

use crate::error::Error;
use crate::field_spec::{FieldSpec, Interest};

/// The reaction a watcher runs for each matching change record.
///
/// Callbacks run synchronously on the dispatching thread and are assumed
/// fast and local; long-running reactions belong behind whatever the
/// callback forwards to.
pub type Callback = Box<dyn Fn(&ChangeRecord) -> Result<(), Error> + Send + Sync>;

/// Which operation kinds a watcher accepts.
///
/// The default accepts all three; `only` and `except` narrow it, mirroring
/// the declaration surface (`except` is the complement over the three
/// kinds).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpFilter {
    allowed: Option<BTreeSet<ChangeOp>>,
}

impl OpFilter {
    /// Accept every operation kind.
    pub fn any() -> Self {
        Self::default()
    }

    /// Accept only the given kinds.
    pub fn only(ops: impl IntoIterator<Item = ChangeOp>) -> Self {
        Self {
            allowed: Some(ops.into_iter().collect()),
        }
    }

    /// Accept every kind except the given ones.
    pub fn except(ops: impl IntoIterator<Item = ChangeOp>) -> Self {
        let excluded: BTreeSet<ChangeOp> = ops.into_iter().collect();
        Self {
            allowed: Some(
                ChangeOp::ALL
                    .into_iter()
                    .filter(|op| !excluded.contains(op))
                    .collect(),
            ),
        }
    }

    /// Whether the filter accepts this operation kind.
    pub fn accepts(&self, op: ChangeOp) -> bool {
        match &self.allowed {
            None => true,
            Some(allowed) => allowed.contains(&op),
        }
    }
}

/// An interest declaration bound to a callback.
///
/// A watcher is constructed once at registration time and is stateless
/// between invocations: deciding interest is a pure query over its field
/// spec and operation filter.
pub struct Watcher {
    spec: FieldSpec,
    filter: OpFilter,
    callback: Callback,
}

impl Watcher {
    /// Create a watcher from its parts.
    pub fn new(spec: FieldSpec, filter: OpFilter, callback: Callback) -> Self {
        Self {
            spec,
            filter,
            callback,
        }
    }

    /// Start building a watcher declaratively.
    pub fn builder() -> WatcherBuilder {
        WatcherBuilder::default()
    }

    /// The field spec this watcher matches against.
    pub fn field_spec(&self) -> &FieldSpec {
        &self.spec
    }

    /// The operation filter this watcher applies.
    pub fn op_filter(&self) -> &OpFilter {
        &self.filter
    }

    /// Whether this watcher wants the given record: the operation filter
    /// must accept the record's kind and the field spec must overlap the
    /// record's table and changed fields.
    pub fn interested_in(&self, record: &ChangeRecord) -> bool {
        self.filter.accepts(record.op())
            && self.spec.overlaps(record.table(), record.changed_fields())
    }

    /// Invoke the callback if this watcher is interested.
    ///
    /// Returns `Ok(false)` when uninterested and `Ok(true)` after a
    /// successful invocation. A callback failure is logged and returned;
    /// the registry decides whether the fan-out continues.
    pub fn execute_if_interested(&self, record: &ChangeRecord) -> Result<bool, Error> {
        if !self.interested_in(record) {
            return Ok(false);
        }
        if let Err(error) = (self.callback)(record) {
            tracing::error!(
                table = record.table(),
                operation = %record.op(),
                %error,
                "watcher callback failed"
            );
            return Err(error);
        }
        Ok(true)
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("spec", &self.spec)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// Builder for watchers: the explicit registration surface.
///
/// ```
/// use fieldwatch_core::Watcher;
/// use fieldwatch_proto::ChangeOp;
///
/// let watcher = Watcher::builder()
///     .fields("orders", ["status"])
///     .only([ChangeOp::Update])
///     .callback(|record| {
///         println!("order status changed: {:?}", record.new_value("status"));
///         Ok(())
///     })
///     .build()
///     .unwrap();
/// ```
#[derive(Default)]
pub struct WatcherBuilder {
    interests: Vec<Interest>,
    spec: Option<FieldSpec>,
    filter: OpFilter,
    callback: Option<Callback>,
}

impl WatcherBuilder {
    /// Watch every field of every table.
    pub fn everything(mut self) -> Self {
        self.interests.push(Interest::Everything);
        self
    }

    /// Watch every field of one table.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.interests.push(Interest::table(name));
        self
    }

    /// Watch specific fields of one table.
    pub fn fields<I, S>(mut self, table: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests.push(Interest::fields(table, fields));
        self
    }

    /// Add a raw interest contribution.
    pub fn interest(mut self, interest: Interest) -> Self {
        self.interests.push(interest);
        self
    }

    /// Use an already-normalized field spec, ignoring any accumulated
    /// interest contributions.
    pub fn spec(mut self, spec: FieldSpec) -> Self {
        self.spec = Some(spec);
        self
    }

    /// Accept only the given operation kinds.
    pub fn only(mut self, ops: impl IntoIterator<Item = ChangeOp>) -> Self {
        self.filter = OpFilter::only(ops);
        self
    }

    /// Accept every operation kind except the given ones.
    pub fn except(mut self, ops: impl IntoIterator<Item = ChangeOp>) -> Self {
        self.filter = OpFilter::except(ops);
        self
    }

    /// Set the callback to run for matching records.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ChangeRecord) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Build the watcher. Fails if no callback was given.
    pub fn build(self) -> Result<Watcher, Error> {
        let callback = self.callback.ok_or(Error::MissingCallback)?;
        let spec = match self.spec {
            Some(spec) => spec,
            None => FieldSpec::from_interests(self.interests),
        };
        Ok(Watcher::new(spec, self.filter, callback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn update_record() -> ChangeRecord {
        ChangeRecord::new("test_models", ChangeOp::Update).with_change(
            "name",
            "Old Name",
            "New Name",
        )
    }

    #[test]
    fn test_op_filter_defaults_to_all() {
        let filter = OpFilter::any();
        for op in ChangeOp::ALL {
            assert!(filter.accepts(op));
        }
    }

    #[test]
    fn test_op_filter_only() {
        let filter = OpFilter::only([ChangeOp::Create, ChangeOp::Update]);
        assert!(filter.accepts(ChangeOp::Create));
        assert!(filter.accepts(ChangeOp::Update));
        assert!(!filter.accepts(ChangeOp::Destroy));
    }

    #[test]
    fn test_op_filter_except_is_complement() {
        assert_eq!(
            OpFilter::except([ChangeOp::Update]),
            OpFilter::only([ChangeOp::Create, ChangeOp::Destroy])
        );
    }

    #[test]
    fn test_interested_when_fields_overlap() {
        let watcher = Watcher::builder()
            .fields("test_models", ["name", "description"])
            .callback(|_| Ok(()))
            .build()
            .unwrap();

        assert!(watcher.interested_in(&update_record()));

        let other = ChangeRecord::new("test_models", ChangeOp::Update).with_change(
            "other_field",
            "Old",
            "New",
        );
        assert!(!watcher.interested_in(&other));
    }

    #[test]
    fn test_operation_filter_blocks_interest() {
        let watcher = Watcher::builder()
            .fields("test_models", ["name"])
            .only([ChangeOp::Update])
            .callback(|_| Ok(()))
            .build()
            .unwrap();

        let create =
            ChangeRecord::new("test_models", ChangeOp::Create).with_change("name", (), "New Name");
        assert!(!watcher.interested_in(&create));
        assert!(watcher.interested_in(&update_record()));
    }

    #[test]
    fn test_execute_runs_callback_when_interested() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let watcher = Watcher::builder()
            .fields("test_models", ["name"])
            .callback(move |_| {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .build()
            .unwrap();

        assert!(watcher.execute_if_interested(&update_record()).unwrap());
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_execute_skips_callback_when_uninterested() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let watcher = Watcher::builder()
            .fields("test_models", ["name"])
            .callback(move |_| {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .build()
            .unwrap();

        let other = ChangeRecord::new("test_models", ChangeOp::Update).with_change(
            "other_field",
            "Old",
            "New",
        );
        assert!(!watcher.execute_if_interested(&other).unwrap());
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_callback_failure_is_returned() {
        let watcher = Watcher::builder()
            .fields("test_models", ["name"])
            .callback(|_| Err(Error::callback("test error")))
            .build()
            .unwrap();

        let err = watcher.execute_if_interested(&update_record()).unwrap_err();
        assert!(matches!(err, Error::Callback(message) if message == "test error"));
    }

    #[test]
    fn test_builder_requires_callback() {
        let err = Watcher::builder().table("test_models").build().unwrap_err();
        assert!(matches!(err, Error::MissingCallback));
    }

    #[test]
    fn test_builder_accepts_prebuilt_spec() {
        let watcher = Watcher::builder()
            .spec(FieldSpec::everything())
            .callback(|_| Ok(()))
            .build()
            .unwrap();
        assert!(watcher.field_spec().includes_everything());
    }
}
