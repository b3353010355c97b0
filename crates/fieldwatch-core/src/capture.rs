//! Capture-side helpers: attribute diffing and transactional buffering.
//!
//! The persistence hooks that observe mutations live with the host
//! application; what belongs here is the reusable mechanics. Diffs are
//! computed by equality-comparing before/after snapshots so unchanged
//! fields never appear in a record, and captured records are buffered per
//! transaction so they are only released once the transaction commits.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use fieldwatch_proto::{ChangeRecord, FieldDelta};

use crate::schema::Row;

/// Diff two attribute snapshots into a change map.
///
/// The union of both key sets is considered; a field appears in the result
/// only if its value actually differs, with absence on either side treated
/// as null.
pub fn diff_attributes(old: &Row, new: &Row) -> BTreeMap<String, FieldDelta> {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    keys.into_iter()
        .filter_map(|key| {
            let old_value = old.get(key).cloned().unwrap_or(Value::Null);
            let new_value = new.get(key).cloned().unwrap_or(Value::Null);
            (old_value != new_value)
                .then(|| (key.clone(), FieldDelta { old: old_value, new: new_value }))
        })
        .collect()
}

/// The change map for a create: every populated field with a null old side.
pub fn create_changes(attributes: &Row) -> BTreeMap<String, FieldDelta> {
    attributes
        .iter()
        .map(|(key, value)| (key.clone(), FieldDelta::new(Value::Null, value.clone())))
        .collect()
}

/// The change map for a destroy: every previously-known field with a null
/// new side.
pub fn destroy_changes(attributes: &Row) -> BTreeMap<String, FieldDelta> {
    attributes
        .iter()
        .map(|(key, value)| (key.clone(), FieldDelta::new(value.clone(), Value::Null)))
        .collect()
}

/// Ordered buffer of change records captured inside one transaction.
///
/// Records accumulate while the transaction is open. [`commit`] drains
/// them, in capture order, exactly once; [`rollback`] discards them. Either
/// way the buffer ends empty, so a record is never released twice and
/// never survives a rolled-back transaction.
///
/// [`commit`]: ChangeBuffer::commit
/// [`rollback`]: ChangeBuffer::rollback
#[derive(Debug, Default)]
pub struct ChangeBuffer {
    pending: Vec<ChangeRecord>,
}

impl ChangeBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a captured record.
    pub fn push(&mut self, record: ChangeRecord) {
        self.pending.push(record);
    }

    /// Drain every buffered record for emission, in capture order.
    pub fn commit(&mut self) -> Vec<ChangeRecord> {
        std::mem::take(&mut self.pending)
    }

    /// Discard every buffered record.
    pub fn rollback(&mut self) {
        let discarded = self.pending.len();
        if discarded > 0 {
            tracing::debug!(discarded, "discarding buffered changes after rollback");
        }
        self.pending.clear();
    }

    /// Number of buffered records.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
