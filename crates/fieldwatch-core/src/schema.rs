//! Schema-metadata boundary.
//!
//! The routing engine does not own a schema. The capture collaborator
//! supplies one through [`Entity`] (enough metadata to describe a live
//! object as a change record) and, optionally, [`RecordStore`] (enough
//! lookup capability to resolve a record back to the current row).

use std::collections::BTreeMap;

use serde_json::Value;

use fieldwatch_proto::{ChangeOp, ChangeRecord, FieldDelta, PrimaryKey};

/// A row as a plain field-to-value mapping.
pub type Row = BTreeMap<String, Value>;

/// Schema metadata for one live, database-backed object.
///
/// Implemented by whatever the host application's persistence layer hands
/// to the capture path.
pub trait Entity {
    /// The table backing this object.
    fn table(&self) -> &str;

    /// The database the table lives in, when known.
    fn database(&self) -> Option<&str> {
        None
    }

    /// Primary key column names, in schema order. Empty means the table
    /// has no primary key.
    fn primary_key_columns(&self) -> Vec<String> {
        vec!["id".to_string()]
    }

    /// The object's current attributes.
    fn attributes(&self) -> Row;
}

/// Best-effort lookup of live rows, used by [`resolve_record`].
pub trait RecordStore {
    /// Find a row by primary key. A miss is `None`.
    fn find_by_key(&self, table: &str, key: &PrimaryKey) -> Option<Row>;

    /// Find a row matching every given field value. A miss is `None`.
    fn find_by_fields(&self, table: &str, fields: &Row) -> Option<Row>;
}

/// Describe a mutation of a live object as a change record.
///
/// Database, table, and primary key are inferred from the entity's schema
/// metadata. Single and composite keys are read out of the attribute
/// snapshot; a table without a primary key retains the full snapshot
/// instead so the row stays identifiable.
pub fn record_from_entity(
    entity: &impl Entity,
    op: ChangeOp,
    changes: BTreeMap<String, FieldDelta>,
) -> ChangeRecord {
    let attributes = entity.attributes();
    let mut record = ChangeRecord::new(entity.table(), op).with_changes(changes);
    if let Some(database) = entity.database() {
        record = record.with_database(database);
    }

    let mut columns = entity.primary_key_columns();
    match columns.len() {
        0 => record.with_all_fields(attributes),
        1 => {
            let name = columns.remove(0);
            let value = attributes.get(&name).cloned().unwrap_or(Value::Null);
            record.with_key(PrimaryKey::single(name, value))
        }
        _ => {
            let values = columns
                .iter()
                .map(|c| attributes.get(c).cloned().unwrap_or(Value::Null))
                .collect();
            // Counts match by construction, one value per column.
            match PrimaryKey::composite(columns, values) {
                Ok(key) => record.with_key(key),
                Err(_) => record.with_all_fields(attributes),
            }
        }
    }
}

/// Best-effort lookup of the live row a change record describes.
///
/// Looks up by primary key when one is known, otherwise by matching the
/// full captured field snapshot. A record with neither resolves to `None`,
/// as does any store miss; resolution never fails.
pub fn resolve_record(record: &ChangeRecord, store: &impl RecordStore) -> Option<Row> {
    if record.key().is_known() {
        return store.find_by_key(record.table(), record.key());
    }
    let snapshot = record.all_fields()?;
    store.find_by_fields(record.table(), snapshot)
}
