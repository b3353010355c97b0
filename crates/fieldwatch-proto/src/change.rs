//! The change record: an immutable description of one committed mutation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::key::PrimaryKey;
use crate::op::ChangeOp;

/// The old and new value of a single changed field.
///
/// Serializes as the two-element array `[old, new]`, with `null` standing
/// in for the absent side (old on creates, new on destroys).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Value, Value)", into = "(Value, Value)")]
pub struct FieldDelta {
    /// Value before the mutation.
    pub old: Value,
    /// Value after the mutation.
    pub new: Value,
}

impl FieldDelta {
    /// Create a delta from old/new values.
    pub fn new(old: impl Into<Value>, new: impl Into<Value>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

impl From<(Value, Value)> for FieldDelta {
    fn from((old, new): (Value, Value)) -> Self {
        Self { old, new }
    }
}

impl From<FieldDelta> for (Value, Value) {
    fn from(delta: FieldDelta) -> Self {
        (delta.old, delta.new)
    }
}

/// An immutable description of one committed mutation: which table, which
/// operation, which row, and a per-field old/new diff.
///
/// Records are built once by the capture collaborator (or deserialized from
/// a consumed payload), handed to the registry, and never mutated. Only
/// fields whose value actually changed appear in the diff; a table without
/// a primary key carries its full captured field snapshot instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    database: Option<String>,
    table: String,
    op: ChangeOp,
    key: PrimaryKey,
    changes: BTreeMap<String, FieldDelta>,
    all_fields: Option<BTreeMap<String, Value>>,
}

impl ChangeRecord {
    /// Create a record for a table and operation. Table names are trimmed
    /// and lower-cased so matching is case-insensitive.
    pub fn new(table: impl AsRef<str>, op: ChangeOp) -> Self {
        Self {
            database: None,
            table: canonical_name(table.as_ref()),
            op,
            key: PrimaryKey::None,
            changes: BTreeMap::new(),
            all_fields: None,
        }
    }

    /// Set the source database name.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the primary key.
    pub fn with_key(mut self, key: PrimaryKey) -> Self {
        self.key = key;
        self
    }

    /// Set the field diff, replacing any previous one. Field names are
    /// canonicalized like table names.
    pub fn with_changes(mut self, changes: BTreeMap<String, FieldDelta>) -> Self {
        self.changes = changes
            .into_iter()
            .map(|(field, delta)| (canonical_name(&field), delta))
            .collect();
        self
    }

    /// Add one field diff.
    pub fn with_change(
        mut self,
        field: impl AsRef<str>,
        old: impl Into<Value>,
        new: impl Into<Value>,
    ) -> Self {
        self.changes
            .insert(canonical_name(field.as_ref()), FieldDelta::new(old, new));
        self
    }

    /// Retain the full captured field snapshot (keyless tables).
    pub fn with_all_fields(mut self, all_fields: BTreeMap<String, Value>) -> Self {
        self.all_fields = Some(all_fields);
        self
    }

    /// Source database name, when known.
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Table the mutation happened on.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The kind of mutation.
    pub fn op(&self) -> ChangeOp {
        self.op
    }

    /// Primary key of the mutated row.
    pub fn key(&self) -> &PrimaryKey {
        &self.key
    }

    /// The per-field diff.
    pub fn changes(&self) -> &BTreeMap<String, FieldDelta> {
        &self.changes
    }

    /// Full captured snapshot, present only for keyless tables.
    pub fn all_fields(&self) -> Option<&BTreeMap<String, Value>> {
        self.all_fields.as_ref()
    }

    /// Whether the given field changed in this mutation.
    pub fn field_changed(&self, field: &str) -> bool {
        self.changes.contains_key(&canonical_name(field))
    }

    /// The names of every changed field, in stable order.
    pub fn changed_fields(&self) -> BTreeSet<&str> {
        self.changes.keys().map(String::as_str).collect()
    }

    /// The value a field held before the mutation, if the field changed.
    pub fn old_value(&self, field: &str) -> Option<&Value> {
        self.changes.get(&canonical_name(field)).map(|d| &d.old)
    }

    /// The value a field holds after the mutation, if the field changed.
    pub fn new_value(&self, field: &str) -> Option<&Value> {
        self.changes.get(&canonical_name(field)).map(|d| &d.new)
    }

    /// Flatten into the wire-level form handed to the emission
    /// collaborator. `all_fields` is included only when no primary key is
    /// known.
    pub fn to_external_form(&self, publisher: &str) -> ExternalChange {
        ExternalChange {
            database: self.database.clone(),
            table: self.table.clone(),
            primary_key_name: self.key.name_json(),
            primary_key_value: self.key.value_json(),
            operation: self.op,
            changes: self.changes.clone(),
            publisher: publisher.to_string(),
            all_fields: if self.key.is_known() {
                None
            } else {
                self.all_fields.clone()
            },
        }
    }

    /// Rebuild a record from a consumed external payload.
    pub fn from_external(external: ExternalChange) -> Result<Self, Error> {
        let key = PrimaryKey::from_json(external.primary_key_name, external.primary_key_value)?;
        let mut record = ChangeRecord::new(external.table, external.operation)
            .with_key(key)
            .with_changes(external.changes);
        record.database = external.database;
        record.all_fields = external.all_fields;
        Ok(record)
    }
}

/// The wire-level representation of a change record.
///
/// Field names are stable; this is the last in-process stop before any
/// off-process transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalChange {
    /// Source database name, or null.
    pub database: Option<String>,
    /// Table name.
    pub table: String,
    /// Key column name: string, ordered list, or null.
    pub primary_key_name: Value,
    /// Key value: scalar, ordered list, or null.
    pub primary_key_value: Value,
    /// Operation code (`"c"`, `"u"`, `"d"`).
    pub operation: ChangeOp,
    /// Field diffs as `field -> [old, new]`.
    pub changes: BTreeMap<String, FieldDelta>,
    /// Publisher identifier.
    pub publisher: String,
    /// Full captured snapshot; only present when no primary key exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_fields: Option<BTreeMap<String, Value>>,
}

/// Trim and lower-case an identifier.
pub(crate) fn canonical_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update_record() -> ChangeRecord {
        ChangeRecord::new("test_models", ChangeOp::Update)
            .with_key(PrimaryKey::single("id", 123))
            .with_change("name", "Old Name", "New Name")
            .with_change("description", "Old Description", "New Description")
    }

    #[test]
    fn test_field_lookups() {
        let record = update_record();
        assert!(record.field_changed("name"));
        assert!(record.field_changed("NAME"));
        assert!(!record.field_changed("other_field"));

        assert_eq!(record.old_value("name"), Some(&json!("Old Name")));
        assert_eq!(record.new_value("name"), Some(&json!("New Name")));
        assert_eq!(record.old_value("missing"), None);
        assert_eq!(record.new_value("missing"), None);
    }

    #[test]
    fn test_changed_fields_ordered() {
        let record = update_record();
        let fields: Vec<&str> = record.changed_fields().into_iter().collect();
        assert_eq!(fields, vec!["description", "name"]);
    }

    #[test]
    fn test_table_name_canonicalized() {
        let record = ChangeRecord::new("  Orders ", ChangeOp::Create);
        assert_eq!(record.table(), "orders");
    }

    #[test]
    fn test_external_form_with_key() {
        let external = update_record().to_external_form("fieldwatch");
        assert_eq!(external.table, "test_models");
        assert_eq!(external.operation, ChangeOp::Update);
        assert_eq!(external.primary_key_name, json!("id"));
        assert_eq!(external.primary_key_value, json!(123));
        assert_eq!(external.publisher, "fieldwatch");
        assert!(external.all_fields.is_none());

        let wire = serde_json::to_value(&external).unwrap();
        assert_eq!(wire["operation"], json!("u"));
        assert_eq!(wire["changes"]["name"], json!(["Old Name", "New Name"]));
        assert!(wire.get("all_fields").is_none());
    }

    #[test]
    fn test_external_form_keyless_includes_snapshot() {
        let mut snapshot = BTreeMap::new();
        snapshot.insert("name".to_string(), json!("A"));
        snapshot.insert("age".to_string(), json!(1));

        let record = ChangeRecord::new("legacy", ChangeOp::Destroy)
            .with_change("name", "A", Value::Null)
            .with_all_fields(snapshot.clone());

        let external = record.to_external_form("fieldwatch");
        assert_eq!(external.primary_key_name, Value::Null);
        assert_eq!(external.all_fields, Some(snapshot));
    }

    #[test]
    fn test_external_roundtrip() {
        let record = update_record().with_database("app_production");
        let external = record.to_external_form("fieldwatch");

        let json = serde_json::to_string(&external).unwrap();
        let parsed: ExternalChange = serde_json::from_str(&json).unwrap();
        let back = ChangeRecord::from_external(parsed).unwrap();

        assert_eq!(back, record);
    }

    #[test]
    fn test_delta_serializes_as_pair() {
        let delta = FieldDelta::new(1, 2);
        assert_eq!(serde_json::to_value(&delta).unwrap(), json!([1, 2]));
        let back: FieldDelta = serde_json::from_value(json!([1, 2])).unwrap();
        assert_eq!(back, delta);
    }
}
