//! Primary-key shapes for change records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// The primary key of the row a change record describes.
///
/// Tables without a primary key are represented as [`PrimaryKey::None`];
/// the record then carries its full captured field snapshot instead so the
/// row can still be located.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimaryKey {
    /// The table has no primary key.
    None,
    /// A single-column key.
    Single {
        /// Key column name.
        name: String,
        /// Key value.
        value: Value,
    },
    /// A composite key; `names` and `values` are index-aligned.
    Composite {
        /// Key column names, in schema order.
        names: Vec<String>,
        /// Key values, matching `names` positionally.
        values: Vec<Value>,
    },
}

impl PrimaryKey {
    /// Create a single-column key.
    pub fn single(name: impl Into<String>, value: impl Into<Value>) -> Self {
        PrimaryKey::Single {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a composite key. Fails if the column and value counts differ.
    pub fn composite(names: Vec<String>, values: Vec<Value>) -> Result<Self, Error> {
        if names.len() != values.len() {
            return Err(Error::KeyShapeMismatch {
                names: names.len(),
                values: values.len(),
            });
        }
        Ok(PrimaryKey::Composite { names, values })
    }

    /// Whether any key is known.
    pub fn is_known(&self) -> bool {
        !matches!(self, PrimaryKey::None)
    }

    /// The wire shape of the key name: a string, an ordered list, or null.
    pub fn name_json(&self) -> Value {
        match self {
            PrimaryKey::None => Value::Null,
            PrimaryKey::Single { name, .. } => Value::String(name.clone()),
            PrimaryKey::Composite { names, .. } => {
                Value::Array(names.iter().cloned().map(Value::String).collect())
            }
        }
    }

    /// The wire shape of the key value: a scalar, an ordered list, or null.
    pub fn value_json(&self) -> Value {
        match self {
            PrimaryKey::None => Value::Null,
            PrimaryKey::Single { value, .. } => value.clone(),
            PrimaryKey::Composite { values, .. } => Value::Array(values.clone()),
        }
    }

    /// Rebuild a key from its wire name/value shapes.
    ///
    /// A null or unrecognized name yields [`PrimaryKey::None`]; a list name
    /// with a non-list or mismatched value is rejected.
    pub fn from_json(name: Value, value: Value) -> Result<Self, Error> {
        match name {
            Value::String(name) => Ok(PrimaryKey::Single { name, value }),
            Value::Array(names) => {
                let names: Vec<String> = names
                    .into_iter()
                    .filter_map(|n| n.as_str().map(str::to_owned))
                    .collect();
                let values = match value {
                    Value::Array(values) => values,
                    other => vec![other],
                };
                Self::composite(names, values)
            }
            _ => Ok(PrimaryKey::None),
        }
    }
}

impl Default for PrimaryKey {
    fn default() -> Self {
        PrimaryKey::None
    }
}
