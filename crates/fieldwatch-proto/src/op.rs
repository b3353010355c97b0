//! Mutation operation kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// The kind of mutation a change record describes.
///
/// On the wire each kind is a single-letter code (`"c"`, `"u"`, `"d"`),
/// matching the `operation` field of the external form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeOp {
    /// A new row was inserted.
    Create,
    /// An existing row was updated.
    Update,
    /// A row was deleted.
    Destroy,
}

impl ChangeOp {
    /// All operation kinds, in wire order.
    pub const ALL: [ChangeOp; 3] = [ChangeOp::Create, ChangeOp::Update, ChangeOp::Destroy];

    /// The single-letter wire code for this kind.
    pub fn code(self) -> char {
        match self {
            ChangeOp::Create => 'c',
            ChangeOp::Update => 'u',
            ChangeOp::Destroy => 'd',
        }
    }

    /// The full lowercase name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            ChangeOp::Create => "create",
            ChangeOp::Update => "update",
            ChangeOp::Destroy => "destroy",
        }
    }

    /// Parse a wire code.
    pub fn from_code(code: char) -> Result<Self, Error> {
        match code.to_ascii_lowercase() {
            'c' => Ok(ChangeOp::Create),
            'u' => Ok(ChangeOp::Update),
            'd' => Ok(ChangeOp::Destroy),
            other => Err(Error::UnknownOperation(other.to_string())),
        }
    }
}

impl FromStr for ChangeOp {
    type Err = Error;

    /// Accepts full names and single-letter codes, case-insensitively.
    /// Only the first letter is significant, so `"created"` parses the
    /// same as `"create"` or `"c"`.
    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().chars().next() {
            Some(first) => {
                Self::from_code(first).map_err(|_| Error::UnknownOperation(s.to_string()))
            }
            None => Err(Error::UnknownOperation(s.to_string())),
        }
    }
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ChangeOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.code())
    }
}

impl<'de> Deserialize<'de> for ChangeOp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
