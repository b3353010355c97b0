//! Field-interest specifications.
//!
//! A [`FieldSpec`] is the canonical form of "which tables and fields is
//! this watcher interested in". Declarations arrive as [`Interest`]
//! contributions and are normalized into one mapping from table name to
//! either "all fields" or a set of field names. Two degenerate specs exist:
//! the wildcard (interested in every field of every table) and the empty
//! spec (interested in nothing).

use std::collections::{BTreeMap, BTreeSet};

/// One contribution to a field spec.
///
/// This is the registration-time declaration surface: identifiers are
/// pre-normalized strings. A caller holding a model type resolves it to a
/// table name through its schema metadata before declaring interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interest {
    /// Every field of every table.
    Everything,
    /// Every field of one table.
    Table(String),
    /// Specific fields of one table.
    Fields {
        /// Table name.
        table: String,
        /// Field names.
        fields: Vec<String>,
    },
}

impl Interest {
    /// Interest in every field of a table.
    pub fn table(name: impl Into<String>) -> Self {
        Interest::Table(name.into())
    }

    /// Interest in specific fields of a table.
    pub fn fields<I, S>(table: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Interest::Fields {
            table: table.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// The fields of interest within one table.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldSet {
    /// Every field of the table.
    All,
    /// A specific set of field names.
    Named(BTreeSet<String>),
}

impl FieldSet {
    fn merge(&mut self, other: FieldSet) {
        match (&mut *self, other) {
            // "All fields" absorbs any narrower contribution.
            (FieldSet::All, _) => {}
            (slot, FieldSet::All) => *slot = FieldSet::All,
            (FieldSet::Named(mine), FieldSet::Named(theirs)) => mine.extend(theirs),
        }
    }
}

/// Canonical table-to-fields interest mapping.
///
/// - `None` map: interested in nothing.
/// - Empty map: the wildcard, interested in everything.
/// - Otherwise: per-table entries, each either all fields or a named set.
///
/// Specs are built once at watcher-registration time and immutable
/// afterwards. Table and field names are trimmed and lower-cased during
/// normalization so every comparison is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    map: Option<BTreeMap<String, FieldSet>>,
}

impl FieldSpec {
    /// The spec that matches nothing.
    pub fn nothing() -> Self {
        Self { map: None }
    }

    /// The wildcard spec that matches every field of every table.
    pub fn everything() -> Self {
        Self {
            map: Some(BTreeMap::new()),
        }
    }

    /// Interest in every field of one table.
    pub fn table(name: impl Into<String>) -> Self {
        Self::from_interests([Interest::Table(name.into())])
    }

    /// Interest in specific fields of one table.
    pub fn fields<I, S>(table: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_interests([Interest::fields(table, fields)])
    }

    /// Normalize a list of interest contributions into one spec.
    ///
    /// Contributions union: if any contribution claims all fields of a
    /// table, the merged entry is all fields; named field sets union.
    /// An empty list yields the nothing-spec. Blank identifiers contribute
    /// nothing; they are logged and skipped rather than failing the whole
    /// declaration.
    pub fn from_interests<I>(interests: I) -> Self
    where
        I: IntoIterator<Item = Interest>,
    {
        let mut interests = interests.into_iter().peekable();
        if interests.peek().is_none() {
            return Self::nothing();
        }

        let mut map = BTreeMap::new();
        let mut wildcard = false;

        for interest in interests {
            match interest {
                Interest::Everything => wildcard = true,
                Interest::Table(table) => {
                    merge_entry(&mut map, &table, FieldSet::All);
                }
                Interest::Fields { table, fields } => {
                    let named: BTreeSet<String> = fields
                        .iter()
                        .map(|f| canonical(f))
                        .filter(|f| !f.is_empty())
                        .collect();
                    merge_entry(&mut map, &table, FieldSet::Named(named));
                }
            }
        }

        if wildcard {
            // A wildcard contribution subsumes every table-level entry.
            return Self::everything();
        }
        if map.is_empty() {
            // Every contribution was malformed; treat as no interest.
            return Self::nothing();
        }
        Self { map: Some(map) }
    }

    /// Decompose back into interest contributions.
    ///
    /// Normalization is idempotent: rebuilding a spec from its own
    /// interests yields an equal spec.
    pub fn interests(&self) -> Vec<Interest> {
        match &self.map {
            None => vec![],
            Some(map) if map.is_empty() => vec![Interest::Everything],
            Some(map) => map
                .iter()
                .map(|(table, fields)| match fields {
                    FieldSet::All => Interest::Table(table.clone()),
                    FieldSet::Named(named) => Interest::Fields {
                        table: table.clone(),
                        fields: named.iter().cloned().collect(),
                    },
                })
                .collect(),
        }
    }

    /// Whether this is the wildcard spec.
    pub fn includes_everything(&self) -> bool {
        matches!(&self.map, Some(map) if map.is_empty())
    }

    /// Whether this spec matches nothing.
    pub fn excludes_everything(&self) -> bool {
        self.map.is_none()
    }

    /// Table names with explicit entries, in stable order.
    pub fn table_names(&self) -> Vec<&str> {
        match &self.map {
            None => vec![],
            Some(map) => map.keys().map(String::as_str).collect(),
        }
    }

    /// Whether any field of the given table is of interest.
    pub fn includes_table(&self, table: &str) -> bool {
        if self.includes_everything() {
            return true;
        }
        match &self.map {
            None => false,
            Some(map) => map.contains_key(&canonical(table)),
        }
    }

    /// Whether every field of the given table is of interest.
    pub fn includes_all_fields_of(&self, table: &str) -> bool {
        if self.includes_everything() {
            return true;
        }
        match &self.map {
            None => false,
            Some(map) => matches!(map.get(&canonical(table)), Some(FieldSet::All)),
        }
    }

    /// Whether a specific field of a table is of interest.
    pub fn includes_field(&self, table: &str, field: &str) -> bool {
        if self.includes_everything() {
            return true;
        }
        match self.entry(table) {
            None => false,
            Some(FieldSet::All) => true,
            Some(FieldSet::Named(fields)) => fields.contains(&canonical(field)),
        }
    }

    /// Whether this spec shares any interest with a concrete change:
    /// a table name plus the set of fields that changed.
    ///
    /// This is the watcher-matching path. The wildcard matches any change;
    /// the nothing-spec matches none. Otherwise the changed table must have
    /// an entry, and either that entry claims all fields or it intersects
    /// the changed set.
    pub fn overlaps<'a, I>(&self, table: &str, changed_fields: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        if self.excludes_everything() {
            return false;
        }
        if self.includes_everything() {
            return true;
        }
        match self.entry(table) {
            None => false,
            Some(FieldSet::All) => true,
            Some(FieldSet::Named(fields)) => changed_fields
                .into_iter()
                .any(|f| fields.contains(&canonical(f))),
        }
    }

    /// Whether two specs share any interest.
    pub fn overlaps_spec(&self, other: &FieldSpec) -> bool {
        if self.excludes_everything() || other.excludes_everything() {
            return false;
        }
        if self.includes_everything() || other.includes_everything() {
            return true;
        }
        let (mine, theirs) = match (&self.map, &other.map) {
            (Some(mine), Some(theirs)) => (mine, theirs),
            // Both degenerate cases were handled above.
            _ => return false,
        };
        mine.iter().any(|(table, fields)| {
            theirs
                .get(table)
                .is_some_and(|other_fields| match (fields, other_fields) {
                    (FieldSet::All, _) | (_, FieldSet::All) => true,
                    (FieldSet::Named(a), FieldSet::Named(b)) => !a.is_disjoint(b),
                })
        })
    }

    fn entry(&self, table: &str) -> Option<&FieldSet> {
        self.map.as_ref()?.get(&canonical(table))
    }
}

impl FromIterator<Interest> for FieldSpec {
    fn from_iter<I: IntoIterator<Item = Interest>>(iter: I) -> Self {
        Self::from_interests(iter)
    }
}

fn merge_entry(map: &mut BTreeMap<String, FieldSet>, table: &str, fields: FieldSet) {
    let table = canonical(table);
    if table.is_empty() {
        tracing::warn!("ignoring interest declaration with blank table name");
        return;
    }
    match map.entry(table) {
        std::collections::btree_map::Entry::Occupied(mut entry) => entry.get_mut().merge(fields),
        std::collections::btree_map::Entry::Vacant(entry) => {
            entry.insert(fields);
        }
    }
}

fn canonical(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_excludes_everything() {
        let spec = FieldSpec::nothing();
        assert!(spec.excludes_everything());
        assert!(!spec.includes_everything());
        assert!(!spec.includes_table("users"));
        assert!(!spec.includes_field("users", "name"));
    }

    #[test]
    fn test_empty_interests_exclude_everything() {
        let spec = FieldSpec::from_interests([]);
        assert!(spec.excludes_everything());
    }

    #[test]
    fn test_wildcard_includes_everything() {
        let spec = FieldSpec::everything();
        assert!(spec.includes_everything());
        assert!(spec.includes_table("anything"));
        assert!(spec.includes_all_fields_of("anything"));
        assert!(spec.includes_field("anything", "any_field"));
    }

    #[test]
    fn test_wildcard_contribution_in_list() {
        let spec = FieldSpec::from_interests([
            Interest::fields("users", ["name"]),
            Interest::Everything,
        ]);
        assert!(spec.includes_everything());
    }

    #[test]
    fn test_table_interest_covers_all_fields() {
        let spec = FieldSpec::table("test_models");
        assert!(spec.includes_table("test_models"));
        assert!(spec.includes_all_fields_of("test_models"));
        assert!(spec.includes_field("test_models", "anything"));
        assert!(!spec.includes_table("other"));
    }

    #[test]
    fn test_field_interest() {
        let spec = FieldSpec::fields("test_models", ["name", "description"]);
        assert!(spec.includes_table("test_models"));
        assert!(!spec.includes_all_fields_of("test_models"));
        assert!(spec.includes_field("test_models", "name"));
        assert!(!spec.includes_field("test_models", "age"));
    }

    #[test]
    fn test_names_are_canonicalized() {
        let spec = FieldSpec::fields(" Test_Models ", ["  Name "]);
        assert!(spec.includes_field("test_models", "name"));
        assert!(spec.includes_field("TEST_MODELS", "NAME"));
        assert_eq!(spec.table_names(), vec!["test_models"]);
    }

    #[test]
    fn test_union_law() {
        let joined = FieldSpec::from_interests([
            Interest::fields("t", ["a"]),
            Interest::fields("t", ["b"]),
        ]);
        let direct = FieldSpec::fields("t", ["a", "b"]);
        assert_eq!(joined, direct);
    }

    #[test]
    fn test_all_fields_absorbs_named() {
        let spec = FieldSpec::from_interests([
            Interest::fields("t", ["a"]),
            Interest::table("t"),
            Interest::fields("t", ["b"]),
        ]);
        assert!(spec.includes_all_fields_of("t"));
    }

    #[test]
    fn test_blank_identifiers_ignored() {
        let spec = FieldSpec::from_interests([
            Interest::table("   "),
            Interest::fields("users", ["name", ""]),
        ]);
        assert_eq!(spec.table_names(), vec!["users"]);
        assert!(spec.includes_field("users", "name"));
        assert!(!spec.includes_field("users", ""));
    }

    #[test]
    fn test_only_blank_identifiers_mean_nothing() {
        let spec = FieldSpec::from_interests([Interest::table("  ")]);
        assert!(spec.excludes_everything());
    }

    #[test]
    fn test_normalization_idempotent() {
        for spec in [
            FieldSpec::nothing(),
            FieldSpec::everything(),
            FieldSpec::table("users"),
            FieldSpec::from_interests([
                Interest::fields("t", ["a", "b"]),
                Interest::table("orders"),
            ]),
        ] {
            assert_eq!(FieldSpec::from_interests(spec.interests()), spec);
        }
    }

    #[test]
    fn test_overlap_with_changed_fields() {
        let spec = FieldSpec::fields("t", ["a", "b"]);
        assert!(spec.overlaps("t", ["b", "c"]));
        assert!(!spec.overlaps("t", ["c", "d"]));
        assert!(!spec.overlaps("other", ["a"]));
    }

    #[test]
    fn test_overlap_degenerate_specs() {
        assert!(!FieldSpec::nothing().overlaps("t", ["a"]));
        assert!(FieldSpec::everything().overlaps("t", ["a"]));
        // Table-level interest matches even an empty change set.
        assert!(FieldSpec::table("t").overlaps("t", []));
        // Field-level interest does not.
        assert!(!FieldSpec::fields("t", ["a"]).overlaps("t", []));
    }

    #[test]
    fn test_overlaps_spec() {
        let a = FieldSpec::fields("t", ["a", "b"]);
        let b = FieldSpec::fields("t", ["b", "c"]);
        let c = FieldSpec::fields("t", ["c", "d"]);
        let table_wide = FieldSpec::table("t");

        assert!(a.overlaps_spec(&b));
        assert!(!a.overlaps_spec(&c));
        assert!(a.overlaps_spec(&table_wide));
        assert!(table_wide.overlaps_spec(&c));

        assert!(FieldSpec::everything().overlaps_spec(&a));
        assert!(!FieldSpec::everything().overlaps_spec(&FieldSpec::nothing()));
        assert!(!FieldSpec::nothing().overlaps_spec(&FieldSpec::everything()));
    }
}
