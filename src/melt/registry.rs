//! Accumulated tables keyed by context name
//!
//! Tables registered under a name that is already present are merged, never
//! replaced. This is what folds same-named nested arrays from different
//! branches, and from different documents, into a single output table.

use crate::melt::table::Table;
use serde::Serialize;
use std::fmt;

/// Merge `new` into `existing`
///
/// Rows of `existing` come first. Columns are the outer union; cells a table
/// lacks are null.
pub fn merge(existing: Option<Table>, new: Table) -> Table {
    match existing {
        None => new,
        Some(mut table) => {
            table.append(new);
            table
        }
    }
}

/// Mapping from context name to table, in first-registration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRegistry {
    tables: Vec<(String, Table)>,
}

impl TableRegistry {
    pub fn new() -> Self {
        TableRegistry::default()
    }

    /// Register `table` under `name`, merging with any existing entry
    pub fn insert(&mut self, name: impl Into<String>, table: Table) {
        let name = name.into();
        match self.tables.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => {
                let existing = std::mem::take(slot);
                *slot = merge(Some(existing), table);
            }
            None => self.tables.push((name, table)),
        }
    }

    /// Merge every entry of `other`, in its order
    pub fn extend(&mut self, other: TableRegistry) {
        for (name, table) in other {
            self.insert(name, table);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.tables.iter().map(|(n, t)| (n.as_str(), t))
    }

    /// Shape of every table
    pub fn summary(&self) -> Vec<TableSummary> {
        self.iter()
            .map(|(name, table)| TableSummary {
                name: name.to_string(),
                rows: table.len(),
                columns: table.width(),
            })
            .collect()
    }
}

impl IntoIterator for TableRegistry {
    type Item = (String, Table);
    type IntoIter = std::vec::IntoIter<(String, Table)>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_iter()
    }
}

/// Name and shape of one registered table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.rows, self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn table(values: Vec<Value>) -> Table {
        Table::from_records(values.into_iter().map(|v| match v {
            Value::Object(map) => map,
            _ => Map::new(),
        }))
    }

    #[test]
    fn test_merge_without_existing() {
        let new = table(vec![json!({"a": 1})]);
        assert_eq!(merge(None, new.clone()), new);
    }

    #[test]
    fn test_merge_self_twice_doubles_rows() {
        let base = table(vec![json!({"a": 1, "b": "x"}), json!({"a": 2})]);

        let once = merge(Some(base.clone()), base.clone());
        let twice = merge(Some(once), base.clone());

        assert_eq!(twice.len(), base.len() * 3);
        assert_eq!(twice.columns(), base.columns());

        let doubled = merge(Some(base.clone()), base.clone());
        assert_eq!(doubled.len(), base.len() * 2);
        assert_eq!(doubled.columns(), base.columns());
    }

    #[test]
    fn test_merge_preserves_row_order_and_fills_gaps() {
        let merged = merge(
            Some(table(vec![json!({"a": 1})])),
            table(vec![json!({"b": 2})]),
        );

        assert_eq!(merged.columns(), ["a", "b"]);
        assert_eq!(merged.value(0, "a"), Some(&json!(1)));
        assert_eq!(merged.value(0, "b"), Some(&Value::Null));
        assert_eq!(merged.value(1, "a"), Some(&Value::Null));
        assert_eq!(merged.value(1, "b"), Some(&json!(2)));
    }

    #[test]
    fn test_insert_appends_under_same_name() {
        let mut registry = TableRegistry::new();
        registry.insert("items", table(vec![json!({"sku": "A"})]));
        registry.insert("other", table(vec![json!({"x": 1})]));
        registry.insert("items", table(vec![json!({"sku": "B"})]));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), ["items", "other"]);
        assert_eq!(registry.get("items").unwrap().len(), 2);
    }

    #[test]
    fn test_extend_and_summary() {
        let mut left = TableRegistry::new();
        left.insert("json", table(vec![json!({"id": 1})]));

        let mut right = TableRegistry::new();
        right.insert("json", table(vec![json!({"id": 2, "name": "b"})]));
        right.insert("orders", table(vec![json!({"sku": "A"})]));

        left.extend(right);

        let summary = left.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].to_string(), "json (2, 2)");
        assert_eq!(summary[1].to_string(), "orders (1, 1)");
        assert!(left.contains("orders"));
        assert!(!left.contains("items"));
    }
}
