//! Column classification
//!
//! Decides, by sampling a column's values in row order, whether it holds
//! plain scalars or objects that must be split out into a child table.

use crate::melt::table::Table;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shape of a table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Plain values (or lists of plain values); stays in the parent table
    Scalar,
    /// Objects or lists of objects; becomes its own child table
    ObjectList,
    /// Nothing to look at (no rows)
    Empty,
}

impl ColumnKind {
    pub fn is_nested(self) -> bool {
        matches!(self, ColumnKind::ObjectList)
    }
}

/// Classify `column` of `table`
///
/// The first piece of structural evidence wins:
/// - an object means `ObjectList`
/// - a non-empty list means `ObjectList` if its first element is an object,
///   otherwise `Scalar`
///
/// Nulls, scalars and empty lists are not evidence, so the scan moves on.
/// A heterogeneous column is therefore classified by whichever of its
/// earliest rows carries structure.
pub fn classify(table: &Table, column: &str) -> ColumnKind {
    if table.is_empty() {
        return ColumnKind::Empty;
    }
    let Some(values) = table.column(column) else {
        return ColumnKind::Empty;
    };

    for value in values {
        match value {
            Value::Object(_) => return ColumnKind::ObjectList,
            Value::Array(items) => match items.first() {
                Some(Value::Object(_)) => return ColumnKind::ObjectList,
                Some(_) => return ColumnKind::Scalar,
                None => {}
            },
            _ => {}
        }
    }

    ColumnKind::Scalar
}
