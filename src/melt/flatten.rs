//! Document flattening
//!
//! Turns a JSON document (or a sequence of them) into one flat table. Nested
//! object keys are joined into dotted column names; lists are kept as
//! embedded values for the decomposer to split out later.

use crate::melt::table::Table;
use serde_json::{Map, Value};

/// Column used for non-object elements (scalars, nested lists)
pub const VALUE_COLUMN: &str = "value";

/// Flatten `value` into a table
///
/// - an object becomes one row
/// - a list becomes one row per element, in order; `null` elements are dropped
/// - anything else becomes a single row in the `value` column
/// - `null` becomes an empty table
///
/// `max_depth` bounds how many object levels are merged into dotted names;
/// deeper objects stay embedded. `None` flattens everything.
pub fn flatten(value: &Value, separator: &str, max_depth: Option<usize>) -> Table {
    let records: Vec<Map<String, Value>> = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| flatten_record(item, separator, max_depth))
            .collect(),
        other => flatten_record(other, separator, max_depth).into_iter().collect(),
    };

    Table::from_records(records)
}

fn flatten_record(value: &Value, separator: &str, max_depth: Option<usize>) -> Option<Map<String, Value>> {
    let mut record = Map::new();
    match value {
        Value::Null => return None,
        Value::Object(obj) => flatten_object(&mut record, None, obj, separator, max_depth, 0),
        other => {
            record.insert(VALUE_COLUMN.to_string(), other.clone());
        }
    }
    Some(record)
}

fn flatten_object(
    record: &mut Map<String, Value>,
    prefix: Option<&str>,
    obj: &Map<String, Value>,
    separator: &str,
    max_depth: Option<usize>,
    depth: usize,
) {
    for (key, value) in obj {
        let name = match prefix {
            Some(prefix) => format!("{prefix}{separator}{key}"),
            None => key.clone(),
        };

        match value {
            Value::Object(inner) if max_depth.map_or(true, |max| depth < max) => {
                flatten_object(record, Some(&name), inner, separator, max_depth, depth + 1);
            }
            _ => {
                let name = unique_name(name, |n| record.contains_key(n));
                record.insert(name, value.clone());
            }
        }
    }
}

/// Return `name`, or `name` suffixed with the smallest free integer
pub(crate) fn unique_name<F>(name: String, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    if !taken(&name) {
        return name;
    }
    let mut n = 1usize;
    while taken(&format!("{name}{n}")) {
        n += 1;
    }
    format!("{name}{n}")
}
