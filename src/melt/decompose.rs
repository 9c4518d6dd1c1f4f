//! Recursive table decomposition
//!
//! A flat table may still hold columns of objects or lists of objects. Each
//! such column is pulled out into a child table named after the column,
//! linked back to its parent rows by a foreign key column, and decomposed in
//! turn. Every call returns its own registry; callers merge what their
//! children return.

use crate::melt::classify::classify;
use crate::melt::config::MeltConfig;
use crate::melt::error::{MeltError, MeltResult};
use crate::melt::flatten::flatten;
use crate::melt::registry::TableRegistry;
use crate::melt::table::Table;
use serde_json::Value;
use tracing::{debug, warn};

/// Split `table` into its scalar part (registered under `context`) and one
/// child table per nested column, recursively
pub fn decompose(table: Table, context: &str, config: &MeltConfig) -> MeltResult<TableRegistry> {
    let (nested_columns, scalar_columns): (Vec<String>, Vec<String>) = table
        .columns()
        .iter()
        .cloned()
        .partition(|column| classify(&table, column).is_nested());

    let mut registry = TableRegistry::new();

    let scalar_table = table.select(&scalar_columns);
    debug!(
        context,
        rows = scalar_table.len(),
        columns = scalar_table.width(),
        nested = nested_columns.len(),
        "registering table"
    );
    registry.insert(context, scalar_table);

    if nested_columns.is_empty() {
        return Ok(registry);
    }

    let id_column = config.id_column(&scalar_columns);

    for column in &nested_columns {
        let Some(children) = child_table(&table, column, context, id_column, config) else {
            debug!(context, column = column.as_str(), "no child rows");
            continue;
        };

        if id_column.is_none() {
            if config.require_links {
                return Err(MeltError::UnlinkedChildren {
                    context: context.to_string(),
                    column: column.clone(),
                });
            }
            warn!(
                context,
                column = column.as_str(),
                "no identifier column in parent; child rows are unlinked"
            );
        }

        registry.extend(decompose(children, column, config)?);
    }

    Ok(registry)
}

/// Flatten every non-empty value of `column` and stack the results
///
/// Returns `None` when no row contributed anything.
fn child_table(
    table: &Table,
    column: &str,
    context: &str,
    id_column: Option<&str>,
    config: &MeltConfig,
) -> Option<Table> {
    let idx = table.column_index(column)?;
    let link = id_column.and_then(|id| {
        table
            .column_index(id)
            .map(|id_idx| (config.foreign_key(context, id), id_idx))
    });

    let mut combined: Option<Table> = None;
    for row in table.rows() {
        let value = &row[idx];
        if is_blank(value) {
            continue;
        }

        let mut sub = flatten(value, &config.separator, config.max_depth);
        if sub.is_empty() || sub.width() == 0 {
            continue;
        }
        if let Some((fk_name, id_idx)) = &link {
            sub = sub.with_leading_column(fk_name.clone(), &row[*id_idx]);
        }

        match combined.as_mut() {
            Some(acc) => acc.append(sub),
            None => combined = Some(sub),
        }
    }

    combined
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(obj) => obj.is_empty(),
        _ => false,
    }
}
