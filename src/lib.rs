//! # json2tables - JSON to relational tables
//!
//! Decomposes semi-structured JSON documents into flat tables, one per
//! nesting context, linked by synthetic foreign key columns.
//!
//! ## Modules
//!
//! - **melt**: flattening, decomposition, merging and table writers
//! - **source**: reading documents from folders, files and NDJSON
//!
//! ## Quick Start
//!
//! ```rust
//! use json2tables::melt::{BatchMelter, MeltConfig};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let data = json!({
//!     "id": 7,
//!     "name": "root",
//!     "orders": [
//!         {"sku": "X1", "qty": 2},
//!         {"sku": "X2", "qty": 1}
//!     ]
//! });
//!
//! let melter = BatchMelter::new(MeltConfig::default().with_id_columns(["id"]))?;
//! let tables = melter.melt_value(data)?;
//!
//! // tables["json"]   = id, name
//! // tables["orders"] = json.id, sku, qty
//! assert_eq!(tables.get("orders").unwrap().len(), 2);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::path::Path;

pub mod melt;
pub mod source;

// Re-export commonly used types for convenience
pub use melt::{
    BatchMelter, ColumnKind, CsvTableWriter, Document, ErrorPolicy, JsonlTableWriter, MeltConfig,
    MeltError, MeltOutput, Table, TableRegistry,
};

/// Melt every `*.json` file in `folder`, one document per file
pub fn melt_json_folder<P: AsRef<Path>>(folder: P, config: MeltConfig) -> Result<MeltOutput> {
    let files = source::json_files_in(&folder)?;
    melt_json_files(files, config)
}

/// Melt the given JSON files, one document per file
pub fn melt_json_files<I, P>(files: I, config: MeltConfig) -> Result<MeltOutput>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let melter = BatchMelter::new(config)?;
    melter
        .run(source::read_documents(files))
        .context("Failed to melt JSON files")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_melt_json_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("one.json"),
            r#"{"heron_id": "h1", "opps": [{"oppID": 1, "lines": [{"amt": 5}]}]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("two.json"),
            r#"{"heron_id": "h2", "opps": [{"oppID": 2, "lines": [{"amt": 6}, {"amt": 7}]}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("three.json"), "{ truncated").unwrap();

        let output = melt_json_folder(dir.path(), MeltConfig::default()).unwrap();

        assert_eq!(output.report.processed, 2);
        assert_eq!(output.report.skipped_count(), 1);
        assert_eq!(output.tables.names().collect::<Vec<_>>(), ["json", "opps", "lines"]);

        let opps = output.tables.get("opps").unwrap();
        assert_eq!(opps.columns(), ["json.heron_id", "oppID"]);

        let lines = output.tables.get("lines").unwrap();
        assert_eq!(lines.columns(), ["opps.oppID", "amt"]);
        let parents: Vec<&serde_json::Value> = lines.column("opps.oppID").unwrap().collect();
        assert_eq!(parents, [&json!(1), &json!(2), &json!(2)]);
    }
}
