//! JSON melting - decompose nested JSON into linked flat tables
//!
//! A document is flattened into one table with dotted column names. Columns
//! holding objects or lists of objects are split out into child tables,
//! named after the column, whose rows carry a foreign key back to the parent
//! row. Tables with the same name are merged, within a document and across
//! a batch.
//!
//! The pipeline, leaves first:
//!
//! - [`classify`]: scalar vs. object-list column detection
//! - [`flatten`]: document to flat table
//! - [`decompose`]: recursive split into child tables
//! - [`registry`]: name to table accumulation and merging
//! - [`batch`]: per-document orchestration with error isolation

pub mod batch;
pub mod classify;
pub mod config;
pub mod decompose;
pub mod error;
pub mod flatten;
pub mod registry;
pub mod table;
pub mod types;
pub mod writer;

pub use batch::{BatchMelter, MeltOutput};
pub use classify::{classify, ColumnKind};
pub use config::{ErrorPolicy, MeltConfig};
pub use decompose::decompose;
pub use error::{MeltError, MeltResult};
pub use flatten::flatten;
pub use registry::{merge, TableRegistry, TableSummary};
pub use table::Table;
pub use types::{BatchReport, Document, SkippedDocument};
pub use writer::{CsvTableWriter, JsonlTableWriter};
