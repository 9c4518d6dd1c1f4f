//! Batch orchestration
//!
//! Melts documents one at a time into a fresh registry each, then folds the
//! per-document registries into the batch registry in input order. A
//! document that fails leaves the batch registry untouched.

use crate::melt::config::{ErrorPolicy, MeltConfig};
use crate::melt::decompose::decompose;
use crate::melt::error::{MeltError, MeltResult};
use crate::melt::flatten::flatten;
use crate::melt::registry::TableRegistry;
use crate::melt::types::{BatchReport, Document, SkippedDocument};
use serde_json::Value;
use tracing::{info, warn};

/// Final tables of a batch, plus what happened along the way
#[derive(Debug, Clone, Default)]
pub struct MeltOutput {
    pub tables: TableRegistry,
    pub report: BatchReport,
}

/// Drives flattening and decomposition over a stream of documents
pub struct BatchMelter {
    config: MeltConfig,
}

impl BatchMelter {
    pub fn new(config: MeltConfig) -> MeltResult<Self> {
        config.validate()?;
        Ok(BatchMelter { config })
    }

    pub fn config(&self) -> &MeltConfig {
        &self.config
    }

    /// Melt one document into its own registry
    pub fn melt_document(&self, document: &Document) -> MeltResult<TableRegistry> {
        let table = flatten(&document.value, &self.config.separator, self.config.max_depth);
        decompose(table, &self.config.root_context, &self.config)
    }

    pub fn melt_value(&self, value: Value) -> MeltResult<TableRegistry> {
        self.melt_document(&Document::new(value))
    }

    /// Melt JSON text as a single document
    pub fn melt_str(&self, json: &str) -> MeltResult<TableRegistry> {
        let document = crate::source::parse_document(None, json.as_bytes().to_vec())?;
        self.melt_document(&document)
    }

    /// Melt in-memory values as one batch
    ///
    /// Values skipped under `ErrorPolicy::Skip` are listed in the report.
    pub fn melt_values<I>(&self, values: I) -> MeltResult<MeltOutput>
    where
        I: IntoIterator<Item = Value>,
    {
        self.run(values.into_iter().map(|v| Ok(Document::new(v))))
    }

    /// Melt a whole batch
    ///
    /// Items that are already errors (unreadable or malformed input) go
    /// through the same error policy as documents that fail to melt.
    pub fn run<I>(&self, documents: I) -> MeltResult<MeltOutput>
    where
        I: IntoIterator<Item = MeltResult<Document>>,
    {
        let mut output = MeltOutput::default();

        for item in documents {
            let (source, result) = match item {
                Ok(document) => (
                    document.source_name().to_string(),
                    self.melt_document(&document),
                ),
                Err(err) => (err.origin().unwrap_or_else(|| "<unknown>".to_string()), Err(err)),
            };

            match result {
                Ok(registry) => {
                    output.tables.extend(registry);
                    output.report.processed += 1;
                }
                Err(err) => self.handle_failure(&mut output.report, source, err)?,
            }
        }

        info!(
            processed = output.report.processed,
            skipped = output.report.skipped_count(),
            tables = output.tables.len(),
            "batch complete"
        );
        Ok(output)
    }

    fn handle_failure(&self, report: &mut BatchReport, source: String, err: MeltError) -> MeltResult<()> {
        match self.config.on_error {
            ErrorPolicy::Abort => Err(err),
            ErrorPolicy::Skip => {
                warn!(source = source.as_str(), error = %err, "skipping document");
                report.skipped.push(SkippedDocument {
                    source,
                    reason: err.to_string(),
                });
                Ok(())
            }
        }
    }
}
