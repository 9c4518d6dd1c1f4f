use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One input document together with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// File name or similar; only used in diagnostics
    pub source: Option<String>,

    pub value: Value,
}

impl Document {
    pub fn new(value: Value) -> Self {
        Document { source: None, value }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn source_name(&self) -> &str {
        self.source.as_deref().unwrap_or("<memory>")
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Document::new(value)
    }
}

/// A document the batch could not melt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub source: String,
    pub reason: String,
}

/// Counts for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Documents merged into the registry
    pub processed: usize,

    pub skipped: Vec<SkippedDocument>,
}

impl BatchReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}
