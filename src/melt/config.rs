use crate::melt::error::{MeltError, MeltResult};
use serde::{Deserialize, Serialize};

/// Identifier columns tried, in order, when linking child rows to a parent
pub const DEFAULT_ID_COLUMNS: [&str; 2] = ["heron_id", "oppID"];

/// Context name of the top-level table
pub const DEFAULT_ROOT_CONTEXT: &str = "json";

pub const DEFAULT_SEPARATOR: &str = ".";

/// What to do when one document of a batch fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log the failure, leave the batch registry untouched, continue
    #[default]
    Skip,
    /// Stop the batch and return the error
    Abort,
}

/// Configuration for the melting process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeltConfig {
    /// Candidate identifier columns, highest priority first
    pub id_columns: Vec<String>,

    /// Context name for the top-level table
    pub root_context: String,

    /// Joins nested object keys and foreign key names
    pub separator: String,

    /// Maximum object depth merged into dotted column names (None = unlimited)
    pub max_depth: Option<usize>,

    /// Fail instead of emitting child rows that cannot be linked to a parent
    pub require_links: bool,

    pub on_error: ErrorPolicy,
}

impl Default for MeltConfig {
    fn default() -> Self {
        MeltConfig {
            id_columns: DEFAULT_ID_COLUMNS.iter().map(|s| s.to_string()).collect(),
            root_context: String::from(DEFAULT_ROOT_CONTEXT),
            separator: String::from(DEFAULT_SEPARATOR),
            max_depth: None,
            require_links: false,
            on_error: ErrorPolicy::Skip,
        }
    }
}

impl MeltConfig {
    pub fn with_id_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_root_context(mut self, name: impl Into<String>) -> Self {
        self.root_context = name.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_require_links(mut self, required: bool) -> Self {
        self.require_links = required;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }

    /// Reject settings that would produce unnamed tables or columns
    pub fn validate(&self) -> MeltResult<()> {
        if self.root_context.is_empty() {
            return Err(MeltError::InvalidConfig("root context name is empty".into()));
        }
        if self.separator.is_empty() {
            return Err(MeltError::InvalidConfig("separator is empty".into()));
        }
        if let Some(pos) = self.id_columns.iter().position(|c| c.trim().is_empty()) {
            return Err(MeltError::InvalidConfig(format!(
                "identifier column #{} is blank",
                pos + 1
            )));
        }
        Ok(())
    }

    /// The highest-priority identifier column found in `columns`
    pub fn id_column<'a>(&'a self, columns: &[String]) -> Option<&'a str> {
        self.id_columns
            .iter()
            .find(|candidate| columns.contains(candidate))
            .map(String::as_str)
    }

    /// Name of the foreign key column pointing at `context`'s `id_column`
    pub fn foreign_key(&self, context: &str, id_column: &str) -> String {
        format!("{}{}{}", context, self.separator, id_column)
    }
}
