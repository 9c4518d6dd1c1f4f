use std::path::PathBuf;

/// Errors raised while reading or melting documents
#[derive(Debug, thiserror::Error)]
pub enum MeltError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {source_name}: {message}")]
    Parse { source_name: String, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised only when links are required and a parent has no identifier column
    #[error("cannot link '{column}' rows to context '{context}': no identifier column present")]
    UnlinkedChildren { context: String, column: String },
}

impl MeltError {
    /// Where the failing document came from, if known
    pub fn origin(&self) -> Option<String> {
        match self {
            MeltError::Io { path, .. } => Some(path.display().to_string()),
            MeltError::Parse { source_name, .. } => Some(source_name.clone()),
            _ => None,
        }
    }
}

pub type MeltResult<T> = std::result::Result<T, MeltError>;
