use spine_config::ConfigError;
use spine_kernel::{RegistryError, SelectionError};

use crate::records::RecordError;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("categories: {0}")]
    Category(SelectionError),

    #[error("sample `{sample}`, tree `{tree}`: {source}")]
    Compile {
        sample: String,
        tree: String,
        source: SelectionError,
    },

    #[error("sample `{sample}`: {source}")]
    Records { sample: String, source: RecordError },

    #[error("{path}: {message}")]
    Write { path: String, message: String },
}

impl AnalysisError {
    /// Exit status for the CLI: 1 for configuration and compilation
    /// errors, 2 for I/O.
    pub fn exit_code(&self) -> i32 {
        match self {
            AnalysisError::Records { .. } | AnalysisError::Write { .. } => 2,
            AnalysisError::Config(ConfigError::ReadFile { .. }) => 2,
            _ => 1,
        }
    }
}
