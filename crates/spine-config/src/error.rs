use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{path}: {message}")]
    ReadFile { path: String, message: String },

    #[error("configuration parse error: {0}")]
    ParseToml(String),

    #[error("{location}: {message}")]
    Invalid { location: String, message: String },

    #[error("{location}: unresolved parameter reference `@{name}`")]
    UnresolvedReference { location: String, name: String },
}

impl ConfigError {
    pub(crate) fn invalid(location: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            location: location.into(),
            message: message.into(),
        }
    }
}
