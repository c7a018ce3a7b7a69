use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Cannot tokenize launch options: {0}")]
    Tokenize(String),

    #[error("Value cannot be shell-quoted: {0:?}")]
    Unquotable(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown option '{key}' in {scope}")]
    UnknownOption { scope: String, key: String },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Schema conflict: {0}")]
    SchemaConflict(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Profile already exists: {0}")]
    ProfileExists(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Atomic write failed: {0}")]
    Persist(#[from] tempfile::PersistError),
}

impl LaunchError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        LaunchError::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LaunchError>;
