use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Errors raised by a [`crate::storage::KeyValueStore`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize value for key {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid storage key \"{0}\"")]
    InvalidKey(String),
}
