use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Runtime settings for the storefront client and CLI.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub env: Environment,
    pub log_level: String,
    /// Directory backing the on-disk [`crate::storage::FileStore`].
    pub state_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}
