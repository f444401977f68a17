use shrine_core::StorageError;
use thiserror::Error;

/// Errors returned by [`crate::ApiClient`] and [`crate::CartContext`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An authenticated call answered 401; the stored session is no longer
    /// valid.
    #[error("session rejected by {url}")]
    Unauthorized { url: String },

    /// Login or registration answered 401. Any stored session is untouched.
    #[error("email or password was not accepted")]
    InvalidCredentials,

    /// Login or registration succeeded but returned no usable token.
    #[error("sign-in response carried no token")]
    MissingToken,

    /// An authenticated endpoint was called with no stored session.
    #[error("not signed in")]
    NotAuthenticated,

    #[error(
        "unexpected HTTP status {status} from {url}{}",
        .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
    )]
    UnexpectedStatus {
        status: u16,
        url: String,
        message: Option<String>,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid API base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("local storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// `true` when the caller should send the user back to sign in.
    #[must_use]
    pub fn is_session_invalid(&self) -> bool {
        matches!(
            self,
            ClientError::Unauthorized { .. } | ClientError::NotAuthenticated
        )
    }
}
