/// Errors raised while talking to a managed cloud API.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    /// The request never produced an HTTP response (DNS, TLS, timeout...).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("{service} API returned {status}: {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// The API answered successfully but the payload was not what we expected.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Obtaining an access token failed.
    #[error("Authentication failed: {0}")]
    Auth(String),
}

impl CloudError {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
