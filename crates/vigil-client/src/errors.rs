/// Errors from request construction.
///
/// Deliberately narrow: anything the service does (timeouts, bad status,
/// unparseable bodies) is a [`crate::RequestOutcome`] value, not an error.
/// These variants only cover malformed requests - genuine programming or
/// configuration mistakes.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("invalid request path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("HTTP client initialization failed: {message}")]
    HttpInit { message: String },
}

impl ClientError {
    /// Error code string for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::InvalidBaseUrl { .. } => "invalid_base_url",
            ClientError::InvalidPath { .. } => "invalid_path",
            ClientError::HttpInit { .. } => "http_init_failed",
        }
    }
}
