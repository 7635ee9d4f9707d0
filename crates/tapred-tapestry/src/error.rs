use thiserror::Error;

/// Errors returned by the Tapestry API client.
#[derive(Debug, Error)]
pub enum TapestryError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL could not be parsed or cannot carry paths.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Tapestry answered with a non-success status; the body text is kept
    /// verbatim so callers can forward it.
    #[error("Tapestry API error: status {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
