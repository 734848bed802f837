//! Typed errors for the weather query, storage and history layers.
//!
//! Lower layers never decide whether an error is shown to the user. They
//! return one of these, and the caller picks: surface it, log it, or degrade.

use thiserror::Error;

/// Failure of a single weather query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Location must not be empty")]
    EmptyLocation,

    #[error("Location not found: {location}")]
    NotFound { location: String },

    #[error("Weather request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Weather request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed weather response: {0}")]
    Malformed(String),
}

impl QueryError {
    /// Message suitable for direct display.
    pub fn user_message(&self) -> &'static str {
        match self {
            QueryError::EmptyLocation => "Please enter a city name.",
            QueryError::NotFound { .. } => {
                "Something went wrong. Please try again with a correct city name."
            }
            QueryError::Status { status, .. } if *status == 401 => {
                "The weather service rejected the API key. Run `weather configure`."
            }
            QueryError::Status { .. } => "The weather service returned an error. Please try again.",
            QueryError::Timeout => "The weather service took too long to answer. Please try again.",
            QueryError::Network(_) => "Could not reach the weather service. Check your connection.",
            QueryError::Malformed(_) => "The weather service sent an unexpected response.",
        }
    }

    /// Whether repeating the same query might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            QueryError::Timeout | QueryError::Network(_) => true,
            QueryError::Status { status, .. } => *status >= 500 || *status == 429,
            QueryError::EmptyLocation | QueryError::NotFound { .. } | QueryError::Malformed(_) => {
                false
            }
        }
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            QueryError::Timeout
        } else if err.is_decode() || err.is_body() {
            QueryError::Malformed(err.to_string())
        } else {
            QueryError::Network(err.to_string())
        }
    }
}

/// Failure of the persistent key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Failure to read the persisted search history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Persisted history is corrupt: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_and_network_are_distinct() {
        let not_found = QueryError::NotFound { location: "Atlantis".into() };
        let network = QueryError::Network("connection refused".into());

        assert_ne!(not_found.user_message(), network.user_message());
        assert!(!not_found.is_retryable());
        assert!(network.is_retryable());
    }

    #[test]
    fn server_errors_are_retryable_client_errors_are_not() {
        let server = QueryError::Status { status: 503, body: String::new() };
        let client = QueryError::Status { status: 400, body: String::new() };
        let limited = QueryError::Status { status: 429, body: String::new() };

        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(limited.is_retryable());
    }

    #[test]
    fn display_includes_location() {
        let err = QueryError::NotFound { location: "Atlantis".into() };
        assert!(err.to_string().contains("Atlantis"));
    }

    #[test]
    fn history_error_wraps_storage() {
        let err: HistoryError = StorageError::Unavailable("disk gone".into()).into();
        assert!(err.to_string().contains("disk gone"));
    }
}
