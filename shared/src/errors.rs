/// Unified error types for the Larder system.
use thiserror::Error;

/// Top-level error type for the Larder system.
#[derive(Debug, Error)]
pub enum LarderError {
    #[error("recipe API error: {0}")]
    MealDb(#[from] MealDbError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Telegram error: {0}")]
    Telegram(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the TheMealDB HTTP client.
#[derive(Debug, Error)]
pub enum MealDbError {
    /// Transport-level failure: DNS, connect, TLS, or timeout.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("upstream returned invalid JSON: {0}")]
    InvalidJson(String),
}

impl MealDbError {
    /// Whether retrying the same request later could succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            MealDbError::Network(_) | MealDbError::Status(500..=599)
        )
    }
}

/// Result type alias for Larder operations.
pub type LarderResult<T> = Result<T, LarderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retriable() {
        assert!(MealDbError::Status(503).is_retriable());
        assert!(!MealDbError::Status(404).is_retriable());
        assert!(!MealDbError::InvalidJson("garbage".into()).is_retriable());
    }
}
