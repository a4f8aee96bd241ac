use thiserror::Error;

/// Message shown for every failure that is not a well-formed "no match".
pub const FETCH_FAILED_MESSAGE: &str = "Something went wrong with fetching movies";
pub const NOT_FOUND_MESSAGE: &str = "Movie not found ...";

#[derive(Debug, Error)]
pub enum SourceError {
    /// The API answered with its "Response": "False" payload
    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound { reason: String },

    #[error("{}", FETCH_FAILED_MESSAGE)]
    Status { status: u16 },

    #[error("{}", FETCH_FAILED_MESSAGE)]
    Network(#[from] reqwest::Error),

    #[error("{}", FETCH_FAILED_MESSAGE)]
    Decode(#[from] serde_json::Error),
}

impl SourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound { .. })
    }

    /// Diagnostic detail for logs; `Display` is the user-facing text.
    pub fn detail(&self) -> String {
        match self {
            SourceError::NotFound { reason } => format!("no match: {}", reason),
            SourceError::Status { status } => format!("HTTP status {}", status),
            SourceError::Network(e) => format!("network error: {}", e),
            SourceError::Decode(e) => format!("malformed response: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        let not_found = SourceError::NotFound { reason: "Movie not found!".to_string() };
        assert_eq!(not_found.to_string(), NOT_FOUND_MESSAGE);
        assert!(not_found.is_not_found());

        let status = SourceError::Status { status: 503 };
        assert_eq!(status.to_string(), FETCH_FAILED_MESSAGE);
        assert!(!status.is_not_found());
        assert_eq!(status.detail(), "HTTP status 503");
    }
}
