//! Provider error types.

use thiserror::Error;

/// Errors that can occur when talking to a question or scoring service.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The service rejected the access token (HTTP 401/403).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The service returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Whether the same request may succeed later.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout(_) | ProviderError::NetworkError(_) => true,
            ProviderError::ApiError { status, .. } => *status >= 500 || *status == 429,
            ProviderError::AuthenticationFailed(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(ProviderError::Timeout(30).is_transient());
        assert!(ProviderError::ApiError {
            status: 503,
            message: "down".into()
        }
        .is_transient());
        assert!(!ProviderError::ApiError {
            status: 400,
            message: "bad".into()
        }
        .is_transient());
        assert!(!ProviderError::AuthenticationFailed("nope".into()).is_transient());
    }
}
