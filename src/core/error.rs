use thiserror::Error;

/// Failures reported by a [`DataSource`](crate::core::DataSource).
///
/// The `Display` text is shown to the user as-is.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    #[error("No network connection. Check your connection and try again.")]
    NetworkUnavailable,
    #[error("The request timed out. Please try again.")]
    RequestTimedOut,
    #[error("The price server returned an error. Please try again later.")]
    ServerError,
    #[error("Received an unexpected response from the price server.")]
    InvalidResponse,
    #[error("No prices were returned for the tracked commodities.")]
    EmptyPayload,
    #[error("No price history is available for this range.")]
    EmptyHistory,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::RequestTimedOut
        } else if err.is_connect() {
            FetchError::NetworkUnavailable
        } else if err.is_status() {
            FetchError::ServerError
        } else if err.is_decode() || err.is_body() {
            FetchError::InvalidResponse
        } else {
            FetchError::NetworkUnavailable
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(_: serde_json::Error) -> Self {
        FetchError::InvalidResponse
    }
}
