//! HTTP client for the p2pay backend.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest`.

mod backend;

pub use backend::{BackendClient, ClientOptions};

use reqwest::StatusCode;

/// Generic text shown when a request failed without a backend message.
pub const NETWORK_ERROR_MESSAGE: &str = "Network Error";

/// Generic text shown when the backend rejected a request but gave no reason.
pub const TRANSACTION_FAILED_MESSAGE: &str = "Transaction Failed";

/// Errors produced by the SDK HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("api error: status {status}, body: {body}")]
    Api {
        status: StatusCode,
        /// The `error` field of the body, when the body carried one.
        message: Option<String>,
        body: String,
    },

    /// The server answered 2xx but the body carried an `error` field.
    #[error("rejected by backend: {0}")]
    Rejected(String),

    /// Response body did not match the endpoint schema.
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The request did not complete within its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl ClientError {
    /// Text to show the user for this failure.
    ///
    /// Backend-reported messages are returned verbatim. A bare non-2xx
    /// becomes [`TRANSACTION_FAILED_MESSAGE`]; everything else becomes
    /// [`NETWORK_ERROR_MESSAGE`].
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api {
                message: Some(message),
                ..
            } => message.clone(),
            ClientError::Rejected(message) => message.clone(),
            ClientError::Api { message: None, .. } => TRANSACTION_FAILED_MESSAGE.to_owned(),
            _ => NETWORK_ERROR_MESSAGE.to_owned(),
        }
    }

    /// Whether the backend itself produced this failure.
    pub fn is_backend_reported(&self) -> bool {
        matches!(self, ClientError::Api { .. } | ClientError::Rejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_user_message() {
        let api = ClientError::Api {
            status: StatusCode::BAD_REQUEST,
            message: Some("Insufficient funds".to_owned()),
            body: r#"{"error":"Insufficient funds"}"#.to_owned(),
        };
        assert_eq!(api.user_message(), "Insufficient funds");
        assert!(api.is_backend_reported());

        let bare = ClientError::Api {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
            body: String::new(),
        };
        assert_eq!(bare.user_message(), TRANSACTION_FAILED_MESSAGE);

        let rejected = ClientError::Rejected("Invalid UPI ID".to_owned());
        assert_eq!(rejected.user_message(), "Invalid UPI ID");

        let timeout = ClientError::Timeout(Duration::from_secs(30));
        assert_eq!(timeout.user_message(), NETWORK_ERROR_MESSAGE);
        assert!(!timeout.is_backend_reported());
    }
}
