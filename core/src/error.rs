//! Error types for the REST client.
//!
//! # Design
//! A non-2xx status is not an error by itself. Only statuses registered with
//! an error constructor become `Custom`. Errors raised before a response
//! exists carry no status; [`ClientError::status`] returns `None` for them.

use thiserror::Error;

use crate::http::HttpMethod;

/// Boxed error produced by a custom error constructor.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `RestClient` operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The JSON payload could not be serialized. Nothing was sent.
    #[error("failed to serialize request payload: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The request could not be built from the method and URL. Nothing was sent.
    #[error("invalid request {method} {url}: {source}")]
    InvalidRequest {
        method: HttpMethod,
        url: String,
        #[source]
        source: ureq::http::Error,
    },

    /// No response was obtained (DNS, connect, I/O).
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: HttpMethod,
        url: String,
        #[source]
        source: ureq::Error,
    },

    /// The status matched the custom-error set; displays the constructor's
    /// error verbatim.
    #[error("{source}")]
    Custom { status: u16, source: BoxError },

    /// The response body is not valid JSON for the caller's target.
    #[error("failed to decode response body (status {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    /// The HTTP status of the response behind this error, or `None` when no
    /// response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Custom { status, .. } | ClientError::Decode { status, .. } => Some(*status),
            ClientError::Serialization(_) | ClientError::InvalidRequest { .. } | ClientError::Transport { .. } => None,
        }
    }

    /// Recover the error built by the custom error constructor.
    pub fn into_custom(self) -> Option<BoxError> {
        match self {
            ClientError::Custom { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("response 'x' is not valid")]
    struct Rejected;

    #[test]
    fn custom_displays_constructor_error_verbatim() {
        let err = ClientError::Custom {
            status: 400,
            source: Box::new(Rejected),
        };
        assert_eq!(err.to_string(), "response 'x' is not valid");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn into_custom_recovers_concrete_error() {
        let err = ClientError::Custom {
            status: 409,
            source: Box::new(Rejected),
        };
        let source = err.into_custom().unwrap();
        assert!(source.downcast_ref::<Rejected>().is_some());
    }

    #[test]
    fn serialization_has_no_status() {
        let source = serde_json::from_str::<u8>("x").unwrap_err();
        let err = ClientError::Serialization(source);
        assert_eq!(err.status(), None);
        assert!(err.into_custom().is_none());
    }

    #[test]
    fn decode_keeps_status() {
        let source = serde_json::from_str::<u8>("x").unwrap_err();
        let err = ClientError::Decode { status: 500, source };
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().starts_with("failed to decode response body (status 500)"));
    }
}
