//! Typed errors raised at the boundary with the hosted services and by
//! request validation.
//!
//! Application code propagates [`UpstreamError`] through `anyhow`; the HTTP
//! layer maps [`RequestError`] to a 400 or a 500 that relays the message.

use thiserror::Error;

/// A failed call to an external API (embeddings, completions, vector store).
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request never produced an HTTP response.
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{service} API error {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("invalid {service} response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl UpstreamError {
    pub fn transport(service: &'static str, source: reqwest::Error) -> Self {
        Self::Transport { service, source }
    }

    pub fn decode(service: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            service,
            message: message.into(),
        }
    }

    /// HTTP status reported by the service, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure of a search, details or setup request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request was malformed. Nothing was sent downstream.
    #[error("{0}")]
    InvalidInput(String),

    /// A required downstream call failed.
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl RequestError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Turn a non-success response into [`UpstreamError::Status`], keeping the body text.
pub(crate) async fn status_error(service: &'static str, response: reqwest::Response) -> UpstreamError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    UpstreamError::Status {
        service,
        status,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message() {
        let err = UpstreamError::Status {
            service: "Qdrant",
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "Qdrant API error 401: unauthorized");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_dimension_message() {
        let err = UpstreamError::DimensionMismatch {
            expected: 3072,
            actual: 1536,
        };
        assert_eq!(err.to_string(), "embedding has 1536 dimensions, expected 3072");
        assert_eq!(err.status(), None);
    }
}
