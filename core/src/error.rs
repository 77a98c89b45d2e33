//! Error types for the request pipeline.
//!
//! # Design
//! `ApiError` is the "transport error" slot of a `Completion`: anything that
//! stopped an HTTP response from being obtained. Request construction
//! failures (bad URL, bad header, unencodable parameters) share the type so
//! they travel through the same completion branch as network failures.
//! Non-2xx statuses are not errors here; they are classified by
//! [`crate::status::HttpErrorKind`].

use thiserror::Error;

/// Failure that prevented the pipeline from obtaining an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The resolved endpoint is not a valid absolute URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A header name or value could not be sent on the wire.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The parameter map could not be serialized for the chosen encoding.
    #[error("parameter encoding failed: {0}")]
    Encoding(String),

    /// The transport gave up waiting for the server.
    #[error("request timed out")]
    Timeout,

    /// No connection could be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request was cancelled through the lifecycle tracker or its handle.
    #[error("request was cancelled")]
    Cancelled,

    #[error("no Tokio runtime to run the request on")]
    NoRuntime,

    /// Reading local data for the request failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Any other transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_parse_error_maps_to_invalid_url() {
        let err: ApiError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(ApiError::Timeout.to_string(), "request timed out");
        assert_eq!(ApiError::Cancelled.to_string(), "request was cancelled");
        assert_eq!(ApiError::NoRuntime.to_string(), "no Tokio runtime to run the request on");
        assert_eq!(
            ApiError::Connection("refused".into()).to_string(),
            "connection failed: refused"
        );
    }
}
