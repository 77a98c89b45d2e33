//! HTTP status classification.
//!
//! A fixed table from status code to an error kind and the message shown to
//! the user. Anything outside the table, including 0 for "no response", is
//! `Unknown`. 2xx codes never reach the classifier in the pipeline.

/// Error category derived from an HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    RequestTimeout,
    TooManyRequests,
    InternalServerError,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,
    Unknown,
}

impl HttpErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            408 => Self::RequestTimeout,
            429 => Self::TooManyRequests,
            500 => Self::InternalServerError,
            502 => Self::BadGateway,
            503 => Self::ServiceUnavailable,
            504 => Self::GatewayTimeout,
            _ => Self::Unknown,
        }
    }

    /// Status code this kind stands for; 0 for `Unknown`.
    pub fn status(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::RequestTimeout => 408,
            Self::TooManyRequests => 429,
            Self::InternalServerError => 500,
            Self::BadGateway => 502,
            Self::ServiceUnavailable => 503,
            Self::GatewayTimeout => 504,
            Self::Unknown => 0,
        }
    }

    /// User-facing message for this kind.
    pub fn message(self) -> &'static str {
        match self {
            Self::BadRequest => "Bad Request – The server could not understand your request.",
            Self::Unauthorized => "Unauthorized – Please login again.",
            Self::Forbidden => "Forbidden – You don’t have permission to access this resource.",
            Self::NotFound => "Not Found – The requested resource could not be found.",
            Self::RequestTimeout => "Request Timeout – Please try again later.",
            Self::TooManyRequests => "Too Many Requests – Please slow down and try again later.",
            Self::InternalServerError => "Internal Server Error – Something went wrong on the server.",
            Self::BadGateway => "Bad Gateway – Invalid response from the upstream server.",
            Self::ServiceUnavailable => "Service Unavailable – The server is temporarily down.",
            Self::GatewayTimeout => "Gateway Timeout – The server didn’t respond in time.",
            Self::Unknown => "An unexpected error occurred. Please try again.",
        }
    }
}

impl std::fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
