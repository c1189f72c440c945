//! Live channel client error types
//!
//! Every failure of a live channel call is a value of [`LiveChannelError`].
//! Transport failures, HTTP errors and body parse failures are separate
//! variants, and the variants that saw a response keep its headers.

use reqwest::StatusCode;
use thiserror::Error;

use crate::live::xml;
use crate::transport::{RawResponse, ResponseHeaders};

/// Maximum response body size accepted from the service (16 MB).
pub const MAX_RESPONSE_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum LiveChannelError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-2xx status.
    #[error("HTTP error {status} [{code}]: {message}")]
    Http {
        status: StatusCode,
        code: String,
        message: String,
        request_id: Option<String>,
        headers: ResponseHeaders,
    },

    /// The service answered 2xx but the body could not be parsed.
    #[error("Parse error ({status}): {message}")]
    Parse {
        status: StatusCode,
        message: String,
        headers: ResponseHeaders,
    },

    #[error("Signing error: {0}")]
    Sign(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    /// The body exceeded [`MAX_RESPONSE_SIZE`].
    #[error("Response too large ({status}): {size} bytes, max {MAX_RESPONSE_SIZE}")]
    ResponseTooLarge {
        status: StatusCode,
        size: u64,
        headers: ResponseHeaders,
    },

    /// The status line and headers arrived but reading the body failed.
    #[error("Failed to read response body ({status}): {message}")]
    Body {
        status: StatusCode,
        message: String,
        headers: ResponseHeaders,
    },
}

impl LiveChannelError {
    /// Build an HTTP error from a non-2xx response.
    ///
    /// The vendor `<Error>` document is used when the body carries one; the
    /// request id falls back to the `x-cos-request-id` header.
    pub(crate) fn from_error_response(raw: RawResponse) -> Self {
        let parsed = xml::parse_error_body(&raw.body).ok();
        let header_request_id = raw.request_id().map(str::to_string);
        let (code, message, body_request_id) = match parsed {
            Some(err) => (err.code, err.message, err.request_id),
            None => (String::new(), String::new(), String::new()),
        };
        let message = if message.is_empty() {
            raw.status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string()
        } else {
            message
        };
        let request_id = if body_request_id.is_empty() {
            header_request_id
        } else {
            Some(body_request_id)
        };

        Self::Http {
            status: raw.status,
            code,
            message,
            request_id,
            headers: raw.headers,
        }
    }

    pub(crate) fn parse(raw: RawResponse, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            status: raw.status,
            message: err.to_string(),
            headers: raw.headers,
        }
    }

    /// Response headers, when a response was received.
    #[must_use]
    pub fn headers(&self) -> Option<&ResponseHeaders> {
        match self {
            Self::Http { headers, .. }
            | Self::Parse { headers, .. }
            | Self::ResponseTooLarge { headers, .. }
            | Self::Body { headers, .. } => Some(headers),
            _ => None,
        }
    }

    /// HTTP status, when a response was received.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. }
            | Self::Parse { status, .. }
            | Self::ResponseTooLarge { status, .. }
            | Self::Body { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Vendor error code of an HTTP error (e.g. `NoSuchLiveChannel`).
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Http { code, .. } if !code.is_empty() => Some(code),
            _ => None,
        }
    }

    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Http { request_id, .. } => request_id.as_deref(),
            _ => self
                .headers()
                .and_then(|h| h.get(crate::transport::REQUEST_ID_HEADER))
                .map(String::as_str),
        }
    }
}

impl From<reqwest::Error> for LiveChannelError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<reqwest::header::InvalidHeaderValue> for LiveChannelError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<url::ParseError> for LiveChannelError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidConfig(format!("invalid endpoint URL: {err}"))
    }
}
