use std::path::PathBuf;

use thiserror::Error;

use crate::connection::Response;

/// Top-level error type for the `onapie-api` crate.
///
/// `Client` and `Api` are the two classified HTTP failure bands; both keep
/// the response envelope when one was received so callers can inspect the
/// status and body. `onapie` maps these into exit codes and diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Classified failures ─────────────────────────────────────────
    /// Caller-side mistake: bad arguments, unsupported scheme, or a 4xx
    /// response from the service.
    #[error("{message}")]
    Client {
        message: String,
        response: Option<Box<Response>>,
    },

    /// Service-side failure: any status outside 200-399 that is not a 4xx.
    #[error("{message}")]
    Api {
        message: String,
        response: Option<Box<Response>>,
    },

    // ── Authentication ──────────────────────────────────────────────
    /// The token exchange succeeded at the HTTP level but yielded no token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// A file named for upload could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// A `Client` error without a response attached.
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client {
            message: message.into(),
            response: None,
        }
    }

    /// Classify a non-success response into `Client` (4xx) or `Api` (rest).
    pub(crate) fn from_response(response: Response) -> Self {
        let message = format!("Api Error: {}, {}", response.status, response.reason);
        let client_side = (400..500).contains(&response.status);
        let response = Some(Box::new(response));
        if client_side {
            Self::Client { message, response }
        } else {
            Self::Api { message, response }
        }
    }

    /// The response that triggered this error, if any.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Client { response, .. } | Self::Api { response, .. } => response.as_deref(),
            _ => None,
        }
    }

    /// HTTP status of the triggering response, if any.
    pub fn status(&self) -> Option<u16> {
        self.response().map(|r| r.status)
    }

    /// Returns `true` for caller-side errors, including 4xx responses.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Client { .. })
    }

    /// Returns `true` if the request never reached the service.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, reason: &str) -> Response {
        Response {
            status,
            reason: reason.into(),
            headers: reqwest::header::HeaderMap::new(),
            body: bytes::Bytes::from_static(br#"{"detail": "Not found"}"#),
        }
    }

    #[test]
    fn plain_messages_print_verbatim() {
        assert_eq!(Error::client("Test Message").to_string(), "Test Message");
    }

    #[test]
    fn http_messages_carry_status_and_reason() {
        let err = Error::from_response(response(404, "Not Found"));
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Api Error: 404, Not Found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn server_errors_are_api_errors() {
        let err = Error::from_response(response(503, "Service Unavailable"));
        assert!(matches!(err, Error::Api { .. }));
        assert_eq!(err.to_string(), "Api Error: 503, Service Unavailable");
    }
}
