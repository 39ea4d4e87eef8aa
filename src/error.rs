//! Error types for account inspection.

use thiserror::Error;

/// Maximum number of characters of a response body kept in an error.
pub const MAX_ERROR_BODY_LEN: usize = 512;

/// Errors that can occur while inspecting an account.
#[derive(Debug, Error)]
pub enum InspectError {
    /// The identity provider refused to exchange the API key.
    #[error("failed to obtain access token: http {status}: {body}")]
    Authentication { status: u16, body: String },

    /// The access token is not a well-formed JWT.
    #[error("invalid access token")]
    InvalidToken,

    /// A control-plane query returned a non-200 status.
    #[error("query failed: http {status}: {body}")]
    Query { status: u16, body: String },

    /// An expected field could not be read from a response.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// HTTP request error before a status was available.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// I/O error, e.g. the CLI could not be spawned.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The CLI ran but exited unsuccessfully.
    #[error("`{program}` exited with {}: {stderr}", describe_exit(.code))]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Response exceeds maximum allowed size.
    #[error("response too large: {0} bytes exceeds limit of {1} bytes")]
    TooLarge(usize, usize),

    /// JSON deserialization error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// A required configuration value was not supplied.
    #[error("missing {0}")]
    MissingCredential(&'static str),
}

impl InspectError {
    /// Whether the failure happened before any HTTP status was available.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            InspectError::Transport(_)
                | InspectError::Io(_)
                | InspectError::CommandFailed { .. }
                | InspectError::TooLarge(..)
        )
    }

    /// Whether an expected field was absent or mistyped.
    pub fn is_extraction(&self) -> bool {
        matches!(self, InspectError::Extraction(_))
    }

    pub(crate) fn authentication(status: u16, body: &str) -> Self {
        InspectError::Authentication {
            status,
            body: truncate_body(body),
        }
    }

    pub(crate) fn query(status: u16, body: &str) -> Self {
        InspectError::Query {
            status,
            body: truncate_body(body),
        }
    }
}

/// Errors raised by field extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The path names a field that is absent or null.
    #[error("missing field `{0}`")]
    MissingField(String),

    /// The field exists but holds a different JSON type.
    #[error("field `{path}` is not {expected}")]
    UnexpectedType {
        path: String,
        expected: &'static str,
    },

    /// The path expression itself could not be parsed.
    #[error("invalid field path `{0}`")]
    InvalidPath(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY_LEN) {
        Some((idx, _)) => format!("{}... [truncated]", &body[..idx]),
        None => body.to_string(),
    }
}
