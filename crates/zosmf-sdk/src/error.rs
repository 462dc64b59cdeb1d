//! Error taxonomy shared by every z/OSMF client crate.
//!
//! All service wrappers return [`ZosmfError`]. Failures reported by the
//! server itself carry the parsed [`ApiErrorBody`] so callers can inspect
//! the `rc`/`reason`/`category` triple that z/OSMF uses to classify
//! problems.

use miette::Diagnostic;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Convenience alias used across the client crates.
pub type Result<T> = std::result::Result<T, ZosmfError>;

/// Structured error document returned by the z/OSMF REST services.
///
/// The services disagree on field names: the file and job APIs report
/// `rc`/`reason`/`category` while the authentication service reports
/// `returnCode`/`reasonCode`. [`ApiErrorBody::parse`] folds both shapes
/// into one type, and unrecognized fields are retained in
/// [`extra`](Self::extra) so nothing the server said is lost.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    pub rc: Option<i64>,
    pub reason: Option<i64>,
    pub category: Option<i64>,
    pub message: Option<String>,
    pub details: Option<Vec<String>>,
    pub stack: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ApiErrorBody {
    /// Parse a server error body, falling back to the raw text when it is
    /// not the JSON error document.
    pub fn parse(body: &str) -> Self {
        match serde_json::from_str::<Self>(body) {
            Ok(mut parsed) => {
                parsed.normalize();
                parsed
            }
            Err(_) => Self::from_text(body),
        }
    }

    /// Wrap a response body that was not the JSON error document.
    pub fn from_text(body: &str) -> Self {
        let trimmed = body.trim();
        Self {
            message: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            ..Self::default()
        }
    }

    /// Fold the authentication service's field names into the common slots.
    fn normalize(&mut self) {
        if self.rc.is_none() {
            if let Some(value) = self.extra.remove("returnCode") {
                self.rc = value.as_i64();
            }
        }
        if self.reason.is_none() {
            if let Some(value) = self.extra.remove("reasonCode") {
                self.reason = value.as_i64();
            }
        }
    }
}

impl std::fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{message}")?,
            None => write!(f, "no error details returned")?,
        }
        if let (Some(category), Some(rc), Some(reason)) = (self.category, self.rc, self.reason) {
            write!(f, " (category {category}, rc {rc}, reason {reason})")?;
        } else if let (Some(rc), Some(reason)) = (self.rc, self.reason) {
            write!(f, " (rc {rc}, reason {reason})")?;
        }
        if let Some(details) = &self.details {
            for line in details {
                write!(f, "\n  {line}")?;
            }
        }
        Ok(())
    }
}

/// Errors produced by the z/OSMF client crates.
#[derive(Debug, Error, Diagnostic)]
pub enum ZosmfError {
    /// Input rejected before any request was issued.
    #[error("{message}")]
    #[diagnostic(code(zosmf::validation))]
    Validation { message: String },

    /// The server could not be reached at all.
    #[error("failed to reach z/OSMF at {host}:{port}")]
    #[diagnostic(
        code(zosmf::connect),
        help("verify the host, port, and TLS settings for the target z/OSMF instance")
    )]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: reqwest::Error,
    },

    /// The request was sent but failed in transit.
    #[error("z/OSMF request could not be completed")]
    #[diagnostic(code(zosmf::transport))]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("z/OSMF request failed with status {status}: {body}")]
    #[diagnostic(code(zosmf::api))]
    Api { status: u16, body: Box<ApiErrorBody> },

    /// The server answered successfully but the body was not usable.
    #[error("{message}")]
    #[diagnostic(code(zosmf::invalid_response))]
    InvalidResponse { message: String },

    /// A local file or directory operation failed.
    #[error("{message}")]
    #[diagnostic(code(zosmf::io))]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Some items in a bulk transfer failed; the message lists each
    /// failed item with its cause.
    #[error("{message}")]
    #[diagnostic(code(zosmf::transfer))]
    Transfer { message: String },

    /// A wait or poll loop gave up before the awaited condition held.
    #[error("{message}")]
    #[diagnostic(code(zosmf::timeout))]
    Timeout { message: String },
}

impl ZosmfError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    pub fn transfer(message: impl Into<String>) -> Self {
        Self::Transfer {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// HTTP status of the server reply, when the error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Parsed server error document, when the error carries one.
    pub fn api_body(&self) -> Option<&ApiErrorBody> {
        match self {
            Self::Api { body, .. } => Some(body),
            _ => None,
        }
    }
}
