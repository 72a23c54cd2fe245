//! Errors raised while talking to the processing service.

use std::time::Duration;

use speckle_pipeline::SessionError;

/// Transport and protocol failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the reply could not be read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The service has no active reference image.
    #[error("no active reference image; upload one first")]
    MissingActiveReference,

    /// No reply arrived within the configured timeout.
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// The reply did not have the expected shape.
    #[error("unexpected reply: {0}")]
    Decode(String),

    /// Client configuration could not be loaded.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// Why a submission did not produce an outcome.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Rejected by the session gate before anything was sent.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Sent (or about to be), but the service call failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}
