use thiserror::Error;

use crate::session::SessionState;

/// Errors that stop the service from starting or keep it from continuing.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Bind error on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Key generation failed for {profile}: {reason}")]
    KeyGeneration { profile: &'static str, reason: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Signing error: {0}")]
    Sign(#[from] SignError),

    #[error("service closed the connection without a response")]
    EmptyResponse,

    #[error("{0} signature did not verify")]
    VerificationFailed(String),
}

/// Per-connection faults. These never leave the session handler.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("peer closed the connection before sending a request")]
    PeerClosed,

    #[error("receive failed: {0}")]
    Read(std::io::Error),

    #[error("could not allocate a {0}-byte receive buffer")]
    Allocation(usize),

    #[error("signing failed: {0}")]
    Sign(#[from] SignError),

    #[error("send failed: {0}")]
    Write(std::io::Error),
}

/// Failures reported by the dual-algorithm signer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("{profile} primitive reported failure: {reason}")]
    Primitive { profile: &'static str, reason: String },

    #[error("{profile} signature is {len} bytes, bound is {max}")]
    SignatureTooLong { profile: &'static str, len: usize, max: usize },

    #[error("{what} buffer is {got} bytes, {profile} expects {expected}")]
    InvalidLength { profile: &'static str, what: &'static str, expected: usize, got: usize },
}

/// Failures of the opaque inference capability. The decision engine swallows these.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferenceError {
    #[error("inference capability not initialized")]
    Uninitialized,

    #[error("malformed model: {0}")]
    Malformed(String),

    #[error("inference fault: {0}")]
    Fault(String),
}

/// Failures while decoding a response frame on the client side.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("response is missing the {0} field")]
    MissingField(&'static str),

    #[error("invalid hex in {field}: {reason}")]
    InvalidHex { field: &'static str, reason: String },

    #[error("invalid TIME_MS value: {0}")]
    InvalidLatency(String),

    #[error("unknown algorithm {0}")]
    UnknownAlgorithm(String),
}

impl SessionError {
    /// Stage label used in audit lines.
    pub fn stage(&self) -> SessionState {
        match self {
            SessionError::PeerClosed | SessionError::Read(_) | SessionError::Allocation(_) => {
                SessionState::Reading
            }
            SessionError::Sign(_) => SessionState::Signing,
            SessionError::Write(_) => SessionState::Responding,
        }
    }
}
