use std::fmt;

use thiserror::Error;

/// Failure raised by a joke source, tagged with what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection could not be established or broke mid-transfer.
    Network,
    Timeout,
    HttpStatus(u16),
    TooLarge { max_bytes: u64, actual: Option<u64> },
    /// Body arrived but could not be decoded.
    InvalidResponse,
    Cancelled,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Other => write!(f, "unexpected failure"),
        }
    }
}

/// User-facing bucket a failure falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Transport layer failed before a usable response arrived.
    Network,
    /// The source answered with a non-success status.
    Http,
    /// Not representable as a screen state; handed to the fault policy.
    Unhandled,
}

pub fn classify(kind: &FailureKind) -> Classification {
    match kind {
        FailureKind::Network | FailureKind::Timeout => Classification::Network,
        FailureKind::HttpStatus(_) => Classification::Http,
        FailureKind::TooLarge { .. }
        | FailureKind::InvalidResponse
        | FailureKind::Cancelled
        | FailureKind::Other => Classification::Unhandled,
    }
}
