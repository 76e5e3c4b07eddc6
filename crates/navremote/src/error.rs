//! Errors raised while serving a request.

use std::fmt;

use crate::history::HistoryError;
use crate::transport::TransportError;
use crate::trip::TripError;

/// Failure class of a dropped request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The history directory could not be enumerated
    Enumeration,
    /// A listed file is gone, unreadable, or not in the history directory
    StaleReference,
    /// The file could not be decoded or written as GPX
    Decode,
    /// The response could not be delivered
    Delivery,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Enumeration => "enumeration failure",
            ErrorKind::StaleReference => "stale reference",
            ErrorKind::Decode => "decode failure",
            ErrorKind::Delivery => "delivery failure",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Trip(#[from] TripError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("decoder task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::History(HistoryError::Enumerate { .. }) => ErrorKind::Enumeration,
            DispatchError::History(_) => ErrorKind::StaleReference,
            DispatchError::Trip(_) | DispatchError::Join(_) => ErrorKind::Decode,
            DispatchError::Transport(_) => ErrorKind::Delivery,
        }
    }
}
