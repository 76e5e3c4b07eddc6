//! Transport capability for NavRemote.
//!
//! The dispatcher only needs to send a response to a set of peers; inbound
//! requests reach it through the [`ActionBus`](crate::bus::ActionBus). Any
//! type implementing [`Transport`] can carry the protocol. [`TcpTransport`]
//! is the implementation used by the service.

pub mod tcp;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::protocol::{CodecError, Response};

pub use tcp::TcpTransport;

/// Opaque identifier of a remote endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PeerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Error delivering a response
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("peer {0} is not connected")]
    UnknownPeer(PeerId),
    #[error("outbound queue for {0} is full")]
    QueueFull(PeerId),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reliable delivery of responses to connected peers
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `response` to every peer in `to`, and to no one else.
    async fn send(&self, response: Response, to: &[PeerId]) -> Result<(), TransportError>;
}
