//! What happens to a request that could not be served.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::DispatchError;
use crate::protocol::{ActionKind, Response};
use crate::transport::{PeerId, Transport, TransportError};

/// Receives every failed request after its handler gave up
#[async_trait]
pub trait ErrorReporter: Send + Sync {
    async fn report(&self, peer: &PeerId, action: ActionKind, error: &DispatchError);
}

/// Logs the failure and sends nothing; the peer sees a timeout
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

#[async_trait]
impl ErrorReporter for LogReporter {
    async fn report(&self, peer: &PeerId, action: ActionKind, error: &DispatchError) {
        log_failure(peer, action, error);
    }
}

/// Logs the failure and answers the requester with `Response::Error`
pub struct NackReporter {
    transport: Arc<dyn Transport>,
}

impl NackReporter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ErrorReporter for NackReporter {
    async fn report(&self, peer: &PeerId, action: ActionKind, error: &DispatchError) {
        log_failure(peer, action, error);

        // A peer that is gone cannot receive the error either. An oversized or
        // queued-out response still leaves the connection usable.
        if let DispatchError::Transport(TransportError::UnknownPeer(_)) = error {
            return;
        }

        let response = Response::Error { action, reason: format!("{}: {}", error.kind(), error) };
        if let Err(e) = self.transport.send(response, std::slice::from_ref(peer)).await {
            warn!("Failed to send error response for {} to {}: {}", action, peer, e);
        }
    }
}

fn log_failure(peer: &PeerId, action: ActionKind, error: &DispatchError) {
    warn!("Dropping {} request from {} ({}): {}", action, peer, error.kind(), error);
}
