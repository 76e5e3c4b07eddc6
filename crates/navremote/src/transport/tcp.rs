//! TCP transport: one framed connection per peer.
//!
//! Each accepted connection becomes a peer identified by its remote address.
//! A reader loop publishes decoded requests on the bus; a writer task drains
//! the peer's outbound queue. Responses are encoded when they are sent, so an
//! oversized response is refused to the caller and never reaches the queue.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use super::{PeerId, Transport, TransportError};
use crate::bus::ActionBus;
use crate::protocol::{encode_frame, read_frame, Request, Response, MAX_FRAME_LEN};

/// Encoded frames waiting to be written to one peer
pub const OUTBOUND_QUEUE_LEN: usize = 8;

/// How long replies may still flow after a peer stops sending
pub const DRAIN_GRACE: Duration = Duration::from_secs(5);

type Frame = Arc<[u8]>;
type PeerSenders = Arc<Mutex<HashMap<PeerId, mpsc::Sender<Frame>>>>;

/// Transport serving the action protocol over plain TCP
pub struct TcpTransport {
    listener: Mutex<Option<TcpListener>>,
    local_addr: SocketAddr,
    peers: PeerSenders,
    max_frame_len: usize,
}

impl TcpTransport {
    /// Bind the listening socket. Connections are accepted once [`serve`](Self::serve) runs.
    pub async fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Transport listening on {}", local_addr);
        Ok(Self {
            listener: Mutex::new(Some(listener)),
            local_addr,
            peers: Arc::new(Mutex::new(HashMap::new())),
            max_frame_len: MAX_FRAME_LEN as usize,
        })
    }

    /// Lower the largest response frame this transport will send.
    ///
    /// Values above [`MAX_FRAME_LEN`] are clamped to it.
    pub fn with_max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len.min(MAX_FRAME_LEN as usize);
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Peers with an open connection
    pub async fn connected_peers(&self) -> Vec<PeerId> {
        self.peers.lock().await.keys().cloned().collect()
    }

    /// Start accepting connections and publishing their requests on `bus`.
    ///
    /// Calling this a second time returns a handle that finishes immediately.
    pub async fn serve(&self, bus: Arc<ActionBus>) -> JoinHandle<()> {
        let listener = self.listener.lock().await.take();
        let peers = self.peers.clone();

        tokio::spawn(async move {
            let Some(listener) = listener else {
                warn!("Transport is already serving");
                return;
            };

            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let peer = PeerId::new(addr.to_string());
                        tokio::spawn(run_connection(stream, peer, bus.clone(), peers.clone()));
                    },
                    Err(e) => {
                        warn!("Accept failed, stopping transport: {}", e);
                        break;
                    },
                }
            }
        })
    }
}

async fn run_connection(stream: TcpStream, peer: PeerId, bus: Arc<ActionBus>, peers: PeerSenders) {
    info!("Peer connected: {}", peer);

    let (tx, mut rx) = mpsc::channel::<Frame>(OUTBOUND_QUEUE_LEN);
    peers.lock().await.insert(peer.clone(), tx);

    let (mut reader, mut writer) = stream.into_split();

    let writer_peer = peer.clone();
    let mut writer_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = writer.write_all(&frame).await {
                warn!("Failed to write to {}: {}", writer_peer, e);
                break;
            }
        }
    });

    let clean_eof = loop {
        match read_frame::<_, Request>(&mut reader).await {
            Ok(Some(request)) => {
                debug!("Received {} from {}", request.kind(), peer);
                bus.publish(peer.clone(), request);
            },
            Ok(None) => break true,
            Err(e) => {
                warn!("Closing connection to {}: {}", peer, e);
                break false;
            },
        }
    };

    // A peer may half-close after its last request and still wait for replies.
    let mut writer_done = false;
    if clean_eof {
        writer_done = time::timeout(DRAIN_GRACE, &mut writer_task).await.is_ok();
    }

    // Removing the sender lets the writer flush what is queued and stop.
    peers.lock().await.remove(&peer);
    if !writer_done && time::timeout(DRAIN_GRACE, &mut writer_task).await.is_err() {
        writer_task.abort();
    }
    info!("Peer disconnected: {}", peer);
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&self, response: Response, to: &[PeerId]) -> Result<(), TransportError> {
        let frame: Frame = encode_frame(&response, self.max_frame_len)?.into();
        let peers = self.peers.lock().await;

        // Resolve every recipient first so a bad address sends nothing.
        let senders = to
            .iter()
            .map(|peer| {
                peers.get(peer).ok_or_else(|| TransportError::UnknownPeer(peer.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (sender, peer) in senders.into_iter().zip(to) {
            sender.try_send(frame.clone()).map_err(|e| match e {
                TrySendError::Full(_) => TransportError::QueueFull(peer.clone()),
                TrySendError::Closed(_) => TransportError::UnknownPeer(peer.clone()),
            })?;
        }
        debug!("Queued {} for {} peer(s)", response.type_name(), to.len());
        Ok(())
    }
}
