//! Action bus for NavRemote.
//!
//! The bus sits between the transport and the dispatcher. It holds one slot
//! per action kind; subscribing fills the slot, dropping the [`Subscription`]
//! empties it. Requests that arrive while a slot is empty are dropped, not
//! buffered. Each subscription queues at most [`SUBSCRIPTION_QUEUE_LEN`]
//! requests; a request arriving at a full queue is dropped as well.

use std::pin::Pin;
use std::sync::{Mutex, MutexGuard};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::protocol::{
    ActionKind, DownloadFileRequest, DownloadGpxRequest, ListFilesRequest, Request,
};
use crate::transport::PeerId;

/// Requests waiting for one action kind's handler
pub const SUBSCRIPTION_QUEUE_LEN: usize = 64;

/// A request together with the peer that sent it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest<T> {
    pub sender: PeerId,
    pub payload: T,
}

type Slot<T> = Option<mpsc::Sender<ActionRequest<T>>>;

/// Per-kind delivery slots. Opaque outside the bus.
#[doc(hidden)]
#[derive(Default)]
pub struct Slots {
    list_files: Slot<ListFilesRequest>,
    download_file: Slot<DownloadFileRequest>,
    download_gpx: Slot<DownloadGpxRequest>,
}

/// A request payload that has its own stream on the bus
pub trait Action: Sized + Send + 'static {
    const KIND: ActionKind;

    #[doc(hidden)]
    fn slot(slots: &mut Slots) -> &mut Slot<Self>;
}

impl Action for ListFilesRequest {
    const KIND: ActionKind = ActionKind::ListFiles;

    fn slot(slots: &mut Slots) -> &mut Slot<Self> {
        &mut slots.list_files
    }
}

impl Action for DownloadFileRequest {
    const KIND: ActionKind = ActionKind::DownloadFile;

    fn slot(slots: &mut Slots) -> &mut Slot<Self> {
        &mut slots.download_file
    }
}

impl Action for DownloadGpxRequest {
    const KIND: ActionKind = ActionKind::DownloadGpx;

    fn slot(slots: &mut Slots) -> &mut Slot<Self> {
        &mut slots.download_gpx
    }
}

/// Router from inbound requests to per-kind subscriptions
#[derive(Default)]
pub struct ActionBus {
    slots: Mutex<Slots>,
}

impl ActionBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the stream for action `T`.
    ///
    /// A second subscription for the same kind replaces the first one, whose
    /// stream then ends.
    pub fn subscribe<T: Action>(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_QUEUE_LEN);
        let mut slots = self.lock();
        if T::slot(&mut slots).replace(tx).is_some_and(|old| !old.is_closed()) {
            warn!("Replacing active subscription for {}", T::KIND);
        }
        Subscription { rx }
    }

    /// Whether a live subscription exists for `kind`
    pub fn is_subscribed(&self, kind: ActionKind) -> bool {
        let slots = self.lock();
        match kind {
            ActionKind::ListFiles => is_open(&slots.list_files),
            ActionKind::DownloadFile => is_open(&slots.download_file),
            ActionKind::DownloadGpx => is_open(&slots.download_gpx),
        }
    }

    /// Route a request from `sender` to the matching subscription.
    ///
    /// Returns `false` when the request was dropped because nobody listens
    /// for its kind or its queue is full.
    pub fn publish(&self, sender: PeerId, request: Request) -> bool {
        match request {
            Request::ListFiles(payload) => self.deliver(sender, payload),
            Request::DownloadFile(payload) => self.deliver(sender, payload),
            Request::DownloadGpx(payload) => self.deliver(sender, payload),
        }
    }

    fn deliver<T: Action>(&self, sender: PeerId, payload: T) -> bool {
        let mut slots = self.lock();
        let slot = T::slot(&mut slots);
        let Some(tx) = slot.as_ref() else {
            debug!("No subscriber for {}, dropping request from {}", T::KIND, sender);
            return false;
        };

        match tx.try_send(ActionRequest { sender, payload }) {
            Ok(()) => true,
            Err(TrySendError::Full(request)) => {
                warn!("Queue for {} is full, dropping request from {}", T::KIND, request.sender);
                false
            },
            Err(TrySendError::Closed(request)) => {
                debug!(
                    "Subscriber for {} went away, dropping request from {}",
                    T::KIND,
                    request.sender
                );
                *slot = None;
                false
            },
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        // Slots hold only senders, so a poisoned lock still has usable state.
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn is_open<T>(slot: &Slot<T>) -> bool {
    slot.as_ref().is_some_and(|tx| !tx.is_closed())
}

/// Stream of requests for one action kind. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::Receiver<ActionRequest<T>>,
}

impl<T> Subscription<T> {
    /// Wait for the next request; `None` once the subscription was replaced
    /// or the bus dropped.
    pub async fn recv(&mut self) -> Option<ActionRequest<T>> {
        self.rx.recv().await
    }
}

impl<T> Stream for Subscription<T> {
    type Item = ActionRequest<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
