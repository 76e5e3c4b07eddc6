//! Shared fixtures for NavRemote integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use navremote::{
    ActionBus, ActionKind, DispatchError, Dispatcher, DispatcherConfig, DispatcherDeps,
    DispatcherHandle, ErrorKind, ErrorReporter, HistoryStore, JsonTripDecoder, PeerId, Response,
    Transport, TransportError, TripDecoder, TripError, TripRecord,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

/// A response as handed to the transport
#[derive(Debug, Clone)]
pub struct Sent {
    pub response: Response,
    pub to: Vec<PeerId>,
}

/// Transport fake that records every send. Peers listed in `offline` fail.
pub struct RecordingTransport {
    tx: mpsc::UnboundedSender<Sent>,
    offline: Vec<PeerId>,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, response: Response, to: &[PeerId]) -> Result<(), TransportError> {
        if let Some(peer) = to.iter().find(|peer| self.offline.contains(peer)) {
            return Err(TransportError::UnknownPeer(peer.clone()));
        }
        let _ = self.tx.send(Sent { response, to: to.to_vec() });
        Ok(())
    }
}

/// A failure as handed to the reporter
#[derive(Debug, Clone)]
pub struct Failure {
    pub peer: PeerId,
    pub action: ActionKind,
    pub kind: ErrorKind,
}

pub struct RecordingReporter {
    tx: mpsc::UnboundedSender<Failure>,
}

#[async_trait]
impl ErrorReporter for RecordingReporter {
    async fn report(&self, peer: &PeerId, action: ActionKind, error: &DispatchError) {
        let _ = self.tx.send(Failure { peer: peer.clone(), action, kind: error.kind() });
    }
}

/// Decoder that parks every call until the test releases it
pub struct GatedDecoder {
    entered: mpsc::UnboundedSender<()>,
    gate: Mutex<std_mpsc::Receiver<()>>,
}

impl GatedDecoder {
    /// The decoder, a receiver signalled when a call starts, and the release handle
    pub fn new() -> (Self, mpsc::UnboundedReceiver<()>, std_mpsc::Sender<()>) {
        let (entered, entered_rx) = mpsc::unbounded_channel();
        let (release, gate) = std_mpsc::channel();
        (Self { entered, gate: Mutex::new(gate) }, entered_rx, release)
    }
}

impl TripDecoder for GatedDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<TripRecord, TripError> {
        let _ = self.entered.send(());
        let _ = self.gate.lock().expect("gate lock").recv();
        JsonTripDecoder.decode(bytes)
    }
}

/// A running dispatcher over a temporary history directory
pub struct Harness {
    pub dir: TempDir,
    pub bus: Arc<ActionBus>,
    pub handle: DispatcherHandle,
    sent: mpsc::UnboundedReceiver<Sent>,
    failures: Option<mpsc::UnboundedReceiver<Failure>>,
}

impl Harness {
    /// Dispatcher that reports failures to the harness
    pub fn start() -> Self {
        Self::build(DispatcherConfig::default(), true, Vec::new(), Arc::new(JsonTripDecoder))
    }

    /// Dispatcher using its own reporter, chosen by `config`
    pub fn with_config(config: DispatcherConfig) -> Self {
        Self::build(config, false, Vec::new(), Arc::new(JsonTripDecoder))
    }

    /// Dispatcher whose transport rejects the given peers
    pub fn with_offline(offline: Vec<PeerId>) -> Self {
        Self::build(DispatcherConfig::default(), true, offline, Arc::new(JsonTripDecoder))
    }

    /// Dispatcher converting trips with `decoder`
    pub fn with_decoder(decoder: Arc<dyn TripDecoder>) -> Self {
        Self::build(DispatcherConfig::default(), true, Vec::new(), decoder)
    }

    fn build(
        config: DispatcherConfig,
        record_failures: bool,
        offline: Vec<PeerId>,
        decoder: Arc<dyn TripDecoder>,
    ) -> Self {
        let _ = tracing_subscriber::fmt::try_init();

        let dir = tempfile::tempdir().expect("create history dir");
        let (sent_tx, sent) = mpsc::unbounded_channel();
        let transport = Arc::new(RecordingTransport { tx: sent_tx, offline });

        let deps = DispatcherDeps {
            history: HistoryStore::new(dir.path()),
            transport,
            decoder,
        };

        let mut dispatcher = Dispatcher::new(deps, config);
        let mut failures = None;
        if record_failures {
            let (failure_tx, failure_rx) = mpsc::unbounded_channel();
            dispatcher = dispatcher.with_reporter(Arc::new(RecordingReporter { tx: failure_tx }));
            failures = Some(failure_rx);
        }

        let bus = Arc::new(ActionBus::new());
        let handle = dispatcher.start(&bus);

        Self { dir, bus, handle, sent, failures }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Next response handed to the transport
    pub async fn next_sent(&mut self) -> Sent {
        timeout(WAIT, self.sent.recv())
            .await
            .expect("timeout waiting for a response")
            .expect("transport channel closed")
    }

    /// Next failure handed to the reporter
    pub async fn next_failure(&mut self) -> Failure {
        let failures = self.failures.as_mut().expect("harness does not record failures");
        timeout(WAIT, failures.recv())
            .await
            .expect("timeout waiting for a failure")
            .expect("reporter channel closed")
    }

    /// Whether nothing has been sent so far
    pub fn nothing_sent(&mut self) -> bool {
        self.sent.try_recv().is_err()
    }
}

/// JSON history record with `points` fixes along a line
pub fn trip_json(name: &str, points: usize) -> Vec<u8> {
    let locations: Vec<serde_json::Value> = (0..points)
        .map(|i| {
            serde_json::json!({
                "latitude": 48.0 + i as f64 * 0.001,
                "longitude": 11.0 + i as f64 * 0.001,
                "altitude": 500.0,
                "timestamp": format!("2024-06-01T10:00:{:02}Z", i % 60),
            })
        })
        .collect();

    serde_json::to_vec(&serde_json::json!({
        "name": name,
        "started_at": "2024-06-01T10:00:00Z",
        "locations": locations,
    }))
    .expect("serialize trip")
}
