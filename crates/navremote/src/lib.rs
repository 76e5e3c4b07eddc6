//! NavRemote - remote access to a navigation session's trip history
//!
//! Peers on the local mesh send typed action requests (list the recorded
//! history files, download one raw, download one converted to GPX). The
//! [`ActionBus`] routes each request to a standing handler owned by the
//! [`Dispatcher`], which answers the requesting peer only.

pub mod bus;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod history;
pub mod protocol;
pub mod transport;
pub mod trip;

// Re-export main types
pub use bus::{Action, ActionBus, ActionRequest, Subscription};
pub use dispatcher::{
    Dispatcher, DispatcherConfig, DispatcherDeps, DispatcherHandle, ErrorReporter, LogReporter,
    NackReporter,
};
pub use error::{DispatchError, ErrorKind};
pub use history::{HistoryError, HistoryStore};
pub use protocol::{
    ActionKind, DownloadFileRequest, DownloadGpxRequest, HistoryFileRef, ListFilesRequest, Request,
    Response, PROTOCOL_VERSION,
};
pub use transport::{PeerId, TcpTransport, Transport, TransportError};
pub use trip::{JsonTripDecoder, TrackPoint, TripDecoder, TripError, TripRecord};
