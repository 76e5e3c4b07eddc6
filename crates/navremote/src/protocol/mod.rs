//! Protocol module for NavRemote.
//!
//! This module contains the request/response types exchanged with peers and
//! the frame codec used by the TCP transport.

pub mod codec;
pub mod types;

pub use codec::{encode_frame, read_frame, write_frame, CodecError, MAX_FRAME_LEN};
pub use types::{
    ActionKind, DownloadFileRequest, DownloadGpxRequest, HistoryFileRef, ListFilesRequest, Request,
    Response,
};

/// Version of the action protocol spoken over the transport
pub const PROTOCOL_VERSION: u16 = 1;
