//! Protocol type definitions for NavRemote.
//!
//! This module defines the data structures used in the action protocol.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of action a peer can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ListFiles,
    DownloadFile,
    DownloadGpx,
}

impl ActionKind {
    /// All action kinds, in subscription order
    pub const ALL: [ActionKind; 3] =
        [ActionKind::ListFiles, ActionKind::DownloadFile, ActionKind::DownloadGpx];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::ListFiles => "list_files",
            ActionKind::DownloadFile => "download_file",
            ActionKind::DownloadGpx => "download_gpx",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded trip file in the history directory.
///
/// Always re-derived from the file system when listing; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFileRef {
    /// File name, without directory
    pub name: String,

    /// Full path of the file on the session's device
    pub path: String,

    /// Creation time (falls back to modification time)
    pub created_at: DateTime<Utc>,
}

impl HistoryFileRef {
    pub fn new(name: impl Into<String>, path: impl AsRef<Path>, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            path: path.as_ref().to_string_lossy().into_owned(),
            created_at,
        }
    }

    pub fn path_buf(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }
}

/// List every history file (no parameters)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilesRequest {}

/// Download a history file in its native binary form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadFileRequest {
    pub history_file: HistoryFileRef,
}

/// Download a history file converted to a GPX track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadGpxRequest {
    pub history_file: HistoryFileRef,
}

/// A request as it travels over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    ListFiles(ListFilesRequest),
    DownloadFile(DownloadFileRequest),
    DownloadGpx(DownloadGpxRequest),
}

impl Request {
    pub fn kind(&self) -> ActionKind {
        match self {
            Request::ListFiles(_) => ActionKind::ListFiles,
            Request::DownloadFile(_) => ActionKind::DownloadFile,
            Request::DownloadGpx(_) => ActionKind::DownloadGpx,
        }
    }
}

/// A response, always addressed to the peer that sent the request
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Every non-hidden history file, in directory enumeration order
    FilesList { files: Vec<HistoryFileRef> },

    /// Raw bytes of one history file
    RawFile {
        name: String,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },

    /// A history file converted to GPX
    GpxFile {
        name: String,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },

    /// Explicit failure notice, only sent when error responses are enabled
    Error { action: ActionKind, reason: String },
}

impl Response {
    /// Short name of the variant, for logging
    pub fn type_name(&self) -> &'static str {
        match self {
            Response::FilesList { .. } => "files_list",
            Response::RawFile { .. } => "raw_file",
            Response::GpxFile { .. } => "gpx_file",
            Response::Error { .. } => "error",
        }
    }
}

// File payloads can be megabytes; keep them out of debug logs.
impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::FilesList { files } => {
                f.debug_struct("FilesList").field("files", files).finish()
            },
            Response::RawFile { name, data } => f
                .debug_struct("RawFile")
                .field("name", name)
                .field("len", &data.len())
                .finish(),
            Response::GpxFile { name, data } => f
                .debug_struct("GpxFile")
                .field("name", name)
                .field("len", &data.len())
                .finish(),
            Response::Error { action, reason } => f
                .debug_struct("Error")
                .field("action", action)
                .field("reason", reason)
                .finish(),
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
    }
}
