//! Action handlers for NavRemote.
//!
//! Each handler resolves one request against the history directory and
//! builds the response. Delivery and failure reporting are left to the
//! dispatcher.

pub mod download_file;
pub mod download_gpx;
pub mod list_files;
pub mod naming;

pub use download_file::handle_download_file;
pub use download_gpx::handle_download_gpx;
pub use list_files::handle_list_files;
pub use naming::{gpx_file_name, FALLBACK_GPX_NAME};
