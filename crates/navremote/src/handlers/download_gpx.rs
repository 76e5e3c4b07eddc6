use std::sync::Arc;

use crate::error::DispatchError;
use crate::history::{HistoryError, HistoryStore};
use crate::protocol::{DownloadGpxRequest, Response};
use crate::trip::TripDecoder;

use super::naming::gpx_file_name;

/// Convert a history file to GPX and return the document
pub async fn handle_download_gpx(
    history: &HistoryStore,
    decoder: Arc<dyn TripDecoder>,
    request: &DownloadGpxRequest,
) -> Result<Response, DispatchError> {
    let file = &request.history_file;

    // Checked before reading so a vanished file never reaches the decoder.
    if !history.exists(file).await {
        return Err(HistoryError::Missing(file.path_buf()).into());
    }

    let bytes = history.read(file).await?;
    let gpx = tokio::task::spawn_blocking(move || {
        let record = decoder.decode(&bytes)?;
        decoder.encode_gpx(&record)
    })
    .await??;

    Ok(Response::GpxFile { name: gpx_file_name(&file.name), data: gpx.into_bytes() })
}
