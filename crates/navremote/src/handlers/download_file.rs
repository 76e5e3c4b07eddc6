use crate::error::DispatchError;
use crate::history::HistoryStore;
use crate::protocol::{DownloadFileRequest, Response};

/// Read a history file and return it unchanged
pub async fn handle_download_file(
    history: &HistoryStore,
    request: &DownloadFileRequest,
) -> Result<Response, DispatchError> {
    let file = &request.history_file;
    let data = history.read(file).await?;
    Ok(Response::RawFile { name: file.name.clone(), data })
}
