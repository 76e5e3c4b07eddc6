use tracing::debug;

use crate::error::DispatchError;
use crate::history::HistoryStore;
use crate::protocol::{ListFilesRequest, Response};

/// List every non-hidden file in the history directory
pub async fn handle_list_files(
    history: &HistoryStore,
    _request: &ListFilesRequest,
) -> Result<Response, DispatchError> {
    let files = history.list().await?;
    debug!("Listed {} history files in {}", files.len(), history.root().display());
    Ok(Response::FilesList { files })
}
