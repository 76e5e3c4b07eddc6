//! Output names for converted files.

use std::path::Path;

/// Name used when the extension of the source file cannot be replaced
pub const FALLBACK_GPX_NAME: &str = "error.gpx";

const GPX_EXTENSION: &str = "gpx";

/// `trip1.bin` becomes `trip1.gpx`, `trip1` becomes `trip1.gpx`, and a trailing
/// `/` is ignored. A name with no file component (empty, `..`, `/`) becomes
/// [`FALLBACK_GPX_NAME`].
pub fn gpx_file_name(name: &str) -> String {
    replace_extension(name, GPX_EXTENSION).unwrap_or_else(|| FALLBACK_GPX_NAME.to_string())
}

fn replace_extension(name: &str, extension: &str) -> Option<String> {
    let path = Path::new(name);
    path.file_name()?;
    path.with_extension(extension).to_str().map(str::to_owned)
}
