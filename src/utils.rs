//! File system helpers for the output and log files.

use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

/// Create the parent directory of `path` if it does not exist yet.
///
/// A bare file name (no parent component) needs nothing.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).await?;
            debug!(parent = %parent.display(), "Output directory ready");
            Ok(())
        }
        _ => Ok(()),
    }
}
