//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::{info, warn};

/// Ensure the upload directory exists (created if missing) and warn when the
/// directory holding a local SQLite database is absent.
pub async fn ensure_env(upload_dir: &Path, sqlite_path: Option<&Path>) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", upload_dir.display()))?;
    info!(upload_dir = %upload_dir.display(), "upload directory ready");

    if let Some(parent) = sqlite_path.and_then(Path::parent) {
        if !parent.as_os_str().is_empty() && tokio::fs::metadata(parent).await.is_err() {
            warn!(dir = %parent.display(), "sqlite directory missing; creating it");
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
