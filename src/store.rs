use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::post::Post;

/// Write `posts` to `path` as pretty-printed JSON.
///
/// If the first write fails (typically because the parent directory does not
/// exist yet), the parent directories are created and the write is retried
/// once.
///
/// # Errors
///
/// Returns an error if serialization fails, the directories cannot be
/// created, or the retried write fails.
pub async fn save_posts(path: &Path, posts: &[Post]) -> Result<()> {
    let json = serde_json::to_vec_pretty(posts).context("Failed to encode posts")?;

    if let Err(e) = tokio::fs::write(path, &json).await {
        debug!(path = %path.display(), error = %e, "Initial write failed, creating parent directory");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }

        tokio::fs::write(path, &json)
            .await
            .with_context(|| format!("Failed to write output file: {}", path.display()))?;
    }

    info!(path = %path.display(), count = posts.len(), "Saved posts");
    Ok(())
}

/// Read posts previously written by [`save_posts`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a post collection.
pub async fn load_posts(path: &Path) -> Result<Vec<Post>> {
    let json = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read posts file: {}", path.display()))?;

    serde_json::from_slice(&json)
        .with_context(|| format!("Failed to decode posts file: {}", path.display()))
}
