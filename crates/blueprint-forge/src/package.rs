//! Packaging and unconditional cleanup.
//!
//! The one operation in the system with finally-style semantics: whatever
//! happens to archiving or delivery, the sandbox, the archive file, the
//! store record, and the build lock are all released before returning.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{info, warn};

use crate::naming;
use crate::store::BlueprintStore;
use crate::transport::{ChatId, Notifier};

/// Archive the sandbox, deliver it, then clean everything up.
///
/// Returns the delivery result; cleanup has already run by the time this
/// returns, on every path.
pub async fn package_and_cleanup(
    notifier: &dyn Notifier,
    chat: ChatId,
    store: &BlueprintStore,
    session: &str,
    working_dir: &Path,
    project_name: &str,
    caption: &str,
) -> Result<()> {
    let stem = naming::archive_stem(project_name);
    let archive_path = working_dir
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{stem}.tar.gz"));

    let result = archive_and_send(notifier, chat, working_dir, &archive_path, caption).await;

    // Unconditional cleanup: sandbox, archive, store record, build lock.
    if let Err(e) = tokio::fs::remove_dir_all(working_dir).await {
        warn!(dir = %working_dir.display(), "sandbox cleanup failed: {e}");
    }
    if archive_path.exists() {
        if let Err(e) = tokio::fs::remove_file(&archive_path).await {
            warn!(archive = %archive_path.display(), "archive cleanup failed: {e}");
        }
    }
    store.delete(session);
    store.unlock(session);

    match &result {
        Ok(()) => info!(session, archive = %stem, "project delivered and cleaned up"),
        Err(e) => warn!(session, "delivery failed (cleanup still ran): {e}"),
    }
    result
}

async fn archive_and_send(
    notifier: &dyn Notifier,
    chat: ChatId,
    working_dir: &Path,
    archive_path: &Path,
    caption: &str,
) -> Result<()> {
    let src = working_dir.to_path_buf();
    let dest = archive_path.to_path_buf();
    tokio::task::spawn_blocking(move || create_archive(&src, &dest))
        .await
        .context("archive task panicked")??;

    notifier
        .send_file(chat, archive_path, caption)
        .await
        .context("archive delivery failed")
}

/// Gzip-tar the whole sandbox tree into one file. Blocking; runs under
/// `spawn_blocking`.
fn create_archive(src: &Path, dest: &Path) -> Result<()> {
    let file = File::create(dest)
        .with_context(|| format!("failed to create archive {}", dest.display()))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder
        .append_dir_all(".", src)
        .context("failed to add sandbox tree to archive")?;
    builder
        .into_inner()
        .context("failed to finish tar stream")?
        .finish()
        .context("failed to finish gzip stream")?;
    Ok(())
}
