//! Asset downloader
//!
//! A thin layer over the fetcher that lands a payload on disk. The write is
//! staged next to the destination and renamed into place, so a failed
//! download never leaves a partial file that looks complete.

use crate::crawler::Fetcher;
use crate::Result;
use std::path::Path;

/// Downloads `url` to `dest`
///
/// Delegates the network work (admission, retries) to the fetcher; a
/// terminal fetch failure is returned as-is with no extra retry layer.
///
/// Existence checks are the caller's job: callers are expected to skip any
/// destination that is already present, this function always overwrites.
pub async fn download(fetcher: &Fetcher, url: &str, dest: &Path) -> Result<()> {
    let bytes = fetcher.fetch(url).await?;

    let file_name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download");
    let part = dest.with_file_name(format!("{file_name}.part"));

    if let Err(e) = tokio::fs::write(&part, &bytes).await {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(e.into());
    }

    if let Err(e) = tokio::fs::rename(&part, dest).await {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(e.into());
    }

    tracing::debug!("Downloaded {} ({} bytes) to {}", url, bytes.len(), dest.display());
    Ok(())
}
