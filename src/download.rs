use std::path::{Path, PathBuf};

use anyhow::Result;
use reqwest::{Client, Url};
use tracing::info;

use crate::config::ScanConfig;
use crate::error::IngestError;
use crate::resolver::last_path_segment;

/// Rewrite a storage-browser file URL onto the raw storage host. The browser
/// proxies downloads through its UI; the direct host is much faster for
/// large files.
pub fn rewrite_to_storage(config: &ScanConfig, url: &Url) -> String {
    let browser_gcs = format!("{}/gcs", config.browser_base);
    url.as_str().replace(&browser_gcs, &config.storage_base)
}

/// Fetch `url` and write the bytes to `<dir>/<basename>`, returning the
/// destination path.
pub async fn download_file(client: &Client, dir: &Path, url: &str) -> Result<PathBuf> {
    info!(url, "downloading file");
    let fetch_failed = |source| IngestError::FetchFailed {
        url: url.to_string(),
        source,
    };
    let bytes = client
        .get(url)
        .send()
        .await
        .map_err(fetch_failed)?
        .error_for_status()
        .map_err(fetch_failed)?
        .bytes()
        .await
        .map_err(fetch_failed)?;

    let dest = dir.join(last_path_segment(url));
    std::fs::write(&dest, &bytes)?;
    info!(size_kb = bytes.len() / 1024, dest = %dest.display(), "download complete");
    Ok(dest)
}
