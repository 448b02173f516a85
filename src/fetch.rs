use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

/// Download the dataset to `path` if it is not already cached.
///
/// Presence of the file alone suppresses the download; there is no
/// checksum or freshness check. A failed download is logged and the
/// caller proceeds against whatever is on disk, so a truly missing file
/// surfaces later as a load error.
pub fn download_if_missing(url: &str, path: &Path) {
    if path.exists() {
        info!("{} already exists, skipping download", path.display());
        return;
    }

    info!("downloading {} from {}", path.display(), url);
    let client = match reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            warn!("could not build HTTP client: {}", e);
            return;
        }
    };

    let body = client
        .get(url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.bytes());

    match body {
        Ok(bytes) => {
            if let Err(e) = fs::write(path, &bytes) {
                warn!("failed to write {}: {}", path.display(), e);
            } else {
                info!("downloaded {} ({} bytes)", path.display(), bytes.len());
            }
        }
        Err(e) => {
            warn!("failed to download {}: {}", url, e);
        }
    }
}
