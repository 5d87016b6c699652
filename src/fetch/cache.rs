//! Local cache for downloaded source data, with a provenance sidecar.
//!
//! A cached download `<dir>/<file>` is accompanied by
//! `<dir>/<file>.meta.json` recording where and when it was retrieved.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{HttpClient, fetch_bytes};

/// Provenance record written next to each cached download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: String,
    pub retrieved_at: DateTime<Utc>,
    pub bytes: usize,
    pub tool: String,
    pub tool_version: String,
}

pub struct Cache {
    dir: PathBuf,
    refresh: bool,
}

impl Cache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            refresh: false,
        }
    }

    /// Ignore existing cached copies and download again.
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a URL is cached under: the last path segment, query stripped.
    pub fn path_for(&self, url: &str) -> PathBuf {
        let trimmed = url.split(['?', '#']).next().unwrap_or(url);
        let name = trimmed
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or("download")
            .replace(|c: char| !(c.is_ascii_alphanumeric() || "._-".contains(c)), "_");
        self.dir.join(name)
    }

    fn meta_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(".meta.json");
        path.with_file_name(name)
    }

    /// Reads the provenance sidecar for a cached URL, if present.
    pub fn provenance(&self, url: &str) -> Result<Option<Provenance>> {
        let meta = Self::meta_path(&self.path_for(url));
        if !meta.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&meta)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Returns the bytes of `source`, a local path or an `http(s)` URL.
    ///
    /// URLs are served from the cache when a copy recorded for that exact
    /// URL exists; otherwise they are downloaded, stored, and a provenance
    /// sidecar is written.
    #[tracing::instrument(skip(self, client))]
    pub async fn load_source<C: HttpClient>(&self, client: &C, source: &str) -> Result<Vec<u8>> {
        if !source.starts_with("http://") && !source.starts_with("https://") {
            return fs::read(source).with_context(|| format!("Failed to read {source}"));
        }

        let path = self.path_for(source);
        if !self.refresh {
            if self.is_cached(source, &path) {
                info!(path = %path.display(), "Using cached source");
                return fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()));
            }
            if path.exists() {
                warn!(path = %path.display(), "Cached copy does not match its provenance; downloading again");
            }
        }

        info!(url = source, "Downloading source");
        let bytes = fetch_bytes(client, source).await?;
        self.store(source, &path, &bytes)?;

        Ok(bytes)
    }

    /// A cached file counts only when its sidecar names `url` and records
    /// the file's current length.
    fn is_cached(&self, url: &str, path: &Path) -> bool {
        let Ok(Some(provenance)) = self.provenance(url) else {
            return false;
        };
        let Ok(meta) = fs::metadata(path) else {
            return false;
        };
        provenance.source == url && meta.len() == provenance.bytes as u64
    }

    /// Writes `bytes` next to `path` and renames it into place.
    fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(".part");
        let tmp = path.with_file_name(name);

        fs::write(&tmp, bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to move {} into place", path.display()))?;
        Ok(())
    }

    /// Stores a download. The sidecar goes last, so an interrupted store
    /// never leaves a file that passes [`Self::is_cached`].
    fn store(&self, url: &str, path: &Path, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let meta = Self::meta_path(path);
        if meta.exists() {
            fs::remove_file(&meta)?;
        }
        Self::write_atomic(path, bytes)?;

        let provenance = Provenance {
            source: url.to_string(),
            retrieved_at: Utc::now(),
            bytes: bytes.len(),
            tool: env!("CARGO_PKG_NAME").to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        };
        Self::write_atomic(&meta, serde_json::to_string_pretty(&provenance)?.as_bytes())?;

        debug!(path = %path.display(), bytes = bytes.len(), "Cached source");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct OfflineClient;

    /// Answers every request with a fixed status and body.
    struct StubClient {
        status: u16,
        body: &'static [u8],
        calls: AtomicUsize,
    }

    impl StubClient {
        fn new(status: u16, body: &'static [u8]) -> Self {
            Self {
                status,
                body,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpClient for StubClient {
        async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let resp = http::Response::builder()
                .status(self.status)
                .body(self.body.to_vec())
                .unwrap();
            Ok(reqwest::Response::from(resp))
        }
    }

    #[async_trait]
    impl HttpClient for OfflineClient {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            panic!("unexpected request to {}", req.url());
        }
    }

    const URL: &str = "https://www2.census.gov/programs-surveys/cfs/datasets/2017/CFS_2017_PUF_CSV.zip";

    #[test]
    fn test_path_for_url() {
        let cache = Cache::new("cache");
        assert_eq!(
            cache.path_for(URL),
            PathBuf::from("cache/CFS_2017_PUF_CSV.zip")
        );
        assert_eq!(
            cache.path_for("https://example.org/data/file.csv?token=a b"),
            PathBuf::from("cache/file.csv")
        );
    }

    #[tokio::test]
    async fn test_local_path_is_read_directly() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("puf.csv");
        fs::write(&file, b"SCTG,MODE\n").unwrap();

        let cache = Cache::new(dir.path().join("cache"));
        let bytes = cache
            .load_source(&OfflineClient, file.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(bytes, b"SCTG,MODE\n");
    }

    #[tokio::test]
    async fn test_cached_url_skips_download() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        cache.store(URL, &cache.path_for(URL), b"cached").unwrap();

        let bytes = cache.load_source(&OfflineClient, URL).await.unwrap();
        assert_eq!(bytes, b"cached");

        let provenance = cache.provenance(URL).unwrap().unwrap();
        assert_eq!(provenance.source, URL);
        assert_eq!(provenance.bytes, 6);
    }

    #[test]
    fn test_provenance_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Cache::new(dir.path()).provenance(URL).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_download_is_stored_with_provenance() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path().join("cache"));
        let client = StubClient::new(200, b"SCTG,MODE\n");

        let bytes = cache.load_source(&client, URL).await.unwrap();
        assert_eq!(bytes, b"SCTG,MODE\n");
        assert_eq!(client.calls(), 1);
        assert_eq!(fs::read(cache.path_for(URL)).unwrap(), b"SCTG,MODE\n");

        let provenance = cache.provenance(URL).unwrap().unwrap();
        assert_eq!(provenance.source, URL);
        assert_eq!(provenance.bytes, 10);
        assert_eq!(provenance.tool, "commodity_transport");

        // second load is a cache hit
        let again = cache.load_source(&OfflineClient, URL).await.unwrap();
        assert_eq!(again, bytes);
    }

    #[tokio::test]
    async fn test_refresh_downloads_over_existing_copy() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path()).with_refresh(true);
        cache.store(URL, &cache.path_for(URL), b"old").unwrap();

        let client = StubClient::new(200, b"new");
        let bytes = cache.load_source(&client, URL).await.unwrap();

        assert_eq!(bytes, b"new");
        assert_eq!(client.calls(), 1);
        assert_eq!(fs::read(cache.path_for(URL)).unwrap(), b"new");
        assert_eq!(cache.provenance(URL).unwrap().unwrap().bytes, 3);
    }

    #[tokio::test]
    async fn test_same_file_name_from_other_url_is_not_reused() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        let old_url = "https://example.org/2012/CFS_PUF_CSV.zip";
        let new_url = "https://example.org/2017/CFS_PUF_CSV.zip";
        assert_eq!(cache.path_for(old_url), cache.path_for(new_url));
        cache.store(old_url, &cache.path_for(old_url), b"from-2012").unwrap();

        let client = StubClient::new(200, b"from-2017");
        let bytes = cache.load_source(&client, new_url).await.unwrap();

        assert_eq!(bytes, b"from-2017");
        assert_eq!(client.calls(), 1);
        assert_eq!(cache.provenance(new_url).unwrap().unwrap().source, new_url);
    }

    #[tokio::test]
    async fn test_file_without_provenance_is_downloaded_again() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        fs::write(cache.path_for(URL), b"PK\x03\x04trunc").unwrap();

        let client = StubClient::new(200, b"complete");
        let bytes = cache.load_source(&client, URL).await.unwrap();

        assert_eq!(bytes, b"complete");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_length_mismatch_is_downloaded_again() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        cache.store(URL, &cache.path_for(URL), b"complete").unwrap();
        fs::write(cache.path_for(URL), b"comp").unwrap();

        let client = StubClient::new(200, b"complete");
        assert_eq!(cache.load_source(&client, URL).await.unwrap(), b"complete");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_error_status_fails_and_caches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path().join("cache"));
        let client = StubClient::new(404, b"not found");

        let err = fetch_bytes(&client, URL).await.unwrap_err();
        assert!(err.to_string().contains("404"));

        assert!(cache.load_source(&client, URL).await.is_err());
        assert!(!cache.path_for(URL).exists());
        assert!(cache.provenance(URL).unwrap().is_none());
    }
}
