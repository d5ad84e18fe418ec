//! Keeps the cached bundle data files current.
//!
//! The latest release tag is read from the redirect GitHub issues for a
//! repository's `releases/latest` page. When it is newer than the tag recorded
//! next to the cached data, the matching JSON asset is downloaded again.

use crate::template::expand_placeholders;
use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Where one bundle's metadata comes from and where it is cached
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BundleSource {
    pub name: String,
    /// `releases/latest` page; redirects to the newest tag
    pub releases_url: String,
    /// Asset URL template containing `{tag}`
    pub asset_url: String,
    pub data_file: PathBuf,
    pub tag_file: PathBuf,
}

impl BundleSource {
    pub fn adafruit() -> Self {
        Self {
            name: "adafruit".to_string(),
            releases_url: "https://github.com/adafruit/Adafruit_CircuitPython_Bundle/releases/latest"
                .to_string(),
            asset_url: "https://adafruit-circuit-python.s3.amazonaws.com/bundles/adafruit/adafruit-circuitpython-bundle-{tag}.json".to_string(),
            data_file: PathBuf::from("latest_bundle_data.json"),
            tag_file: PathBuf::from("latest_bundle_tag.json"),
        }
    }

    pub fn community() -> Self {
        Self {
            name: "community".to_string(),
            releases_url: "https://github.com/adafruit/CircuitPython_Community_Bundle/releases/latest"
                .to_string(),
            asset_url: "https://adafruit-circuit-python.s3.amazonaws.com/bundles/community/circuitpython-community-bundle-{tag}.json".to_string(),
            data_file: PathBuf::from("latest_community_bundle_data.json"),
            tag_file: PathBuf::from("latest_community_bundle_tag.json"),
        }
    }

    pub fn asset_url_for(&self, tag: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("tag".to_string(), tag.to_string());
        expand_placeholders(&self.asset_url, &vars)
            .with_context(|| format!("Invalid asset URL template for the {} bundle", self.name))
    }
}

pub fn default_sources() -> Vec<BundleSource> {
    vec![BundleSource::adafruit(), BundleSource::community()]
}

// === HTTP ===

pub trait ReleaseClient {
    /// URL the latest-release page points at
    fn latest_release_url(&self, url: &str) -> Result<String>;
    fn download(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpReleaseClient {
    head_client: Client,
    client: Client,
}

impl HttpReleaseClient {
    pub fn new() -> Result<Self> {
        let user_agent = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
        let head_client = Client::builder()
            .redirect(Policy::none())
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { head_client, client })
    }
}

impl ReleaseClient for HttpReleaseClient {
    fn latest_release_url(&self, url: &str) -> Result<String> {
        debug!(url, "Requesting redirect information");
        let response = self
            .head_client
            .head(url)
            .send()
            .with_context(|| format!("HEAD request failed: {}", url))?;

        if response.status().is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .ok_or_else(|| anyhow!("Redirect from {} has no Location header", url))?;
            let location = location
                .to_str()
                .with_context(|| format!("Redirect from {} has a non-ASCII Location", url))?;
            return Ok(location.to_string());
        }
        Ok(response.url().to_string())
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("GET request failed: {}", url))?
            .error_for_status()
            .with_context(|| format!("Download failed: {}", url))?;
        let bytes = response
            .bytes()
            .with_context(|| format!("Failed to read response body: {}", url))?;
        Ok(bytes.to_vec())
    }
}

// === Tags ===

/// Tag name is the last path segment of a release URL
pub fn tag_from_url(url: &str) -> &str {
    url.trim_end_matches('/').rsplit('/').next().unwrap_or(url)
}

/// Latest release tag for one bundle source, fetched at most once
#[derive(Debug, Default)]
pub struct LatestTag {
    tag: OnceCell<String>,
}

impl LatestTag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_fetch(&self, source: &BundleSource, client: &dyn ReleaseClient) -> Result<&str> {
        if let Some(tag) = self.tag.get() {
            return Ok(tag.as_str());
        }
        let url = client
            .latest_release_url(&source.releases_url)
            .with_context(|| format!("Failed to find the latest {} bundle release", source.name))?;
        let tag = tag_from_url(&url).to_string();
        info!(bundle = %source.name, tag = %tag, "Latest release");
        Ok(self.tag.get_or_init(|| tag).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub tag: String,
}

/// Tag recorded with the cached data, or "0" when there is none usable
pub fn read_cached_tag(path: &Path) -> String {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return "0".to_string(),
    };
    match serde_json::from_str::<TagRecord>(&content) {
        Ok(record) => record.tag,
        Err(err) => {
            warn!(path = %path.display(), "Could not parse cached tag file: {}", err);
            "0".to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleStatus {
    Updated { tag: String },
    UpToDate { tag: String },
}

/// Download the bundle data if the cache is missing or older than the latest release
pub fn ensure_latest_bundle(
    source: &BundleSource,
    latest: &LatestTag,
    client: &dyn ReleaseClient,
    cache_dir: &Path,
) -> Result<BundleStatus> {
    let tag = latest.get_or_fetch(source, client)?.to_string();
    let tag_path = cache_dir.join(&source.tag_file);
    let data_path = cache_dir.join(&source.data_file);
    let old_tag = read_cached_tag(&tag_path);

    if tag.as_str() <= old_tag.as_str() && data_path.is_file() {
        info!(bundle = %source.name, tag = %tag, "Library bundle up to date");
        return Ok(BundleStatus::UpToDate { tag });
    }

    info!(bundle = %source.name, old = %old_tag, new = %tag, "New bundle version available");
    let url = source.asset_url_for(&tag)?;
    let data = client.download(&url).map_err(|err| {
        error!(bundle = %source.name, "There was a problem downloading the bundle: {:#}", err);
        err
    })?;

    fs::write(&data_path, &data)
        .with_context(|| format!("Failed to write bundle data: {}", data_path.display()))?;
    let record = serde_json::to_string(&TagRecord { tag: tag.clone() })?;
    fs::write(&tag_path, record)
        .with_context(|| format!("Failed to write tag file: {}", tag_path.display()))?;

    Ok(BundleStatus::Updated { tag })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeClient {
        location: String,
        body: Option<Vec<u8>>,
        heads: RefCell<usize>,
        downloads: RefCell<Vec<String>>,
    }

    impl FakeClient {
        fn new(location: &str, body: Option<&str>) -> Self {
            Self {
                location: location.to_string(),
                body: body.map(|b| b.as_bytes().to_vec()),
                heads: RefCell::new(0),
                downloads: RefCell::new(Vec::new()),
            }
        }
    }

    impl ReleaseClient for FakeClient {
        fn latest_release_url(&self, _url: &str) -> Result<String> {
            *self.heads.borrow_mut() += 1;
            Ok(self.location.clone())
        }

        fn download(&self, url: &str) -> Result<Vec<u8>> {
            self.downloads.borrow_mut().push(url.to_string());
            self.body.clone().ok_or_else(|| anyhow!("404 Not Found"))
        }
    }

    fn source() -> BundleSource {
        BundleSource {
            name: "test".to_string(),
            releases_url: "https://example.invalid/releases/latest".to_string(),
            asset_url: "https://example.invalid/bundle-{tag}.json".to_string(),
            data_file: PathBuf::from("data.json"),
            tag_file: PathBuf::from("tag.json"),
        }
    }

    #[test]
    fn test_tag_from_url() {
        assert_eq!(tag_from_url("https://github.com/a/b/releases/tag/20240101"), "20240101");
        assert_eq!(tag_from_url("https://github.com/a/b/releases/tag/20240101/"), "20240101");
        assert_eq!(tag_from_url("20240101"), "20240101");
    }

    #[test]
    fn test_read_cached_tag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tag.json");
        assert_eq!(read_cached_tag(&path), "0");

        fs::write(&path, r#"{"tag": "20240101"}"#).unwrap();
        assert_eq!(read_cached_tag(&path), "20240101");

        fs::write(&path, "{not json").unwrap();
        assert_eq!(read_cached_tag(&path), "0");
    }

    #[test]
    fn test_latest_tag_fetched_once() {
        let client = FakeClient::new("https://example.invalid/releases/tag/20240202", None);
        let latest = LatestTag::new();
        assert_eq!(latest.get_or_fetch(&source(), &client).unwrap(), "20240202");
        assert_eq!(latest.get_or_fetch(&source(), &client).unwrap(), "20240202");
        assert_eq!(*client.heads.borrow(), 1);
    }

    #[test]
    fn test_downloads_newer_bundle() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tag.json"), r#"{"tag": "20240101"}"#).unwrap();
        let client = FakeClient::new("https://example.invalid/releases/tag/20240202", Some("{}"));

        let status = ensure_latest_bundle(&source(), &LatestTag::new(), &client, dir.path()).unwrap();
        assert_eq!(status, BundleStatus::Updated { tag: "20240202".to_string() });
        assert_eq!(
            *client.downloads.borrow(),
            vec!["https://example.invalid/bundle-20240202.json".to_string()]
        );
        assert_eq!(fs::read_to_string(dir.path().join("data.json")).unwrap(), "{}");
        assert_eq!(read_cached_tag(&dir.path().join("tag.json")), "20240202");
    }

    #[test]
    fn test_up_to_date_skips_download() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tag.json"), r#"{"tag": "20240202"}"#).unwrap();
        fs::write(dir.path().join("data.json"), "{}").unwrap();
        let client = FakeClient::new("https://example.invalid/releases/tag/20240202", Some("{}"));

        let status = ensure_latest_bundle(&source(), &LatestTag::new(), &client, dir.path()).unwrap();
        assert_eq!(status, BundleStatus::UpToDate { tag: "20240202".to_string() });
        assert!(client.downloads.borrow().is_empty());
    }

    #[test]
    fn test_missing_data_file_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tag.json"), r#"{"tag": "20240202"}"#).unwrap();
        let client = FakeClient::new("https://example.invalid/releases/tag/20240202", Some("{}"));

        let status = ensure_latest_bundle(&source(), &LatestTag::new(), &client, dir.path()).unwrap();
        assert!(matches!(status, BundleStatus::Updated { .. }));
    }

    #[test]
    fn test_failed_download_keeps_old_tag() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tag.json"), r#"{"tag": "20240101"}"#).unwrap();
        let client = FakeClient::new("https://example.invalid/releases/tag/20240202", None);

        let result = ensure_latest_bundle(&source(), &LatestTag::new(), &client, dir.path());
        assert!(result.is_err());
        assert_eq!(read_cached_tag(&dir.path().join("tag.json")), "20240101");
        assert!(!dir.path().join("data.json").exists());
    }

    #[test]
    fn test_default_sources_expand() {
        let url = BundleSource::adafruit().asset_url_for("20240101").unwrap();
        assert!(url.ends_with("adafruit-circuitpython-bundle-20240101.json"));
        assert_eq!(default_sources().len(), 2);
    }
}
