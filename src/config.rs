//! Tool configuration
//!
//! Everything has a default, so a config file only needs the keys it changes.
//! Command-line flags are applied on top by `main`.

use crate::fetch::{default_sources, BundleSource};
use crate::scan::ScanOptions;
use crate::settings::default_settings_libraries;
use crate::theme::ThemeConfig;
use crate::RenderOptions;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::thread;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Checkout of the learn guide repository
    pub learn_repo: PathBuf,
    pub output_dir: PathBuf,
    /// Where bundle data and tag files are cached
    pub cache_dir: PathBuf,
    /// Worker threads; defaults to the available parallelism
    pub jobs: Option<usize>,
    pub render: RenderOptions,
    pub scan: ScanOptions,
    pub theme: ThemeConfig,
    /// Libraries that imply a `settings.toml` on the board
    pub settings_libraries: Vec<String>,
    pub bundles: Vec<BundleSource>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            learn_repo: PathBuf::from("../Adafruit_Learning_System_Guides/"),
            output_dir: PathBuf::from("generated_images"),
            cache_dir: PathBuf::from("."),
            jobs: None,
            render: RenderOptions::default(),
            scan: ScanOptions::default(),
            theme: ThemeConfig::default(),
            settings_libraries: default_settings_libraries(),
            bundles: default_sources(),
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid configuration")
    }

    /// Load from `path`, or use the defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Failed to load {}", path.display()))
    }

    pub fn jobs(&self) -> usize {
        match self.jobs {
            Some(jobs) if jobs > 0 => jobs,
            _ => thread::available_parallelism().map_or(1, NonZeroUsize::get),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output_dir, PathBuf::from("generated_images"));
        assert_eq!(config.render.width, 800);
        assert_eq!(config.scan.subdirectory_entry_limit, 9);
        assert_eq!(config.bundles.len(), 2);
        assert_eq!(config.bundles[0].data_file, PathBuf::from("latest_bundle_data.json"));
        assert!(config.settings_libraries.contains(&"adafruit_requests".to_string()));
        assert!(config.jobs() >= 1);
    }

    #[test]
    fn test_partial_json() {
        let config = Config::from_json(
            r##"{
                "output_dir": "out",
                "jobs": 3,
                "render": { "padding": 10 },
                "theme": { "background": "#000000" },
                "scan": { "subdirectory_entry_limit": 4 }
            }"##,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.jobs(), 3);
        assert_eq!(config.render.padding, 10);
        assert_eq!(config.render.line_spacing, 28);
        assert_eq!(config.theme.background, "#000000");
        assert_eq!(config.theme.text, "#B0B0B0");
        assert_eq!(config.scan.subdirectory_entry_limit, 4);
        assert!(config.scan.shown_extensions.contains(&"py".to_string()));
    }

    #[test]
    fn test_zero_jobs_means_default() {
        let config = Config::from_json(r#"{"jobs": 0}"#).unwrap();
        assert!(config.jobs() >= 1);
    }

    #[test]
    fn test_custom_bundles() {
        let config = Config::from_json(
            r#"{"bundles": [{
                "name": "local",
                "releases_url": "https://example.invalid/releases/latest",
                "asset_url": "https://example.invalid/{tag}.json",
                "data_file": "local.json",
                "tag_file": "local_tag.json"
            }]}"#,
        )
        .unwrap();
        assert_eq!(config.bundles.len(), 1);
        assert_eq!(config.bundles[0].name, "local");
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::from_json(r#"{"jobs": "many"}"#).is_err());
    }

    #[test]
    fn test_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cptree.json");
        fs::write(&path, r#"{"cache_dir": "cache"}"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.cache_dir, PathBuf::from("cache"));
        assert!(Config::load(Some(&dir.path().join("missing.json"))).is_err());
        assert_eq!(Config::load(None).unwrap().render.width, 800);
    }
}
