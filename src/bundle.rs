//! Library bundle metadata
//!
//! A bundle data file maps every library name to its metadata. Only two fields
//! matter here: whether the library ships as a package (a folder) or a single
//! `.mpy` file, and which other libraries it depends on.

use crate::fetch::BundleSource;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BundleEntry {
    /// Filled in from the map key
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "package", default)]
    pub is_package: bool,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl BundleEntry {
    pub fn package(name: &str, dependencies: &[&str]) -> Self {
        Self::new(name, true, dependencies)
    }

    pub fn file(name: &str, dependencies: &[&str]) -> Self {
        Self::new(name, false, dependencies)
    }

    fn new(name: &str, is_package: bool, dependencies: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            is_package,
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// One named bundle (e.g. "adafruit" or "community")
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    pub name: String,
    entries: HashMap<String, BundleEntry>,
}

impl Bundle {
    pub fn from_json(name: &str, json: &str) -> Result<Self> {
        let mut entries: HashMap<String, BundleEntry> = serde_json::from_str(json)
            .with_context(|| format!("Failed to parse {} bundle data", name))?;
        for (key, entry) in entries.iter_mut() {
            entry.name = key.clone();
        }
        Ok(Self {
            name: name.to_string(),
            entries,
        })
    }

    pub fn load(name: &str, path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read bundle data: {}", path.display()))?;
        let bundle = Self::from_json(name, &json)?;
        if bundle.is_empty() {
            warn!(bundle = name, path = %path.display(), "Bundle data lists no libraries");
        }
        debug!(bundle = name, libraries = bundle.len(), "Loaded bundle data");
        Ok(bundle)
    }

    pub fn from_entries(name: &str, entries: impl IntoIterator<Item = BundleEntry>) -> Self {
        Self {
            name: name.to_string(),
            entries: entries.into_iter().map(|e| (e.name.clone(), e)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&BundleEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All loaded bundles. The first is the primary bundle; lookups search in order.
#[derive(Debug, Clone, Default)]
pub struct LibraryIndex {
    bundles: Vec<Bundle>,
}

impl LibraryIndex {
    pub fn new(bundles: Vec<Bundle>) -> Self {
        Self { bundles }
    }

    /// Load every configured bundle's cached data file
    pub fn load(sources: &[BundleSource], cache_dir: &Path) -> Result<Self> {
        let bundles = sources
            .iter()
            .map(|source| {
                Bundle::load(&source.name, &cache_dir.join(&source.data_file)).with_context(|| {
                    format!("No usable data for the {} bundle; fetch it first", source.name)
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { bundles })
    }

    pub fn get(&self, name: &str) -> Option<&BundleEntry> {
        self.bundles.iter().find_map(|bundle| bundle.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bundles.iter().any(|bundle| bundle.contains(name))
    }

    pub fn contains_primary(&self, name: &str) -> bool {
        self.bundles.first().is_some_and(|bundle| bundle.contains(name))
    }

    pub fn library_count(&self) -> usize {
        self.bundles.iter().map(Bundle::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const BUNDLE_JSON: &str = r#"{
        "adafruit_requests": {
            "package": false,
            "pypi_name": "adafruit-circuitpython-requests",
            "version": "4.1.3",
            "dependencies": ["adafruit_connection_manager"]
        },
        "adafruit_connection_manager": {
            "package": false,
            "dependencies": []
        },
        "adafruit_display_text": {
            "package": true,
            "dependencies": ["adafruit_bitmap_font"]
        }
    }"#;

    #[test]
    fn test_parse_bundle_json() {
        let bundle = Bundle::from_json("adafruit", BUNDLE_JSON).unwrap();
        assert_eq!(bundle.len(), 3);

        let requests = bundle.get("adafruit_requests").unwrap();
        assert_eq!(requests.name, "adafruit_requests");
        assert!(!requests.is_package);
        assert_eq!(requests.dependencies, vec!["adafruit_connection_manager"]);

        assert!(bundle.get("adafruit_display_text").unwrap().is_package);
    }

    #[test]
    fn test_missing_fields_default() {
        let bundle = Bundle::from_json("community", r#"{"circuitpython_nrf24l01": {}}"#).unwrap();
        let entry = bundle.get("circuitpython_nrf24l01").unwrap();
        assert!(!entry.is_package);
        assert!(entry.dependencies.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let err = Bundle::from_json("adafruit", "[1, 2").unwrap_err();
        assert!(err.to_string().contains("adafruit bundle data"));
    }

    #[test]
    fn test_index_lookup_order() {
        let primary = Bundle::from_entries("adafruit", [BundleEntry::file("shared", &[])]);
        let secondary = Bundle::from_entries(
            "community",
            [
                BundleEntry::package("shared", &["other"]),
                BundleEntry::package("community_only", &[]),
            ],
        );
        let index = LibraryIndex::new(vec![primary, secondary]);

        assert!(!index.get("shared").unwrap().is_package);
        assert!(index.contains("community_only"));
        assert!(!index.contains_primary("community_only"));
        assert!(index.contains_primary("shared"));
        assert!(!index.contains("missing"));
        assert_eq!(index.library_count(), 3);
    }

    #[test]
    fn test_load_from_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("primary.json"), BUNDLE_JSON).unwrap();

        let source = BundleSource {
            name: "adafruit".to_string(),
            releases_url: "https://example.invalid/releases/latest".to_string(),
            asset_url: "https://example.invalid/bundle-{tag}.json".to_string(),
            data_file: PathBuf::from("primary.json"),
            tag_file: PathBuf::from("primary_tag.json"),
        };
        let index = LibraryIndex::load(&[source.clone()], dir.path()).unwrap();
        assert!(index.contains_primary("adafruit_requests"));

        let missing = BundleSource {
            data_file: PathBuf::from("absent.json"),
            ..source
        };
        let err = LibraryIndex::load(&[missing], dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("absent.json"));
    }
}
