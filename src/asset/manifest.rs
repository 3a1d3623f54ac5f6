//! Asset manifest
//!
//! Maps logical keys to GLB file names. File names are case and space
//! sensitive; unlisted keys resolve to `<key>.glb`.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AssetLoadError, ConfigError};

const EMBEDDED_MANIFEST: &str = include_str!("../../assets/manifest.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub key: String,
    /// Explicit file name when it differs from `<key>.glb`
    #[serde(default)]
    pub file: Option<String>,
    /// Assets in the same family can be replayed on one mounted model
    #[serde(default)]
    pub family: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    pub base: ManifestEntry,
    pub animations: Vec<ManifestEntry>,
}

impl AssetManifest {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The manifest shipped in `assets/manifest.json`.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_json(EMBEDDED_MANIFEST)
    }

    fn entry(&self, key: &str) -> Option<&ManifestEntry> {
        std::iter::once(&self.base)
            .chain(self.animations.iter())
            .find(|e| e.key == key)
    }

    pub fn file_name(&self, key: &str) -> String {
        self.entry(key)
            .and_then(|e| e.file.clone())
            .unwrap_or_else(|| format!("{key}.glb"))
    }

    pub fn family(&self, key: &str) -> Option<&str> {
        self.entry(key).and_then(|e| e.family.as_deref())
    }

    /// Absolute, percent-encoded URL of the file for `key`.
    pub fn url(&self, base: &Url, key: &str) -> Result<Url, AssetLoadError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| AssetLoadError::Network {
                url: base.to_string(),
                reason: "base URL cannot hold a path".to_string(),
            })?
            .pop_if_empty()
            .push(&self.file_name(key));
        Ok(url)
    }
}
