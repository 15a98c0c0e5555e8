//! Per-extension search results and their on-disk cache.
//!
//! The cache is a JSON array with one `{"name", "version", "url"}` object per
//! extension. It is written once, after every extension has been searched,
//! and replaced atomically so an interrupted run never leaves a partial file.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::core::{Error, Result};

/// Search result for one extension.
///
/// `version` and `url` are either both present or both absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct ExtensionRecord {
    name: String,
    version: Option<String>,
    url: Option<String>,
}

/// Unchecked record shape as it appears in the cache file.
#[derive(Deserialize)]
struct RawRecord {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl TryFrom<RawRecord> for ExtensionRecord {
    type Error = String;

    fn try_from(raw: RawRecord) -> std::result::Result<Self, Self::Error> {
        match (raw.version, raw.url) {
            (Some(version), Some(url)) => Ok(Self::resolved(raw.name, version, url)),
            (None, None) => Ok(Self::unresolved(raw.name)),
            _ => Err(format!("record '{}' has only one of version and url", raw.name)),
        }
    }
}

impl ExtensionRecord {
    /// A record with a compatible version and its download URL.
    pub fn resolved(
        name: impl Into<String>,
        version: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), version: Some(version.into()), url: Some(url.into()) }
    }

    /// A record for an extension with no compatible version.
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self { name: name.into(), version: None, url: None }
    }

    /// Extension identifier as listed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compatible version, if one was found.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Download URL, if a version was found.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// `(version, url)` when resolved.
    pub fn resolution(&self) -> Option<(&str, &str)> {
        self.version().zip(self.url())
    }

    /// Whether a compatible version was found.
    pub fn is_resolved(&self) -> bool {
        self.version.is_some()
    }
}

/// The results cache file.
#[derive(Debug, Clone)]
pub struct ResultsCache {
    path: PathBuf,
}

impl ResultsCache {
    /// Cache stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a cache file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read every record back.
    pub fn load(&self) -> Result<Vec<ExtensionRecord>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| Error::cache(&self.path, e))?;
        serde_json::from_str(&content).map_err(|e| Error::cache(&self.path, e))
    }

    /// Replace the cache with `records`.
    pub fn save(&self, records: &[ExtensionRecord]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| Error::cache(&self.path, e))?;

        let content =
            serde_json::to_string_pretty(records).map_err(|e| Error::cache(&self.path, e))?;

        let mut file = NamedTempFile::new_in(dir).map_err(|e| Error::cache(&self.path, e))?;
        file.write_all(content.as_bytes()).map_err(|e| Error::cache(&self.path, e))?;
        file.persist(&self.path).map_err(|e| Error::cache(&self.path, e.error))?;

        tracing::debug!(path = %self.path.display(), records = records.len(), "Saved results cache");
        Ok(())
    }

    /// Delete the cache file. Returns whether one existed.
    pub fn clear(&self) -> Result<bool> {
        if !self.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path).map_err(|e| Error::cache(&self.path, e))?;
        Ok(true)
    }
}
