//! Package manifest (`extension/package.json`) reading.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use serde::Deserialize;

use crate::core::{Error, Result};

/// Location of the manifest inside a `.vsix` archive.
pub const MANIFEST_ENTRY: &str = "extension/package.json";

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_PREALLOCATION: u64 = 1 << 20;

/// Capacity to reserve for an entry whose header claims `declared` bytes.
fn initial_capacity(declared: u64) -> usize {
    declared.min(MAX_PREALLOCATION) as usize
}

/// The parts of `package.json` this tool looks at.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    /// Extension name
    #[serde(default)]
    pub name: Option<String>,

    /// Extension version
    #[serde(default)]
    pub version: Option<String>,

    /// Host engine requirements
    #[serde(default)]
    pub engines: Option<Engines>,
}

/// The `engines` object of a manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Engines {
    /// Minimum editor version, e.g. `^1.75.0`
    #[serde(default)]
    pub vscode: Option<String>,
}

impl PackageManifest {
    /// Parse a manifest document.
    pub fn from_json(content: &[u8]) -> Result<Self> {
        serde_json::from_slice(content).map_err(|e| Error::Manifest(e.to_string()))
    }

    /// Read the manifest out of a package archive on disk.
    pub fn from_archive(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Read the manifest out of any seekable zip stream.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive =
            zip::ZipArchive::new(reader).map_err(|e| Error::Archive(e.to_string()))?;

        let mut entry = archive.by_name(MANIFEST_ENTRY).map_err(|e| match e {
            zip::result::ZipError::FileNotFound => {
                Error::Manifest(format!("{MANIFEST_ENTRY} not found in archive"))
            }
            other => Error::Archive(other.to_string()),
        })?;

        let mut content = Vec::with_capacity(initial_capacity(entry.size()));
        entry.read_to_end(&mut content).map_err(|e| Error::Archive(e.to_string()))?;

        Self::from_json(&content)
    }

    /// Declared `engines.vscode` constraint, if any.
    pub fn host_constraint(&self) -> Option<&str> {
        self.engines.as_ref()?.vscode.as_deref()
    }
}
