//! Blocking gallery client.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use reqwest::header::ACCEPT;
use sha2::{Digest, Sha256};

use super::versions::{ExtensionQuery, QueryResponse, VersionedExtension};
use super::ExtensionId;
use crate::core::{Error, GalleryConfig, Result, VersionSource};

/// API version the marketplace query endpoint expects.
const QUERY_ACCEPT: &str = "application/json;api-version=3.0-preview.1";

/// A package archive written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedPackage {
    /// Where the archive was written.
    pub path: PathBuf,
    /// Lowercase hex SHA-256 of the archive.
    pub sha256: String,
    /// Size in bytes.
    pub size: u64,
}

impl DownloadedPackage {
    /// Write `bytes` to `path` and record their checksum.
    pub fn write(path: &Path, bytes: &[u8]) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;

        let mut hasher = Sha256::new();
        hasher.update(bytes);

        Ok(Self {
            path: path.to_path_buf(),
            sha256: format!("{:x}", hasher.finalize()),
            size: bytes.len() as u64,
        })
    }
}

/// Source of published versions and package archives.
pub trait Gallery {
    /// Published versions of `extension`, newest first.
    fn list_versions(&self, extension: &ExtensionId) -> Result<Vec<String>>;

    /// Download URL of one published version.
    fn package_url(&self, extension: &ExtensionId, version: &str) -> String;

    /// Fetch `url` into the file at `dest`.
    fn download(&self, url: &str, dest: &Path) -> Result<DownloadedPackage>;
}

/// Gallery backed by the public marketplace.
pub struct GalleryClient {
    config: GalleryConfig,
    client: reqwest::blocking::Client,
}

/// `User-Agent` sent with every gallery request.
fn user_agent() -> String {
    format!("{}/{}", crate::APP_NAME, crate::VERSION)
}

impl GalleryClient {
    /// Create a new gallery client.
    pub fn new(config: GalleryConfig) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(user_agent());

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder.build().map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Versions from the marketplace query endpoint.
    fn query_versions(&self, extension: &ExtensionId) -> Result<Vec<String>> {
        let name = extension.to_string();
        let list_error = |reason: String| Error::VersionList { extension: name.clone(), reason };

        let response = self
            .client
            .post(&self.config.query_url)
            .header(ACCEPT, QUERY_ACCEPT)
            .json(&ExtensionQuery::versions_of(&name))
            .send()
            .map_err(|e| list_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(list_error(format!("HTTP {}", response.status())));
        }

        let body: QueryResponse =
            response.json().map_err(|e| list_error(format!("Invalid query response: {e}")))?;

        body.into_versions().ok_or_else(|| list_error("not found in the gallery".to_string()))
    }

    /// Versions from `vsce show <extension> --json`.
    fn vsce_versions(&self, extension: &ExtensionId) -> Result<Vec<String>> {
        let name = extension.to_string();
        let list_error = |reason: String| Error::VersionList { extension: name.clone(), reason };

        let output = Command::new("vsce")
            .args(["show", name.as_str(), "--json"])
            .output()
            .map_err(|e| list_error(format!("could not run vsce: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(list_error(format!("vsce exited with {}: {}", output.status, stderr.trim())));
        }

        let shown: VersionedExtension = serde_json::from_slice(&output.stdout)
            .map_err(|e| list_error(format!("Invalid vsce output: {e}")))?;

        Ok(shown.into_versions())
    }
}

impl Gallery for GalleryClient {
    fn list_versions(&self, extension: &ExtensionId) -> Result<Vec<String>> {
        let versions = match self.config.version_source {
            VersionSource::Gallery => self.query_versions(extension)?,
            VersionSource::Vsce => self.vsce_versions(extension)?,
        };

        tracing::debug!(
            extension = %extension,
            source = ?self.config.version_source,
            count = versions.len(),
            "Fetched version list"
        );

        Ok(versions)
    }

    fn package_url(&self, extension: &ExtensionId, version: &str) -> String {
        extension.render_url(&self.config.download_url_template, version)
    }

    fn download(&self, url: &str, dest: &Path) -> Result<DownloadedPackage> {
        let response = self.client.get(url).send().map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().map_err(|e| Error::Network(e.to_string()))?;
        let package = DownloadedPackage::write(dest, &bytes)?;

        tracing::debug!(url, path = %dest.display(), size = package.size, "Downloaded package");

        Ok(package)
    }
}
