//! Configuration management for vsixfetch.
//!
//! Handles loading configuration from TOML files. Command-line flags are
//! applied on top of the loaded value by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{Error, Result};

/// Host version targeted when nothing else is configured.
pub const DEFAULT_HOST_VERSION: &str = "1.77.3";

/// Marketplace query endpoint used to list published versions.
pub const DEFAULT_QUERY_URL: &str =
    "https://marketplace.visualstudio.com/_apis/public/gallery/extensionquery";

/// Per-version package download URL.
pub const DEFAULT_DOWNLOAD_URL_TEMPLATE: &str = "https://{publisher}.gallery.vsassets.io/_apis/public/gallery/publisher/{publisher}/extension/{package}/{version}/assetbyname/Microsoft.VisualStudio.Services.VSIXPackage";

/// Placeholders every download URL template must contain.
const TEMPLATE_PLACEHOLDERS: [&str; 3] = ["{publisher}", "{package}", "{version}"];

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host version that every resolved package must support
    pub host_version: String,

    /// Directory receiving the downloaded `.vsix` files
    pub output_dir: PathBuf,

    /// Results cache written after a full search
    pub cache_file: PathBuf,

    /// Ignore an existing cache and search again
    pub force_refresh: bool,

    /// Report planned downloads without fetching them
    #[serde(skip)]
    pub dry_run: bool,

    /// Gallery settings
    pub gallery: GalleryConfig,

    /// Installed extension listing settings
    pub installed: InstalledConfig,
}

/// Where the published version list comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionSource {
    /// Marketplace `extensionquery` endpoint.
    Gallery,
    /// The `vsce show <extension> --json` command.
    Vsce,
}

impl Default for VersionSource {
    fn default() -> Self {
        Self::Gallery
    }
}

/// Gallery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Version list source
    pub version_source: VersionSource,

    /// Marketplace query endpoint
    pub query_url: String,

    /// Package URL with `{publisher}`, `{package}` and `{version}` placeholders
    pub download_url_template: String,

    /// Request timeout; the HTTP client default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// How installed extensions are listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstalledConfig {
    /// Editor command
    pub command: String,

    /// Arguments producing `name@version` lines
    pub args: Vec<String>,

    /// Drop the first output line
    pub skip_header: bool,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Falls back to defaults when no config file exists.
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Serialize the effective configuration.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check the values the search and download steps rely on.
    pub fn validate(&self) -> Result<()> {
        if self.host_version.trim().is_empty() {
            return Err(Error::Config("host_version must not be empty".to_string()));
        }

        for placeholder in TEMPLATE_PLACEHOLDERS {
            if !self.gallery.download_url_template.contains(placeholder) {
                return Err(Error::Config(format!(
                    "download_url_template is missing the {placeholder} placeholder"
                )));
            }
        }

        if self.installed.command.trim().is_empty() {
            return Err(Error::Config("installed.command must not be empty".to_string()));
        }

        Ok(())
    }

    /// Output directory with `~` and environment variables expanded.
    pub fn output_dir(&self) -> PathBuf {
        expand_path(&self.output_dir)
    }

    /// Cache file path with `~` and environment variables expanded.
    pub fn cache_file(&self) -> PathBuf {
        expand_path(&self.cache_file)
    }

    /// Get the configuration directory.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("vsixfetch"))
    }

    /// Get the default configuration file path.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host_version: DEFAULT_HOST_VERSION.to_string(),
            output_dir: PathBuf::from("./extensions"),
            cache_file: PathBuf::from("compatible_packages.json"),
            force_refresh: false,
            dry_run: false,
            gallery: GalleryConfig::default(),
            installed: InstalledConfig::default(),
        }
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            version_source: VersionSource::default(),
            query_url: DEFAULT_QUERY_URL.to_string(),
            download_url_template: DEFAULT_DOWNLOAD_URL_TEMPLATE.to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for InstalledConfig {
    fn default() -> Self {
        Self {
            command: "code".to_string(),
            args: vec!["--list-extensions".to_string(), "--show-versions".to_string()],
            skip_header: true,
        }
    }
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            tracing::warn!(path = %raw, error = %e, "Could not expand path, using it verbatim");
            path.to_path_buf()
        }
    }
}
