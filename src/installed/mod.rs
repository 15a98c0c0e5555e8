//! Installed extension discovery.
//!
//! Parses the `name@version` listing produced by
//! `code --list-extensions --show-versions`, either by running the command or
//! from a file captured on another machine.

use std::collections::HashSet;
use std::path::Path;
use std::process::Command;

use crate::core::{Error, InstalledConfig, Result};

/// One line of the installed listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledExtension {
    /// `publisher.package`
    pub id: String,
    /// Installed version, when the listing included one
    pub version: Option<String>,
}

impl InstalledExtension {
    /// Parse a `name@version` line. Returns `None` for blank lines.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (id, version) = match line.split_once('@') {
            Some((id, version)) => (id.trim(), Some(version.trim().to_string())),
            None => (line, None),
        };

        if id.is_empty() {
            return None;
        }

        Some(Self { id: id.to_string(), version: version.filter(|v| !v.is_empty()) })
    }
}

/// Parse a full listing, optionally dropping its first line.
pub fn parse_listing(output: &str, skip_header: bool) -> Vec<InstalledExtension> {
    output
        .lines()
        .skip(usize::from(skip_header))
        .filter_map(InstalledExtension::parse_line)
        .collect()
}

/// Extension identifiers in listing order, without repeats.
pub fn distinct_ids(installed: &[InstalledExtension]) -> Vec<String> {
    let mut seen = HashSet::new();
    installed
        .iter()
        .filter(|ext| seen.insert(ext.id.as_str()))
        .map(|ext| ext.id.clone())
        .collect()
}

/// Run the configured editor command and parse its output.
pub fn list_installed(config: &InstalledConfig) -> Result<Vec<InstalledExtension>> {
    tracing::debug!(command = %config.command, args = ?config.args, "Listing installed extensions");

    let output = Command::new(&config.command)
        .args(&config.args)
        .output()
        .map_err(|e| Error::ListCommand(format!("could not run '{}': {e}", config.command)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::ListCommand(format!(
            "'{}' exited with {}: {}",
            config.command,
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_listing(&stdout, config.skip_header))
}

/// Parse a listing saved to a file.
pub fn read_listing(path: &Path, skip_header: bool) -> Result<Vec<InstalledExtension>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::ListCommand(format!("{}: {e}", path.display())))?;
    Ok(parse_listing(&content, skip_header))
}
