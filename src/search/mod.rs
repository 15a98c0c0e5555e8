//! Compatibility search.
//!
//! Walks an extension's published versions newest first and stops at the
//! first one whose manifest declares a minimum host version the pinned host
//! satisfies. Every version is tried in its own scratch directory, which is
//! removed when the attempt ends, whatever the outcome.
//!
//! A version that cannot be downloaded or whose archive cannot be read is
//! treated as incompatible and the scan moves on to the next older version.
//! Only a failure to obtain the version list itself is reported as an error.

use std::collections::HashSet;
use std::fmt;

use tempfile::TempDir;

use crate::core::Result;
use crate::gallery::{ExtensionId, Gallery};
use crate::package::PackageManifest;
use crate::version::host_satisfies;

/// File name used for a package inside its scratch directory.
const SCRATCH_PACKAGE: &str = "extension.vsix";

/// Result of evaluating one published version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Declared constraint is satisfied by the host.
    Compatible { declared: String },
    /// Declared constraint requires a newer host.
    Incompatible { declared: String },
    /// Manifest declares no `engines.vscode`.
    Undeclared,
    /// Package could not be downloaded or read.
    Unavailable { reason: String },
}

impl Verdict {
    /// Whether this verdict ends the search.
    pub fn is_compatible(&self) -> bool {
        matches!(self, Self::Compatible { .. })
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compatible { declared } => write!(f, "compatible (requires {declared})"),
            Self::Incompatible { declared } => write!(f, "incompatible (requires {declared})"),
            Self::Undeclared => write!(f, "no engines.vscode declared"),
            Self::Unavailable { reason } => write!(f, "unavailable: {reason}"),
        }
    }
}

/// One evaluated version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub version: String,
    pub verdict: Verdict,
}

/// Outcome of searching one extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// The extension searched.
    pub extension: ExtensionId,
    /// Newest compatible version, if any.
    pub version: Option<String>,
    /// Versions evaluated, in order. Nothing after the winner is included.
    pub attempts: Vec<Attempt>,
}

/// Finds the newest version of an extension that supports a given host.
pub struct CompatibilitySearch<'a, G: Gallery + ?Sized> {
    gallery: &'a G,
    host_version: &'a str,
}

impl<'a, G: Gallery + ?Sized> CompatibilitySearch<'a, G> {
    /// Create a search against `gallery` for `host_version`.
    pub fn new(gallery: &'a G, host_version: &'a str) -> Self {
        Self { gallery, host_version }
    }

    /// Fetch the version list of `extension` and scan it.
    pub fn find(&self, extension: &ExtensionId) -> Result<SearchOutcome> {
        let versions = self.gallery.list_versions(extension)?;
        Ok(self.scan(extension, &versions))
    }

    /// Scan an already known version list, newest first.
    pub fn scan(&self, extension: &ExtensionId, versions: &[String]) -> SearchOutcome {
        let mut seen = HashSet::new();
        let mut attempts = Vec::new();
        let mut found = None;

        for version in versions {
            if !seen.insert(version.as_str()) {
                continue;
            }

            let verdict = self.evaluate(extension, version);
            tracing::debug!(extension = %extension, version, verdict = %verdict, "Evaluated version");

            let compatible = verdict.is_compatible();
            attempts.push(Attempt { version: version.clone(), verdict });

            if compatible {
                found = Some(version.clone());
                break;
            }
        }

        match &found {
            Some(version) => tracing::info!(extension = %extension, version, "Found compatible version"),
            None => tracing::warn!(
                extension = %extension,
                host = self.host_version,
                tried = attempts.len(),
                "No compatible version found"
            ),
        }

        SearchOutcome { extension: extension.clone(), version: found, attempts }
    }

    /// Download one version into a scratch directory and check its manifest.
    pub fn evaluate(&self, extension: &ExtensionId, version: &str) -> Verdict {
        let manifest = match self.fetch_manifest(extension, version) {
            Ok(manifest) => manifest,
            Err(e) => return Verdict::Unavailable { reason: e.to_string() },
        };

        match manifest.host_constraint() {
            Some(declared) if host_satisfies(self.host_version, declared) => {
                Verdict::Compatible { declared: declared.to_string() }
            }
            Some(declared) => Verdict::Incompatible { declared: declared.to_string() },
            None => Verdict::Undeclared,
        }
    }

    fn fetch_manifest(&self, extension: &ExtensionId, version: &str) -> Result<PackageManifest> {
        // Removed on drop, including on the error paths below.
        let scratch = TempDir::new()?;
        let url = self.gallery.package_url(extension, version);
        let package = self.gallery.download(&url, &scratch.path().join(SCRATCH_PACKAGE))?;
        PackageManifest::from_archive(&package.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::Path;

    use zip::write::SimpleFileOptions;

    use crate::core::Error;
    use crate::gallery::DownloadedPackage;

    #[derive(Default)]
    struct FakeGallery {
        versions: Vec<String>,
        constraints: HashMap<String, Option<String>>,
        downloads: RefCell<Vec<String>>,
    }

    impl FakeGallery {
        fn with(versions: &[&str]) -> Self {
            Self { versions: versions.iter().map(|v| v.to_string()).collect(), ..Self::default() }
        }

        fn declare(mut self, version: &str, constraint: Option<&str>) -> Self {
            self.constraints.insert(version.to_string(), constraint.map(String::from));
            self
        }

        fn downloaded(&self) -> Vec<String> {
            self.downloads.borrow().clone()
        }
    }

    impl Gallery for FakeGallery {
        fn list_versions(&self, _extension: &ExtensionId) -> Result<Vec<String>> {
            Ok(self.versions.clone())
        }

        fn package_url(&self, _extension: &ExtensionId, version: &str) -> String {
            version.to_string()
        }

        fn download(&self, url: &str, dest: &Path) -> Result<DownloadedPackage> {
            self.downloads.borrow_mut().push(url.to_string());

            let constraint = self.constraints.get(url).ok_or_else(|| Error::HttpStatus {
                url: url.to_string(),
                status: 404,
            })?;

            let manifest = match constraint {
                Some(c) => format!(r#"{{"engines": {{"vscode": "{c}"}}}}"#),
                None => "{}".to_string(),
            };

            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
            writer.start_file("extension/package.json", SimpleFileOptions::default()).unwrap();
            writer.write_all(manifest.as_bytes()).unwrap();
            let bytes = writer.finish().unwrap().into_inner();

            DownloadedPackage::write(dest, &bytes)
        }
    }

    fn id() -> ExtensionId {
        ExtensionId::new("acme", "widget")
    }

    #[test]
    fn test_stops_at_first_compatible() {
        let gallery = FakeGallery::with(&["2.0.0", "1.5.0", "1.0.0"])
            .declare("2.0.0", Some("^1.80.0"))
            .declare("1.5.0", Some("^1.70.0"))
            .declare("1.0.0", Some("^1.50.0"));

        let outcome = CompatibilitySearch::new(&gallery, "1.77.3").find(&id()).unwrap();

        assert_eq!(outcome.version.as_deref(), Some("1.5.0"));
        assert_eq!(gallery.downloaded(), vec!["2.0.0", "1.5.0"]);
        assert_eq!(outcome.attempts.len(), 2);
        assert_eq!(
            outcome.attempts[0].verdict,
            Verdict::Incompatible { declared: "^1.80.0".to_string() }
        );
    }

    #[test]
    fn test_exhaustion_yields_none() {
        let gallery = FakeGallery::with(&["3.0.0", "2.0.0"])
            .declare("3.0.0", Some("^1.90.0"))
            .declare("2.0.0", None);

        let outcome = CompatibilitySearch::new(&gallery, "1.77.3").find(&id()).unwrap();

        assert!(outcome.version.is_none());
        assert_eq!(outcome.attempts[1].verdict, Verdict::Undeclared);
    }

    #[test]
    fn test_download_failure_falls_through() {
        let gallery = FakeGallery::with(&["2.0.0", "1.9.0"]).declare("1.9.0", Some("1.60.0"));

        let outcome = CompatibilitySearch::new(&gallery, "1.77.3").find(&id()).unwrap();

        assert_eq!(outcome.version.as_deref(), Some("1.9.0"));
        assert!(matches!(outcome.attempts[0].verdict, Verdict::Unavailable { .. }));
    }

    #[test]
    fn test_repeated_versions_evaluated_once() {
        let gallery = FakeGallery::with(&["2.0.0", "2.0.0", "1.0.0"])
            .declare("2.0.0", Some("^1.99.0"))
            .declare("1.0.0", Some("^1.0.0"));

        let outcome = CompatibilitySearch::new(&gallery, "1.77.3").find(&id()).unwrap();

        assert_eq!(outcome.version.as_deref(), Some("1.0.0"));
        assert_eq!(gallery.downloaded(), vec!["2.0.0", "1.0.0"]);
    }

    #[test]
    fn test_empty_version_list() {
        let gallery = FakeGallery::default();
        let outcome = CompatibilitySearch::new(&gallery, "1.77.3").find(&id()).unwrap();
        assert!(outcome.version.is_none());
        assert!(outcome.attempts.is_empty());
    }

    #[test]
    fn test_verdict_display() {
        let verdict = Verdict::Compatible { declared: "^1.0.0".to_string() };
        assert_eq!(verdict.to_string(), "compatible (requires ^1.0.0)");
        assert!(Verdict::Unavailable { reason: "HTTP 404".into() }.to_string().contains("404"));
    }
}
