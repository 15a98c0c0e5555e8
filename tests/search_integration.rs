//! Compatibility Search Integration Tests
//!
//! Drives the public search and driver APIs against an in-memory gallery
//! that serves real zip archives.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use vsixfetch::gallery::DownloadedPackage;
use vsixfetch::{
    CompatibilitySearch, Config, Driver, Error, ExtensionId, Gallery, NoopReporter, Result,
    Verdict,
};
use zip::write::SimpleFileOptions;

/// What a published version serves.
#[derive(Clone)]
enum Package {
    Manifest(String),
    NotAZip,
    Missing,
}

#[derive(Default)]
struct MemoryGallery {
    listings: HashMap<String, Vec<(&'static str, Package)>>,
    fetched: RefCell<Vec<String>>,
    destinations: RefCell<Vec<PathBuf>>,
}

impl MemoryGallery {
    fn publish(mut self, extension: &str, versions: Vec<(&'static str, Package)>) -> Self {
        self.listings.insert(extension.to_string(), versions);
        self
    }

    fn fetched(&self) -> Vec<String> {
        self.fetched.borrow().clone()
    }
}

fn vsix(manifest: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("extension.vsixmanifest", SimpleFileOptions::default()).unwrap();
    writer.write_all(b"<PackageManifest/>").unwrap();
    writer.start_file("extension/package.json", SimpleFileOptions::default()).unwrap();
    writer.write_all(manifest.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

impl Gallery for MemoryGallery {
    fn list_versions(&self, extension: &ExtensionId) -> Result<Vec<String>> {
        let versions = self.listings.get(&extension.to_string()).ok_or_else(|| {
            Error::VersionList {
                extension: extension.to_string(),
                reason: "not found in the gallery".to_string(),
            }
        })?;
        Ok(versions.iter().map(|(v, _)| (*v).to_string()).collect())
    }

    fn package_url(&self, extension: &ExtensionId, version: &str) -> String {
        format!("mem://{}/{}/{}", extension.publisher(), extension.package(), version)
    }

    fn download(&self, url: &str, dest: &Path) -> Result<DownloadedPackage> {
        self.fetched.borrow_mut().push(url.to_string());
        self.destinations.borrow_mut().push(dest.to_path_buf());

        let mut parts = url.trim_start_matches("mem://").splitn(3, '/');
        let (publisher, package, version) = match (parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(n), Some(v)) => (p, n, v),
            _ => return Err(Error::Network(format!("bad url {url}"))),
        };

        let served = self
            .listings
            .get(&format!("{publisher}.{package}"))
            .and_then(|vs| vs.iter().find(|(v, _)| *v == version))
            .map(|(_, p)| p.clone())
            .unwrap_or(Package::Missing);

        match served {
            Package::Manifest(json) => DownloadedPackage::write(dest, &vsix(&json)),
            Package::NotAZip => DownloadedPackage::write(dest, b"<html>maintenance</html>"),
            Package::Missing => Err(Error::HttpStatus { url: url.to_string(), status: 404 }),
        }
    }
}

fn engines(constraint: &str) -> Package {
    Package::Manifest(format!(r#"{{"name": "fixture", "engines": {{"vscode": "{constraint}"}}}}"#))
}

fn widget() -> ExtensionId {
    "acme.widget".parse().unwrap()
}

#[test]
fn test_first_satisfying_version_wins() {
    let gallery = MemoryGallery::default().publish(
        "acme.widget",
        vec![
            ("2.0.0", engines("^1.80.0")),
            ("1.5.0", engines("^1.77.0")),
            ("1.0.0", engines("^1.50.0")),
        ],
    );

    let outcome = CompatibilitySearch::new(&gallery, "1.77.3").find(&widget()).unwrap();

    assert_eq!(outcome.version.as_deref(), Some("1.5.0"));
    assert_eq!(
        gallery.fetched(),
        vec!["mem://acme/widget/2.0.0", "mem://acme/widget/1.5.0"]
    );
}

#[test]
fn test_unreadable_packages_fall_through() {
    let gallery = MemoryGallery::default().publish(
        "acme.widget",
        vec![
            ("3.0.0", Package::Missing),
            ("2.0.0", Package::NotAZip),
            ("1.9.0", Package::Manifest("{ broken".to_string())),
            ("1.8.0", Package::Manifest(r#"{"engines": {"node": ">=16"}}"#.to_string())),
            ("1.7.0", engines("1.60.0")),
        ],
    );

    let outcome = CompatibilitySearch::new(&gallery, "1.77.3").find(&widget()).unwrap();

    assert_eq!(outcome.version.as_deref(), Some("1.7.0"));
    let verdicts: Vec<_> = outcome.attempts.iter().map(|a| &a.verdict).collect();
    assert!(matches!(verdicts[0], Verdict::Unavailable { .. }));
    assert!(matches!(verdicts[1], Verdict::Unavailable { .. }));
    assert!(matches!(verdicts[2], Verdict::Unavailable { .. }));
    assert_eq!(verdicts[3], &Verdict::Undeclared);
    assert!(verdicts[4].is_compatible());
}

#[test]
fn test_no_satisfying_version_is_not_an_error() {
    let gallery = MemoryGallery::default()
        .publish("acme.widget", vec![("2.0.0", engines("^1.90.0")), ("1.0.0", engines("*"))]);

    let outcome = CompatibilitySearch::new(&gallery, "1.77.3").find(&widget()).unwrap();

    assert!(outcome.version.is_none());
    assert_eq!(outcome.attempts.len(), 2);
}

#[test]
fn test_scratch_directories_are_removed() {
    let gallery = MemoryGallery::default().publish(
        "acme.widget",
        vec![("2.0.0", Package::NotAZip), ("1.0.0", engines("^1.0.0"))],
    );

    CompatibilitySearch::new(&gallery, "1.77.3").find(&widget()).unwrap();

    let destinations = gallery.destinations.borrow();
    assert_eq!(destinations.len(), 2);
    for dest in destinations.iter() {
        assert!(!dest.exists(), "{} should be gone", dest.display());
        assert!(!dest.parent().unwrap().exists());
    }
}

#[test]
fn test_driver_writes_cache_and_packages() {
    let temp = tempfile::TempDir::new().unwrap();
    let gallery = MemoryGallery::default()
        .publish("acme.widget", vec![("2.0.0", engines("^1.90.0")), ("1.5.0", engines("^1.70.0"))])
        .publish("acme.gadget", vec![("1.0.0", engines("^1.99.0"))]);
    let config = Config {
        output_dir: temp.path().join("extensions"),
        cache_file: temp.path().join("compatible_packages.json"),
        ..Config::default()
    };
    let driver = Driver::new(config, gallery);

    let names = vec!["acme.widget".to_string(), "acme.gadget".to_string(), "bogus".to_string()];
    let report = driver.run(&names, &mut NoopReporter).unwrap();

    assert_eq!(report.downloads.downloaded.len(), 1);
    assert_eq!(report.downloads.unresolved, vec!["acme.gadget", "bogus"]);
    assert!(temp.path().join("extensions").join("acme.widget.vsix").is_file());

    let cached: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(temp.path().join("compatible_packages.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(
        cached,
        serde_json::json!([
            {"name": "acme.widget", "version": "1.5.0", "url": "mem://acme/widget/1.5.0"},
            {"name": "acme.gadget", "version": null, "url": null},
            {"name": "bogus", "version": null, "url": null}
        ])
    );
}
