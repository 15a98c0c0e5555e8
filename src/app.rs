//! Run orchestration.
//!
//! The [`Driver`] ties the pieces together: it resolves every installed
//! extension to a compatible version (or reuses the results cache), then
//! downloads the winning packages into the output directory. Progress is
//! reported through a [`Reporter`] so the binary can print it and tests can
//! record it.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::core::{Config, Error, Result};
use crate::gallery::{DownloadedPackage, ExtensionId, Gallery};
use crate::records::{ExtensionRecord, ResultsCache};
use crate::search::{CompatibilitySearch, SearchOutcome};

/// Checksum manifest written next to the downloaded packages.
pub const CHECKSUMS_FILE: &str = "SHA256SUMS";

/// Receives progress events from a [`Driver`].
///
/// Every method has an empty default.
pub trait Reporter {
    /// Records were read from an existing cache.
    fn cache_loaded(&mut self, _path: &Path, _records: &[ExtensionRecord]) {}

    /// Search of one extension is starting.
    fn searching(&mut self, _name: &str) {}

    /// Search of one extension finished. `outcome` is `None` when the name
    /// was not a valid identifier.
    fn searched(&mut self, _record: &ExtensionRecord, _outcome: Option<&SearchOutcome>) {}

    /// The full result list was written.
    fn cache_saved(&mut self, _path: &Path, _count: usize) {}

    /// A package download is starting.
    fn downloading(&mut self, _name: &str, _version: &str) {}

    /// A package was written to the output directory.
    fn downloaded(&mut self, _name: &str, _package: &DownloadedPackage) {}

    /// A package download failed.
    fn download_failed(&mut self, _name: &str, _error: &Error) {}

    /// Dry run: a package would be downloaded to `dest`.
    fn planned(&mut self, _name: &str, _version: &str, _dest: &Path) {}

    /// No compatible version exists for this extension.
    fn unresolved(&mut self, _name: &str) {}
}

/// Reporter that ignores every event.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl Reporter for NoopReporter {}

/// Records for every extension and where they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub records: Vec<ExtensionRecord>,
    pub from_cache: bool,
}

/// What the download step did.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    /// Packages written to the output directory.
    pub downloaded: Vec<DownloadedPackage>,
    /// Packages a dry run would have downloaded.
    pub planned: Vec<PathBuf>,
    /// Extensions without a compatible version.
    pub unresolved: Vec<String>,
    /// Extensions whose download failed, with the reason.
    pub failed: Vec<(String, String)>,
}

impl DownloadSummary {
    /// Whether every resolved package was fetched.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of a full run.
#[derive(Debug)]
pub struct RunReport {
    pub resolution: Resolution,
    pub downloads: DownloadSummary,
}

/// Resolves and downloads compatible extension packages.
pub struct Driver<G: Gallery> {
    config: Config,
    gallery: G,
}

impl<G: Gallery> Driver<G> {
    /// Create a driver for `config` backed by `gallery`.
    pub fn new(config: Config, gallery: G) -> Self {
        Self { config, gallery }
    }

    /// Effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The gallery in use.
    pub fn gallery(&self) -> &G {
        &self.gallery
    }

    /// The results cache.
    pub fn cache(&self) -> ResultsCache {
        ResultsCache::new(self.config.cache_file())
    }

    /// Whether [`Driver::resolve`] will search instead of reading the cache.
    pub fn needs_search(&self) -> bool {
        self.config.force_refresh || !self.cache().exists()
    }

    /// Search one extension by its listed name.
    ///
    /// Names that are not `publisher.package` produce an unresolved record.
    pub fn search_extension(
        &self,
        name: &str,
    ) -> Result<(ExtensionRecord, Option<SearchOutcome>)> {
        let id: ExtensionId = match name.parse() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(extension = name, error = %e, "Skipping invalid extension name");
                return Ok((ExtensionRecord::unresolved(name), None));
            }
        };

        let search = CompatibilitySearch::new(&self.gallery, &self.config.host_version);
        let outcome = search.find(&id)?;

        let record = match &outcome.version {
            Some(version) => {
                ExtensionRecord::resolved(name, version, self.gallery.package_url(&id, version))
            }
            None => ExtensionRecord::unresolved(name),
        };

        Ok((record, Some(outcome)))
    }

    /// Produce a record for every name, from the cache when allowed.
    ///
    /// A fresh search writes the cache only after every extension has been
    /// processed, and never during a dry run.
    pub fn resolve(&self, names: &[String], reporter: &mut dyn Reporter) -> Result<Resolution> {
        let cache = self.cache();

        if !self.needs_search() {
            let records = cache.load()?;
            tracing::info!(path = %cache.path().display(), records = records.len(), "Using cached results");
            reporter.cache_loaded(cache.path(), &records);
            return Ok(Resolution { records, from_cache: true });
        }

        let mut records = Vec::with_capacity(names.len());
        for name in names {
            reporter.searching(name);
            let (record, outcome) = self.search_extension(name)?;
            reporter.searched(&record, outcome.as_ref());
            records.push(record);
        }

        if self.config.dry_run {
            tracing::info!(path = %cache.path().display(), "Dry run, results cache not written");
        } else {
            cache.save(&records)?;
            reporter.cache_saved(cache.path(), records.len());
        }

        Ok(Resolution { records, from_cache: false })
    }

    /// Download every resolved record into the output directory.
    ///
    /// Unresolved records are reported and skipped. A failed download is
    /// reported and does not stop the remaining ones.
    pub fn download_all(
        &self,
        records: &[ExtensionRecord],
        reporter: &mut dyn Reporter,
    ) -> Result<DownloadSummary> {
        let output_dir = self.config.output_dir();
        if !self.config.dry_run {
            std::fs::create_dir_all(&output_dir)?;
        }

        let mut summary = DownloadSummary::default();

        for record in records {
            let Some((version, url)) = record.resolution() else {
                tracing::warn!(extension = record.name(), "No compatible version found");
                reporter.unresolved(record.name());
                summary.unresolved.push(record.name().to_string());
                continue;
            };

            let dest = output_dir.join(format!("{}.vsix", record.name()));

            if self.config.dry_run {
                reporter.planned(record.name(), version, &dest);
                summary.planned.push(dest);
                continue;
            }

            reporter.downloading(record.name(), version);
            match self.gallery.download(url, &dest) {
                Ok(package) => {
                    reporter.downloaded(record.name(), &package);
                    summary.downloaded.push(package);
                }
                Err(e) => {
                    tracing::error!(extension = record.name(), url, error = %e, "Download failed");
                    reporter.download_failed(record.name(), &e);
                    summary.failed.push((record.name().to_string(), e.to_string()));
                }
            }
        }

        if !summary.downloaded.is_empty() {
            write_checksums(&output_dir, &summary.downloaded)?;
        }

        Ok(summary)
    }

    /// Resolve `names` and download the results.
    pub fn run(&self, names: &[String], reporter: &mut dyn Reporter) -> Result<RunReport> {
        let resolution = self.resolve(names, reporter)?;
        let downloads = self.download_all(&resolution.records, reporter)?;
        Ok(RunReport { resolution, downloads })
    }
}

/// Write `<sha256>  <file name>` lines for `packages` into `dir`.
pub fn write_checksums(dir: &Path, packages: &[DownloadedPackage]) -> Result<PathBuf> {
    let mut content = String::new();
    for package in packages {
        let file_name = package
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| package.path.display().to_string());
        let _ = writeln!(content, "{}  {}", package.sha256, file_name);
    }

    let path = dir.join(CHECKSUMS_FILE);
    std::fs::write(&path, content)?;
    Ok(path)
}
