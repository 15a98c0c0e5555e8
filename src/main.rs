//! vsixfetch - download editor extensions compatible with a pinned host version.
//!
//! Resolves every installed extension to the newest published version whose
//! manifest supports the target host, caches the results, and downloads the
//! packages for offline installation.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vsixfetch::core::VersionSource;
use vsixfetch::gallery::DownloadedPackage;
use vsixfetch::installed::{distinct_ids, list_installed, read_listing, InstalledExtension};
use vsixfetch::{
    compare_versions, CompatibilitySearch, Config, Driver, Error, ExtensionId, ExtensionRecord,
    Gallery, GalleryClient, Reporter, ResultsCache, SearchOutcome,
};

/// Download the newest extension packages compatible with a pinned editor version
#[derive(Parser)]
#[command(name = "vsixfetch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Show what would be downloaded without downloading it
    #[arg(long, global = true)]
    dry_run: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, env = "VSIXFETCH_CONFIG")]
    config: Option<PathBuf>,

    /// Host version every package must support
    #[arg(long, global = true, env = "VSIXFETCH_HOST_VERSION")]
    host_version: Option<String>,

    /// Directory receiving the downloaded packages
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Results cache file
    #[arg(long, global = true)]
    cache_file: Option<PathBuf>,

    /// Ignore the results cache and search again
    #[arg(long, global = true)]
    refresh: bool,

    /// Where published version lists come from
    #[arg(long, global = true, value_enum)]
    version_source: Option<SourceArg>,

    /// The installed listing has no header line to drop
    #[arg(long, global = true)]
    no_header: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    /// Marketplace query endpoint
    Gallery,
    /// `vsce show --json`
    Vsce,
}

impl From<SourceArg> for VersionSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Gallery => Self::Gallery,
            SourceArg::Vsce => Self::Vsce,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve installed extensions and download them (default)
    Run {
        /// Read the installed listing from a file instead of running the editor
        #[arg(short, long)]
        extensions_file: Option<PathBuf>,
    },

    /// Search for compatible versions and write the results cache
    Search {
        /// Read the installed listing from a file instead of running the editor
        #[arg(short, long)]
        extensions_file: Option<PathBuf>,
    },

    /// Download the packages recorded in the results cache
    Download,

    /// Search a single extension and show every version tried
    Check {
        /// Extension identifier (publisher.package)
        extension: String,
    },

    /// Compare two version strings (-1, 0 or 1; ties break on operators)
    Compare {
        /// Left-hand version
        left: String,

        /// Right-hand version
        right: String,
    },

    /// List installed extensions
    List {
        /// Read the installed listing from a file instead of running the editor
        #[arg(short, long)]
        extensions_file: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Inspect or clear the results cache
    Cache {
        /// Cache operation
        #[command(subcommand)]
        operation: CacheOperation,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum CacheOperation {
    /// Print the cached results
    Show,

    /// Delete the results cache
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    match &cli.command {
        None => cmd_run(&cli, None)?,
        Some(Commands::Run { extensions_file }) => cmd_run(&cli, extensions_file.as_deref())?,
        Some(Commands::Search { extensions_file }) => {
            cmd_search(&cli, extensions_file.as_deref())?;
        }
        Some(Commands::Download) => cmd_download(&cli)?,
        Some(Commands::Check { extension }) => cmd_check(&cli, extension)?,
        Some(Commands::Compare { left, right }) => cmd_compare(left, right),
        Some(Commands::List { extensions_file, format }) => {
            cmd_list(&cli, extensions_file.as_deref(), format)?;
        }
        Some(Commands::Cache { operation }) => cmd_cache(&cli, operation)?,
        Some(Commands::Config { path }) => cmd_config(&cli, *path)?,
        Some(Commands::Completions { shell }) => cmd_completions(*shell),
    }

    Ok(())
}

/// Load the config file and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load()?,
    };

    if let Some(ref version) = cli.host_version {
        config.host_version.clone_from(version);
    }
    if let Some(ref dir) = cli.output_dir {
        config.output_dir.clone_from(dir);
    }
    if let Some(ref file) = cli.cache_file {
        config.cache_file.clone_from(file);
    }
    if let Some(source) = cli.version_source {
        config.gallery.version_source = source.into();
    }
    if cli.no_header {
        config.installed.skip_header = false;
    }
    config.force_refresh |= cli.refresh;
    config.dry_run = cli.dry_run;

    config.validate()?;
    Ok(config)
}

fn build_driver(config: Config) -> Result<Driver<GalleryClient>> {
    let gallery = GalleryClient::new(config.gallery.clone())?;
    Ok(Driver::new(config, gallery))
}

fn installed_extensions(
    config: &Config,
    extensions_file: Option<&Path>,
) -> Result<Vec<InstalledExtension>> {
    let installed = match extensions_file {
        Some(path) => read_listing(path, config.installed.skip_header)?,
        None => list_installed(&config.installed)?,
    };
    Ok(installed)
}

/// Installed extension names, only listed when a search will actually run.
fn names_to_search(
    driver: &Driver<GalleryClient>,
    extensions_file: Option<&Path>,
) -> Result<Vec<String>> {
    if !driver.needs_search() {
        return Ok(Vec::new());
    }
    let installed = installed_extensions(driver.config(), extensions_file)?;
    Ok(distinct_ids(&installed))
}

/// Full pipeline: resolve, cache, download.
fn cmd_run(cli: &Cli, extensions_file: Option<&Path>) -> Result<()> {
    let driver = build_driver(load_config(cli)?)?;
    let names = names_to_search(&driver, extensions_file)?;

    let mut reporter = ConsoleReporter::new(&driver.config().host_version);
    let report = driver.run(&names, &mut reporter)?;

    print_download_summary(&report.downloads);

    if !report.downloads.is_success() {
        anyhow::bail!("{} download(s) failed", report.downloads.failed.len());
    }

    Ok(())
}

/// Resolve and write the cache without downloading.
fn cmd_search(cli: &Cli, extensions_file: Option<&Path>) -> Result<()> {
    let mut config = load_config(cli)?;
    config.force_refresh = true;

    let driver = build_driver(config)?;
    let names = names_to_search(&driver, extensions_file)?;

    let mut reporter = ConsoleReporter::new(&driver.config().host_version);
    let resolution = driver.resolve(&names, &mut reporter)?;

    let resolved = resolution.records.iter().filter(|r| r.is_resolved()).count();
    println!("\n{} of {} extension(s) resolved.", resolved, resolution.records.len());

    Ok(())
}

/// Download from an existing cache.
fn cmd_download(cli: &Cli) -> Result<()> {
    let driver = build_driver(load_config(cli)?)?;
    let cache = driver.cache();

    if !cache.exists() {
        anyhow::bail!(
            "No results cache at {}. Run `vsixfetch search` first.",
            cache.path().display()
        );
    }

    let records = cache.load()?;
    let mut reporter = ConsoleReporter::new(&driver.config().host_version);
    let summary = driver.download_all(&records, &mut reporter)?;

    print_download_summary(&summary);

    if !summary.is_success() {
        anyhow::bail!("{} download(s) failed", summary.failed.len());
    }

    Ok(())
}

/// Search one extension and print every attempt.
fn cmd_check(cli: &Cli, extension: &str) -> Result<()> {
    let config = load_config(cli)?;
    let id: ExtensionId = extension.parse()?;
    let gallery = GalleryClient::new(config.gallery.clone())?;

    println!("Checking {} against host version {}...\n", id, config.host_version);

    let outcome = CompatibilitySearch::new(&gallery, &config.host_version).find(&id)?;

    for attempt in &outcome.attempts {
        let icon = if attempt.verdict.is_compatible() { "✓" } else { "✗" };
        println!("  {} {:<16} {}", icon, attempt.version, attempt.verdict);
    }

    match outcome.version {
        Some(ref version) => {
            println!("\nNewest compatible version: {}", version);
            println!("  {}", gallery.package_url(&id, version));
        }
        None => println!("\nNo compatible version found for {}.", id),
    }

    Ok(())
}

fn cmd_compare(left: &str, right: &str) {
    println!("{}", compare_versions(left, right));
}

fn cmd_list(cli: &Cli, extensions_file: Option<&Path>, format: &str) -> Result<()> {
    let config = load_config(cli)?;
    let installed = installed_extensions(&config, extensions_file)?;

    match format {
        "json" => {
            let entries: Vec<_> = installed
                .iter()
                .map(|ext| serde_json::json!({ "name": ext.id, "version": ext.version }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        _ => {
            if installed.is_empty() {
                println!("No installed extensions found.");
            }
            for ext in &installed {
                match ext.version {
                    Some(ref version) => println!("{}@{}", ext.id, version),
                    None => println!("{}", ext.id),
                }
            }
        }
    }

    Ok(())
}

fn cmd_cache(cli: &Cli, operation: &CacheOperation) -> Result<()> {
    let config = load_config(cli)?;
    let cache = ResultsCache::new(config.cache_file());

    match operation {
        CacheOperation::Show => {
            if !cache.exists() {
                println!("No results cache at {}.", cache.path().display());
                return Ok(());
            }

            let records = cache.load()?;
            println!("Cached results ({}):\n", cache.path().display());
            for record in &records {
                match record.version() {
                    Some(version) => println!("  ✓ {} {}", record.name(), version),
                    None => println!("  ✗ {} (no compatible version)", record.name()),
                }
            }
            println!("\nTotal: {} extension(s)", records.len());
        }
        CacheOperation::Clear => {
            if cache.clear()? {
                println!("Removed {}.", cache.path().display());
            } else {
                println!("No results cache at {}.", cache.path().display());
            }
        }
    }

    Ok(())
}

fn cmd_config(cli: &Cli, show_path: bool) -> Result<()> {
    if show_path {
        match cli.config.clone().or_else(Config::config_path) {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("Could not determine config directory"),
        }
        return Ok(());
    }

    let config = load_config(cli)?;
    println!("{}", config.to_toml()?);

    Ok(())
}

fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "vsixfetch", &mut io::stdout());
}

fn print_download_summary(summary: &vsixfetch::DownloadSummary) {
    println!();
    if !summary.planned.is_empty() {
        println!("Dry run: {} package(s) would be downloaded.", summary.planned.len());
    } else {
        println!("Downloaded {} package(s).", summary.downloaded.len());
    }
    if !summary.unresolved.is_empty() {
        println!("No compatible version for {} extension(s).", summary.unresolved.len());
    }
    if !summary.failed.is_empty() {
        println!("Failed downloads:");
        for (name, reason) in &summary.failed {
            println!("  {}: {}", name, reason);
        }
    }
}

/// Prints driver progress to the terminal.
struct ConsoleReporter<'a> {
    host_version: &'a str,
}

impl<'a> ConsoleReporter<'a> {
    fn new(host_version: &'a str) -> Self {
        Self { host_version }
    }
}

impl Reporter for ConsoleReporter<'_> {
    fn cache_loaded(&mut self, path: &Path, records: &[ExtensionRecord]) {
        println!(
            "Using cached results for {} extension(s) from {}. Pass --refresh to search again.",
            records.len(),
            path.display()
        );
    }

    fn searching(&mut self, name: &str) {
        println!(
            "Searching through {}'s versions for one compatible with host version {}...",
            name, self.host_version
        );
    }

    fn searched(&mut self, record: &ExtensionRecord, outcome: Option<&SearchOutcome>) {
        let tried = outcome.map_or(0, |o| o.attempts.len());
        match record.version() {
            Some(version) => println!("  ✓ {} (tried {} version(s))", version, tried),
            None if outcome.is_none() => println!("  ✗ not a publisher.package identifier"),
            None => println!("  ✗ none compatible (tried {} version(s))", tried),
        }
    }

    fn cache_saved(&mut self, path: &Path, count: usize) {
        println!("Saved results for {} extension(s) to {}.\n", count, path.display());
    }

    fn downloading(&mut self, name: &str, version: &str) {
        println!("Downloading latest compatible version of {} ({})...", name, version);
    }

    fn downloaded(&mut self, _name: &str, package: &DownloadedPackage) {
        println!("Download completed: {} ({} bytes)\n", package.path.display(), package.size);
    }

    fn download_failed(&mut self, name: &str, error: &Error) {
        eprintln!("Download of {} failed: {}\n", name, error);
    }

    fn planned(&mut self, name: &str, version: &str, dest: &Path) {
        println!("Would download {} {} -> {}", name, version, dest.display());
    }

    fn unresolved(&mut self, name: &str) {
        println!("\n!!!  WARNING: No compatible version found for {}  !!!\n", name);
    }
}
