//! # vsixfetch
//!
//! Fetch editor extension packages for offline installation.
//!
//! For every installed extension, vsixfetch walks the published versions from
//! newest to oldest and picks the first one whose manifest declares a minimum
//! host version (`engines.vscode`) that a pinned host version satisfies. The
//! chosen `.vsix` archives are then downloaded into an output directory.
//!
//! ## Quick Start
//!
//! ```bash
//! # Resolve and download everything installed locally, for host 1.77.3
//! vsixfetch --host-version 1.77.3 run
//!
//! # Use a listing captured on the offline machine
//! code --list-extensions --show-versions > extensions.txt
//! vsixfetch run --extensions-file extensions.txt
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::derivable_impls)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app;
pub mod core;
pub mod gallery;
pub mod installed;
pub mod package;
pub mod records;
pub mod search;
pub mod version;

// Re-export commonly used types
pub use app::{Driver, DownloadSummary, NoopReporter, Reporter, Resolution, RunReport};
pub use crate::core::{Config, Error, Result};
pub use gallery::{ExtensionId, Gallery, GalleryClient};
pub use records::{ExtensionRecord, ResultsCache};
pub use search::{CompatibilitySearch, SearchOutcome, Verdict};
pub use version::{compare_versions, host_satisfies};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "vsixfetch";
