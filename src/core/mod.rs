//! Core types shared across vsixfetch: configuration and errors.

mod config;
mod error;

pub use config::{
    Config, GalleryConfig, InstalledConfig, VersionSource, DEFAULT_DOWNLOAD_URL_TEMPLATE,
    DEFAULT_HOST_VERSION, DEFAULT_QUERY_URL,
};
pub use error::{Error, Result};
