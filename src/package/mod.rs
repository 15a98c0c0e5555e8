//! Extension package archives.

mod manifest;

pub use manifest::{Engines, PackageManifest, MANIFEST_ENTRY};
