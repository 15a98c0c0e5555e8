//! Extension gallery access.
//!
//! Lists the published versions of an extension and downloads package
//! archives. The [`Gallery`] trait is the seam the compatibility search and
//! the driver are written against; [`GalleryClient`] is the blocking HTTP
//! implementation.

mod client;
mod extension_id;
mod versions;

pub use client::{DownloadedPackage, Gallery, GalleryClient};
pub use extension_id::ExtensionId;
pub use versions::{dedup_preserving_order, ExtensionQuery, QueryResponse, VersionedExtension};
