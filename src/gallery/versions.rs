//! Published version lists.
//!
//! Both the marketplace query endpoint and `vsce show --json` return versions
//! newest first. The marketplace repeats a version once per target platform.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// `filterType` selecting an extension by its full name.
const FILTER_EXTENSION_NAME: u32 = 7;

/// `IncludeVersions` query flag.
const FLAG_INCLUDE_VERSIONS: u32 = 0x1;

/// Request body for the marketplace `extensionquery` endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionQuery {
    filters: Vec<QueryFilter>,
    asset_types: Vec<String>,
    flags: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryFilter {
    criteria: Vec<QueryCriterion>,
    page_number: u32,
    page_size: u32,
    sort_by: u32,
    sort_order: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryCriterion {
    filter_type: u32,
    value: String,
}

impl ExtensionQuery {
    /// Query for every published version of one extension.
    pub fn versions_of(extension: &str) -> Self {
        Self {
            filters: vec![QueryFilter {
                criteria: vec![QueryCriterion {
                    filter_type: FILTER_EXTENSION_NAME,
                    value: extension.to_string(),
                }],
                page_number: 1,
                page_size: 1,
                sort_by: 0,
                sort_order: 0,
            }],
            asset_types: Vec::new(),
            flags: FLAG_INCLUDE_VERSIONS,
        }
    }
}

/// Marketplace `extensionquery` response.
#[derive(Debug, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    results: Vec<QueryResult>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResult {
    #[serde(default)]
    extensions: Vec<VersionedExtension>,
}

/// An extension entry carrying its version list.
///
/// This is also the shape of `vsce show <extension> --json`.
#[derive(Debug, Default, Deserialize)]
pub struct VersionedExtension {
    #[serde(default)]
    versions: Vec<PublishedVersion>,
}

#[derive(Debug, Deserialize)]
struct PublishedVersion {
    version: String,
}

impl QueryResponse {
    /// Versions of the first matching extension, or `None` if nothing matched.
    pub fn into_versions(self) -> Option<Vec<String>> {
        self.results
            .into_iter()
            .next()
            .and_then(|r| r.extensions.into_iter().next())
            .map(VersionedExtension::into_versions)
    }
}

impl VersionedExtension {
    /// Version strings in published order, without repeats.
    pub fn into_versions(self) -> Vec<String> {
        dedup_preserving_order(self.versions.into_iter().map(|v| v.version))
    }
}

/// Drop repeated entries, keeping the first occurrence.
pub fn dedup_preserving_order(versions: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    versions.into_iter().filter(|v| seen.insert(v.clone())).collect()
}
