//! Version parsing and comparison.
//!
//! Only the subset needed to check a manifest's `engines.vscode` constraint
//! against a pinned host version: an optional leading `<`, `<=`, `>`, `>=` or
//! `==`, followed by a dot-separated body of numeric or text components.

mod compare;
mod parse;

pub use compare::{compare_versions, host_satisfies, tokenize, Token};
pub use parse::{Operator, VersionSpec};
