//! `publisher.package` extension identifiers.

use std::fmt;
use std::str::FromStr;

use crate::core::Error;

/// A marketplace extension identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionId {
    publisher: String,
    package: String,
}

impl ExtensionId {
    /// Build an identifier from its two halves.
    pub fn new(publisher: impl Into<String>, package: impl Into<String>) -> Self {
        Self { publisher: publisher.into(), package: package.into() }
    }

    /// Publisher half.
    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    /// Package half.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Fill a URL template's `{publisher}`, `{package}` and `{version}` placeholders.
    pub fn render_url(&self, template: &str, version: &str) -> String {
        template
            .replace("{publisher}", &self.publisher)
            .replace("{package}", &self.package)
            .replace("{version}", version)
    }
}

impl FromStr for ExtensionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.split_once('.') {
            Some((publisher, package)) if !publisher.is_empty() && !package.is_empty() => {
                Ok(Self::new(publisher, package))
            }
            _ => Err(Error::InvalidExtensionId(s.to_string())),
        }
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.publisher, self.package)
    }
}
