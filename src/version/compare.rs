//! Component-wise version comparison.

use std::cmp::Ordering;

use super::VersionSpec;

/// One dot-separated component of a version body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// All ASCII digits.
    Number(u64),
    /// Anything else, including digit runs too long for `u64`.
    Text(&'a str),
}

impl<'a> Token<'a> {
    /// Classify a single component.
    pub fn parse(part: &'a str) -> Self {
        if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = part.parse() {
                return Self::Number(n);
            }
        }
        Self::Text(part)
    }

    /// Ordering between two components.
    ///
    /// A number always sorts below text, whatever the text says.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
        }
    }
}

/// Split a version body into components.
pub fn tokenize(body: &str) -> Vec<Token<'_>> {
    body.split('.').map(Token::parse).collect()
}

/// Compare two version strings, each with an optional leading operator.
///
/// Returns -1, 0 or 1 on the first differing component. Missing trailing
/// components count as `0`. When every component ties, the result is the
/// difference of the operator codes, so `>=1.0` compares above `1.0`.
pub fn compare_versions(a: &str, b: &str) -> i32 {
    let a = VersionSpec::parse(a);
    let b = VersionSpec::parse(b);

    let a_parts = tokenize(a.body);
    let b_parts = tokenize(b.body);
    let zero = Token::Number(0);

    for i in 0..a_parts.len().max(b_parts.len()) {
        let a_part = a_parts.get(i).unwrap_or(&zero);
        let b_part = b_parts.get(i).unwrap_or(&zero);

        match a_part.compare(b_part) {
            Ordering::Less => return -1,
            Ordering::Greater => return 1,
            Ordering::Equal => {}
        }
    }

    a.op.code() - b.op.code()
}

/// Whether `host` satisfies a manifest's declared minimum host version.
///
/// Everything up to the last `^` in `declared` is dropped before comparing.
pub fn host_satisfies(host: &str, declared: &str) -> bool {
    let declared = declared.rsplit('^').next().unwrap_or(declared);
    compare_versions(host, declared) >= 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_versions() {
        assert_eq!(compare_versions("1.0.0", "1.0.0"), 0);
        assert_eq!(compare_versions("1.77.3", "1.77.3"), 0);
    }

    #[test]
    fn test_numeric_not_lexical() {
        assert_eq!(compare_versions("1.2.3", "1.2.10"), -1);
        assert_eq!(compare_versions("1.2.10", "1.2.3"), 1);
        assert_eq!(compare_versions("1.10.0", "1.9.0"), 1);
    }

    #[test]
    fn test_missing_components_are_zero() {
        assert_eq!(compare_versions("1.2", "1.2.0"), 0);
        assert_eq!(compare_versions("1.2.0.0", "1.2"), 0);
        assert_eq!(compare_versions("1.2", "1.2.1"), -1);
    }

    #[test]
    fn test_operator_breaks_ties() {
        assert_eq!(compare_versions(">=1.0.0", "1.0.0"), 1);
        assert_eq!(compare_versions("1.0.0", ">=1.0.0"), -1);
        assert_eq!(compare_versions("<1.0.0", ">1.0.0"), -2);
        assert_eq!(compare_versions("==1.0.0", "1.0.0"), 0);
    }

    #[test]
    fn test_operator_ignored_when_bodies_differ() {
        assert_eq!(compare_versions("<2.0.0", ">1.0.0"), 1);
    }

    #[test]
    fn test_number_sorts_below_text() {
        assert_eq!(compare_versions("1.0.0", "1.0.rc"), -1);
        assert_eq!(compare_versions("1.x", "1.0"), 1);
        // Padding counts as a number too.
        assert_eq!(compare_versions("1.0", "1.0.beta"), -1);
    }

    #[test]
    fn test_text_components_compare_lexically() {
        assert_eq!(compare_versions("1.0.alpha", "1.0.beta"), -1);
        assert_eq!(compare_versions("1.0.beta", "1.0.alpha"), 1);
        assert_eq!(compare_versions("1.0.0-rc", "1.0.0-rc"), 0);
    }

    #[test]
    fn test_antisymmetric_without_operators() {
        let versions = ["1.0.0", "1.2", "1.2.10", "1.2.3", "2.0.0-insider", "1.x", "0.9.9.9"];
        for a in versions {
            assert_eq!(compare_versions(a, a), 0, "{a} vs itself");
            for b in versions {
                assert_eq!(
                    compare_versions(a, b).signum(),
                    -compare_versions(b, a).signum(),
                    "{a} vs {b}"
                );
            }
        }
    }

    #[test]
    fn test_oversized_number_falls_back_to_text() {
        assert_eq!(Token::parse("99999999999999999999999"), Token::Text("99999999999999999999999"));
        assert_eq!(Token::parse("42"), Token::Number(42));
        assert_eq!(Token::parse(""), Token::Text(""));
    }

    #[test]
    fn test_host_satisfies_caret() {
        assert!(host_satisfies("1.77.3", "^1.77.0"));
        assert!(host_satisfies("1.77.3", "^1.77.3"));
        assert!(!host_satisfies("1.77.3", "^1.78.0"));
        assert!(host_satisfies("1.77.3", "1.60.0"));
    }

    #[test]
    fn test_host_satisfies_operator_constraint() {
        // ">=1.77.3" ties on the body and the operator code makes it larger.
        assert!(!host_satisfies("1.77.3", ">=1.77.3"));
        assert!(host_satisfies("1.77.3", ">=1.70.0"));
    }

    #[test]
    fn test_wildcard_is_not_satisfied() {
        assert!(!host_satisfies("1.77.3", "*"));
    }
}
