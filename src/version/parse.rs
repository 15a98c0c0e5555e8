//! Operator-prefixed version strings.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading run of operator characters, then a body that starts with anything else.
static OPERATOR_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([<>=]+)([^<>=].*)$").expect("operator prefix pattern is valid"));

/// Comparison operator attached to a version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `<` or `<=`
    Less,
    /// `==`, no operator, or an unrecognised run of `<`, `>` and `=`
    Equal,
    /// `>` or `>=`
    Greater,
}

impl Operator {
    /// Map an operator token to its operator.
    ///
    /// Unknown tokens (`=`, `=>`, `<>`, ...) map to [`Operator::Equal`].
    pub fn from_token(token: &str) -> Self {
        match token {
            "<" | "<=" => Self::Less,
            ">" | ">=" => Self::Greater,
            _ => Self::Equal,
        }
    }

    /// Numeric code used to break ties between equal bodies.
    pub fn code(self) -> i32 {
        match self {
            Self::Less => -1,
            Self::Equal => 0,
            Self::Greater => 1,
        }
    }
}

/// A version body together with the operator that prefixed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionSpec<'a> {
    /// Leading operator, [`Operator::Equal`] when absent.
    pub op: Operator,
    /// Dot-separated version body.
    pub body: &'a str,
}

impl<'a> VersionSpec<'a> {
    /// Split an optional leading operator off a version string.
    ///
    /// The operator must start the string. Operator characters anywhere else
    /// are part of the body. A string made only of operator characters is
    /// returned unchanged as the body.
    pub fn parse(input: &'a str) -> Self {
        match OPERATOR_PREFIX.captures(input) {
            Some(caps) => {
                let (Some(op), Some(body)) = (caps.get(1), caps.get(2)) else {
                    return Self { op: Operator::Equal, body: input };
                };
                Self { op: Operator::from_token(op.as_str()), body: body.as_str() }
            }
            None => Self { op: Operator::Equal, body: input },
        }
    }
}
