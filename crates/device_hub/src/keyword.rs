//! Keyword expressions for matching installed package identifiers
//!
//! A keyword wrapped in `*` on both sides (`*token*`) matches any package
//! containing `token`; anything else must equal the package identifier.
//! Both forms compare case-insensitively; the keyword text itself is kept as
//! typed so exact identifiers can be passed to the bridge verbatim.

use std::fmt;

use crate::error::{HubError, Result};

const WILDCARD: char = '*';

/// Parsed package keyword
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordExpression {
    Exact(String),
    Contains(String),
}

impl KeywordExpression {
    /// Parse a raw operator keyword.
    ///
    /// A keyword carrying only a leading or only a trailing `*` is rejected.
    /// Inner `*` characters are literal.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(HubError::InvalidKeyword(
                "keyword must not be empty".to_string(),
            ));
        }

        let leading = raw.starts_with(WILDCARD);
        let trailing = raw.ends_with(WILDCARD);

        match (leading, trailing) {
            (true, true) => Ok(Self::Contains(raw.trim_matches(WILDCARD).to_string())),
            (false, false) => Ok(Self::Exact(raw.to_string())),
            _ => Err(HubError::InvalidKeyword(format!(
                "'{}' has a * on one side only; use *keyword* to match by substring",
                raw
            ))),
        }
    }

    /// Whether this expression needs the device's package listing to resolve
    pub fn is_contains(&self) -> bool {
        matches!(self, Self::Contains(_))
    }

    /// The keyword with any wildcard markers removed
    pub fn needle(&self) -> &str {
        match self {
            Self::Exact(s) | Self::Contains(s) => s,
        }
    }

    /// Test a package identifier against this expression
    pub fn matches(&self, package: &str) -> bool {
        let package = package.to_lowercase();
        match self {
            Self::Exact(k) => package == k.to_lowercase(),
            Self::Contains(k) => package.contains(&k.to_lowercase()),
        }
    }
}

impl fmt::Display for KeywordExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(k) => write!(f, "{}", k),
            Self::Contains(k) => write!(f, "*{}*", k),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_contains() {
        let expr = KeywordExpression::parse("*Foo*").unwrap();
        assert_eq!(expr, KeywordExpression::Contains("Foo".to_string()));
        assert!(expr.is_contains());
        assert_eq!(expr.to_string(), "*Foo*");
    }

    #[test]
    fn test_parse_exact() {
        let expr = KeywordExpression::parse("com.BAZ").unwrap();
        assert_eq!(expr, KeywordExpression::Exact("com.BAZ".to_string()));
        assert_eq!(expr.needle(), "com.BAZ");
        assert!(!expr.is_contains());
    }

    #[test]
    fn test_single_marker_rejected() {
        assert!(matches!(
            KeywordExpression::parse("*foo"),
            Err(HubError::InvalidKeyword(_))
        ));
        assert!(matches!(
            KeywordExpression::parse("foo*"),
            Err(HubError::InvalidKeyword(_))
        ));
        assert!(matches!(
            KeywordExpression::parse("  "),
            Err(HubError::InvalidKeyword(_))
        ));
    }

    #[test]
    fn test_inner_wildcard_is_literal() {
        assert_eq!(
            KeywordExpression::parse("com.fo*o").unwrap(),
            KeywordExpression::Exact("com.fo*o".to_string())
        );

        let expr = KeywordExpression::parse("*fo*o*").unwrap();
        assert_eq!(expr, KeywordExpression::Contains("fo*o".to_string()));
        assert!(expr.matches("com.fo*o.app"));
        assert!(!expr.matches("com.foo.app"));
    }

    #[test]
    fn test_bare_wildcard_matches_everything() {
        for raw in ["*", "**"] {
            let expr = KeywordExpression::parse(raw).unwrap();
            assert_eq!(expr.needle(), "");
            assert!(expr.matches("com.example.anything"));
        }
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let contains = KeywordExpression::parse("*foo*").unwrap();
        assert!(contains.matches("com.FOO.bar"));
        assert!(!contains.matches("com.baz"));

        let exact = KeywordExpression::parse("com.baz").unwrap();
        assert!(exact.matches("com.baz"));
        assert!(exact.matches("COM.BAZ"));
        assert!(!exact.matches("com.baz.extra"));
    }
}
