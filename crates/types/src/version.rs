//! Comparable versions and version ranges.
//!
//! A [`Version`] has three numeric segments and an optional qualifier
//! (`1.2.3.v20240101`). Ordering compares the numeric segments first and the
//! qualifier lexically last, so `1.0.0` < `1.0.0.a` < `1.0.1`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Empty version string")]
    Empty,

    #[error("Invalid segment '{segment}' in version '{input}'")]
    InvalidSegment { input: String, segment: String },

    #[error("Invalid version range '{0}'")]
    InvalidRange(String),
}

/// A totally ordered version number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    major: u32,
    minor: u32,
    micro: u32,
    qualifier: String,
}

impl Version {
    pub fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: String::new(),
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let mut parts = trimmed.splitn(4, '.');
        let mut numeric = [0u32; 3];
        for slot in numeric.iter_mut() {
            match parts.next() {
                Some(segment) => {
                    *slot = segment
                        .parse()
                        .map_err(|_| VersionError::InvalidSegment {
                            input: input.to_string(),
                            segment: segment.to_string(),
                        })?;
                }
                None => break,
            }
        }

        Ok(Self {
            major: numeric[0],
            minor: numeric[1],
            micro: numeric[2],
            qualifier: parts.next().unwrap_or_default().to_string(),
        })
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn micro(&self) -> u32 {
        self.micro
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

/// An interval of versions, written `[1.0,2.0)` or as a bare minimum `1.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    minimum: Version,
    include_minimum: bool,
    maximum: Option<Version>,
    include_maximum: bool,
}

impl VersionRange {
    /// A range matching every version at or above `minimum`.
    pub fn at_least(minimum: Version) -> Self {
        Self {
            minimum,
            include_minimum: true,
            maximum: None,
            include_maximum: false,
        }
    }

    pub fn between(
        minimum: Version,
        include_minimum: bool,
        maximum: Version,
        include_maximum: bool,
    ) -> Self {
        Self {
            minimum,
            include_minimum,
            maximum: Some(maximum),
            include_maximum,
        }
    }

    /// A range matching exactly one version.
    pub fn exactly(version: Version) -> Self {
        Self::between(version.clone(), true, version, true)
    }

    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let include_minimum = match trimmed.chars().next() {
            Some('[') => true,
            Some('(') => false,
            Some(_) => return Ok(Self::at_least(Version::parse(trimmed)?)),
            None => return Err(VersionError::Empty),
        };
        let include_maximum = match trimmed.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(VersionError::InvalidRange(input.to_string())),
        };

        let inner = &trimmed[1..trimmed.len() - 1];
        let (low, high) = inner
            .split_once(',')
            .ok_or_else(|| VersionError::InvalidRange(input.to_string()))?;

        Ok(Self::between(
            Version::parse(low)?,
            include_minimum,
            Version::parse(high)?,
            include_maximum,
        ))
    }

    pub fn contains(&self, version: &Version) -> bool {
        let above_minimum = if self.include_minimum {
            version >= &self.minimum
        } else {
            version > &self.minimum
        };
        let below_maximum = match &self.maximum {
            None => true,
            Some(max) if self.include_maximum => version <= max,
            Some(max) => version < max,
        };
        above_minimum && below_maximum
    }
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionRange {
    type Error = VersionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<VersionRange> for String {
    fn from(r: VersionRange) -> Self {
        r.to_string()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.maximum {
            None if self.include_minimum => write!(f, "{}", self.minimum),
            None => write!(f, "({},)", self.minimum),
            Some(max) => write!(
                f,
                "{}{},{}{}",
                if self.include_minimum { '[' } else { '(' },
                self.minimum,
                max,
                if self.include_maximum { ']' } else { ')' }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_full_version() {
        let version = v("1.2.3.v20240101");
        assert_eq!(version.major(), 1);
        assert_eq!(version.minor(), 2);
        assert_eq!(version.micro(), 3);
        assert_eq!(version.qualifier(), "v20240101");
    }

    #[test]
    fn test_parse_short_version_pads_with_zero() {
        assert_eq!(v("2"), Version::new(2, 0, 0));
        assert_eq!(v("2.1"), Version::new(2, 1, 0));
    }

    #[test]
    fn test_parse_rejects_non_numeric_segment() {
        assert!(matches!(
            Version::parse("1.x.0"),
            Err(VersionError::InvalidSegment { .. })
        ));
        assert_eq!(Version::parse("  "), Err(VersionError::Empty));
    }

    #[test]
    fn test_ordering_numeric_before_qualifier() {
        assert!(v("1.0.0") < v("1.0.0.a"));
        assert!(v("1.0.0.z") < v("1.0.1"));
        assert!(v("1.10.0") > v("1.9.0"));
        assert_eq!(v("1.0"), v("1.0.0"));
    }

    #[test]
    fn test_display_round_trips() {
        assert_eq!(v("1.2").to_string(), "1.2.0");
        assert_eq!(v("1.2.3.beta").to_string(), "1.2.3.beta");
    }

    #[test]
    fn test_range_contains() {
        let range = VersionRange::parse("[1.0,2.0)").unwrap();
        assert!(range.contains(&v("1.0.0")));
        assert!(range.contains(&v("1.9.9")));
        assert!(!range.contains(&v("2.0.0")));
        assert!(!range.contains(&v("0.9")));

        let open = VersionRange::parse("(1.0,2.0]").unwrap();
        assert!(!open.contains(&v("1.0")));
        assert!(open.contains(&v("2.0")));
    }

    #[test]
    fn test_bare_range_is_minimum() {
        let range = VersionRange::parse("1.5").unwrap();
        assert!(range.contains(&v("1.5")));
        assert!(range.contains(&v("99.0")));
        assert!(!range.contains(&v("1.4.9")));
        assert_eq!(range.to_string(), "1.5.0");
    }

    #[test]
    fn test_range_parse_errors() {
        assert!(matches!(
            VersionRange::parse("[1.0"),
            Err(VersionError::InvalidRange(_))
        ));
        assert!(matches!(
            VersionRange::parse("[1.0]"),
            Err(VersionError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_version_serde_as_string() {
        let json = serde_json::to_string(&v("3.1.4")).unwrap();
        assert_eq!(json, "\"3.1.4\"");
        let back: Version = serde_json::from_str("\"3.1.4.final\"").unwrap();
        assert_eq!(back, v("3.1.4.final"));
        assert!(serde_json::from_str::<Version>("\"abc\"").is_err());
    }
}
