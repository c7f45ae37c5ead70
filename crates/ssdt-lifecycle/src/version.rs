//! Dacpac versions and the configurable version pattern used to render them.
//!
//! A pattern is a dotted list of 2 to 4 segments. Each segment is either a
//! non-negative integer literal or the keyword for its position:
//!
//! | Position | Keyword |
//! |---|---|
//! | 0 | `{MAJOR}` |
//! | 1 | `{MINOR}` |
//! | 2 | `{BUILD}` (alias `{PATCH}`) |
//! | 3 | `{REVISION}` |
//!
//! Patterns are validated when parsed (or deserialized), so formatting never
//! fails.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LifecycleError, Result};

/// Default version pattern, renders all four components.
pub const DEFAULT_VERSION_PATTERN: &str = "{MAJOR}.{MINOR}.{BUILD}.{REVISION}";

const KEYWORD_MAJOR: &str = "{MAJOR}";
const KEYWORD_MINOR: &str = "{MINOR}";
const KEYWORD_BUILD: &str = "{BUILD}";
const KEYWORD_PATCH: &str = "{PATCH}";
const KEYWORD_REVISION: &str = "{REVISION}";

/// Four-part numeric dacpac version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    pub revision: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    fn component(&self, position: usize) -> u32 {
        match position {
            0 => self.major,
            1 => self.minor,
            2 => self.build,
            _ => self.revision,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

impl FromStr for Version {
    type Err = LifecycleError;

    /// Parse `major.minor[.build[.revision]]`; missing parts are 0.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if !(2..=4).contains(&parts.len()) {
            return Err(LifecycleError::config(format!(
                "Version '{}' must have between 2 and 4 components",
                s
            )));
        }

        let mut components = [0u32; 4];
        for (i, part) in parts.iter().enumerate() {
            components[i] = part.parse().map_err(|_| {
                LifecycleError::config(format!(
                    "Version '{}' has an invalid component '{}'",
                    s, part
                ))
            })?;
        }

        Ok(Version::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }
}

/// A single validated pattern segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Literal(u32),
    Component(usize),
}

/// Validated version pattern. Stored as its raw string on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl VersionPattern {
    /// Parse and validate a pattern.
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.trim().is_empty() {
            return Err(LifecycleError::config("Version pattern is required"));
        }

        let parts: Vec<&str> = pattern.split('.').collect();
        if !(2..=4).contains(&parts.len()) {
            return Err(LifecycleError::config(format!(
                "Version pattern '{}' must have between 2 and 4 segments, found {}",
                pattern,
                parts.len()
            )));
        }

        let segments = parts
            .iter()
            .enumerate()
            .map(|(position, part)| parse_segment(pattern, position, part))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// Render a version with this pattern.
    pub fn format(&self, version: &Version) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(value) => value.to_string(),
                Segment::Component(position) => version.component(*position).to_string(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn parse_segment(pattern: &str, position: usize, part: &str) -> Result<Segment> {
    let part = part.trim();

    if part.starts_with('{') {
        let expected_position = match part {
            KEYWORD_MAJOR => 0,
            KEYWORD_MINOR => 1,
            KEYWORD_BUILD | KEYWORD_PATCH => 2,
            KEYWORD_REVISION => 3,
            _ => {
                return Err(LifecycleError::config(format!(
                    "Version pattern '{}' contains unknown keyword '{}'",
                    pattern, part
                )))
            }
        };
        if expected_position != position {
            return Err(LifecycleError::config(format!(
                "Keyword '{}' must be segment {} of the version pattern, found at segment {}",
                part,
                expected_position + 1,
                position + 1
            )));
        }
        return Ok(Segment::Component(position));
    }

    if part.starts_with('-') {
        return Err(LifecycleError::config(format!(
            "Version pattern '{}' contains negative number '{}'",
            pattern, part
        )));
    }

    part.parse::<u32>().map(Segment::Literal).map_err(|_| {
        LifecycleError::config(format!(
            "Version pattern '{}' contains invalid segment '{}'",
            pattern, part
        ))
    })
}

impl Default for VersionPattern {
    fn default() -> Self {
        Self {
            raw: DEFAULT_VERSION_PATTERN.to_string(),
            segments: (0..4).map(Segment::Component).collect(),
        }
    }
}

impl fmt::Display for VersionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for VersionPattern {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionPattern {
    type Error = LifecycleError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<VersionPattern> for String {
    fn from(pattern: VersionPattern) -> Self {
        pattern.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_three_segments_with_patch_alias() {
        let pattern = VersionPattern::parse("{MAJOR}.{MINOR}.{PATCH}").unwrap();
        let version: Version = "2.5.0.0".parse().unwrap();
        assert_eq!(pattern.format(&version), "2.5.0");
    }

    #[test]
    fn test_format_default_pattern() {
        let pattern = VersionPattern::default();
        assert_eq!(pattern.format(&Version::new(1, 2, 3, 4)), "1.2.3.4");
        assert_eq!(pattern, VersionPattern::parse(DEFAULT_VERSION_PATTERN).unwrap());
    }

    #[test]
    fn test_format_with_literals() {
        let pattern = VersionPattern::parse("{MAJOR}.0.{BUILD}.7").unwrap();
        assert_eq!(pattern.format(&Version::new(3, 9, 1, 2)), "3.0.1.7");
    }

    #[test]
    fn test_format_is_deterministic() {
        let version = Version::new(4, 1, 0, 12);
        for raw in ["{MAJOR}.{MINOR}", "1.{MINOR}.{BUILD}", "{MAJOR}.{MINOR}.{BUILD}.{REVISION}"] {
            let pattern = VersionPattern::parse(raw).unwrap();
            let first = pattern.format(&version);
            assert_eq!(first, pattern.format(&version));
            // re-validating the accepted pattern never fails
            assert_eq!(VersionPattern::parse(pattern.as_str()).unwrap(), pattern);
        }
    }

    #[test]
    fn test_rejects_wrong_arity() {
        assert!(VersionPattern::parse("{MAJOR}").is_err());
        assert!(VersionPattern::parse("{MAJOR}.{MINOR}.{BUILD}.{REVISION}.1").is_err());
        assert!(VersionPattern::parse("").is_err());
    }

    #[test]
    fn test_rejects_misplaced_keyword() {
        let err = VersionPattern::parse("{MINOR}.{MAJOR}").unwrap_err();
        assert!(err.to_string().contains("must be segment 2"));
    }

    #[test]
    fn test_rejects_negative_and_garbage() {
        assert!(VersionPattern::parse("{MAJOR}.-1").is_err());
        assert!(VersionPattern::parse("{MAJOR}.x").is_err());
        assert!(VersionPattern::parse("{MAJOR}.{FOO}").is_err());
        assert!(VersionPattern::parse("{MAJOR}.").is_err());
    }

    #[test]
    fn test_serde_validates_pattern() {
        let pattern: VersionPattern = serde_json::from_str("\"{MAJOR}.{MINOR}.{PATCH}\"").unwrap();
        assert_eq!(pattern.format(&Version::new(2, 5, 1, 9)), "2.5.1");
        assert_eq!(serde_json::to_string(&pattern).unwrap(), "\"{MAJOR}.{MINOR}.{PATCH}\"");

        let err = serde_json::from_str::<VersionPattern>("\"{MINOR}.{MAJOR}\"").unwrap_err();
        assert!(err.to_string().contains("must be segment 2"));
    }

    #[test]
    fn test_version_parse() {
        assert_eq!("1.2".parse::<Version>().unwrap(), Version::new(1, 2, 0, 0));
        assert_eq!("1.2.3.4".parse::<Version>().unwrap(), Version::new(1, 2, 3, 4));
        assert!("1".parse::<Version>().is_err());
        assert!("1.a".parse::<Version>().is_err());
    }

    #[test]
    fn test_version_ordering() {
        assert!(Version::new(1, 1, 0, 0) > Version::new(1, 0, 9, 9));
        assert!(Version::new(2, 0, 0, 0) > Version::new(1, 9, 9, 9));
    }
}
