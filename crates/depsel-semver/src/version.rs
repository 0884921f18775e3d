//! Version identifiers and their total order

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::constraint::ConstraintError;

lazy_static! {
    static ref VERSION_RE: Regex = Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?$").unwrap();
}

/// A version identifier of one to three numeric components.
///
/// Components that were not written count as zero, so `1.0` and `1.0.0`
/// compare equal. The number of written components is remembered for
/// display and for the `~>` operator, which truncates at the last one.
#[derive(Debug, Clone, Copy)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
    components: u8,
}

impl Version {
    /// Create a fully specified `major.minor.patch` version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            components: 3,
        }
    }

    /// Parse a version identifier such as `1`, `1.2` or `1.2.3`
    pub fn parse(input: &str) -> Result<Self, ConstraintError> {
        let trimmed = input.trim();
        let invalid = || ConstraintError::InvalidVersion {
            version: input.to_string(),
        };

        let caps = VERSION_RE.captures(trimmed).ok_or_else(invalid)?;
        let mut parts = [0u64; 3];
        let mut components = 0u8;
        for (i, slot) in parts.iter_mut().enumerate() {
            if let Some(m) = caps.get(i + 1) {
                *slot = m.as_str().parse().map_err(|_| invalid())?;
                components += 1;
            }
        }

        Ok(Version {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
            components,
        })
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    /// Number of components written in the source identifier (1 to 3)
    pub fn components(&self) -> u8 {
        self.components
    }

    /// Exclusive upper bound for `~> self`.
    ///
    /// Drops the last written component and increments the new last one:
    /// `1.2.3` gives `1.3`, `1.2` gives `2`. A single component is simply
    /// incremented.
    pub fn pessimistic_upper(&self) -> Version {
        match self.components {
            3 => Version {
                major: self.major,
                minor: self.minor.saturating_add(1),
                patch: 0,
                components: 2,
            },
            _ => Version {
                major: self.major.saturating_add(1),
                minor: 0,
                patch: 0,
                components: 1,
            },
        }
    }

    fn key(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl FromStr for Version {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.components {
            1 => write!(f, "{}", self.major),
            2 => write!(f, "{}.{}", self.major, self.minor),
            _ => write!(f, "{}.{}.{}", self.major, self.minor, self.patch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_components() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!((v.major(), v.minor(), v.patch()), (1, 2, 3));
        assert_eq!(v.components(), 3);

        let v = Version::parse(" 4.5 ").unwrap();
        assert_eq!((v.major(), v.minor(), v.patch()), (4, 5, 0));
        assert_eq!(v.components(), 2);
        assert_eq!(v.to_string(), "4.5");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("1.2.3.4").is_err());
        assert!(Version::parse("1.x").is_err());
        assert!(Version::parse("v1.0.0").is_err());
        assert!(Version::parse("99999999999999999999999").is_err());
    }

    #[test]
    fn test_ordering() {
        let v = |s: &str| Version::parse(s).unwrap();
        assert!(v("1.10.0") > v("1.9.0"));
        assert!(v("2.0.0") > v("1.99.99"));
        assert!(v("0.0.1") < v("0.1"));
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1"), v("1.0.0"));
    }

    #[test]
    fn test_display_round_trips_written_form() {
        for s in ["1", "1.0", "1.0.0", "10.20.30"] {
            assert_eq!(Version::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_pessimistic_upper() {
        let v = |s: &str| Version::parse(s).unwrap();
        assert_eq!(v("1.2.3").pessimistic_upper(), v("1.3.0"));
        assert_eq!(v("1.2").pessimistic_upper(), v("2.0.0"));
        assert_eq!(v("1").pessimistic_upper(), v("2.0.0"));
    }
}
