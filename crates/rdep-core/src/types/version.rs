//! Four-component package versions and relational constraints.
//!
//! A repository index records versions such as `1.2.3`, `0.9-12` or
//! `4.1.0.2`. They are normalized to a `(major, minor, patch, rev)` tuple,
//! padding missing trailing components with zero, and ordered
//! lexicographically.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Package version (major.minor.patch.rev)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub rev: u32,
}

/// Relational operator of a version constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = ">")]
    Gt,
}

/// An operator applied to a reference version, e.g. `>= 2.0.0.0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionConstraint {
    pub op: Op,
    pub version: Version,
}

/// Version and constraint parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Empty version string")]
    Empty,

    #[error("Version '{input}' has more than four components")]
    TooManyComponents { input: String },

    #[error("Invalid number in version '{input}': '{component}'")]
    InvalidNumber { input: String, component: String },

    #[error("Unknown constraint operator in '{input}'")]
    InvalidOperator { input: String },
}

impl Version {
    pub const ZERO: Version = Version::new(0, 0, 0, 0);

    /// Create a new version
    pub const fn new(major: u32, minor: u32, patch: u32, rev: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            rev,
        }
    }

    /// Check if this version satisfies a constraint
    pub fn satisfies(&self, constraint: &VersionConstraint) -> bool {
        constraint.matches(self)
    }

    /// Check against an optional constraint; no constraint always matches
    pub fn satisfies_opt(&self, constraint: Option<&VersionConstraint>) -> bool {
        constraint.map_or(true, |c| c.matches(self))
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(VersionError::Empty);
        }

        // R-style versions use '-' as well as '.' between components
        let mut parts = [0u32; 4];
        for (i, component) in input.split(['.', '-']).enumerate() {
            if i >= parts.len() {
                return Err(VersionError::TooManyComponents {
                    input: input.to_string(),
                });
            }
            if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionError::InvalidNumber {
                    input: input.to_string(),
                    component: component.to_string(),
                });
            }
            parts[i] = component.parse().map_err(|_| VersionError::InvalidNumber {
                input: input.to_string(),
                component: component.to_string(),
            })?;
        }

        let [major, minor, patch, rev] = parts;
        Ok(Version::new(major, minor, patch, rev))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.patch, self.rev)
    }
}

impl Op {
    /// Whether `compare(candidate, reference)` satisfies this operator
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Op::Lt => ordering == Ordering::Less,
            Op::Lte => ordering != Ordering::Greater,
            Op::Eq => ordering == Ordering::Equal,
            Op::Gte => ordering != Ordering::Less,
            Op::Gt => ordering == Ordering::Greater,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Eq => "==",
            Op::Gte => ">=",
            Op::Gt => ">",
        }
    }

    /// Split a leading operator off `input`, returning the operator and the rest
    pub fn split_prefix(input: &str) -> Option<(Op, &str)> {
        // Two-character operators must be tried first
        const TABLE: [(&str, Op); 6] = [
            ("<=", Op::Lte),
            (">=", Op::Gte),
            ("==", Op::Eq),
            ("<", Op::Lt),
            (">", Op::Gt),
            ("=", Op::Eq),
        ];
        TABLE
            .iter()
            .find_map(|(token, op)| input.strip_prefix(token).map(|rest| (*op, rest)))
    }
}

impl FromStr for Op {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Op::split_prefix(s.trim()) {
            Some((op, "")) => Ok(op),
            _ => Err(VersionError::InvalidOperator {
                input: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl VersionConstraint {
    pub fn new(op: Op, version: Version) -> Self {
        Self { op, version }
    }

    /// Check if a candidate version satisfies this constraint
    pub fn matches(&self, candidate: &Version) -> bool {
        self.op.holds(candidate.cmp(&self.version))
    }
}

impl FromStr for VersionConstraint {
    type Err = VersionError;

    /// Parse `op version`, e.g. `>= 3.5.0` or `==1.0-2`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let (op, rest) = Op::split_prefix(input).ok_or_else(|| VersionError::InvalidOperator {
            input: input.to_string(),
        })?;
        let version = rest.parse()?;
        Ok(VersionConstraint { op, version })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        let v = Version::from_str("1.2.3.4").unwrap();
        assert_eq!(v, Version::new(1, 2, 3, 4));
    }

    #[test]
    fn test_version_padding() {
        assert_eq!(Version::from_str("1").unwrap(), Version::new(1, 0, 0, 0));
        assert_eq!(Version::from_str("1.2").unwrap(), Version::new(1, 2, 0, 0));
        assert_eq!(Version::from_str(" 1.2.3 ").unwrap(), Version::new(1, 2, 3, 0));
    }

    #[test]
    fn test_version_dash_separator() {
        assert_eq!(Version::from_str("0.9-12").unwrap(), Version::new(0, 9, 12, 0));
        assert_eq!(Version::from_str("1.0-2.1").unwrap(), Version::new(1, 0, 2, 1));
    }

    #[test]
    fn test_version_errors() {
        assert_eq!(Version::from_str("  "), Err(VersionError::Empty));
        assert!(matches!(
            Version::from_str("1.2.3.4.5"),
            Err(VersionError::TooManyComponents { .. })
        ));
        assert!(matches!(
            Version::from_str("1..2"),
            Err(VersionError::InvalidNumber { .. })
        ));
        assert!(matches!(
            Version::from_str("1.2a"),
            Err(VersionError::InvalidNumber { .. })
        ));
        assert!(matches!(
            Version::from_str("-1.2"),
            Err(VersionError::InvalidNumber { .. })
        ));
        assert!(matches!(
            Version::from_str("99999999999"),
            Err(VersionError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_version_display() {
        assert_eq!(Version::new(1, 2, 3, 0).to_string(), "1.2.3.0");
    }

    #[test]
    fn test_version_comparison() {
        let v1 = Version::new(1, 0, 0, 0);
        let v2 = Version::new(2, 0, 0, 0);
        let v3 = Version::new(1, 1, 0, 0);
        let v4 = Version::new(1, 0, 0, 1);

        assert!(v1 < v2);
        assert!(v1 < v3);
        assert!(v3 < v2);
        assert!(v1 < v4);
        assert!(v4 < v3);
    }

    #[test]
    fn test_op_parsing() {
        assert_eq!(Op::from_str("<").unwrap(), Op::Lt);
        assert_eq!(Op::from_str("<=").unwrap(), Op::Lte);
        assert_eq!(Op::from_str("==").unwrap(), Op::Eq);
        assert_eq!(Op::from_str("=").unwrap(), Op::Eq);
        assert_eq!(Op::from_str(">=").unwrap(), Op::Gte);
        assert_eq!(Op::from_str(">").unwrap(), Op::Gt);
        assert!(Op::from_str("~").is_err());
        assert!(Op::from_str(">>").is_err());
    }

    #[test]
    fn test_constraint_parsing() {
        let c = VersionConstraint::from_str(">= 3.5.0").unwrap();
        assert_eq!(c, VersionConstraint::new(Op::Gte, Version::new(3, 5, 0, 0)));

        let c = VersionConstraint::from_str("<1.0-2").unwrap();
        assert_eq!(c, VersionConstraint::new(Op::Lt, Version::new(1, 0, 2, 0)));

        assert!(VersionConstraint::from_str("~1.0").is_err());
        assert!(VersionConstraint::from_str(">=").is_err());
    }

    #[test]
    fn test_constraint_operators() {
        let v1_2 = Version::new(1, 2, 0, 0);
        let v1_3 = Version::new(1, 3, 0, 0);
        let reference = Version::new(1, 2, 0, 0);

        let check = |op, v: &Version| VersionConstraint::new(op, reference).matches(v);

        assert!(!check(Op::Lt, &v1_2));
        assert!(check(Op::Lte, &v1_2));
        assert!(check(Op::Eq, &v1_2));
        assert!(check(Op::Gte, &v1_2));
        assert!(!check(Op::Gt, &v1_2));

        assert!(!check(Op::Lt, &v1_3));
        assert!(!check(Op::Eq, &v1_3));
        assert!(check(Op::Gt, &v1_3));
    }

    #[test]
    fn test_constraint_display() {
        let c = VersionConstraint::new(Op::Gte, Version::new(2, 0, 0, 0));
        assert_eq!(c.to_string(), ">= 2.0.0.0");
    }

    #[test]
    fn test_satisfies_opt() {
        let v = Version::new(1, 0, 0, 0);
        assert!(v.satisfies_opt(None));
        let c = VersionConstraint::new(Op::Gt, Version::new(1, 0, 0, 0));
        assert!(!v.satisfies_opt(Some(&c)));
    }

    #[test]
    fn test_op_serde() {
        let c = VersionConstraint::new(Op::Gte, Version::new(1, 0, 0, 0));
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\">=\""));
        let back: VersionConstraint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
