//! Name-collision handling
//!
//! When an imported template's name is already installed, the caller decides
//! what happens: keep the existing one, install under a fresh name, or
//! replace it.

use serde::{Deserialize, Serialize};
use store::TemplateRecord;

/// Disposition for a colliding import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictResolution {
    /// Replace the stored record
    #[default]
    Overwrite,
    /// Install under the lowest free `"<name> (<n>)"`, n >= 2
    Duplicate,
    /// Abort without writing
    Skip,
}

impl std::fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overwrite => write!(f, "overwrite"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

impl std::str::FromStr for ConflictResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" | "o" => Ok(Self::Overwrite),
            "duplicate" | "d" => Ok(Self::Duplicate),
            "skip" | "s" => Ok(Self::Skip),
            other => Err(format!("unknown conflict resolution '{other}'")),
        }
    }
}

/// What the handler is told about a collision
#[derive(Debug, Clone)]
pub struct ConflictContext {
    /// The colliding name
    pub name: String,
    /// The record currently installed under that name
    pub existing: TemplateRecord,
}

/// Decides how to resolve a name collision
#[trait_variant::make(Send)]
pub trait ConflictHandler: Send + Sync {
    async fn resolve(&self, context: &ConflictContext) -> ConflictResolution;
}

/// Handler that always answers the same way
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConflictPolicy(pub ConflictResolution);

impl ConflictHandler for ConflictPolicy {
    async fn resolve(&self, _context: &ConflictContext) -> ConflictResolution {
        self.0
    }
}

/// Candidate name for the n-th copy of a template
pub fn duplicate_name(name: &str, n: u32) -> String {
    format!("{name} ({n})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution() {
        assert_eq!("overwrite".parse(), Ok(ConflictResolution::Overwrite));
        assert_eq!(" D ".parse(), Ok(ConflictResolution::Duplicate));
        assert_eq!("skip".parse(), Ok(ConflictResolution::Skip));
        assert!("merge".parse::<ConflictResolution>().is_err());
    }

    #[test]
    fn test_duplicate_name() {
        assert_eq!(duplicate_name("Foo", 2), "Foo (2)");
        assert_eq!(duplicate_name("Foo (2)", 2), "Foo (2) (2)");
    }

    #[test]
    fn test_default_policy_overwrites() {
        assert_eq!(ConflictPolicy::default().0, ConflictResolution::Overwrite);
        assert_eq!(ConflictResolution::Duplicate.to_string(), "duplicate");
    }
}
