//! Package manifest structures
//!
//! The manifest (`manifest.json`) is the authoritative descriptor of a
//! template package. Optional fields fall back to their defaults when absent;
//! the required fields (`name`, `version`, `author`) are checked by the
//! validator so that every gap is reported, not just the first.

use serde::{Deserialize, Serialize};

/// Local files every template declares as dependencies
pub const DEFAULT_DEPENDENCY_FILES: [&str; 2] = ["styles.css", "script.js"];

/// A reference to an external library
///
/// Packages may list a dependency either as a bare name (`"gsap"`) or as an
/// object pinning a version (`{"name": "gsap", "version": "3.12.2"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyRef {
    /// Bare library name, resolved at its default version
    Name(String),
    /// Library name with an optional explicit version
    Pinned {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<String>,
    },
}

impl DependencyRef {
    /// Reference a library by name only
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Reference a library at a specific version
    pub fn pinned(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::Pinned {
            name: name.into(),
            version: Some(version.into()),
        }
    }

    /// Normalize to a `{name, version}` pair
    pub fn normalize(&self) -> NormalizedDependency {
        match self {
            Self::Name(name) => NormalizedDependency {
                name: name.clone(),
                version: None,
            },
            Self::Pinned { name, version } => NormalizedDependency {
                name: name.clone(),
                version: version.clone(),
            },
        }
    }
}

impl From<&str> for DependencyRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

/// A dependency reference in canonical form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedDependency {
    pub name: String,
    pub version: Option<String>,
}

/// Dependency declarations of a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependencies {
    /// External libraries loaded from the CDN allowlist
    #[serde(default, deserialize_with = "null_as_default")]
    pub external: Vec<DependencyRef>,
    /// Local files the template needs
    #[serde(default = "default_dependency_files")]
    pub files: Vec<String>,
}

/// Deserialize `null` the same way as an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_dependency_files() -> Vec<String> {
    DEFAULT_DEPENDENCY_FILES.iter().map(|s| s.to_string()).collect()
}

impl Default for Dependencies {
    fn default() -> Self {
        Self {
            external: Vec::new(),
            files: default_dependency_files(),
        }
    }
}

impl Dependencies {
    /// Create dependency declarations from a list of external references
    pub fn with_external(external: Vec<DependencyRef>) -> Self {
        Self {
            external,
            ..Default::default()
        }
    }

    /// Union another external list into this one
    ///
    /// Entries are compared in normalized form, so `"gsap"` and
    /// `{"name": "gsap"}` count as the same dependency. Returns the number
    /// of entries added.
    pub fn merge_external(&mut self, other: &[DependencyRef]) -> usize {
        let mut added = 0;
        for dep in other {
            let normalized = dep.normalize();
            if !self.external.iter().any(|d| d.normalize() == normalized) {
                self.external.push(dep.clone());
                added += 1;
            }
        }
        added
    }
}

/// Package manifest stored in manifest.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Template name, unique key in the local store
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Version of the template
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
    /// Author of the template
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    /// What the animation does
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Tags for searching/filtering
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Dependency declarations; absent means no external dependencies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Dependencies>,
    /// Relative paths of bundled assets
    #[serde(default, deserialize_with = "null_as_default")]
    pub assets: Vec<String>,
    /// Creation timestamp (RFC 3339)
    #[serde(default, deserialize_with = "null_as_default")]
    pub created: String,
    /// Preview image, one of `assets`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl Manifest {
    /// Required manifest fields, in reporting order
    pub const REQUIRED_FIELDS: [&'static str; 3] = ["name", "version", "author"];

    /// Create a new manifest stamped with the current time
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            author: author.into(),
            description: String::new(),
            tags: Vec::new(),
            dependencies: Some(Dependencies::default()),
            assets: Vec::new(),
            created: chrono::Utc::now().to_rfc3339(),
            preview: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the dependency declarations
    pub fn with_dependencies(mut self, dependencies: Dependencies) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    /// Add an asset path
    pub fn with_asset(mut self, path: impl Into<String>) -> Self {
        self.assets.push(path.into());
        self
    }

    /// Set the preview asset
    pub fn with_preview(mut self, path: impl Into<String>) -> Self {
        self.preview = Some(path.into());
        self
    }

    /// Required fields that are missing or blank
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let values = [&self.name, &self.version, &self.author];
        Self::REQUIRED_FIELDS
            .iter()
            .zip(values)
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect()
    }

    /// External dependencies, empty when none are declared
    pub fn external_dependencies(&self) -> &[DependencyRef] {
        self.dependencies
            .as_ref()
            .map(|d| d.external.as_slice())
            .unwrap_or(&[])
    }

    /// Dependency declarations, inserting the default block if absent
    pub fn dependencies_mut(&mut self) -> &mut Dependencies {
        self.dependencies.get_or_insert_with(Dependencies::default)
    }
}
