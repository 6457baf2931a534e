//! Known CDN dependencies

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a dependency is attached to the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Script,
    Stylesheet,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Script => write!(f, "script"),
            Self::Stylesheet => write!(f, "stylesheet"),
        }
    }
}

/// A library on the CDN allowlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownDependency {
    /// URL with a `{version}` placeholder
    pub url_template: String,
    /// Version used when the reference does not pin one
    pub default_version: String,
    /// Script or stylesheet
    pub kind: ResourceKind,
}

impl KnownDependency {
    pub fn new(
        url_template: impl Into<String>,
        default_version: impl Into<String>,
        kind: ResourceKind,
    ) -> Self {
        Self {
            url_template: url_template.into(),
            default_version: default_version.into(),
            kind,
        }
    }

    /// Concrete URL for a version, or the default version
    pub fn url(&self, version: Option<&str>) -> String {
        self.url_template
            .replace("{version}", version.unwrap_or(&self.default_version))
    }
}

/// Symbolic name to CDN resource mapping
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DependencyTable {
    entries: BTreeMap<String, KnownDependency>,
}

impl DependencyTable {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// The shipped allowlist
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.register(
            "gsap",
            KnownDependency::new(
                "https://cdnjs.cloudflare.com/ajax/libs/gsap/{version}/gsap.min.js",
                "3.12.2",
                ResourceKind::Script,
            ),
        );
        table.register(
            "animate.css",
            KnownDependency::new(
                "https://cdnjs.cloudflare.com/ajax/libs/animate.css/{version}/animate.min.css",
                "4.1.1",
                ResourceKind::Stylesheet,
            ),
        );
        table
    }

    /// Add or replace an entry
    pub fn register(&mut self, name: impl Into<String>, dependency: KnownDependency) {
        self.entries.insert(name.into(), dependency);
    }

    /// Look up a dependency by name
    pub fn get(&self, name: &str) -> Option<&KnownDependency> {
        self.entries.get(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_urls() {
        let table = DependencyTable::builtin();

        let gsap = table.get("gsap").unwrap();
        assert_eq!(gsap.kind, ResourceKind::Script);
        assert_eq!(
            gsap.url(None),
            "https://cdnjs.cloudflare.com/ajax/libs/gsap/3.12.2/gsap.min.js"
        );
        assert_eq!(
            gsap.url(Some("3.11.0")),
            "https://cdnjs.cloudflare.com/ajax/libs/gsap/3.11.0/gsap.min.js"
        );

        assert_eq!(table.get("animate.css").unwrap().kind, ResourceKind::Stylesheet);
        assert!(table.get("not-a-real-lib").is_none());
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["animate.css", "gsap"]);
    }
}
