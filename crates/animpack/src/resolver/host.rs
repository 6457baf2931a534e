//! Page resource bookkeeping
//!
//! The host stands in for the page the gallery renders into: it remembers
//! which script and stylesheet resources have been attached, so each
//! dependency is attached at most once per page lifetime.

use super::ResourceKind;
use serde::Serialize;
use std::collections::BTreeMap;

/// Load state of an attached resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    Pending,
    Loaded,
}

/// A script or stylesheet attached to the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResource {
    pub name: String,
    pub url: String,
    pub kind: ResourceKind,
    pub state: ResourceState,
    /// Bytes received when the load completed
    pub size: Option<usize>,
}

/// Resources attached to the page, keyed by dependency name
#[derive(Debug, Default)]
pub struct ResourceHost {
    resources: BTreeMap<String, PageResource>,
}

impl ResourceHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a pending resource; returns false if the name is already attached
    pub fn inject(&mut self, name: &str, url: &str, kind: ResourceKind) -> bool {
        if self.resources.contains_key(name) {
            return false;
        }
        self.resources.insert(
            name.to_string(),
            PageResource {
                name: name.to_string(),
                url: url.to_string(),
                kind,
                state: ResourceState::Pending,
                size: None,
            },
        );
        true
    }

    /// Mark an attached resource as loaded
    pub fn mark_loaded(&mut self, name: &str, size: usize) {
        if let Some(resource) = self.resources.get_mut(name) {
            resource.state = ResourceState::Loaded;
            resource.size = Some(size);
        }
    }

    /// Detach a resource
    pub fn remove(&mut self, name: &str) -> Option<PageResource> {
        self.resources.remove(name)
    }

    /// Whether the name is attached, pending or loaded
    pub fn is_attached(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    /// Whether the name finished loading
    pub fn is_loaded(&self, name: &str) -> bool {
        self.resources
            .get(name)
            .map(|r| r.state == ResourceState::Loaded)
            .unwrap_or(false)
    }

    /// All attached resources
    pub fn resources(&self) -> impl Iterator<Item = &PageResource> {
        self.resources.values()
    }

    /// Number of attached resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Forget everything, as a page reload would
    pub fn reset(&mut self) {
        self.resources.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_once() {
        let mut host = ResourceHost::new();
        assert!(host.inject("gsap", "https://cdn/gsap.js", ResourceKind::Script));
        assert!(!host.inject("gsap", "https://cdn/other.js", ResourceKind::Script));
        assert!(host.is_attached("gsap"));
        assert!(!host.is_loaded("gsap"));

        host.mark_loaded("gsap", 42);
        assert!(host.is_loaded("gsap"));
        assert_eq!(host.len(), 1);
    }

    #[test]
    fn test_remove_and_reset() {
        let mut host = ResourceHost::new();
        host.inject("a", "u", ResourceKind::Stylesheet);
        host.inject("b", "u", ResourceKind::Script);

        assert_eq!(host.remove("a").map(|r| r.kind), Some(ResourceKind::Stylesheet));
        assert!(!host.is_attached("a"));

        host.reset();
        assert!(host.is_empty());
    }
}
