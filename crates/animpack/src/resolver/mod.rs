//! Dependency resolution
//!
//! Turns a manifest's external dependency list into page resources, each
//! dependency attached at most once per page lifetime. Failures are
//! collected per entry; one bad dependency never blocks the others.

mod host;
mod loader;
mod table;

pub use host::*;
pub use loader::*;
pub use table::*;

use crate::Manifest;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

/// Default per-resource load timeout
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Why a single dependency could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Unknown dependency: {0}")]
    UnknownDependency(String),

    #[error("Timed out after {timeout_ms} ms loading {kind} {url}")]
    Timeout {
        url: String,
        kind: ResourceKind,
        timeout_ms: u128,
    },

    #[error("Failed to load {kind} {url}: {reason}")]
    LoadFailed {
        url: String,
        kind: ResourceKind,
        reason: String,
    },
}

/// A dependency that failed to resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyFailure {
    pub name: String,
    pub error: String,
}

/// Outcome of resolving one manifest's dependencies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    /// Newly attached this call
    pub loaded: Vec<String>,
    /// Already attached earlier
    pub skipped: Vec<String>,
    /// Per-entry failures
    pub errors: Vec<DependencyFailure>,
}

impl ResolutionReport {
    /// Whether every dependency resolved
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Resolves manifest dependencies against a [`DependencyTable`]
pub struct DependencyResolver<L> {
    table: DependencyTable,
    loader: L,
    timeout: Duration,
    host: Arc<Mutex<ResourceHost>>,
}

impl<L> std::fmt::Debug for DependencyResolver<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyResolver")
            .field("table", &self.table)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<L: ResourceLoader> DependencyResolver<L> {
    /// Create a resolver over the built-in table
    pub fn new(loader: L) -> Self {
        Self {
            table: DependencyTable::builtin(),
            loader,
            timeout: DEFAULT_LOAD_TIMEOUT,
            host: Arc::new(Mutex::new(ResourceHost::new())),
        }
    }

    /// Use a different dependency table
    pub fn with_table(mut self, table: DependencyTable) -> Self {
        self.table = table;
        self
    }

    /// Set the per-resource timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Share a page host with other resolvers
    pub fn with_host(mut self, host: Arc<Mutex<ResourceHost>>) -> Self {
        self.host = host;
        self
    }

    /// The page host
    pub fn host(&self) -> Arc<Mutex<ResourceHost>> {
        self.host.clone()
    }

    /// The dependency table
    pub fn table(&self) -> &DependencyTable {
        &self.table
    }

    /// The loader
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Resolve every external dependency of the manifest
    pub async fn resolve_dependencies(&self, manifest: &Manifest) -> ResolutionReport {
        let mut report = ResolutionReport::default();

        for dep in manifest.external_dependencies() {
            let dep = dep.normalize();

            let Some(known) = self.table.get(&dep.name) else {
                tracing::warn!(name = %dep.name, "Unknown dependency");
                report.errors.push(DependencyFailure {
                    error: ResolveError::UnknownDependency(dep.name.clone()).to_string(),
                    name: dep.name,
                });
                continue;
            };

            let request = ResourceRequest {
                url: known.url(dep.version.as_deref()),
                kind: known.kind,
                name: dep.name,
            };

            let injected = self
                .host
                .lock()
                .await
                .inject(&request.name, &request.url, request.kind);
            if !injected {
                tracing::debug!(name = %request.name, "Dependency already loaded");
                report.skipped.push(request.name);
                continue;
            }

            match self.load(&request).await {
                Ok(size) => {
                    self.host.lock().await.mark_loaded(&request.name, size);
                    tracing::info!(name = %request.name, url = %request.url, "Loaded dependency");
                    report.loaded.push(request.name);
                }
                Err(e) => {
                    self.host.lock().await.remove(&request.name);
                    tracing::warn!(name = %request.name, "Dependency failed: {}", e);
                    report.errors.push(DependencyFailure {
                        name: request.name,
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    async fn load(&self, request: &ResourceRequest) -> Result<usize, ResolveError> {
        match tokio::time::timeout(self.timeout, self.loader.load(request)).await {
            Ok(Ok(body)) => Ok(body.len()),
            Ok(Err(reason)) => Err(ResolveError::LoadFailed {
                url: request.url.clone(),
                kind: request.kind,
                reason,
            }),
            Err(_) => Err(ResolveError::Timeout {
                url: request.url.clone(),
                kind: request.kind,
                timeout_ms: self.timeout.as_millis(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dependencies, DependencyRef};

    fn manifest_with(deps: Vec<DependencyRef>) -> Manifest {
        Manifest::new("Test", "1.0.0", "Ada").with_dependencies(Dependencies::with_external(deps))
    }

    fn online_resolver() -> DependencyResolver<StaticResourceLoader> {
        let table = DependencyTable::builtin();
        let urls = table
            .names()
            .filter_map(|n| table.get(n))
            .map(|d| d.url(None))
            .collect::<Vec<_>>();
        DependencyResolver::new(StaticResourceLoader::serving(urls))
    }

    #[tokio::test]
    async fn test_second_resolution_skips() {
        let resolver = online_resolver();
        let manifest = manifest_with(vec![DependencyRef::name("gsap")]);

        let first = resolver.resolve_dependencies(&manifest).await;
        assert_eq!(first.loaded, vec!["gsap"]);
        assert!(first.skipped.is_empty());

        let second = resolver.resolve_dependencies(&manifest).await;
        assert!(second.loaded.is_empty());
        assert_eq!(second.skipped, vec!["gsap"]);

        assert_eq!(resolver.loader().request_count(), 1);
        assert_eq!(resolver.host().lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_dependency_is_reported() {
        let resolver = online_resolver();
        let manifest = manifest_with(vec![DependencyRef::name("not-a-real-lib")]);

        let report = resolver.resolve_dependencies(&manifest).await;
        assert!(report.loaded.is_empty());
        assert!(report.skipped.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].name, "not-a-real-lib");
        assert!(report.errors[0].error.contains("Unknown dependency"));
    }

    #[tokio::test]
    async fn test_failure_does_not_block_batch() {
        let resolver = DependencyResolver::new(StaticResourceLoader::new().with_response(
            "https://cdnjs.cloudflare.com/ajax/libs/animate.css/4.1.1/animate.min.css",
            StaticResponse::Body(b".animated{}".to_vec()),
        ));
        let manifest = manifest_with(vec![
            DependencyRef::name("gsap"),
            DependencyRef::name("animate.css"),
        ]);

        let report = resolver.resolve_dependencies(&manifest).await;
        assert_eq!(report.loaded, vec!["animate.css"]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].name, "gsap");

        // The failed resource is detached and may be retried.
        let host = resolver.host();
        assert!(!host.lock().await.is_attached("gsap"));
        assert!(host.lock().await.is_loaded("animate.css"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_removes_resource() {
        let url = "https://cdnjs.cloudflare.com/ajax/libs/gsap/3.12.2/gsap.min.js";
        let resolver = DependencyResolver::new(StaticResourceLoader::new().with_response(
            url,
            StaticResponse::Delayed(Duration::from_secs(60), Vec::new()),
        ))
        .with_timeout(Duration::from_millis(100));

        let report = resolver
            .resolve_dependencies(&manifest_with(vec![DependencyRef::name("gsap")]))
            .await;

        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].error.contains("Timed out after 100 ms"));
        assert!(resolver.host().lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_pinned_version_and_duplicates() {
        let url = "https://cdnjs.cloudflare.com/ajax/libs/gsap/3.11.0/gsap.min.js";
        let resolver = DependencyResolver::new(
            StaticResourceLoader::new().with_response(url, StaticResponse::Body(b"x".to_vec())),
        );
        let manifest = manifest_with(vec![
            DependencyRef::pinned("gsap", "3.11.0"),
            DependencyRef::name("gsap"),
        ]);

        let report = resolver.resolve_dependencies(&manifest).await;
        assert_eq!(report.loaded, vec!["gsap"]);
        assert_eq!(report.skipped, vec!["gsap"]);
        let host = resolver.host();
        let guard = host.lock().await;
        assert_eq!(guard.resources().next().map(|r| r.url.as_str()), Some(url));
    }

    #[tokio::test]
    async fn test_missing_dependencies_block_is_empty() {
        let resolver = online_resolver();
        let mut manifest = Manifest::new("Bare", "1.0.0", "Ada");
        manifest.dependencies = None;

        assert_eq!(resolver.resolve_dependencies(&manifest).await, ResolutionReport::default());
    }
}
