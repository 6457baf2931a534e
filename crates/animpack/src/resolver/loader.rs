//! Fetching dependency resources

use super::ResourceKind;
use std::collections::HashMap;
use std::time::Duration;

/// A resource to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub name: String,
    pub url: String,
    pub kind: ResourceKind,
}

/// Loads a script or stylesheet, returning its body
#[trait_variant::make(Send)]
pub trait ResourceLoader: Send + Sync {
    /// Fetch the resource, or describe why it could not be fetched
    async fn load(&self, request: &ResourceRequest) -> Result<Vec<u8>, String>;
}

/// Loader that fetches resources over HTTP(S)
#[derive(Debug, Clone, Default)]
pub struct HttpResourceLoader {
    client: reqwest::Client,
}

impl HttpResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ResourceLoader for HttpResourceLoader {
    async fn load(&self, request: &ResourceRequest) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .get(&request.url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| e.to_string())
    }
}

/// Scripted outcome for a [`StaticResourceLoader`] URL
#[derive(Debug, Clone)]
pub enum StaticResponse {
    /// Respond with a body
    Body(Vec<u8>),
    /// Fail with a message
    Fail(String),
    /// Respond after a delay
    Delayed(Duration, Vec<u8>),
}

/// In-memory loader answering from a fixed URL table
///
/// Unlisted URLs fail as unreachable. Used for offline sessions and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticResourceLoader {
    responses: HashMap<String, StaticResponse>,
    requests: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

impl StaticResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every known URL with a small body
    pub fn serving(urls: impl IntoIterator<Item = String>) -> Self {
        let mut loader = Self::new();
        for url in urls {
            loader = loader.with_response(url, StaticResponse::Body(b"/* ok */".to_vec()));
        }
        loader
    }

    pub fn with_response(mut self, url: impl Into<String>, response: StaticResponse) -> Self {
        self.responses.insert(url.into(), response);
        self
    }

    /// Number of load calls made so far
    pub fn request_count(&self) -> usize {
        self.requests.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl ResourceLoader for StaticResourceLoader {
    async fn load(&self, request: &ResourceRequest) -> Result<Vec<u8>, String> {
        self.requests.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match self.responses.get(&request.url) {
            Some(StaticResponse::Body(body)) => Ok(body.clone()),
            Some(StaticResponse::Fail(reason)) => Err(reason.clone()),
            Some(StaticResponse::Delayed(delay, body)) => {
                tokio::time::sleep(*delay).await;
                Ok(body.clone())
            }
            None => Err(format!("{} is unreachable", request.url)),
        }
    }
}
