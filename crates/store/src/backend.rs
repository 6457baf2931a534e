//! Template store abstraction

use crate::{Result, TemplateRecord};

/// Keyed collection of installed templates
///
/// Records are keyed by `name`. Every operation is atomic on its own; no
/// transaction spans several records, so concurrent writes to the same key
/// resolve as last-write-wins.
#[trait_variant::make(Send)]
pub trait TemplateStore: Send + Sync {
    /// Insert or replace the record under its name
    async fn put(&self, record: TemplateRecord) -> Result<()>;

    /// Get a record by name
    async fn get(&self, name: &str) -> Result<Option<TemplateRecord>>;

    /// Every record, in no particular order
    async fn get_all(&self) -> Result<Vec<TemplateRecord>>;

    /// Remove a record and its assets; returns whether it existed
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Replace the asset blobs held for a record
    async fn put_assets(&self, name: &str, assets: Vec<(String, Vec<u8>)>) -> Result<()>;

    /// Read one asset blob
    async fn get_asset(&self, name: &str, path: &str) -> Result<Option<Vec<u8>>>;

    /// Check if a record exists
    async fn contains(&self, name: &str) -> Result<bool>;
}
