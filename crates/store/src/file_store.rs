//! File-backed template store
//!
//! Layout under the store directory:
//! - records/<key>.json: one JSON document per template record
//! - assets/<key>/<path>: asset blobs held separately from the record
//!
//! Keys and asset paths map to single file names: a short percent-encoded
//! prefix for readability followed by the SHA-256 of the full string, so any
//! key fits the platform's file name limit. The record JSON carries the real
//! name; file names are never decoded. Records are written to a temporary file and renamed into place, so a reader sees
//! either the old or the new record, never a partial one.

use crate::{Result, StoreError, TemplateRecord, TemplateStore};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const RECORDS_DIR: &str = "records";
const ASSETS_DIR: &str = "assets";
const RECORD_EXTENSION: &str = "json";
/// Bytes of the readable prefix kept in front of the digest
const PREFIX_LEN: usize = 48;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Template store persisted in a local directory
#[derive(Debug, Clone)]
pub struct FileTemplateStore {
    root: PathBuf,
}

impl FileTemplateStore {
    /// Create a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open a store, creating its directories if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(root);
        store.ensure_directory().await?;
        Ok(store)
    }

    /// Ensure the store directories exist
    pub async fn ensure_directory(&self) -> Result<()> {
        tokio::fs::create_dir_all(self.root.join(RECORDS_DIR)).await?;
        tokio::fs::create_dir_all(self.root.join(ASSETS_DIR)).await?;
        Ok(())
    }

    /// Get the store directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self
            .root
            .join(RECORDS_DIR)
            .join(format!("{}.{}", encode_component(name)?, RECORD_EXTENSION)))
    }

    fn assets_dir(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(ASSETS_DIR).join(encode_component(name)?))
    }

    async fn read_record(&self, path: &Path, key: &str) -> Result<TemplateRecord> {
        let content = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&content).map_err(|e| StoreError::CorruptRecord {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Map a key or asset path to one file-system-safe component
fn encode_component(raw: &str) -> Result<String> {
    if raw.is_empty() {
        return Err(StoreError::InvalidKey(raw.to_string()));
    }

    // Dots are encoded too, so "." and ".." cannot escape the directory.
    let mut prefix = urlencoding::encode(raw).replace('.', "%2E");
    prefix.truncate(PREFIX_LEN);

    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    Ok(format!("{}-{}", prefix, hex::encode(hasher.finalize())))
}

/// Write a file through a temporary sibling and rename it into place
async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("record");
    let temp = path.with_file_name(format!(
        ".{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    tokio::fs::write(&temp, data).await?;
    if let Err(e) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e.into());
    }
    Ok(())
}

impl TemplateStore for FileTemplateStore {
    async fn put(&self, record: TemplateRecord) -> Result<()> {
        let path = self.record_path(&record.name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_vec_pretty(&record)?;
        write_atomic(&path, &content).await?;
        tracing::debug!(name = %record.name, "Stored template record");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<TemplateRecord>> {
        let path = self.record_path(name)?;
        match tokio::fs::try_exists(&path).await? {
            true => Ok(Some(self.read_record(&path, name).await?)),
            false => Ok(None),
        }
    }

    async fn get_all(&self) -> Result<Vec<TemplateRecord>> {
        let dir = self.root.join(RECORDS_DIR);
        if !tokio::fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e != RECORD_EXTENSION).unwrap_or(true) {
                continue;
            }
            let key = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();

            match self.read_record(&path, &key).await {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("Skipping unreadable template record {:?}: {}", path, e),
            }
        }

        Ok(records)
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let path = self.record_path(name)?;
        let assets = self.assets_dir(name)?;

        if tokio::fs::try_exists(&assets).await? {
            tokio::fs::remove_dir_all(&assets).await?;
        }
        if !tokio::fs::try_exists(&path).await? {
            return Ok(false);
        }
        tokio::fs::remove_file(&path).await?;
        tracing::debug!(name, "Deleted template record");
        Ok(true)
    }

    async fn put_assets(&self, name: &str, assets: Vec<(String, Vec<u8>)>) -> Result<()> {
        let dir = self.assets_dir(name)?;
        if tokio::fs::try_exists(&dir).await? {
            tokio::fs::remove_dir_all(&dir).await?;
        }
        if assets.is_empty() {
            return Ok(());
        }

        tokio::fs::create_dir_all(&dir).await?;
        for (path, data) in assets {
            write_atomic(&dir.join(encode_component(&path)?), &data).await?;
        }
        Ok(())
    }

    async fn get_asset(&self, name: &str, path: &str) -> Result<Option<Vec<u8>>> {
        let file = self.assets_dir(name)?.join(encode_component(path)?);
        match tokio::fs::try_exists(&file).await? {
            true => Ok(Some(tokio::fs::read(&file).await?)),
            false => Ok(None),
        }
    }

    async fn contains(&self, name: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.record_path(name)?).await?)
    }
}
