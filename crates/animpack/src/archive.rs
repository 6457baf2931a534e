//! Package archive format (.animpack)
//!
//! An .animpack file is a ZIP archive containing:
//! - manifest.json: Package manifest (required)
//! - index.html, styles.css, script.js: Template sources (optional)
//! - dependencies.json: `{"external": [...]}` (optional)
//! - asset files at the paths listed in `manifest.assets`
//!
//! A bulk archive uses the same container and holds one `<name>.animpack`
//! entry per template.

use crate::{PackageError, PackageResult};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::read::ZipArchive;

/// File names within the package
pub const MANIFEST_FILE: &str = "manifest.json";
pub const INDEX_FILE: &str = "index.html";
pub const STYLES_FILE: &str = "styles.css";
pub const SCRIPT_FILE: &str = "script.js";
pub const DEPENDENCIES_FILE: &str = "dependencies.json";

/// Package extension
pub const PACKAGE_EXTENSION: &str = "animpack";

/// Extensions accepted on import
pub const ACCEPTED_EXTENSIONS: [&str; 2] = [PACKAGE_EXTENSION, "zip"];

/// Check whether a file name carries an archive extension
pub fn has_archive_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| e.eq_ignore_ascii_case(accepted))
        })
        .unwrap_or(false)
}

/// A decoded view over a package archive
///
/// Opening reads only the central directory. Entry data is inflated on
/// demand, and every read is bounded by the size the directory declares.
pub struct PackageArchive {
    zip: ZipArchive<Cursor<Vec<u8>>>,
    index: BTreeMap<String, u64>,
}

impl std::fmt::Debug for PackageArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageArchive")
            .field("entries", &self.index)
            .finish()
    }
}

impl PackageArchive {
    /// Open an archive from its raw bytes
    pub fn open(bytes: Vec<u8>) -> PackageResult<Self> {
        let mut zip =
            ZipArchive::new(Cursor::new(bytes)).map_err(|e| PackageError::corrupted(e.to_string()))?;

        let mut index = BTreeMap::new();
        for i in 0..zip.len() {
            let file = zip
                .by_index_raw(i)
                .map_err(|e| PackageError::corrupted(e.to_string()))?;
            if file.is_dir() {
                continue;
            }
            index.insert(file.name().to_string(), file.size());
        }

        Ok(Self { zip, index })
    }

    /// Open an archive from a file on disk
    pub fn open_file(path: impl AsRef<Path>) -> PackageResult<Self> {
        Self::open(std::fs::read(path)?)
    }

    /// Sum of the declared uncompressed sizes of all entries
    pub fn total_size(&self) -> u64 {
        self.index.values().fold(0u64, |acc, size| acc.saturating_add(*size))
    }

    /// Number of file entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the archive holds no file entries
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Check if an entry exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names of all file entries, sorted
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Declared uncompressed size of an entry
    pub fn entry_size(&self, name: &str) -> Option<u64> {
        self.index.get(name).copied()
    }

    /// Read an entry's bytes, or `None` if it is absent
    pub fn read_file(&mut self, name: &str) -> PackageResult<Option<Vec<u8>>> {
        let Some(&declared) = self.index.get(name) else {
            return Ok(None);
        };

        let file = self
            .zip
            .by_name(name)
            .map_err(|e| PackageError::corrupted(format!("{name}: {e}")))?;

        // One extra byte lets us notice entries that inflate past their header.
        let mut data = Vec::with_capacity(declared.min(1 << 20) as usize);
        file.take(declared.saturating_add(1))
            .read_to_end(&mut data)
            .map_err(|e| PackageError::corrupted(format!("{name}: {e}")))?;

        if data.len() as u64 > declared {
            return Err(PackageError::corrupted(format!(
                "{name} is larger than its declared size"
            )));
        }

        Ok(Some(data))
    }

    /// Read an entry as UTF-8 text, or `None` if it is absent
    pub fn read_text(&mut self, name: &str) -> PackageResult<Option<String>> {
        match self.read_file(name)? {
            Some(data) => String::from_utf8(data)
                .map(Some)
                .map_err(|_| PackageError::corrupted(format!("{name} is not valid UTF-8"))),
            None => Ok(None),
        }
    }
}
