//! Bulk archive import
//!
//! A bulk archive is a container of `.animpack` members. Each member goes
//! through the single-package pipeline on its own, one after another; a
//! failing member is reported and the rest still import.

use crate::conflict::ConflictHandler;
use crate::pipeline::{ImportOptions, ImportOutcome, Importer};
use crate::{ImportError, ImportResult};
use animpack::archive::MANIFEST_FILE;
use animpack::{has_archive_extension, PackageArchive, ResourceLoader, PACKAGE_EXTENSION};
use store::TemplateStore;

/// Result of importing one member of a bulk archive
#[derive(Debug)]
pub struct BulkMemberResult {
    /// Entry name inside the bulk archive
    pub entry: String,
    pub result: ImportResult<ImportOutcome>,
}

/// Whether an archive is a bulk container rather than a single package
pub fn is_bulk_archive(archive: &PackageArchive) -> bool {
    !archive.contains(MANIFEST_FILE) && !bulk_members(archive).is_empty()
}

fn bulk_members(archive: &PackageArchive) -> Vec<String> {
    let suffix = format!(".{PACKAGE_EXTENSION}");
    archive
        .entry_names()
        .filter(|name| name.to_lowercase().ends_with(&suffix))
        .map(str::to_string)
        .collect()
}

impl<S: TemplateStore, L: ResourceLoader> Importer<S, L> {
    /// Import every package inside a bulk archive
    pub async fn import_bulk<H: ConflictHandler>(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        options: &ImportOptions,
        handler: &H,
    ) -> ImportResult<Vec<BulkMemberResult>> {
        if !has_archive_extension(file_name) {
            return Err(ImportError::UnsupportedFile(file_name.to_string()));
        }

        let archive = PackageArchive::open(bytes)?;
        self.import_bulk_archive(file_name, archive, options, handler).await
    }

    /// Import every package inside an already opened bulk archive
    pub async fn import_bulk_archive<H: ConflictHandler>(
        &self,
        file_name: &str,
        mut archive: PackageArchive,
        options: &ImportOptions,
        handler: &H,
    ) -> ImportResult<Vec<BulkMemberResult>> {
        let members = bulk_members(&archive);
        if members.is_empty() {
            return Err(ImportError::EmptyBulk);
        }

        let mut results = Vec::with_capacity(members.len());
        for entry in members {
            let result = match archive.read_file(&entry) {
                Ok(Some(data)) => self.import_package(&entry, data, options, handler).await,
                Ok(None) => Err(ImportError::Corrupted(format!("{entry} is missing"))),
                Err(e) => Err(e.into()),
            };

            if let Err(e) = &result {
                tracing::warn!(entry = %entry, "Bulk member failed: {}", e);
            }
            results.push(BulkMemberResult { entry, result });
        }

        let installed = results
            .iter()
            .filter(|r| matches!(&r.result, Ok(outcome) if outcome.is_installed()))
            .count();
        tracing::info!(file = file_name, installed, total = results.len(), "Imported bulk archive");

        Ok(results)
    }
}
