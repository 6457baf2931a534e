//! Gallery controller
//!
//! Owns the settings, the template store and the importer, and exposes the
//! operations the commands need: multi-select export, import with conflict
//! handling, listing and removal.

use crate::source::load_template_dir;
use animpack::{
    create_package_with_progress, export_bulk_with_progress, has_archive_extension,
    DependencyResolver, HttpResourceLoader, PackageArchive, ResourceLoader, TemplateData,
};
use anyhow::{Context, Result};
use importer::{
    is_bulk_archive, BulkMemberResult, ConflictHandler, ImportError, ImportOptions, ImportOutcome,
    ImportResult, Importer,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use store::{search, FileTemplateStore, GallerySettings, SettingsManager, TemplateRecord, TemplateStore, TemplateSummary};

/// File name offered for a bulk export
pub const BULK_FILE_NAME: &str = "animation-templates.animpack";

/// An archive ready to be written out
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Names of the templates inside
    pub templates: Vec<String>,
}

/// Coordinates the store, importer and settings
pub struct GalleryController<S, L> {
    settings: GallerySettings,
    importer: Importer<S, L>,
}

impl GalleryController<FileTemplateStore, HttpResourceLoader> {
    /// Open the gallery rooted at a data directory
    pub async fn open(data_dir: PathBuf) -> Result<Self> {
        let mut manager = SettingsManager::new(data_dir.clone());
        let settings = manager
            .load()
            .await
            .context("failed to load gallery settings")?
            .clone();

        let templates_dir = settings.templates_dir(&data_dir);
        let store = FileTemplateStore::open(templates_dir.clone())
            .await
            .with_context(|| format!("failed to open template store at {}", templates_dir.display()))?;
        let resolver = DependencyResolver::new(HttpResourceLoader::new())
            .with_timeout(settings.dependency_timeout());

        tracing::debug!(data_dir = %data_dir.display(), "Opened gallery");
        Ok(Self::new(settings, Arc::new(store), Arc::new(resolver)))
    }
}

impl<S: TemplateStore, L: ResourceLoader> GalleryController<S, L> {
    pub fn new(
        settings: GallerySettings,
        store: Arc<S>,
        resolver: Arc<DependencyResolver<L>>,
    ) -> Self {
        let importer = Importer::new(store, resolver).with_validator(settings.validator_config());
        Self { settings, importer }
    }

    pub fn store(&self) -> &Arc<S> {
        self.importer.store()
    }

    /// Import options from the settings, optionally forced strict
    pub fn import_options(&self, strict: bool) -> ImportOptions {
        ImportOptions {
            strict: strict || self.settings.dependencies.strict,
        }
    }

    /// Package the selected source directories
    ///
    /// One directory gives a single package, several give a bulk archive.
    pub async fn export_dirs(&self, dirs: &[PathBuf]) -> Result<ExportArtifact> {
        let mut items = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let data = load_template_dir(dir)
                .await
                .with_context(|| format!("failed to load template from {}", dir.display()))?;
            items.push(data);
        }
        self.export_templates(items)
    }

    /// Package an installed template again
    pub async fn export_installed(&self, name: &str) -> Result<ExportArtifact> {
        let record = self
            .store()
            .get(name)
            .await?
            .with_context(|| format!("template '{name}' is not installed"))?;

        let mut assets = Vec::with_capacity(record.assets_meta.len());
        for path in &record.assets_meta {
            match self.store().get_asset(name, path).await? {
                Some(blob) => assets.push((path.clone(), blob)),
                None => tracing::warn!(name, asset = %path, "Stored asset is missing"),
            }
        }

        self.export_templates(vec![record.to_template_data(assets)])
    }

    fn export_templates(&self, items: Vec<TemplateData>) -> Result<ExportArtifact> {
        let options = self.settings.package_options();
        let templates: Vec<String> = items.iter().map(|item| item.name.clone()).collect();
        let report = |percent: u8| tracing::debug!(percent, "Packaging");

        if let [item] = items.as_slice() {
            let created = create_package_with_progress(item, &options, report)
                .with_context(|| format!("failed to package '{}'", item.name))?;
            return Ok(ExportArtifact {
                file_name: created.file_name(),
                bytes: created.bytes,
                templates,
            });
        }

        let bulk = export_bulk_with_progress(&items, &options, report)
            .context("failed to build bulk archive")?;
        Ok(ExportArtifact {
            file_name: BULK_FILE_NAME.to_string(),
            bytes: bulk.bytes,
            templates,
        })
    }

    /// Import one file, which may be a single package or a bulk archive
    pub async fn import_file<H: ConflictHandler>(
        &self,
        path: &Path,
        options: &ImportOptions,
        handler: &H,
    ) -> Result<Vec<BulkMemberResult>> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !has_archive_extension(&file_name) {
            return Ok(single_result(&file_name, Err(ImportError::UnsupportedFile(file_name.clone()))));
        }

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;

        self.import_bytes(&file_name, bytes, options, handler).await
    }

    /// Import archive bytes, detecting bulk archives
    pub async fn import_bytes<H: ConflictHandler>(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        options: &ImportOptions,
        handler: &H,
    ) -> Result<Vec<BulkMemberResult>> {
        if !has_archive_extension(file_name) {
            return Ok(single_result(file_name, Err(ImportError::UnsupportedFile(file_name.to_string()))));
        }

        let archive = match PackageArchive::open(bytes) {
            Ok(archive) => archive,
            Err(e) => return Ok(single_result(file_name, Err(e.into()))),
        };

        if is_bulk_archive(&archive) {
            tracing::info!(file = file_name, "Detected bulk archive");
            return Ok(self
                .importer
                .import_bulk_archive(file_name, archive, options, handler)
                .await?);
        }

        let result = self
            .importer
            .import_archive(file_name, archive, options, handler)
            .await;
        Ok(single_result(file_name, result))
    }

    /// Installed templates, optionally filtered, sorted by name
    pub async fn list(&self, query: Option<&str>) -> Result<Vec<TemplateSummary>> {
        let records = self.store().get_all().await?;
        let mut summaries: Vec<TemplateSummary> = match query {
            Some(query) => search(&records, query).into_iter().map(TemplateSummary::from).collect(),
            None => records.iter().map(TemplateSummary::from).collect(),
        };
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    pub async fn show(&self, name: &str) -> Result<Option<TemplateRecord>> {
        Ok(self.store().get(name).await?)
    }

    /// Remove a template and its assets; false when it was not installed
    pub async fn remove(&self, name: &str) -> Result<bool> {
        let removed = self.store().delete(name).await?;
        if removed {
            tracing::info!(name, "Removed template");
        }
        Ok(removed)
    }
}

fn single_result(file_name: &str, result: ImportResult<ImportOutcome>) -> Vec<BulkMemberResult> {
    vec![BulkMemberResult {
        entry: file_name.to_string(),
        result,
    }]
}
