//! Template import pipeline
//!
//! Import runs as explicit stages so that the conflict decision, which may
//! need to ask a user, is an inspectable state instead of a hidden callback:
//!
//! 1. [`Importer::prepare`] checks the extension, opens and validates the
//!    archive, merges `dependencies.json`, resolves dependencies and extracts
//!    sources and assets.
//! 2. [`Importer::check_conflict`] looks the name up in the store and yields
//!    either [`ImportStage::Ready`] or [`ImportStage::AwaitingConflictResolution`].
//! 3. [`Importer::resolve_conflict`] applies the caller's decision.
//! 4. [`Importer::install`] writes the record.
//!
//! [`Importer::import_package`] drives all stages with a [`ConflictHandler`].

use crate::conflict::{duplicate_name, ConflictContext, ConflictHandler, ConflictResolution};
use crate::{ImportError, ImportResult};
use animpack::archive::{DEPENDENCIES_FILE, INDEX_FILE, SCRIPT_FILE, STYLES_FILE};
use animpack::{
    has_archive_extension, Dependencies, DependencyResolver, Manifest, PackageArchive,
    PackageValidator, ResolutionReport, ResourceLoader, ValidatorConfig,
};
use std::path::Path;
use std::sync::Arc;
use store::{TemplateRecord, TemplateStore};

/// Per-import options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Treat any dependency failure as fatal
    pub strict: bool,
}

impl ImportOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// A package that passed validation, with its contents extracted
#[derive(Debug, Clone)]
pub struct PreparedImport {
    /// Name of the file the package came from
    pub file_name: String,
    /// Manifest with merged dependencies; `name` is the name to install under
    pub manifest: Manifest,
    /// Validation and extraction warnings
    pub warnings: Vec<String>,
    /// Dependency resolution outcome
    pub dependencies: ResolutionReport,
    pub index_html: Option<String>,
    pub styles_css: Option<String>,
    pub script_js: Option<String>,
    /// Asset blobs present in the archive, in manifest order
    pub assets: Vec<(String, Vec<u8>)>,
}

impl PreparedImport {
    /// The name the template will be installed under
    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    fn rename(&mut self, name: String) {
        self.manifest.name = name;
    }
}

/// A prepared import whose name is already taken
#[derive(Debug, Clone)]
pub struct PendingConflict {
    prepared: PreparedImport,
    context: ConflictContext,
}

impl PendingConflict {
    /// The collision details to show the user
    pub fn context(&self) -> &ConflictContext {
        &self.context
    }

    /// The import waiting on the decision
    pub fn prepared(&self) -> &PreparedImport {
        &self.prepared
    }
}

/// Where a prepared import stands after the store lookup
#[derive(Debug, Clone)]
pub enum ImportStage {
    /// No collision, or the collision was resolved; ready to install
    Ready(PreparedImport),
    /// The name is taken; a [`ConflictResolution`] is needed
    AwaitingConflictResolution(PendingConflict),
}

/// A template written to the store
#[derive(Debug, Clone)]
pub struct InstalledTemplate {
    pub name: String,
    pub manifest: Manifest,
    pub warnings: Vec<String>,
    pub dependencies: ResolutionReport,
}

/// Final result of an import
#[derive(Debug, Clone)]
pub enum ImportOutcome {
    Installed(InstalledTemplate),
    Skipped { name: String },
}

impl ImportOutcome {
    pub fn is_installed(&self) -> bool {
        matches!(self, Self::Installed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// The installed template, if any
    pub fn installed(&self) -> Option<&InstalledTemplate> {
        match self {
            Self::Installed(installed) => Some(installed),
            Self::Skipped { .. } => None,
        }
    }
}

/// Imports template packages into a [`TemplateStore`]
pub struct Importer<S, L> {
    store: Arc<S>,
    resolver: Arc<DependencyResolver<L>>,
    validator: PackageValidator,
}

impl<S: TemplateStore, L: ResourceLoader> Importer<S, L> {
    /// Create an importer with the default validator configuration
    pub fn new(store: Arc<S>, resolver: Arc<DependencyResolver<L>>) -> Self {
        Self {
            store,
            resolver,
            validator: PackageValidator::default(),
        }
    }

    /// Use a different validator configuration
    pub fn with_validator(mut self, config: ValidatorConfig) -> Self {
        self.validator = PackageValidator::new(config);
        self
    }

    /// The backing store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The dependency resolver
    pub fn resolver(&self) -> &Arc<DependencyResolver<L>> {
        &self.resolver
    }

    /// Read a package from disk and import it
    pub async fn import_file<H: ConflictHandler>(
        &self,
        path: impl AsRef<Path>,
        options: &ImportOptions,
        handler: &H,
    ) -> ImportResult<ImportOutcome> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !has_archive_extension(&file_name) {
            return Err(ImportError::UnsupportedFile(file_name));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ImportError::Corrupted(format!("{}: {}", path.display(), e)))?;
        self.import_package(&file_name, bytes, options, handler).await
    }

    /// Run the whole pipeline, consulting the handler on a name collision
    pub async fn import_package<H: ConflictHandler>(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        options: &ImportOptions,
        handler: &H,
    ) -> ImportResult<ImportOutcome> {
        if !has_archive_extension(file_name) {
            return Err(ImportError::UnsupportedFile(file_name.to_string()));
        }
        let archive = PackageArchive::open(bytes)?;
        self.import_archive(file_name, archive, options, handler).await
    }

    /// Run the pipeline on an archive the caller has already opened
    pub async fn import_archive<H: ConflictHandler>(
        &self,
        file_name: &str,
        archive: PackageArchive,
        options: &ImportOptions,
        handler: &H,
    ) -> ImportResult<ImportOutcome> {
        let prepared = self.prepare_archive(file_name, archive, options).await?;

        let prepared = match self.check_conflict(prepared).await? {
            ImportStage::Ready(prepared) => prepared,
            ImportStage::AwaitingConflictResolution(pending) => {
                let resolution = handler.resolve(pending.context()).await;
                let name = pending.context().name.clone();
                match self.resolve_conflict(pending, resolution).await? {
                    Some(prepared) => prepared,
                    None => return Ok(ImportOutcome::Skipped { name }),
                }
            }
        };

        Ok(ImportOutcome::Installed(self.install(prepared).await?))
    }

    /// Validate the package and extract everything needed to install it
    pub async fn prepare(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        options: &ImportOptions,
    ) -> ImportResult<PreparedImport> {
        if !has_archive_extension(file_name) {
            return Err(ImportError::UnsupportedFile(file_name.to_string()));
        }
        let archive = PackageArchive::open(bytes)?;
        self.prepare_archive(file_name, archive, options).await
    }

    /// [`Importer::prepare`] for an already opened archive
    pub async fn prepare_archive(
        &self,
        file_name: &str,
        mut archive: PackageArchive,
        options: &ImportOptions,
    ) -> ImportResult<PreparedImport> {
        let report = self.validator.validate(&mut archive);
        if !report.valid {
            tracing::warn!(file = file_name, errors = ?report.errors, "Package rejected");
            return Err(ImportError::ValidationFailed(report.errors.join("; ")));
        }
        let mut manifest = report
            .manifest
            .ok_or_else(|| ImportError::ValidationFailed("manifest.json could not be read".to_string()))?;
        for warning in &report.warnings {
            tracing::debug!(file = file_name, "Validation warning: {}", warning);
        }

        merge_dependency_file(&mut archive, &mut manifest);

        let dependencies = self.resolver.resolve_dependencies(&manifest).await;
        if options.strict && !dependencies.errors.is_empty() {
            let failures: Vec<String> = dependencies
                .errors
                .iter()
                .map(|f| format!("{} ({})", f.name, f.error))
                .collect();
            return Err(ImportError::DependencyFailed(failures.join(", ")));
        }

        let mut warnings = report.warnings;
        let index_html = read_source(&mut archive, INDEX_FILE, &mut warnings)?;
        let styles_css = read_source(&mut archive, STYLES_FILE, &mut warnings)?;
        let script_js = read_source(&mut archive, SCRIPT_FILE, &mut warnings)?;

        let mut assets = Vec::new();
        for path in &manifest.assets {
            if let Some(data) = archive.read_file(path)? {
                assets.push((path.clone(), data));
            }
        }

        Ok(PreparedImport {
            file_name: file_name.to_string(),
            manifest,
            warnings,
            dependencies,
            index_html,
            styles_css,
            script_js,
            assets,
        })
    }

    /// Look for an installed template with the same name
    pub async fn check_conflict(&self, prepared: PreparedImport) -> ImportResult<ImportStage> {
        match self.store.get(prepared.name()).await? {
            Some(existing) => {
                tracing::info!(name = prepared.name(), "Template already installed");
                let context = ConflictContext {
                    name: prepared.name().to_string(),
                    existing,
                };
                Ok(ImportStage::AwaitingConflictResolution(PendingConflict {
                    prepared,
                    context,
                }))
            }
            None => Ok(ImportStage::Ready(prepared)),
        }
    }

    /// Apply a conflict decision; `None` means the import was skipped
    pub async fn resolve_conflict(
        &self,
        pending: PendingConflict,
        resolution: ConflictResolution,
    ) -> ImportResult<Option<PreparedImport>> {
        let PendingConflict {
            mut prepared,
            context,
        } = pending;
        tracing::info!(name = %context.name, %resolution, "Resolved template conflict");

        match resolution {
            ConflictResolution::Skip => Ok(None),
            ConflictResolution::Overwrite => Ok(Some(prepared)),
            ConflictResolution::Duplicate => {
                let name = self.next_free_name(&context.name).await?;
                prepared.rename(name);
                Ok(Some(prepared))
            }
        }
    }

    /// Write the record and its assets
    pub async fn install(&self, prepared: PreparedImport) -> ImportResult<InstalledTemplate> {
        let PreparedImport {
            manifest,
            warnings,
            dependencies,
            index_html,
            styles_css,
            script_js,
            assets,
            ..
        } = prepared;

        let name = manifest.name.clone();
        let record = TemplateRecord::new(manifest.clone())
            .with_sources(index_html, styles_css, script_js)
            .with_assets_meta(assets.iter().map(|(path, _)| path.clone()).collect());

        // Assets first, so a stored record never points at missing blobs.
        self.store.put_assets(&name, assets).await?;
        self.store.put(record).await?;
        tracing::info!(name = %name, "Installed template");

        Ok(InstalledTemplate {
            name,
            manifest,
            warnings,
            dependencies,
        })
    }

    /// Lowest `"<name> (<n>)"`, n >= 2, not present in the store
    pub async fn next_free_name(&self, name: &str) -> ImportResult<String> {
        let mut n = 2;
        loop {
            let candidate = duplicate_name(name, n);
            if !self.store.contains(&candidate).await? {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

/// Read a source file, replacing invalid UTF-8 rather than failing
fn read_source(
    archive: &mut PackageArchive,
    name: &str,
    warnings: &mut Vec<String>,
) -> ImportResult<Option<String>> {
    let Some(bytes) = archive.read_file(name)? else {
        return Ok(None);
    };
    match String::from_utf8(bytes) {
        Ok(text) => Ok(Some(text)),
        Err(e) => {
            tracing::warn!(file = name, "Source is not valid UTF-8, decoding lossily");
            warnings.push(format!("{name} is not valid UTF-8; invalid bytes were replaced"));
            Ok(Some(String::from_utf8_lossy(e.as_bytes()).into_owned()))
        }
    }
}

/// Union `dependencies.json` into the manifest's external dependencies
///
/// Best effort: an unreadable or malformed file leaves the manifest as is.
fn merge_dependency_file(archive: &mut PackageArchive, manifest: &mut Manifest) {
    let text = match archive.read_text(DEPENDENCIES_FILE) {
        Ok(Some(text)) => text,
        Ok(None) => return,
        Err(e) => {
            tracing::debug!("Ignoring unreadable {}: {}", DEPENDENCIES_FILE, e);
            return;
        }
    };

    match serde_json::from_str::<Dependencies>(&text) {
        Ok(declared) => {
            let added = manifest.dependencies_mut().merge_external(&declared.external);
            if added > 0 {
                tracing::debug!(added, "Merged dependencies from {}", DEPENDENCIES_FILE);
            }
        }
        Err(e) => tracing::debug!("Ignoring malformed {}: {}", DEPENDENCIES_FILE, e),
    }
}
