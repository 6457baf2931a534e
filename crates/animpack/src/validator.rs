//! Package validation
//!
//! The validator decides whether an archive is well-formed enough to import.
//! It never fails: every check runs and findings are collected into a
//! [`ValidationReport`], so one call surfaces the complete problem list.

use crate::archive::{
    PackageArchive, DEPENDENCIES_FILE, INDEX_FILE, MANIFEST_FILE, SCRIPT_FILE, STYLES_FILE,
};
use crate::Manifest;
use serde::{Deserialize, Serialize};

/// Default ceiling for the total uncompressed size (50 MB)
pub const DEFAULT_MAX_PACKAGE_SIZE: u64 = 50 * 1024 * 1024;

/// Files whose absence is reported as a warning
pub fn default_required_files() -> Vec<String> {
    [MANIFEST_FILE, INDEX_FILE, STYLES_FILE, SCRIPT_FILE, DEPENDENCIES_FILE]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Validator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Maximum total uncompressed size in bytes
    pub max_package_size: u64,
    /// Entries expected in every package
    pub required_files: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_package_size: DEFAULT_MAX_PACKAGE_SIZE,
            required_files: default_required_files(),
        }
    }
}

impl ValidatorConfig {
    /// Set the size ceiling
    pub fn with_max_package_size(mut self, max: u64) -> Self {
        self.max_package_size = max;
        self
    }

    /// Set the required file list
    pub fn with_required_files(mut self, files: Vec<String>) -> Self {
        self.required_files = files;
        self
    }
}

/// Outcome of validating a package
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Whether the package may be imported
    pub valid: bool,
    /// Blocking problems
    pub errors: Vec<String>,
    /// Non-blocking findings
    pub warnings: Vec<String>,
    /// Parsed manifest, if it could be read
    pub manifest: Option<Manifest>,
}

/// Validates package archives against a [`ValidatorConfig`]
#[derive(Debug, Clone, Default)]
pub struct PackageValidator {
    config: ValidatorConfig,
}

impl PackageValidator {
    /// Create a validator with the given configuration
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Run every check against the archive
    pub fn validate(&self, archive: &mut PackageArchive) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let total = archive.total_size();
        if total > self.config.max_package_size {
            errors.push(format!(
                "Package size {} bytes exceeds maximum of {} bytes",
                total, self.config.max_package_size
            ));
        }

        let manifest = if archive.contains(MANIFEST_FILE) {
            self.check_manifest(archive, &mut errors, &mut warnings)
        } else {
            errors.push(format!("Missing {MANIFEST_FILE}"));
            None
        };

        for file in &self.config.required_files {
            // A missing manifest is already an error.
            if file == MANIFEST_FILE && !archive.contains(MANIFEST_FILE) {
                continue;
            }
            if !archive.contains(file) {
                warnings.push(format!("Missing file: {file}"));
            }
        }

        if let Some(manifest) = &manifest {
            for asset in &manifest.assets {
                if !archive.contains(asset) {
                    warnings.push(format!("Asset not found in package: {asset}"));
                }
            }
        }

        let valid = errors.is_empty();
        tracing::debug!(
            valid,
            errors = errors.len(),
            warnings = warnings.len(),
            "Validated package"
        );

        ValidationReport {
            valid,
            errors,
            warnings,
            manifest,
        }
    }

    fn check_manifest(
        &self,
        archive: &mut PackageArchive,
        errors: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) -> Option<Manifest> {
        let text = match archive.read_text(MANIFEST_FILE) {
            Ok(Some(text)) => text,
            Ok(None) => {
                errors.push(format!("Missing {MANIFEST_FILE}"));
                return None;
            }
            Err(e) => {
                errors.push(format!("Unreadable {MANIFEST_FILE}: {e}"));
                return None;
            }
        };

        let manifest: Manifest = match serde_json::from_str(&text) {
            Ok(manifest) => manifest,
            Err(e) => {
                errors.push(format!("Invalid {MANIFEST_FILE}: {e}"));
                return None;
            }
        };

        for field in manifest.missing_required_fields() {
            errors.push(format!("Missing required field: {field}"));
        }

        if manifest.dependencies.is_none() {
            warnings.push("Manifest declares no dependencies, assuming none".to_string());
        }

        Some(manifest)
    }
}

/// Validate an archive with the default configuration
pub fn validate_package(archive: &mut PackageArchive) -> ValidationReport {
    PackageValidator::default().validate(archive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn archive_with(entries: &[(&str, &str)]) -> PackageArchive {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        PackageArchive::open(zip.finish().unwrap().into_inner()).unwrap()
    }

    const FULL_MANIFEST: &str =
        r#"{"name": "Bounce", "version": "1.0.0", "author": "Ada", "dependencies": {"external": []}}"#;

    #[test]
    fn test_null_required_fields_reported_individually() {
        let mut archive = archive_with(&[(
            MANIFEST_FILE,
            r#"{"name": null, "version": "1", "author": null, "tags": null}"#,
        )]);

        let report = validate_package(&mut archive);
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec![
                "Missing required field: name".to_string(),
                "Missing required field: author".to_string(),
            ]
        );
    }

    #[test]
    fn test_complete_package_is_valid() {
        let mut archive = archive_with(&[
            (MANIFEST_FILE, FULL_MANIFEST),
            (INDEX_FILE, "<div></div>"),
            (STYLES_FILE, ""),
            (SCRIPT_FILE, ""),
            (DEPENDENCIES_FILE, r#"{"external": []}"#),
        ]);

        let report = validate_package(&mut archive);
        assert!(report.valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(report.manifest.unwrap().name, "Bounce");
    }

    #[test]
    fn test_missing_manifest_is_single_error() {
        let mut archive = archive_with(&[(INDEX_FILE, "<div></div>")]);

        let report = validate_package(&mut archive);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Missing manifest.json"]);
        assert!(report.manifest.is_none());
    }

    #[test]
    fn test_one_error_per_missing_field() {
        let mut archive = archive_with(&[(MANIFEST_FILE, r#"{"description": "no keys"}"#)]);

        let report = validate_package(&mut archive);
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec![
                "Missing required field: name",
                "Missing required field: version",
                "Missing required field: author",
            ]
        );
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("no dependencies")));
    }

    #[test]
    fn test_field_errors_independent_of_optional_files() {
        let manifest = r#"{"name": "Bounce", "author": "Ada"}"#;
        let sparse = validate_package(&mut archive_with(&[(MANIFEST_FILE, manifest)]));
        let full = validate_package(&mut archive_with(&[
            (MANIFEST_FILE, manifest),
            (INDEX_FILE, ""),
            (STYLES_FILE, ""),
            (SCRIPT_FILE, ""),
            (DEPENDENCIES_FILE, "{}"),
        ]));

        assert_eq!(sparse.errors, vec!["Missing required field: version"]);
        assert_eq!(full.errors, sparse.errors);
    }

    #[test]
    fn test_invalid_json_halts_manifest_checks() {
        let mut archive = archive_with(&[(MANIFEST_FILE, "{not json")]);

        let report = validate_package(&mut archive);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("Invalid manifest.json"));
        assert!(report.manifest.is_none());
    }

    #[test]
    fn test_oversized_package_fails_regardless_of_manifest() {
        let mut archive = archive_with(&[
            (MANIFEST_FILE, FULL_MANIFEST),
            (INDEX_FILE, "<div>some markup</div>"),
        ]);
        let validator = PackageValidator::new(ValidatorConfig::default().with_max_package_size(16));

        let report = validator.validate(&mut archive);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("exceeds maximum of 16 bytes"));
        assert!(report.manifest.is_some());
    }

    #[test]
    fn test_missing_assets_are_warnings() {
        let manifest = r#"{"name": "A", "version": "1", "author": "B", "dependencies": {}, "assets": ["img/x.png", "img/y.png"]}"#;
        let mut archive = archive_with(&[(MANIFEST_FILE, manifest), ("img/x.png", "png")]);

        let report = validate_package(&mut archive);
        assert!(report.valid);
        assert!(report
            .warnings
            .contains(&"Asset not found in package: img/y.png".to_string()));
        assert!(report.warnings.contains(&"Missing file: index.html".to_string()));
    }
}
