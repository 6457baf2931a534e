//! Animpack - Animation template package format
//!
//! This crate handles the .animpack container: manifest schema, archive
//! reading, validation, packaging (single and bulk), and resolution of
//! external CDN dependencies.

mod error;
mod manifest;
pub mod archive;
pub mod packager;
pub mod resolver;
pub mod validator;

pub use error::*;
pub use manifest::*;

pub use archive::{has_archive_extension, PackageArchive, PACKAGE_EXTENSION};
pub use packager::{
    create_package, create_package_with_progress, export_bulk, export_bulk_with_progress,
    sanitize_file_name, suggested_file_name, AssetContent, BulkPackage, CompressionScheme,
    CreatedPackage, PackageOptions, TemplateAsset, TemplateData,
};
pub use resolver::{
    DependencyResolver, DependencyTable, HttpResourceLoader, ResolutionReport, ResourceHost,
    ResourceKind, ResourceLoader, StaticResourceLoader,
};
pub use validator::{validate_package, PackageValidator, ValidationReport, ValidatorConfig};
