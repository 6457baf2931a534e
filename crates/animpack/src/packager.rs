//! Template packaging
//!
//! Serializes in-memory template data into an .animpack archive, and bundles
//! several packages into one bulk archive (a ZIP of ZIPs, each member keeping
//! its own manifest untouched).

use crate::archive::{
    DEPENDENCIES_FILE, INDEX_FILE, MANIFEST_FILE, PACKAGE_EXTENSION, SCRIPT_FILE, STYLES_FILE,
};
use crate::{Dependencies, DependencyRef, Manifest, PackageError, PackageResult};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Default deflate level
pub const DEFAULT_COMPRESSION_LEVEL: i64 = 6;

/// Share of bulk export progress spent packaging members; the rest is the outer archive
const BULK_PACKAGING_SHARE: u32 = 90;

/// Entry names the packager writes itself
const RESERVED_ENTRIES: [&str; 5] = [
    INDEX_FILE,
    STYLES_FILE,
    SCRIPT_FILE,
    DEPENDENCIES_FILE,
    MANIFEST_FILE,
];

/// Compression applied to archive entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionScheme {
    /// No compression
    Stored,
    /// Standard deflate
    #[default]
    Deflated,
}

/// Packaging options
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackageOptions {
    /// Compression scheme for every entry
    pub compression: CompressionScheme,
    /// Compression level; `None` uses [`DEFAULT_COMPRESSION_LEVEL`]
    pub level: Option<i64>,
    /// Dependencies used when the template declares none
    pub dependencies: Option<Dependencies>,
    /// Fixed `created` stamp; `None` stamps the current time
    pub created: Option<String>,
}

impl PackageOptions {
    /// Set the compression scheme
    pub fn with_compression(mut self, compression: CompressionScheme) -> Self {
        self.compression = compression;
        self
    }

    /// Set the compression level
    pub fn with_level(mut self, level: i64) -> Self {
        self.level = Some(level);
        self
    }

    /// Set fallback dependencies
    pub fn with_dependencies(mut self, dependencies: Dependencies) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    /// Stamp manifests with a fixed creation time
    pub fn with_created(mut self, created: impl Into<String>) -> Self {
        self.created = Some(created.into());
        self
    }

    fn file_options(&self) -> SimpleFileOptions {
        let options = SimpleFileOptions::default().last_modified_time(zip::DateTime::default());
        match self.compression {
            CompressionScheme::Stored => options.compression_method(CompressionMethod::Stored),
            CompressionScheme::Deflated => options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(self.level.unwrap_or(DEFAULT_COMPRESSION_LEVEL))),
        }
    }
}

/// Content of an asset to bundle
#[derive(Debug, Clone, PartialEq)]
pub enum AssetContent {
    /// Raw bytes
    Bytes(Vec<u8>),
    /// A `data:` URL, decoded at packaging time
    DataUrl(String),
}

/// An asset to bundle at a relative path
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateAsset {
    pub path: String,
    pub content: AssetContent,
}

impl TemplateAsset {
    /// Asset from raw bytes
    pub fn bytes(path: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            content: AssetContent::Bytes(data),
        }
    }

    /// Asset from a data URL
    pub fn data_url(path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: AssetContent::DataUrl(url.into()),
        }
    }

    fn decode(&self) -> PackageResult<Vec<u8>> {
        match &self.content {
            AssetContent::Bytes(data) => Ok(data.clone()),
            AssetContent::DataUrl(url) => decode_data_url(url)
                .map_err(|reason| PackageError::invalid_asset(&self.path, reason)),
        }
    }
}

/// In-memory template sources and metadata
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateData {
    pub name: String,
    pub version: Option<String>,
    pub author: Option<String>,
    pub description: String,
    pub tags: Vec<String>,
    pub index_html: Option<String>,
    pub styles_css: Option<String>,
    pub script_js: Option<String>,
    pub assets: Vec<TemplateAsset>,
    pub dependencies: Option<Dependencies>,
    pub preview: Option<String>,
}

impl TemplateData {
    /// Version written when none is given
    pub const DEFAULT_VERSION: &'static str = "1.0.0";
    /// Author written when none is given
    pub const DEFAULT_AUTHOR: &'static str = "Anonymous";

    /// Create template data with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            author: None,
            description: String::new(),
            tags: Vec::new(),
            index_html: None,
            styles_css: None,
            script_js: None,
            assets: Vec::new(),
            dependencies: None,
            preview: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.index_html = Some(html.into());
        self
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.styles_css = Some(css.into());
        self
    }

    pub fn with_js(mut self, js: impl Into<String>) -> Self {
        self.script_js = Some(js.into());
        self
    }

    pub fn with_asset(mut self, asset: TemplateAsset) -> Self {
        self.assets.push(asset);
        self
    }

    pub fn with_external_dependency(mut self, dep: DependencyRef) -> Self {
        self.dependencies
            .get_or_insert_with(Dependencies::default)
            .external
            .push(dep);
        self
    }

    pub fn with_preview(mut self, path: impl Into<String>) -> Self {
        self.preview = Some(path.into());
        self
    }
}

/// A freshly built single-template archive
#[derive(Debug, Clone)]
pub struct CreatedPackage {
    /// Archive bytes
    pub bytes: Vec<u8>,
    /// The manifest written into the archive
    pub manifest: Manifest,
}

impl CreatedPackage {
    /// File name to offer for download
    pub fn file_name(&self) -> String {
        suggested_file_name(&self.manifest.name)
    }
}

/// A bulk archive holding several packages
#[derive(Debug, Clone)]
pub struct BulkPackage {
    /// Archive bytes
    pub bytes: Vec<u8>,
    /// Member entry names, in write order
    pub entries: Vec<String>,
}

/// Build a single-template package
pub fn create_package(data: &TemplateData, options: &PackageOptions) -> PackageResult<CreatedPackage> {
    create_package_with_progress(data, options, |_| {})
}

/// Build a single-template package, reporting progress as a 0-100 percentage
pub fn create_package_with_progress(
    data: &TemplateData,
    options: &PackageOptions,
    mut on_progress: impl FnMut(u8),
) -> PackageResult<CreatedPackage> {
    let dependencies = data
        .dependencies
        .clone()
        .or_else(|| options.dependencies.clone())
        .unwrap_or_default();

    check_asset_paths(&data.assets)?;
    let mut assets = Vec::with_capacity(data.assets.len());
    for asset in &data.assets {
        assets.push((asset.path.clone(), asset.decode()?));
    }

    let manifest = Manifest {
        name: data.name.clone(),
        version: data
            .version
            .clone()
            .unwrap_or_else(|| TemplateData::DEFAULT_VERSION.to_string()),
        author: data
            .author
            .clone()
            .unwrap_or_else(|| TemplateData::DEFAULT_AUTHOR.to_string()),
        description: data.description.clone(),
        tags: data.tags.clone(),
        dependencies: Some(Dependencies {
            external: dependencies.external.clone(),
            ..Default::default()
        }),
        assets: assets.iter().map(|(path, _)| path.clone()).collect(),
        created: options
            .created
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
        preview: data.preview.clone(),
    };

    let dependencies_json = serde_json::to_string_pretty(&serde_json::json!({
        "external": dependencies.external,
    }))?;
    let manifest_json = serde_json::to_string_pretty(&manifest)?;

    let mut entries: Vec<(&str, &[u8])> = vec![
        (INDEX_FILE, data.index_html.as_deref().unwrap_or("").as_bytes()),
        (STYLES_FILE, data.styles_css.as_deref().unwrap_or("").as_bytes()),
        (SCRIPT_FILE, data.script_js.as_deref().unwrap_or("").as_bytes()),
    ];
    entries.extend(assets.iter().map(|(path, bytes)| (path.as_str(), bytes.as_slice())));
    entries.push((DEPENDENCIES_FILE, dependencies_json.as_bytes()));
    entries.push((MANIFEST_FILE, manifest_json.as_bytes()));

    let bytes = write_entries(&entries, options, &mut on_progress)?;

    tracing::debug!(
        name = %manifest.name,
        size = bytes.len(),
        assets = manifest.assets.len(),
        "Created package"
    );

    Ok(CreatedPackage { bytes, manifest })
}

/// Bundle several templates into one bulk archive
pub fn export_bulk(items: &[TemplateData], options: &PackageOptions) -> PackageResult<BulkPackage> {
    export_bulk_with_progress(items, options, |_| {})
}

/// Bundle several templates, reporting the outer archive's progress
///
/// Members are packaged one at a time; the outer writer is not shared
/// between in-flight packagings.
pub fn export_bulk_with_progress(
    items: &[TemplateData],
    options: &PackageOptions,
    mut on_progress: impl FnMut(u8),
) -> PackageResult<BulkPackage> {
    if items.is_empty() {
        return Err(PackageError::EmptyExport);
    }

    let mut last = 0u8;
    let mut report = |percent: u8| {
        last = last.max(percent);
        on_progress(last);
    };
    report(0);

    let count = items.len() as u32;
    let mut members = Vec::with_capacity(items.len());
    let mut used = HashSet::new();
    for (i, item) in items.iter().enumerate() {
        let low = i as u32 * BULK_PACKAGING_SHARE / count;
        let high = (i as u32 + 1) * BULK_PACKAGING_SHARE / count;
        let package = create_package_with_progress(item, options, |p| {
            report((low + (high - low) * u32::from(p) / 100) as u8)
        })?;
        let entry = unique_entry_name(&sanitize_file_name(&item.name), &mut used);
        members.push((entry, package.bytes));
    }

    let entries: Vec<(&str, &[u8])> = members
        .iter()
        .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
        .collect();
    let outer_share = 99 - BULK_PACKAGING_SHARE;
    let bytes = write_entries(&entries, options, &mut |p| {
        report((BULK_PACKAGING_SHARE + outer_share * u32::from(p) / 100) as u8)
    })?;
    report(100);

    tracing::info!(templates = members.len(), size = bytes.len(), "Created bulk export");

    Ok(BulkPackage {
        bytes,
        entries: members.into_iter().map(|(name, _)| name).collect(),
    })
}

/// Reject asset paths that collide with each other or with reserved entries
fn check_asset_paths(assets: &[TemplateAsset]) -> PackageResult<()> {
    let mut seen = HashSet::new();
    for asset in assets {
        if asset.path.is_empty() {
            return Err(PackageError::invalid_asset(&asset.path, "empty asset path"));
        }
        if RESERVED_ENTRIES.contains(&asset.path.as_str()) {
            return Err(PackageError::invalid_asset(
                &asset.path,
                "path is reserved for a package file",
            ));
        }
        if !seen.insert(asset.path.as_str()) {
            return Err(PackageError::invalid_asset(&asset.path, "duplicate asset path"));
        }
    }
    Ok(())
}

fn write_entries(
    entries: &[(&str, &[u8])],
    options: &PackageOptions,
    on_progress: &mut dyn FnMut(u8),
) -> PackageResult<Vec<u8>> {
    let file_options = options.file_options();
    let total: u64 = entries.iter().map(|(_, data)| data.len() as u64 + 1).sum();
    let mut written = 0u64;

    on_progress(0);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        zip.start_file(*name, file_options)?;
        zip.write_all(data)?;
        written += data.len() as u64 + 1;
        // 100 is reserved for the finished archive.
        on_progress(((written * 99) / total.max(1)) as u8);
    }
    let bytes = zip.finish()?.into_inner();
    on_progress(100);

    Ok(bytes)
}

fn unique_entry_name(base: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = format!("{base}.{PACKAGE_EXTENSION}");
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{base}_{n}.{PACKAGE_EXTENSION}");
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "template".to_string()
    } else {
        sanitized
    }
}

/// Download file name for a template
pub fn suggested_file_name(name: &str) -> String {
    format!("{}.{}", sanitize_file_name(name), PACKAGE_EXTENSION)
}

/// Decode a `data:` URL into bytes
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, String> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| "not a data URL".to_string())?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| "data URL has no payload separator".to_string())?;

    if meta.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| format!("bad base64 payload: {e}"))
    } else {
        Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::PackageArchive;

    fn bounce() -> TemplateData {
        TemplateData::new("Bounce Ball!")
            .with_author("Ada")
            .with_html("<div class=\"ball\"></div>")
            .with_css(".ball { animation: bounce 1s infinite; }")
            .with_external_dependency(DependencyRef::name("gsap"))
    }

    #[test]
    fn test_create_package_contents() {
        let package = create_package(&bounce(), &PackageOptions::default()).unwrap();
        let mut archive = PackageArchive::open(package.bytes).unwrap();

        for name in [MANIFEST_FILE, INDEX_FILE, STYLES_FILE, SCRIPT_FILE, DEPENDENCIES_FILE] {
            assert!(archive.contains(name), "missing {name}");
        }
        assert_eq!(archive.read_text(SCRIPT_FILE).unwrap().as_deref(), Some(""));

        let manifest: Manifest =
            serde_json::from_str(&archive.read_text(MANIFEST_FILE).unwrap().unwrap()).unwrap();
        assert_eq!(manifest.name, "Bounce Ball!");
        assert_eq!(manifest.version, "1.0.0");
        assert_eq!(manifest.author, "Ada");
        assert_eq!(manifest.external_dependencies(), &[DependencyRef::name("gsap")]);
        assert_eq!(manifest, package.manifest);

        let deps: Dependencies =
            serde_json::from_str(&archive.read_text(DEPENDENCIES_FILE).unwrap().unwrap()).unwrap();
        assert_eq!(deps.external, vec![DependencyRef::name("gsap")]);
    }

    #[test]
    fn test_dependencies_fall_back_to_options() {
        let options = PackageOptions::default()
            .with_dependencies(Dependencies::with_external(vec![DependencyRef::name("animate.css")]));
        let package = create_package(&TemplateData::new("Plain"), &options).unwrap();
        assert_eq!(
            package.manifest.external_dependencies(),
            &[DependencyRef::name("animate.css")]
        );

        let bare = create_package(&TemplateData::new("Plain"), &PackageOptions::default()).unwrap();
        assert!(bare.manifest.external_dependencies().is_empty());
    }

    #[test]
    fn test_assets_from_bytes_and_data_urls() {
        let data = TemplateData::new("Sprites")
            .with_asset(TemplateAsset::bytes("img/raw.bin", vec![1, 2, 3]))
            .with_asset(TemplateAsset::data_url("img/dot.txt", "data:text/plain;base64,aGk="))
            .with_asset(TemplateAsset::data_url("img/plain.txt", "data:,a%20b"));

        let package = create_package(&data, &PackageOptions::default()).unwrap();
        assert_eq!(package.manifest.assets, vec!["img/raw.bin", "img/dot.txt", "img/plain.txt"]);

        let mut archive = PackageArchive::open(package.bytes).unwrap();
        assert_eq!(archive.read_file("img/raw.bin").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(archive.read_text("img/dot.txt").unwrap().as_deref(), Some("hi"));
        assert_eq!(archive.read_text("img/plain.txt").unwrap().as_deref(), Some("a b"));
    }

    #[test]
    fn test_bad_data_url_names_asset() {
        let data = TemplateData::new("Broken")
            .with_asset(TemplateAsset::data_url("img/bad.png", "data:image/png;base64,@@@"));

        let err = create_package(&data, &PackageOptions::default()).unwrap_err();
        assert!(matches!(err, PackageError::InvalidAsset { ref path, .. } if path == "img/bad.png"));
    }

    #[test]
    fn test_progress_reaches_100() {
        let mut seen = Vec::new();
        create_package_with_progress(&bounce(), &PackageOptions::default(), |p| seen.push(p)).unwrap();

        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_reserved_asset_path_rejected() {
        let data = TemplateData::new("Clash").with_asset(TemplateAsset::bytes(INDEX_FILE, vec![1]));

        let err = create_package(&data, &PackageOptions::default()).unwrap_err();
        assert!(matches!(err, PackageError::InvalidAsset { ref path, .. } if path == INDEX_FILE));
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_duplicate_asset_path_rejected() {
        let data = TemplateData::new("Twice")
            .with_asset(TemplateAsset::bytes("a.png", vec![1]))
            .with_asset(TemplateAsset::bytes("a.png", vec![2]));

        let err = create_package(&data, &PackageOptions::default()).unwrap_err();
        assert!(matches!(err, PackageError::InvalidAsset { ref path, .. } if path == "a.png"));
        assert!(err.to_string().contains("duplicate asset path"));
    }

    #[test]
    fn test_fixed_created_gives_identical_archives() {
        let options = PackageOptions::default().with_created("2024-01-01T00:00:00+00:00");
        let first = create_package(&bounce(), &options).unwrap();
        let second = create_package(&bounce(), &options).unwrap();

        assert_eq!(first.manifest.created, "2024-01-01T00:00:00+00:00");
        assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn test_bulk_progress_is_aggregate() {
        let items = vec![bounce(), TemplateData::new("Fade"), TemplateData::new("Spin")];
        let mut seen = Vec::new();
        export_bulk_with_progress(&items, &PackageOptions::default(), |p| seen.push(p)).unwrap();

        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        // Member packaging reports along the way, not just the outer write.
        assert!(seen.iter().any(|&p| p > 0 && p < BULK_PACKAGING_SHARE as u8));
        assert_eq!(seen.iter().filter(|&&p| p == 100).count(), 1);
    }

    #[test]
    fn test_stored_compression() {
        let options = PackageOptions::default().with_compression(CompressionScheme::Stored);
        let package = create_package(&bounce(), &options).unwrap();
        let archive = PackageArchive::open(package.bytes).unwrap();
        assert!(archive.contains(MANIFEST_FILE));
    }

    #[test]
    fn test_bulk_export_empty_fails() {
        let err = export_bulk(&[], &PackageOptions::default()).unwrap_err();
        assert!(matches!(err, PackageError::EmptyExport));
    }

    #[test]
    fn test_bulk_export_nests_packages() {
        let items = vec![bounce(), TemplateData::new("Bounce Ball?"), TemplateData::new("Fade")];
        let bulk = export_bulk(&items, &PackageOptions::default()).unwrap();

        assert_eq!(
            bulk.entries,
            vec!["Bounce_Ball_.animpack", "Bounce_Ball__2.animpack", "Fade.animpack"]
        );

        let mut outer = PackageArchive::open(bulk.bytes).unwrap();
        let inner_bytes = outer.read_file("Fade.animpack").unwrap().unwrap();
        let mut inner = PackageArchive::open(inner_bytes).unwrap();
        let manifest: Manifest =
            serde_json::from_str(&inner.read_text(MANIFEST_FILE).unwrap().unwrap()).unwrap();
        assert_eq!(manifest.name, "Fade");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Slide In (fast)"), "Slide_In__fast_");
        assert_eq!(sanitize_file_name("ok-name_1"), "ok-name_1");
        assert_eq!(sanitize_file_name(""), "template");
        assert_eq!(suggested_file_name("a/b"), "a_b.animpack");
    }

    proptest::proptest! {
        #[test]
        fn prop_sanitized_names_are_file_safe(name in ".*") {
            let sanitized = sanitize_file_name(&name);
            proptest::prop_assert!(!sanitized.is_empty());
            proptest::prop_assert!(sanitized
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }
}
