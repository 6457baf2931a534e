//! Template source directories
//!
//! A source directory holds `template.json` with the template's metadata,
//! the three source files and any asset files the metadata lists.

use animpack::archive::{INDEX_FILE, SCRIPT_FILE, STYLES_FILE};
use animpack::{Dependencies, DependencyRef, TemplateAsset, TemplateData};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata file inside a source directory
pub const SOURCE_FILE: &str = "template.json";

/// Contents of `template.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSource {
    pub name: String,
    pub version: Option<String>,
    pub author: Option<String>,
    pub description: String,
    pub tags: Vec<String>,
    pub dependencies: Vec<DependencyRef>,
    pub assets: Vec<String>,
    pub preview: Option<String>,
}

/// Read a source directory into packager input
pub async fn load_template_dir(dir: &Path) -> Result<TemplateData> {
    let meta_path = dir.join(SOURCE_FILE);
    let text = tokio::fs::read_to_string(&meta_path)
        .await
        .with_context(|| format!("failed to read {}", meta_path.display()))?;
    let source: TemplateSource = serde_json::from_str(&text)
        .with_context(|| format!("invalid {}", meta_path.display()))?;

    if source.name.trim().is_empty() {
        anyhow::bail!("{} has no template name", meta_path.display());
    }

    let mut data = TemplateData::new(source.name);
    data.version = source.version;
    data.author = source.author;
    data.description = source.description;
    data.tags = source.tags;
    data.preview = source.preview;
    if !source.dependencies.is_empty() {
        data.dependencies = Some(Dependencies::with_external(source.dependencies));
    }

    data.index_html = read_optional(&dir.join(INDEX_FILE)).await?;
    data.styles_css = read_optional(&dir.join(STYLES_FILE)).await?;
    data.script_js = read_optional(&dir.join(SCRIPT_FILE)).await?;

    for asset in source.assets {
        let path = dir.join(&asset);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read asset {}", path.display()))?;
        data.assets.push(TemplateAsset::bytes(asset, bytes));
    }

    Ok(data)
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_full_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SOURCE_FILE),
            r#"{
                "name": "Bounce",
                "author": "Ada",
                "tags": ["bounce"],
                "dependencies": ["gsap", {"name": "animate.css", "version": "4.0.0"}],
                "assets": ["img/ball.png"]
            }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("index.html"), "<div class=\"ball\"></div>").unwrap();
        std::fs::write(dir.path().join("styles.css"), ".ball {}").unwrap();
        std::fs::create_dir(dir.path().join("img")).unwrap();
        std::fs::write(dir.path().join("img/ball.png"), [1u8, 2, 3]).unwrap();

        let data = load_template_dir(dir.path()).await.unwrap();

        assert_eq!(data.name, "Bounce");
        assert_eq!(data.author.as_deref(), Some("Ada"));
        assert_eq!(data.version, None);
        assert_eq!(data.index_html.as_deref(), Some("<div class=\"ball\"></div>"));
        assert_eq!(data.script_js, None);
        assert_eq!(data.assets.len(), 1);
        assert_eq!(data.assets[0].path, "img/ball.png");
        assert_eq!(data.dependencies.unwrap().external.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_asset_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SOURCE_FILE),
            r#"{"name": "Fade", "assets": ["gone.svg"]}"#,
        )
        .unwrap();

        let err = load_template_dir(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("gone.svg"));
    }

    #[tokio::test]
    async fn test_nameless_template_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SOURCE_FILE), r#"{"name": "  "}"#).unwrap();
        assert!(load_template_dir(dir.path()).await.is_err());
    }
}
