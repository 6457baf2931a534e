//! Installed template records

use animpack::{Manifest, TemplateAsset, TemplateData};
use serde::{Deserialize, Serialize};

/// The persisted, installed form of a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    /// Primary key
    pub name: String,
    /// Manifest, with `name` matching the key
    pub manifest: Manifest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles_css: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_js: Option<String>,
    /// Paths of the asset blobs stored alongside the record
    #[serde(default)]
    pub assets_meta: Vec<String>,
    /// Installation timestamp (RFC 3339)
    pub installed_at: String,
}

impl TemplateRecord {
    /// Create a record stamped with the current time
    pub fn new(manifest: Manifest) -> Self {
        Self {
            name: manifest.name.clone(),
            manifest,
            index_html: None,
            styles_css: None,
            script_js: None,
            assets_meta: Vec::new(),
            installed_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Set the template sources
    pub fn with_sources(
        mut self,
        index_html: Option<String>,
        styles_css: Option<String>,
        script_js: Option<String>,
    ) -> Self {
        self.index_html = index_html;
        self.styles_css = styles_css;
        self.script_js = script_js;
        self
    }

    /// Set the asset path list
    pub fn with_assets_meta(mut self, assets: Vec<String>) -> Self {
        self.assets_meta = assets;
        self
    }

    /// Rebuild packager input, so an installed template can be exported again
    pub fn to_template_data(&self, assets: Vec<(String, Vec<u8>)>) -> TemplateData {
        let manifest = &self.manifest;
        TemplateData {
            name: self.name.clone(),
            version: Some(manifest.version.clone()),
            author: Some(manifest.author.clone()),
            description: manifest.description.clone(),
            tags: manifest.tags.clone(),
            index_html: self.index_html.clone(),
            styles_css: self.styles_css.clone(),
            script_js: self.script_js.clone(),
            assets: assets
                .into_iter()
                .map(|(path, data)| TemplateAsset::bytes(path, data))
                .collect(),
            dependencies: manifest.dependencies.clone(),
            preview: manifest.preview.clone(),
        }
    }
}

/// Summary information for template listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub name: String,
    pub version: String,
    pub author: String,
    pub description: String,
    pub tags: Vec<String>,
    pub asset_count: usize,
    pub installed_at: String,
}

impl From<&TemplateRecord> for TemplateSummary {
    fn from(record: &TemplateRecord) -> Self {
        Self {
            name: record.name.clone(),
            version: record.manifest.version.clone(),
            author: record.manifest.author.clone(),
            description: record.manifest.description.clone(),
            tags: record.manifest.tags.clone(),
            asset_count: record.assets_meta.len(),
            installed_at: record.installed_at.clone(),
        }
    }
}

/// Search records by name, description or tags (case-insensitive)
pub fn search<'a>(records: &'a [TemplateRecord], query: &str) -> Vec<&'a TemplateRecord> {
    let query_lower = query.to_lowercase();

    records
        .iter()
        .filter(|record| {
            let manifest = &record.manifest;
            record.name.to_lowercase().contains(&query_lower)
                || manifest.description.to_lowercase().contains(&query_lower)
                || manifest
                    .tags
                    .iter()
                    .any(|t| t.to_lowercase().contains(&query_lower))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, description: &str, tags: &[&str]) -> TemplateRecord {
        let manifest = Manifest::new(name, "1.0.0", "Ada")
            .with_description(description)
            .with_tags(tags.iter().map(|s| s.to_string()).collect());
        TemplateRecord::new(manifest)
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let rec = record("Fade", "", &[]).with_sources(Some("<p>x</p>".to_string()), None, None);
        let json = serde_json::to_value(&rec).unwrap();

        assert_eq!(json["indexHtml"], "<p>x</p>");
        assert!(json.get("stylesCss").is_none());
        assert!(json.get("installedAt").is_some());

        let back: TemplateRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn test_search_templates() {
        let records = vec![
            record("Bounce", "Ball bounce", &["physics"]),
            record("Slide In", "Entrance slide", &["entrance"]),
            record("Fade In", "Entrance fade", &["entrance", "opacity"]),
        ];

        assert_eq!(search(&records, "entrance").len(), 2);
        assert_eq!(search(&records, "PHYSICS").len(), 1);
        assert_eq!(search(&records, "opacity")[0].name, "Fade In");
        assert!(search(&records, "spin").is_empty());
    }

    #[test]
    fn test_to_template_data() {
        let rec = record("Spin", "Rotates", &["spin"])
            .with_sources(None, Some(".s{}".to_string()), None)
            .with_assets_meta(vec!["a.png".to_string()]);

        let data = rec.to_template_data(vec![("a.png".to_string(), vec![9])]);
        assert_eq!(data.name, "Spin");
        assert_eq!(data.version.as_deref(), Some("1.0.0"));
        assert_eq!(data.styles_css.as_deref(), Some(".s{}"));
        assert_eq!(data.assets, vec![TemplateAsset::bytes("a.png", vec![9])]);

        let summary = TemplateSummary::from(&rec);
        assert_eq!(summary.asset_count, 1);
    }
}
