//! `gallery show` command

use anyhow::Result;

use super::Gallery;
use crate::cli::ShowArgs;

pub async fn execute(args: ShowArgs, gallery: &Gallery) -> Result<()> {
    let Some(record) = gallery.show(&args.name).await? else {
        anyhow::bail!("template '{}' is not installed", args.name);
    };

    println!("{}", serde_json::to_string_pretty(&record.manifest)?);
    println!("installed: {}", record.installed_at);
    for (label, source) in [
        ("index.html", &record.index_html),
        ("styles.css", &record.styles_css),
        ("script.js", &record.script_js),
    ] {
        match source {
            Some(text) => println!("{label}: {} bytes", text.len()),
            None => println!("{label}: missing"),
        }
    }
    for asset in &record.assets_meta {
        println!("asset: {asset}");
    }
    Ok(())
}
