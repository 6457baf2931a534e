//! `gallery list` command

use anyhow::Result;

use super::Gallery;
use crate::cli::ListArgs;

pub async fn execute(args: ListArgs, gallery: &Gallery) -> Result<()> {
    let templates = gallery.list(args.search.as_deref()).await?;

    if templates.is_empty() {
        println!("No templates installed");
        return Ok(());
    }

    for summary in &templates {
        let tags = if summary.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", summary.tags.join(", "))
        };
        println!(
            "{} v{} by {}{}",
            summary.name, summary.version, summary.author, tags
        );
        if !summary.description.is_empty() {
            println!("  {}", summary.description);
        }
    }
    Ok(())
}
