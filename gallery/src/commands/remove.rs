//! `gallery remove` command

use anyhow::Result;

use super::Gallery;
use crate::cli::RemoveArgs;

pub async fn execute(args: RemoveArgs, gallery: &Gallery) -> Result<()> {
    if gallery.remove(&args.name).await? {
        println!("Removed \"{}\"", args.name);
    } else {
        tracing::warn!("template `{}` not found", args.name);
    }
    Ok(())
}
