//! `gallery export` and `gallery export-installed` commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::Gallery;
use crate::cli::{ExportArgs, ExportInstalledArgs};
use crate::controller::ExportArtifact;

pub async fn execute(args: ExportArgs, gallery: &Gallery) -> Result<()> {
    let artifact = gallery.export_dirs(&args.dirs).await?;
    write_artifact(artifact, args.output).await
}

pub async fn execute_installed(args: ExportInstalledArgs, gallery: &Gallery) -> Result<()> {
    let artifact = gallery.export_installed(&args.name).await?;
    write_artifact(artifact, args.output).await
}

async fn write_artifact(artifact: ExportArtifact, output: Option<PathBuf>) -> Result<()> {
    let path = output_path(&artifact, output);
    tokio::fs::write(&path, &artifact.bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!(
        "Exported {} template(s) to {} ({} bytes)",
        artifact.templates.len(),
        path.display(),
        artifact.bytes.len()
    );
    for name in &artifact.templates {
        println!("  {name}");
    }
    Ok(())
}

fn output_path(artifact: &ExportArtifact, output: Option<PathBuf>) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(&artifact.file_name),
        Some(path) => path,
        None => Path::new(".").join(&artifact.file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> ExportArtifact {
        ExportArtifact {
            file_name: "Fade.animpack".to_string(),
            bytes: vec![1, 2, 3],
            templates: vec!["Fade".to_string()],
        }
    }

    #[test]
    fn test_output_path_defaults_to_suggested_name() {
        assert_eq!(output_path(&artifact(), None), Path::new(".").join("Fade.animpack"));
    }

    #[test]
    fn test_output_path_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            output_path(&artifact(), Some(dir.path().to_path_buf())),
            dir.path().join("Fade.animpack")
        );
        let file = dir.path().join("custom.animpack");
        assert_eq!(output_path(&artifact(), Some(file.clone())), file);
    }
}
