//! `gallery import` command

use anyhow::Result;
use importer::{BulkMemberResult, ImportOutcome};

use super::Gallery;
use crate::cli::ImportArgs;
use crate::prompt::CliConflictHandler;

pub async fn execute(args: ImportArgs, gallery: &Gallery) -> Result<()> {
    let options = gallery.import_options(args.strict);
    let handler = CliConflictHandler::new(args.on_conflict.policy());

    let mut failures = 0;
    for file in &args.files {
        let results = gallery.import_file(file, &options, &handler).await?;
        for member in &results {
            if !report(member) {
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} package(s) failed to import");
    }
    Ok(())
}

/// Print one import result; false when it failed
fn report(member: &BulkMemberResult) -> bool {
    match &member.result {
        Ok(ImportOutcome::Installed(installed)) => {
            println!("Installed \"{}\" from {}", installed.name, member.entry);
            for warning in &installed.warnings {
                println!("  warning: {warning}");
            }
            for failure in &installed.dependencies.errors {
                println!("  dependency {}: {}", failure.name, failure.error);
            }
            true
        }
        Ok(ImportOutcome::Skipped { name }) => {
            println!("Skipped \"{}\" from {}", name, member.entry);
            true
        }
        Err(e) => {
            eprintln!("Failed to import {}: {}", member.entry, e);
            false
        }
    }
}
