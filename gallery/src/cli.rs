//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use importer::ConflictResolution;

/// Animation template gallery: export, import and manage `.animpack` packages
#[derive(Parser)]
#[command(name = "gallery")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Gallery data directory (settings and installed templates)
    #[arg(
        long,
        global = true,
        env = "ANIMGALLERY_DATA_DIR",
        default_value = ".animgallery"
    )]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Package template source directories
    Export(ExportArgs),

    /// Package an installed template
    ExportInstalled(ExportInstalledArgs),

    /// Import template packages or bulk archives
    Import(ImportArgs),

    /// List installed templates
    List(ListArgs),

    /// Show details of an installed template
    Show(ShowArgs),

    /// Remove an installed template
    Remove(RemoveArgs),
}

#[derive(Args)]
pub struct ExportArgs {
    /// Template source directories; more than one produces a bulk archive
    #[arg(required = true)]
    pub dirs: Vec<PathBuf>,

    /// Output file (defaults to a name derived from the template)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ExportInstalledArgs {
    /// Installed template name
    pub name: String,

    /// Output file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Package files (.animpack or .zip)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Fail the import when any dependency cannot be loaded
    #[arg(long)]
    pub strict: bool,

    /// What to do when a template with the same name is installed
    #[arg(long, value_enum, default_value_t = OnConflict::Ask)]
    pub on_conflict: OnConflict,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only show templates matching this text
    #[arg(short, long)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Installed template name
    pub name: String,
}

#[derive(Args)]
pub struct RemoveArgs {
    /// Installed template name
    pub name: String,
}

/// Conflict handling chosen on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnConflict {
    /// Prompt for each collision
    Ask,
    Overwrite,
    Duplicate,
    Skip,
}

impl OnConflict {
    /// The fixed answer, or `None` when the user should be asked
    pub fn policy(self) -> Option<ConflictResolution> {
        match self {
            Self::Ask => None,
            Self::Overwrite => Some(ConflictResolution::Overwrite),
            Self::Duplicate => Some(ConflictResolution::Duplicate),
            Self::Skip => Some(ConflictResolution::Skip),
        }
    }
}
