//! Command implementations

pub mod export;
pub mod import;
pub mod list;
pub mod remove;
pub mod show;

use crate::controller::GalleryController;
use animpack::HttpResourceLoader;
use store::FileTemplateStore;

/// Controller used by every command
pub type Gallery = GalleryController<FileTemplateStore, HttpResourceLoader>;
