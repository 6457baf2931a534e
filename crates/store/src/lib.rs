//! Store - Persistence for installed templates and gallery settings
//!
//! This crate holds the keyed template collection (file-backed or in
//! memory), the installed template record, and settings management.

mod backend;
mod error;
mod file_store;
mod memory;
mod record;
mod settings;

pub use backend::*;
pub use error::*;
pub use file_store::*;
pub use memory::*;
pub use record::*;
pub use settings::*;

/// Result type for store operations
pub type StoreResult<T> = Result<T>;
