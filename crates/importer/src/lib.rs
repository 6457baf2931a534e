//! Importer - Bring template packages into the local store
//!
//! This crate runs the import pipeline (extension check, decompression,
//! validation, dependency resolution, extraction), the conflict workflow for
//! names that are already installed, and bulk archive import.

mod bulk;
mod conflict;
mod error;
mod pipeline;

pub use bulk::*;
pub use conflict::*;
pub use error::*;
pub use pipeline::*;
