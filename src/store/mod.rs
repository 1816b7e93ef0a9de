//! Output store for condensed pages
//!
//! This module handles everything that touches the output directory:
//! - Deterministic URL → filename mapping
//! - The existence + size idempotency gate
//! - Serialized writes of `# <url>\n\n<body>` records

mod filename;
mod output_store;

pub use filename::{derive_filename, EXTENSION, ROOT_NAME};
pub use output_store::{
    format_record, OutputStore, DEFAULT_MIN_CONTENT_CHARS, DEFAULT_STRIP_PREFIX,
};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing output
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Output directory missing or not writable: {0}")]
    OutputDir(String),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
