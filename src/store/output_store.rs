//! One markdown file per URL, with an idempotency gate and a global write lock

use crate::config::OutputConfig;
use crate::store::filename::derive_filename;
use crate::store::{StoreError, StoreResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Default minimum size (characters) of a file that counts as done
pub const DEFAULT_MIN_CONTENT_CHARS: usize = 100;

/// Default path prefix removed before deriving filenames
pub const DEFAULT_STRIP_PREFIX: &str = "/docs/";

/// Output directory of condensed pages
///
/// The store keeps no index: a file that exists and holds at least
/// `min_content_chars` characters is the marker that its URL is done.
/// All writes go through one lock, so no two writes ever interleave.
#[derive(Debug)]
pub struct OutputStore {
    root: PathBuf,
    strip_prefix: String,
    min_content_chars: usize,
    write_lock: Mutex<()>,
}

impl OutputStore {
    /// Creates a store rooted at `root` with default settings
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            strip_prefix: DEFAULT_STRIP_PREFIX.to_string(),
            min_content_chars: DEFAULT_MIN_CONTENT_CHARS,
            write_lock: Mutex::new(()),
        }
    }

    /// Creates a store from the `[output]` configuration section
    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.directory)
            .with_strip_prefix(&config.strip_prefix)
            .with_min_content_chars(config.min_content_chars)
    }

    pub fn with_strip_prefix(mut self, prefix: &str) -> Self {
        self.strip_prefix = prefix.to_string();
        self
    }

    pub fn with_min_content_chars(mut self, min: usize) -> Self {
        self.min_content_chars = min;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filename (relative to the root) for a URL
    pub fn filename_for(&self, url: &str) -> String {
        derive_filename(url, &self.strip_prefix)
    }

    /// Full output path for a URL
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.root.join(self.filename_for(url))
    }

    /// Creates the output directory if needed
    ///
    /// Fails if the root exists but is not a directory.
    pub async fn ensure_root(&self) -> StoreResult<()> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::OutputDir(format!(
                "{} is not a directory",
                self.root.display()
            ))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tokio::fs::create_dir_all(&self.root)
                    .await
                    .map_err(|e| StoreError::OutputDir(e.to_string()))?;
                tracing::debug!("Created output directory {}", self.root.display());
                Ok(())
            }
            Err(e) => Err(StoreError::OutputDir(e.to_string())),
        }
    }

    /// Returns true if the URL already has a sufficiently large output file
    ///
    /// Any read error counts as "not present" so the page gets reprocessed
    /// rather than silently dropped.
    pub async fn exists_and_sufficient(&self, url: &str) -> bool {
        let path = self.path_for(url);

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => content.chars().count() >= self.min_content_chars,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                tracing::debug!(
                    "Could not read {} ({}), treating as missing",
                    path.display(),
                    e
                );
                false
            }
        }
    }

    /// Writes `# {header}\n\n{body}` to the URL's file, replacing any old content
    ///
    /// The whole open/write/close runs under the store's write lock.
    pub async fn write(&self, url: &str, header: &str, body: &str) -> StoreResult<PathBuf> {
        let path = self.path_for(url);
        let content = format_record(header, body);

        let _guard = self.write_lock.lock().await;

        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let mut file = tokio::fs::File::create(&path).await.map_err(io_err)?;
        file.write_all(content.as_bytes()).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        Ok(path)
    }
}

/// Formats the content of an output file
pub fn format_record(header: &str, body: &str) -> String {
    format!("# {header}\n\n{body}")
}
