//! Page source: where crawl results come from
//!
//! This module fetches documentation pages, renders them to markdown
//! text and hands them out as a lazy stream of `CrawlResult` values.

mod fetcher;
mod page_source;
mod parser;

pub use fetcher::{build_http_client, fetch_html, fetch_url, is_html, user_agent, FetchResult};
pub use page_source::PageSource;
pub use parser::{extract_links, parse_html, parse_sitemap, render_markdown, ParsedPage};

use crate::UrlError;
use thiserror::Error;

/// One rendered page, consumed exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlResult {
    pub url: String,
    pub markdown: String,
}

impl CrawlResult {
    pub fn new(url: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            markdown: markdown.into(),
        }
    }

    /// Size of the markdown in characters
    pub fn size(&self) -> usize {
        self.markdown.chars().count()
    }
}

/// Errors raised while setting up or seeding the page source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Invalid seed URL '{url}': {source}")]
    InvalidSeed {
        url: String,
        #[source]
        source: UrlError,
    },

    #[error("Failed to read sitemap {url}: {reason}")]
    Sitemap { url: String, reason: String },
}
