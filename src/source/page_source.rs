//! Breadth-first page producer
//!
//! The source runs as its own task and pushes rendered pages into a bounded
//! channel. The receiving end is the lazy stream of crawl results.

use crate::config::SourceConfig;
use crate::source::fetcher::{fetch_html, fetch_url, FetchResult};
use crate::source::parser::{is_nested_sitemap, parse_html, parse_sitemap};
use crate::source::{CrawlResult, SourceError};
use crate::url::{in_scope, normalize_url, same_origin};
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use tokio::sync::mpsc;
use url::Url;

/// Produces crawl results from seeds, an optional sitemap and link following
#[derive(Debug, Clone)]
pub struct PageSource {
    client: Client,
    seeds: Vec<Url>,
    sitemap: Option<Url>,
    pattern: Option<String>,
    max_depth: u32,
    buffer_size: usize,
}

impl PageSource {
    /// Creates a source from the `[source]` configuration section
    ///
    /// Seeds and the sitemap URL are normalized up front; an invalid one is
    /// an error.
    pub fn new(client: Client, config: &SourceConfig) -> Result<Self, SourceError> {
        let seeds = config
            .seeds
            .iter()
            .map(|seed| {
                normalize_url(seed).map_err(|source| SourceError::InvalidSeed {
                    url: seed.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let sitemap = config
            .sitemap
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|e| SourceError::InvalidSeed {
                    url: raw.to_string(),
                    source: crate::UrlError::Parse(e.to_string()),
                })
            })
            .transpose()?;

        Ok(Self {
            client,
            seeds,
            sitemap,
            pattern: config.pattern.clone(),
            max_depth: config.max_depth,
            buffer_size: config.buffer_size.max(1),
        })
    }

    /// Normalized seed URLs from the configuration
    pub fn seeds(&self) -> &[Url] {
        &self.seeds
    }

    /// Resolves the starting pages, then starts the producer task
    ///
    /// Returns the stream of results. The stream ends when every reachable
    /// page has been produced, or early if the receiver is dropped. Fails
    /// before anything is spawned if there is nothing to crawl.
    pub async fn start(self) -> Result<mpsc::Receiver<CrawlResult>, SourceError> {
        let seeds = self.resolve_seeds().await?;
        tracing::info!("Page source starting from {} pages", seeds.len());

        let (tx, rx) = mpsc::channel(self.buffer_size);
        tokio::spawn(async move {
            self.produce(seeds, tx).await;
        });
        Ok(rx)
    }

    /// Seeds plus in-scope sitemap entries, deduplicated, in order
    ///
    /// A sitemap failure is only an error when there are no configured seeds
    /// to fall back on. So is a sitemap with no in-scope entries.
    pub async fn resolve_seeds(&self) -> Result<Vec<Url>, SourceError> {
        let mut resolved = self.seeds.clone();

        if let Some(sitemap) = &self.sitemap {
            match self.sitemap_entries(sitemap).await {
                Ok(entries) if entries.is_empty() && resolved.is_empty() => {
                    return Err(SourceError::Sitemap {
                        url: sitemap.to_string(),
                        reason: "no in-scope entries".to_string(),
                    });
                }
                Ok(entries) => {
                    tracing::info!("Sitemap {} lists {} in-scope pages", sitemap, entries.len());
                    resolved.extend(entries);
                }
                Err(e) if resolved.is_empty() => return Err(e),
                Err(e) => tracing::warn!("{}; continuing with configured seeds", e),
            }
        }

        let mut seen = HashSet::new();
        resolved.retain(|url| seen.insert(url.to_string()));
        Ok(resolved)
    }

    async fn sitemap_entries(&self, sitemap: &Url) -> Result<Vec<Url>, SourceError> {
        let locs = self.fetch_sitemap(sitemap).await?;
        let mut entries = Vec::new();

        for loc in locs {
            if is_nested_sitemap(&loc) {
                match Url::parse(&loc) {
                    Ok(nested) => match self.fetch_sitemap(&nested).await {
                        Ok(nested_locs) => entries.extend(nested_locs),
                        Err(e) => tracing::warn!("{}", e),
                    },
                    Err(e) => tracing::debug!("Skipping sitemap entry {}: {}", loc, e),
                }
            } else {
                entries.push(loc);
            }
        }

        Ok(entries
            .iter()
            .filter_map(|loc| normalize_url(loc).ok())
            .filter(|url| in_scope(self.pattern.as_deref(), url))
            .collect())
    }

    async fn fetch_sitemap(&self, sitemap: &Url) -> Result<Vec<String>, SourceError> {
        let failure = |reason: String| SourceError::Sitemap {
            url: sitemap.to_string(),
            reason,
        };

        match fetch_url(&self.client, sitemap.as_str()).await {
            FetchResult::Success { body, .. } => Ok(parse_sitemap(&body)),
            FetchResult::HttpError { status_code } => Err(failure(format!("HTTP {}", status_code))),
            FetchResult::NetworkError { error } => Err(failure(error)),
            FetchResult::ContentMismatch { content_type } => {
                Err(failure(format!("unexpected content type {}", content_type)))
            }
        }
    }

    /// Breadth-first walk; every fetched page with content is sent once
    async fn produce(self, seeds: Vec<Url>, tx: mpsc::Sender<CrawlResult>) {
        let mut visited: HashSet<String> = seeds.iter().map(|url| url.to_string()).collect();
        let mut queue: VecDeque<(Url, u32)> = seeds.into_iter().map(|url| (url, 0)).collect();
        let mut produced = 0usize;

        while let Some((url, depth)) = queue.pop_front() {
            let body = match fetch_html(&self.client, url.as_str()).await {
                FetchResult::Success { body, .. } => body,
                FetchResult::ContentMismatch { content_type } => {
                    tracing::debug!("Skipping {}: content type {}", url, content_type);
                    continue;
                }
                FetchResult::HttpError { status_code } => {
                    tracing::warn!("Skipping {}: HTTP {}", url, status_code);
                    continue;
                }
                FetchResult::NetworkError { error } => {
                    tracing::warn!("Skipping {}: {}", url, error);
                    continue;
                }
            };

            let page = parse_html(&body, &url);

            if depth < self.max_depth {
                for link in &page.links {
                    let Ok(next) = normalize_url(link) else {
                        continue;
                    };
                    if same_origin(&url, &next)
                        && in_scope(self.pattern.as_deref(), &next)
                        && visited.insert(next.to_string())
                    {
                        queue.push_back((next, depth + 1));
                    }
                }
            }

            if page.markdown.trim().is_empty() {
                tracing::debug!("Skipping {}: no content", url);
                continue;
            }

            let result = CrawlResult::new(url.to_string(), page.markdown);
            if tx.send(result).await.is_err() {
                tracing::debug!("Result stream closed, stopping page source");
                return;
            }
            produced += 1;
        }

        tracing::info!(
            "Page source finished: {} pages produced, {} URLs seen",
            produced,
            visited.len()
        );
    }
}
