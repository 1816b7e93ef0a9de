//! HTML and sitemap parsing
//!
//! This module turns a fetched page into:
//! - Markdown for the main content (via `html2md`)
//! - Links to follow (from `<a>` tags)
//!
//! and reads `<loc>` entries out of sitemap documents.

use quick_xml::events::Event;
use quick_xml::Reader;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements tried in order when looking for the page's main content
const CONTENT_ROOTS: &[&str] = &["main", "article", "[role='main']", "body"];

/// Elements whose content never belongs in the rendered text
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "nav", "header", "footer", "aside",
    "form", "button", "iframe",
];

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Rendered main content
    pub markdown: String,

    /// All links found on the page (absolute URLs, fragments removed)
    pub links: Vec<String>,
}

/// Parses an HTML page
///
/// # Example
///
/// ```
/// use doc_digest::source::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><h1>Intro</h1><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert!(parsed.markdown.contains("Intro"));
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        markdown: render_markdown(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Renders the main content of a page as markdown
///
/// The first matching content root is kept, page chrome and scripts are
/// cut out of it, and the remaining HTML is converted with `html2md`.
pub fn render_markdown(document: &Html) -> String {
    let Some(root) = content_root(document) else {
        return String::new();
    };

    let html = strip_skipped(root);
    html2md::parse_html(&html).trim().to_string()
}

fn content_root(document: &Html) -> Option<ElementRef<'_>> {
    CONTENT_ROOTS
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .find_map(|selector| document.select(&selector).next())
        .or_else(|| Some(document.root_element()))
}

/// Serializes `root` with every skipped element removed
fn strip_skipped(root: ElementRef<'_>) -> String {
    let mut html = root.html();

    // Descendants come in document order, so an outer element is removed
    // before anything nested inside it is looked up.
    for element in root.descendants().filter_map(ElementRef::wrap) {
        if SKIPPED_TAGS.contains(&element.value().name()) {
            html = html.replacen(&element.html(), "", 1);
        }
    }
    html
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts all followable links from the HTML document
///
/// Links with a `download` attribute are skipped.
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }

    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}

/// Reads every `<loc>` entry of a sitemap or sitemap index
///
/// Entries may be plain text or CDATA. Parsing stops at the first XML
/// error and keeps what was read up to that point.
///
/// # Example
///
/// ```
/// use doc_digest::source::parse_sitemap;
///
/// let xml = r#"<urlset><url><loc> https://example.com/docs/a </loc></url></urlset>"#;
/// assert_eq!(parse_sitemap(xml), vec!["https://example.com/docs/a".to_string()]);
/// ```
pub fn parse_sitemap(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut locs = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"loc" => {
                current = Some(String::new());
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"loc" => {
                if let Some(loc) = current.take() {
                    let loc = loc.trim();
                    if !loc.is_empty() {
                        locs.push(loc.to_string());
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(loc) = current.as_mut() {
                    match e.unescape() {
                        Ok(text) => loc.push_str(&text),
                        Err(err) => {
                            tracing::debug!("Bad escape in sitemap entry: {}", err);
                            current = None;
                        }
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(loc) = current.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                tracing::debug!(
                    "Sitemap XML error at byte {}: {}",
                    reader.buffer_position(),
                    err
                );
                break;
            }
            _ => {}
        }
    }

    locs
}

/// Returns true if a sitemap entry points at another sitemap
pub fn is_nested_sitemap(loc: &str) -> bool {
    let path = Url::parse(loc)
        .map(|url| url.path().to_string())
        .unwrap_or_else(|_| loc.to_string());
    path.ends_with(".xml") || path.ends_with(".xml.gz")
}
