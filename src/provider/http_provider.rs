use std::time::Duration;

use async_trait::async_trait;
use html_escape::decode_html_entities;
use reqwest::Client;
use url::Url;

use crate::app::{LecternError, Result};
use crate::normalizer::{SiteInfo, UrlNormalizer};
use crate::provider::{Provider, RawChapterPayload};

/// Generic reqwest-backed provider.
///
/// Fetches the page and applies a plain-HTML extraction (title tag, tag
/// stripping, entity decoding). Site-specific adapters can replace this
/// behind the [`Provider`] trait.
pub struct HttpProvider {
    client: Client,
    normalizer: UrlNormalizer,
}

impl HttpProvider {
    pub fn new(sites: Vec<SiteInfo>, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(user_agent.to_string())
            .build()?;

        Ok(Self {
            client,
            normalizer: UrlNormalizer::new(sites),
        })
    }

    pub fn with_defaults(sites: Vec<SiteInfo>) -> Result<Self> {
        Self::new(sites, Duration::from_secs(10), "lectern/0.1.0")
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn is_url_supported(&self, url: &str) -> bool {
        self.normalizer.is_supported(url)
    }

    fn supported_sites(&self) -> Vec<SiteInfo> {
        self.normalizer.sites().to_vec()
    }

    async fn fetch_and_parse(&self, url: &str) -> Result<RawChapterPayload> {
        let parsed = Url::parse(url)?;
        let response = self.client.get(url).send().await?;
        response.error_for_status_ref()?;

        let canonical_url = response.url().to_string();
        let body = response.text().await?;

        let title = extract_title(&body)
            .ok_or_else(|| LecternError::Extraction(format!("No title found in {url}")))?;
        let content = extract_text(&body);
        if content.is_empty() {
            return Err(LecternError::Extraction(format!(
                "No readable content in {url}"
            )));
        }

        Ok(RawChapterPayload {
            title,
            content,
            canonical_url,
            original_url: url.to_string(),
            next_url: None,
            prev_url: None,
            chapter_number: trailing_number(parsed.path()),
            source_name: parsed.host_str().unwrap_or("").to_string(),
        })
    }
}

/// Pull the `<title>` (or first `<h1>`) out of an HTML document.
fn extract_title(html: &str) -> Option<String> {
    for tag in ["title", "h1"] {
        if let Some(text) = extract_tag_text(html, tag) {
            let text = decode_html_entities(text.trim()).to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn extract_tag_text<'a>(html: &'a str, tag: &str) -> Option<&'a str> {
    let lower = html.to_ascii_lowercase();
    let open = lower.find(&format!("<{tag}"))?;
    let start = lower[open..].find('>')? + open + 1;
    let end = lower[start..].find(&format!("</{tag}"))? + start;
    Some(&html[start..end])
}

/// Strip scripts, styles, and markup, leaving decoded text.
fn extract_text(html: &str) -> String {
    let without_blocks = remove_block(&remove_block(html, "script"), "style");

    let mut text = String::with_capacity(without_blocks.len());
    let mut in_tag = false;
    for ch in without_blocks.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                text.push(' ');
            }
            c if !in_tag => text.push(c),
            _ => {}
        }
    }

    let decoded = decode_html_entities(&text);
    decoded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn remove_block(html: &str, tag: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let open_marker = format!("<{tag}");
    let close_marker = format!("</{tag}>");

    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(open) = lower[pos..].find(&open_marker) {
        let open = pos + open;
        out.push_str(&html[pos..open]);
        match lower[open..].find(&close_marker) {
            Some(close) => pos = open + close + close_marker.len(),
            None => {
                // Unclosed block: drop the rest
                return out;
            }
        }
    }
    out.push_str(&html[pos..]);
    out
}

fn trailing_number(path: &str) -> Option<i64> {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>Chapter 3 &ndash; The Pass</title>
<style>body { color: red; }</style></head>
<body><script>var x = "<ignored>";</script>
<h1>Chapter 3</h1>
<p>The road climbed&nbsp;steeply.</p>
<p>Snow began to fall.</p></body></html>"#;

    #[test]
    fn test_extract_title() {
        assert_eq!(
            extract_title(PAGE).as_deref(),
            Some("Chapter 3 \u{2013} The Pass")
        );
    }

    #[test]
    fn test_extract_title_falls_back_to_h1() {
        let html = "<html><body><h1>Only Heading</h1></body></html>";
        assert_eq!(extract_title(html).as_deref(), Some("Only Heading"));
    }

    #[test]
    fn test_extract_text_strips_scripts_and_tags() {
        let text = extract_text(PAGE);
        assert!(text.contains("The road climbed steeply."));
        assert!(text.contains("Snow began to fall."));
        assert!(!text.contains("var x"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn test_trailing_number() {
        assert_eq!(trailing_number("/novel/12/"), Some(12));
        assert_eq!(trailing_number("/novel/12"), Some(12));
        assert_eq!(trailing_number("/novel/about"), None);
    }
}
