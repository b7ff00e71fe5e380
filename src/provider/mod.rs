pub mod http_provider;
pub mod import;

use async_trait::async_trait;

use crate::app::Result;
use crate::normalizer::SiteInfo;

pub use http_provider::HttpProvider;
pub use import::{transform_imported_chapters, ImportedChapters};

/// A chapter as it comes off the wire, before import.
#[derive(Debug, Clone)]
pub struct RawChapterPayload {
    pub title: String,
    pub content: String,
    pub canonical_url: String,
    pub original_url: String,
    pub next_url: Option<String>,
    pub prev_url: Option<String>,
    pub chapter_number: Option<i64>,
    pub source_name: String,
}

/// Site adapter: knows which hosts it serves and how to turn one of their
/// pages into a [`RawChapterPayload`].
#[async_trait]
pub trait Provider: Send + Sync {
    fn is_url_supported(&self, url: &str) -> bool;

    fn supported_sites(&self) -> Vec<SiteInfo>;

    /// Fetch and parse one page. Errors here are operational and are
    /// captured by the fetch coordinator, never surfaced as panics.
    async fn fetch_and_parse(&self, url: &str) -> Result<RawChapterPayload>;
}
