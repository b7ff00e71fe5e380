use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::TranslationResult;

/// Where a chapter came from when it was first imported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSource {
    pub source_name: String,
    pub imported_at: DateTime<Utc>,
}

impl ImportSource {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            imported_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub stable_id: String,
    pub title: String,
    pub content: String,
    pub canonical_url: String,
    pub original_url: Option<String>,
    pub next_url: Option<String>,
    pub prev_url: Option<String>,
    pub chapter_number: Option<i64>,
    /// Every raw URL variant that has resolved to this chapter.
    pub source_urls: Vec<String>,
    pub import_source: ImportSource,
    pub translation_result: Option<TranslationResult>,
    pub created_at: DateTime<Utc>,
}

impl Chapter {
    pub fn new(normalized_key: &str, title: String, content: String, canonical_url: String) -> Self {
        let stable_id = Self::generate_stable_id(normalized_key);
        Self {
            stable_id,
            title,
            content,
            canonical_url,
            original_url: None,
            next_url: None,
            prev_url: None,
            chapter_number: None,
            source_urls: Vec::new(),
            import_source: ImportSource::new(""),
            translation_result: None,
            created_at: Utc::now(),
        }
    }

    /// Generate a deterministic stable ID from the normalized URL key.
    ///
    /// The ID is independent of which URL variant referenced the chapter:
    /// all variants collapse to the same normalized key first.
    pub fn generate_stable_id(normalized_key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(normalized_key.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }

    pub fn has_translation(&self) -> bool {
        self.translation_result.is_some()
    }
}
