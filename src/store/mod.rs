pub mod sqlite;

use std::collections::HashMap;

use crate::app::Result;
use crate::domain::{Chapter, TranslationRecord};

pub use sqlite::SqliteStore;

pub trait ChapterStore: Send + Sync {
    // Chapter operations
    fn put_chapter(&self, chapter: &Chapter) -> Result<()>;
    fn get_chapter_by_stable_id(&self, stable_id: &str) -> Result<Option<Chapter>>;
    fn list_chapters(&self) -> Result<Vec<Chapter>>;

    // URL mapping operations
    fn add_url_mapping(&self, url: &str, normalized_key: &str, stable_id: &str) -> Result<()>;
    fn find_stable_id_by_url(&self, url: &str) -> Result<Option<String>>;
    fn find_stable_id_by_key(&self, normalized_key: &str) -> Result<Option<String>>;

    // Translation operations
    fn add_translation(&self, record: &TranslationRecord) -> Result<i64>;
    fn get_active_translation(&self, stable_id: &str) -> Result<Option<TranslationRecord>>;
    /// Like [`get_active_translation`](Self::get_active_translation), but if
    /// no version is active the most recent one is promoted first.
    fn ensure_active_translation(&self, stable_id: &str) -> Result<Option<TranslationRecord>>;
    fn set_active_translation(&self, stable_id: &str, version: i64) -> Result<()>;

    /// Bulk-import transformed chapters plus their URL mappings.
    /// Returns the number of newly inserted chapters.
    fn import_chapters(
        &self,
        chapters: &HashMap<String, Chapter>,
        url_index: &HashMap<String, String>,
        raw_url_index: &HashMap<String, String>,
    ) -> Result<usize>;
}
