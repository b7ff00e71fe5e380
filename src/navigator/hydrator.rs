use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::app::Result;
use crate::domain::{Chapter, TranslationResult, TranslationSettingsSnapshot};
use crate::store::ChapterStore;

/// Push notification for hydration state: `(stable_id, started)`.
pub type HydratingCallback = Arc<dyn Fn(&str, bool) + Send + Sync>;

/// A chapter loaded from the persistent store, with the generation settings
/// captured alongside its active translation (when one exists).
#[derive(Debug, Clone)]
pub struct HydratedChapter {
    pub chapter: Chapter,
    pub translation_settings: Option<TranslationSettingsSnapshot>,
}

/// Caller-supplied loader the resolver delegates its persistent tier to.
#[async_trait]
pub trait ChapterLoader: Send + Sync {
    /// Load a chapter plus its active translation. `None` covers both
    /// "not found" and "store unavailable".
    async fn load_chapter(&self, stable_id: &str) -> Option<HydratedChapter>;

    /// Read just the active translation, for lazy hydration of a chapter
    /// that is already in memory.
    async fn load_active_translation(&self, stable_id: &str)
        -> Result<Option<TranslationResult>>;
}

/// Fires `(id, true)` on construction and `(id, false)` on drop, so the
/// stop signal reaches the callback on every exit path.
struct HydratingGuard {
    stable_id: String,
    callback: HydratingCallback,
}

impl HydratingGuard {
    fn enter(stable_id: &str, callback: HydratingCallback) -> Self {
        (callback)(stable_id, true);
        Self {
            stable_id: stable_id.to_string(),
            callback,
        }
    }
}

impl Drop for HydratingGuard {
    fn drop(&mut self) {
        (self.callback)(&self.stable_id, false);
    }
}

pub struct Hydrator {
    store: Arc<dyn ChapterStore>,
    on_hydrating: HydratingCallback,
}

impl Hydrator {
    pub fn new(store: Arc<dyn ChapterStore>) -> Self {
        Self {
            store,
            on_hydrating: Arc::new(|_, _| {}),
        }
    }

    /// Replace the no-op hydration callback, typically with one that flips
    /// `hydrating_chapters` in the session state.
    pub fn with_callback(mut self, on_hydrating: HydratingCallback) -> Self {
        self.on_hydrating = on_hydrating;
        self
    }

    /// Load a chapter and its active translation by stable ID.
    ///
    /// The callback observes `(id, true)` before any store I/O and
    /// `(id, false)` exactly once afterwards, whatever the exit path.
    /// Store failures are recovered locally: navigation must never
    /// hard-fail merely because hydration errored.
    pub async fn load_chapter_from_store(
        &self,
        stable_id: &str,
        on_hydrating: &HydratingCallback,
    ) -> Option<HydratedChapter> {
        let _guard = HydratingGuard::enter(stable_id, on_hydrating.clone());

        let mut chapter = match self.store.get_chapter_by_stable_id(stable_id) {
            Ok(Some(chapter)) => chapter,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read chapter {stable_id} from store: {e}");
                return None;
            }
        };

        let translation_settings = match self.store.ensure_active_translation(stable_id) {
            Ok(Some(record)) => {
                chapter.translation_result = Some(record.to_result());
                Some(record.settings_snapshot())
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read active translation for {stable_id}: {e}");
                return None;
            }
        };

        Some(HydratedChapter {
            chapter,
            translation_settings,
        })
    }
}

#[async_trait]
impl ChapterLoader for Hydrator {
    async fn load_chapter(&self, stable_id: &str) -> Option<HydratedChapter> {
        let callback = self.on_hydrating.clone();
        self.load_chapter_from_store(stable_id, &callback).await
    }

    /// Read-only: lazy hydration during navigation must never write to
    /// the store, so no inactive draft gets promoted here.
    async fn load_active_translation(
        &self,
        stable_id: &str,
    ) -> Result<Option<TranslationResult>> {
        Ok(self
            .store
            .get_active_translation(stable_id)?
            .map(|record| record.to_result()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::app::LecternError;
    use crate::domain::{Chapter, ImportSource, TranslationRecord};
    use crate::store::SqliteStore;

    /// Store whose every operation fails, for the thrown-error path.
    struct FailingStore;

    fn db_error() -> LecternError {
        LecternError::Database(rusqlite::Error::InvalidQuery)
    }

    impl ChapterStore for FailingStore {
        fn put_chapter(&self, _: &Chapter) -> Result<()> {
            Err(db_error())
        }
        fn get_chapter_by_stable_id(&self, _: &str) -> Result<Option<Chapter>> {
            Err(db_error())
        }
        fn list_chapters(&self) -> Result<Vec<Chapter>> {
            Err(db_error())
        }
        fn add_url_mapping(&self, _: &str, _: &str, _: &str) -> Result<()> {
            Err(db_error())
        }
        fn find_stable_id_by_url(&self, _: &str) -> Result<Option<String>> {
            Err(db_error())
        }
        fn find_stable_id_by_key(&self, _: &str) -> Result<Option<String>> {
            Err(db_error())
        }
        fn add_translation(&self, _: &TranslationRecord) -> Result<i64> {
            Err(db_error())
        }
        fn get_active_translation(&self, _: &str) -> Result<Option<TranslationRecord>> {
            Err(db_error())
        }
        fn ensure_active_translation(&self, _: &str) -> Result<Option<TranslationRecord>> {
            Err(db_error())
        }
        fn set_active_translation(&self, _: &str, _: i64) -> Result<()> {
            Err(db_error())
        }
        fn import_chapters(
            &self,
            _: &HashMap<String, Chapter>,
            _: &HashMap<String, String>,
            _: &HashMap<String, String>,
        ) -> Result<usize> {
            Err(db_error())
        }
    }

    type SignalLog = Arc<Mutex<Vec<(String, bool)>>>;

    fn logging_callback() -> (HydratingCallback, SignalLog) {
        let log: SignalLog = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        let callback: HydratingCallback = Arc::new(move |id, hydrating| {
            log_clone.lock().unwrap().push((id.to_string(), hydrating));
        });
        (callback, log)
    }

    fn assert_signal_pair(log: &SignalLog, stable_id: &str) {
        let events = log.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                (stable_id.to_string(), true),
                (stable_id.to_string(), false)
            ]
        );
    }

    fn stored_chapter(store: &SqliteStore, key: &str) -> Chapter {
        let mut chapter = Chapter::new(
            key,
            "A Chapter".into(),
            "Original text".into(),
            format!("https://{key}"),
        );
        chapter.import_source = ImportSource::new("test");
        store.put_chapter(&chapter).unwrap();
        chapter
    }

    #[tokio::test]
    async fn test_signals_fire_when_no_record_found() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let hydrator = Hydrator::new(store);
        let (callback, log) = logging_callback();

        let result = hydrator.load_chapter_from_store("missing", &callback).await;
        assert!(result.is_none());
        assert_signal_pair(&log, "missing");
    }

    #[tokio::test]
    async fn test_signals_fire_for_chapter_without_translation() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let chapter = stored_chapter(&store, "example.com/novel/1");
        let hydrator = Hydrator::new(store);
        let (callback, log) = logging_callback();

        let hydrated = hydrator
            .load_chapter_from_store(&chapter.stable_id, &callback)
            .await
            .unwrap();
        assert_eq!(hydrated.chapter.title, "A Chapter");
        assert!(hydrated.chapter.translation_result.is_none());
        assert!(hydrated.translation_settings.is_none());
        assert_signal_pair(&log, &chapter.stable_id);
    }

    #[tokio::test]
    async fn test_signals_fire_for_chapter_with_active_translation() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let chapter = stored_chapter(&store, "example.com/novel/1");

        let mut record = TranslationRecord::new(&chapter.stable_id, "Hello");
        record.model = Some("claude-sonnet".into());
        record.is_active = true;
        store.add_translation(&record).unwrap();

        let hydrator = Hydrator::new(store);
        let (callback, log) = logging_callback();

        let hydrated = hydrator
            .load_chapter_from_store(&chapter.stable_id, &callback)
            .await
            .unwrap();
        let translation = hydrated.chapter.translation_result.unwrap();
        assert_eq!(translation.translation, "Hello");
        assert_eq!(translation.usage.provider, "unknown");
        let settings = hydrated.translation_settings.unwrap();
        assert_eq!(settings.model, "claude-sonnet");
        assert_signal_pair(&log, &chapter.stable_id);
    }

    #[tokio::test]
    async fn test_signals_fire_when_store_errors() {
        let hydrator = Hydrator::new(Arc::new(FailingStore));
        let (callback, log) = logging_callback();

        let result = hydrator.load_chapter_from_store("broken", &callback).await;
        assert!(result.is_none());
        assert_signal_pair(&log, "broken");
    }

    #[tokio::test]
    async fn test_inactive_translation_is_promoted_on_load() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let chapter = stored_chapter(&store, "example.com/novel/1");
        // Persisted but never activated
        store
            .add_translation(&TranslationRecord::new(&chapter.stable_id, "Draft"))
            .unwrap();

        let hydrator = Hydrator::new(store);
        let (callback, _log) = logging_callback();

        let hydrated = hydrator
            .load_chapter_from_store(&chapter.stable_id, &callback)
            .await
            .unwrap();
        let translation = hydrated.chapter.translation_result.unwrap();
        assert_eq!(translation.translation, "Draft");
        assert!(translation.is_active);
    }
}
