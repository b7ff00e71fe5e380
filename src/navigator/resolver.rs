use tracing::{debug, warn};

use crate::domain::{NavigationContext, NavigationOutcome, NavigationResult};
use crate::navigator::hydrator::ChapterLoader;
use crate::normalizer::{self, UrlNormalizer};

/// Tiered URL resolution: memory, then the persistent store (through a
/// caller-supplied [`ChapterLoader`]), then a "fetch needed" signal.
///
/// The context is read, never mutated; results carry the deltas the owner
/// commits.
pub struct Navigator {
    normalizer: UrlNormalizer,
}

impl Navigator {
    pub fn new(normalizer: UrlNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn is_valid_url(&self, url: &str) -> bool {
        normalizer::is_valid_url(url)
    }

    pub async fn handle_navigate(
        &self,
        url: &str,
        ctx: &NavigationContext,
        loader: &dyn ChapterLoader,
    ) -> NavigationResult {
        // Syntactic validation happens before any I/O.
        if !normalizer::is_valid_url(url) {
            return NavigationResult::miss(
                NavigationOutcome::Malformed,
                Some("Invalid URL format".into()),
                ctx,
            );
        }
        let Some(key) = normalizer::normalize(url) else {
            return NavigationResult::miss(
                NavigationOutcome::Malformed,
                Some("Invalid URL format".into()),
                ctx,
            );
        };

        if let Some(stable_id) = ctx.lookup_stable_id(url, &key).cloned() {
            // Memory tier
            if let Some(chapter) = ctx.chapters.get(&stable_id) {
                debug!("Memory hit for {key} -> {stable_id}");
                let mut chapter = chapter.clone();
                if chapter.translation_result.is_none() {
                    // Best effort: a failed translation read never fails
                    // the navigation itself.
                    match loader.load_active_translation(&stable_id).await {
                        Ok(translation) => chapter.translation_result = translation,
                        Err(e) => {
                            warn!("Lazy translation hydration failed for {stable_id}: {e}")
                        }
                    }
                }
                return NavigationResult::hit(NavigationOutcome::MemoryHit, chapter, ctx);
            }

            // Persistent tier: the ID is known but the chapter is not resident.
            if let Some(hydrated) = loader.load_chapter(&stable_id).await {
                debug!("Store hit for {key} -> {stable_id}");
                return NavigationResult::hit(NavigationOutcome::StoreHit, hydrated.chapter, ctx);
            }
        }

        // No usable local data.
        if !self.normalizer.is_supported(url) {
            let error = format!(
                "This site is not currently supported. Supported sites: {}",
                self.normalizer.supported_domains()
            );
            return NavigationResult::miss(NavigationOutcome::Unsupported, Some(error), ctx);
        }

        debug!("No local data for {key}, fetch needed");
        NavigationResult::miss(NavigationOutcome::NeedsFetch, None, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::app::{LecternError, Result};
    use crate::domain::{Chapter, TranslationRecord, TranslationResult};
    use crate::navigator::hydrator::HydratedChapter;
    use crate::normalizer::SiteInfo;

    fn navigator() -> Navigator {
        Navigator::new(UrlNormalizer::new(vec![SiteInfo {
            domain: "example.com".into(),
            example: "https://example.com/novel/1".into(),
        }]))
    }

    fn chapter(key: &str) -> Chapter {
        Chapter::new(
            key,
            format!("Chapter at {key}"),
            "text".into(),
            format!("https://{key}"),
        )
    }

    /// Loader that counts calls and serves from a fixed chapter/translation.
    #[derive(Default)]
    struct MockLoader {
        chapter: Option<Chapter>,
        translation: Option<String>,
        load_calls: AtomicUsize,
        translation_calls: AtomicUsize,
        fail_translation: bool,
    }

    #[async_trait]
    impl ChapterLoader for MockLoader {
        async fn load_chapter(&self, _stable_id: &str) -> Option<HydratedChapter> {
            self.load_calls.fetch_add(1, Ordering::SeqCst);
            self.chapter.clone().map(|chapter| HydratedChapter {
                chapter,
                translation_settings: None,
            })
        }

        async fn load_active_translation(
            &self,
            stable_id: &str,
        ) -> Result<Option<TranslationResult>> {
            self.translation_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_translation {
                return Err(LecternError::Database(rusqlite::Error::InvalidQuery));
            }
            Ok(self
                .translation
                .as_ref()
                .map(|t| TranslationRecord::new(stable_id, t.clone()).to_result()))
        }
    }

    fn ctx_with_chapter(chapter: Chapter, raw_url: &str, key: &str) -> NavigationContext {
        let mut ctx = NavigationContext::default();
        let id = chapter.stable_id.clone();
        ctx.url_index.insert(key.to_string(), id.clone());
        ctx.raw_url_index.insert(raw_url.to_string(), id.clone());
        ctx.chapters.insert(id, chapter);
        ctx
    }

    #[tokio::test]
    async fn test_malformed_url() {
        let nav = navigator();
        let ctx = NavigationContext::default();
        let loader = MockLoader::default();

        let result = nav.handle_navigate("not a url", &ctx, &loader).await;
        assert_eq!(result.outcome, NavigationOutcome::Malformed);
        assert_eq!(result.error.as_deref(), Some("Invalid URL format"));
        assert!(result.chapter_id.is_none());
        assert!(!result.should_update_browser_history);
        // No I/O at all
        assert_eq!(loader.load_calls.load(Ordering::SeqCst), 0);
        assert_eq!(loader.translation_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_memory_hit_never_invokes_loader() {
        let nav = navigator();
        let mut ch = chapter("example.com/novel/1");
        ch.translation_result = Some(TranslationRecord::new(&ch.stable_id, "done").to_result());
        let id = ch.stable_id.clone();
        let ctx = ctx_with_chapter(ch, "https://example.com/novel/1", "example.com/novel/1");
        let loader = MockLoader::default();

        for _ in 0..3 {
            let result = nav
                .handle_navigate("https://example.com/novel/1", &ctx, &loader)
                .await;
            assert_eq!(result.outcome, NavigationOutcome::MemoryHit);
            assert_eq!(result.chapter_id.as_deref(), Some(id.as_str()));
            assert!(result.should_update_browser_history);
        }
        assert_eq!(loader.load_calls.load(Ordering::SeqCst), 0);
        assert_eq!(loader.translation_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_url_variants_resolve_to_same_chapter() {
        let nav = navigator();
        let mut ch = chapter("example.com/novel/1");
        ch.translation_result = Some(TranslationRecord::new(&ch.stable_id, "t").to_result());
        let id = ch.stable_id.clone();
        let ctx = ctx_with_chapter(ch, "https://example.com/novel/1", "example.com/novel/1");
        let loader = MockLoader::default();

        for variant in [
            "https://Example.com/Novel/1",
            "https://www.example.com/novel/1/",
            "https://example.com/novel/1#top",
        ] {
            let result = nav.handle_navigate(variant, &ctx, &loader).await;
            assert_eq!(result.outcome, NavigationOutcome::MemoryHit, "{variant}");
            assert_eq!(result.chapter_id.as_deref(), Some(id.as_str()), "{variant}");
        }
    }

    #[tokio::test]
    async fn test_memory_hit_lazily_hydrates_translation() {
        let nav = navigator();
        let ch = chapter("example.com/novel/1");
        let ctx = ctx_with_chapter(ch, "https://example.com/novel/1", "example.com/novel/1");
        let loader = MockLoader {
            translation: Some("Hello".into()),
            ..Default::default()
        };

        let result = nav
            .handle_navigate("https://example.com/novel/1", &ctx, &loader)
            .await;
        assert_eq!(result.outcome, NavigationOutcome::MemoryHit);
        let translation = result.chapter.unwrap().translation_result.unwrap();
        assert_eq!(translation.translation, "Hello");
        assert_eq!(loader.translation_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_translation_hydration_failure_is_swallowed() {
        let nav = navigator();
        let ch = chapter("example.com/novel/1");
        let ctx = ctx_with_chapter(ch, "https://example.com/novel/1", "example.com/novel/1");
        let loader = MockLoader {
            fail_translation: true,
            ..Default::default()
        };

        let result = nav
            .handle_navigate("https://example.com/novel/1", &ctx, &loader)
            .await;
        assert_eq!(result.outcome, NavigationOutcome::MemoryHit);
        assert!(result.error.is_none());
        assert!(result.chapter.unwrap().translation_result.is_none());
    }

    #[tokio::test]
    async fn test_store_hit_when_id_known_but_not_resident() {
        let nav = navigator();
        let ch = chapter("example.com/novel/1");
        let id = ch.stable_id.clone();

        let mut ctx = NavigationContext::default();
        ctx.url_index.insert("example.com/novel/1".into(), id.clone());
        let loader = MockLoader {
            chapter: Some(ch),
            ..Default::default()
        };

        let result = nav
            .handle_navigate("https://example.com/novel/1", &ctx, &loader)
            .await;
        assert_eq!(result.outcome, NavigationOutcome::StoreHit);
        assert_eq!(result.chapter_id.as_deref(), Some(id.as_str()));
        assert!(result.should_update_browser_history);
        assert_eq!(result.navigation_history, vec![id]);
        assert_eq!(loader.load_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_store_miss_falls_through_to_needs_fetch() {
        let nav = navigator();
        let mut ctx = NavigationContext::default();
        // Stale mapping: ID known, but neither memory nor store has it.
        ctx.url_index
            .insert("example.com/novel/1".into(), "gone".into());
        let loader = MockLoader::default();

        let result = nav
            .handle_navigate("https://example.com/novel/1", &ctx, &loader)
            .await;
        assert_eq!(result.outcome, NavigationOutcome::NeedsFetch);
        assert!(result.error.is_none());
        assert!(result.chapter_id.is_none());
    }

    #[tokio::test]
    async fn test_unsupported_host_names_providers() {
        let nav = navigator();
        let ctx = NavigationContext::default();
        let loader = MockLoader::default();

        let result = nav
            .handle_navigate("https://unknown.org/x", &ctx, &loader)
            .await;
        assert_eq!(result.outcome, NavigationOutcome::Unsupported);
        let error = result.error.unwrap();
        assert!(error.contains("not currently supported"));
        assert!(error.contains("example.com"));
    }

    #[tokio::test]
    async fn test_needs_fetch_is_error_free() {
        let nav = navigator();
        let ctx = NavigationContext::default();
        let loader = MockLoader::default();

        let result = nav
            .handle_navigate("https://example.com/new-chapter", &ctx, &loader)
            .await;
        assert_eq!(result.outcome, NavigationOutcome::NeedsFetch);
        assert!(result.error.is_none());
        assert!(result.chapter_id.is_none());
        assert!(!result.should_update_browser_history);
    }

    #[tokio::test]
    async fn test_hit_appends_to_navigation_history() {
        let nav = navigator();
        let mut ch = chapter("example.com/novel/2");
        ch.translation_result = Some(TranslationRecord::new(&ch.stable_id, "t").to_result());
        let id = ch.stable_id.clone();
        let mut ctx = ctx_with_chapter(ch, "https://example.com/novel/2", "example.com/novel/2");
        ctx.navigation_history = vec!["earlier".into()];
        let loader = MockLoader::default();

        let result = nav
            .handle_navigate("https://example.com/novel/2", &ctx, &loader)
            .await;
        assert_eq!(result.navigation_history, vec!["earlier".to_string(), id]);
        // The caller's context itself is untouched.
        assert_eq!(ctx.navigation_history, vec!["earlier".to_string()]);
    }
}
