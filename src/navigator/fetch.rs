use std::sync::Arc;

use tracing::{info, warn};

use crate::app::{LecternError, Result};
use crate::domain::FetchOutcome;
use crate::navigator::dedup::FetchRegistry;
use crate::navigator::hydrator::{ChapterLoader, Hydrator};
use crate::normalizer;
use crate::provider::{transform_imported_chapters, Provider};
use crate::store::ChapterStore;

/// Resolves a still-unknown URL: persistent URL mapping first, then a
/// coalesced network fetch through the provider adapter.
///
/// Error split: usage errors (unsupported source, malformed URL) are
/// returned as `Err` before any I/O; operational failures settle inside
/// the [`FetchOutcome`].
pub struct FetchCoordinator {
    store: Arc<dyn ChapterStore>,
    provider: Arc<dyn Provider>,
    hydrator: Arc<Hydrator>,
    registry: Arc<FetchRegistry>,
}

impl FetchCoordinator {
    pub fn new(
        store: Arc<dyn ChapterStore>,
        provider: Arc<dyn Provider>,
        hydrator: Arc<Hydrator>,
    ) -> Self {
        Self {
            store,
            provider,
            hydrator,
            registry: FetchRegistry::new(),
        }
    }

    pub fn registry(&self) -> &Arc<FetchRegistry> {
        &self.registry
    }

    pub async fn handle_fetch(&self, url: &str) -> Result<FetchOutcome> {
        if !self.provider.is_url_supported(url) {
            return Err(LecternError::UnsupportedSource(url.to_string()));
        }
        let key = normalizer::normalize(url).ok_or(LecternError::MalformedUrl)?;

        // Known content reachable by URL mapping: hydrate, skip the network.
        if let Some(stable_id) = self.lookup_known_id(url, &key) {
            info!("URL {url} already mapped to {stable_id}, skipping fetch");
            let mut outcome = FetchOutcome::default();
            if let Some(hydrated) = self.hydrator.load_chapter(&stable_id).await {
                outcome
                    .chapters
                    .insert(stable_id.clone(), hydrated.chapter);
            }
            outcome.url_index.insert(key, stable_id.clone());
            outcome.raw_url_index.insert(url.to_string(), stable_id.clone());
            outcome.current_chapter_id = Some(stable_id);
            return Ok(outcome);
        }

        let store = Arc::clone(&self.store);
        let provider = Arc::clone(&self.provider);
        let owned_url = url.to_string();
        let shared = self.registry.join_or_start(&key, async move {
            fetch_and_import(provider, store, &owned_url).await
        });

        Ok(shared.await)
    }

    /// A store lookup failure here is operational: log it and fall through
    /// to the network rather than failing the fetch.
    fn lookup_known_id(&self, url: &str, key: &str) -> Option<String> {
        let by_url = match self.store.find_stable_id_by_url(url) {
            Ok(found) => found,
            Err(e) => {
                warn!("URL mapping lookup failed for {url}: {e}");
                None
            }
        };
        by_url.or_else(|| match self.store.find_stable_id_by_key(key) {
            Ok(found) => found,
            Err(e) => {
                warn!("Key mapping lookup failed for {key}: {e}");
                None
            }
        })
    }
}

async fn fetch_and_import(
    provider: Arc<dyn Provider>,
    store: Arc<dyn ChapterStore>,
    url: &str,
) -> FetchOutcome {
    let payload = match provider.fetch_and_parse(url).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Fetch failed for {url}: {e}");
            // Preserve the raw message for diagnosability.
            return FetchOutcome::failed(e.to_string());
        }
    };

    let imported = transform_imported_chapters(std::slice::from_ref(&payload), url);
    match store.import_chapters(
        &imported.chapters,
        &imported.url_index,
        &imported.raw_url_index,
    ) {
        Ok(new_count) => info!("Imported {new_count} new chapters from {url}"),
        Err(e) => warn!("Failed to persist chapters fetched from {url}: {e}"),
    }

    FetchOutcome {
        chapters: imported.chapters,
        url_index: imported.url_index,
        raw_url_index: imported.raw_url_index,
        current_chapter_id: imported.current_chapter_id,
        error: None,
    }
}
