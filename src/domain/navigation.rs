use std::collections::{HashMap, HashSet};

use crate::domain::Chapter;

/// Bound on `navigation_history`; oldest entries are dropped past this.
pub const MAX_NAVIGATION_HISTORY: usize = 256;

/// Session-lived navigation state.
///
/// Treated as an immutable value per call: resolver and fetch operations
/// return results/deltas and never mutate a shared context. The owner
/// applies commits one at a time via [`absorb_fetch`](Self::absorb_fetch)
/// and friends.
#[derive(Debug, Clone, Default)]
pub struct NavigationContext {
    /// Chapters currently held in memory, keyed by stable ID.
    pub chapters: HashMap<String, Chapter>,
    /// Normalized URL key -> stable ID.
    pub url_index: HashMap<String, String>,
    /// Raw URL -> stable ID. Multiple raw URLs may map to the same ID.
    pub raw_url_index: HashMap<String, String>,
    /// Ordered stable IDs of visited chapters.
    pub navigation_history: Vec<String>,
    /// Stable IDs with a hydration currently in progress.
    pub hydrating_chapters: HashSet<String>,
}

impl NavigationContext {
    /// Resolve a raw URL / normalized key pair to a known stable ID.
    pub fn lookup_stable_id(&self, raw_url: &str, key: &str) -> Option<&String> {
        self.raw_url_index
            .get(raw_url)
            .or_else(|| self.url_index.get(key))
    }

    /// History with `stable_id` appended under the bounded policy:
    /// consecutive repeats are collapsed and length is capped.
    pub fn history_with(&self, stable_id: &str) -> Vec<String> {
        let mut history = self.navigation_history.clone();
        if history.last().map(String::as_str) != Some(stable_id) {
            history.push(stable_id.to_string());
        }
        if history.len() > MAX_NAVIGATION_HISTORY {
            let excess = history.len() - MAX_NAVIGATION_HISTORY;
            history.drain(..excess);
        }
        history
    }

    /// Merge a settled fetch into the session state.
    pub fn absorb_fetch(&mut self, outcome: &FetchOutcome) {
        for (id, chapter) in &outcome.chapters {
            self.chapters.insert(id.clone(), chapter.clone());
        }
        for (key, id) in &outcome.url_index {
            self.url_index.insert(key.clone(), id.clone());
        }
        for (url, id) in &outcome.raw_url_index {
            self.raw_url_index.insert(url.clone(), id.clone());
        }
    }

    /// Merge a navigation result (resolved chapter + updated history).
    pub fn absorb_navigation(&mut self, result: &NavigationResult) {
        if let Some(chapter) = &result.chapter {
            self.chapters
                .insert(chapter.stable_id.clone(), chapter.clone());
        }
        self.navigation_history = result.navigation_history.clone();
    }

    pub fn set_hydrating(&mut self, stable_id: &str, hydrating: bool) {
        if hydrating {
            self.hydrating_chapters.insert(stable_id.to_string());
        } else {
            self.hydrating_chapters.remove(stable_id);
        }
    }
}

/// Terminal outcome of one `handle_navigate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Chapter was already in the in-memory index.
    MemoryHit,
    /// Chapter was known by ID and loaded from the persistent store.
    StoreHit,
    /// No local data; the caller must invoke the fetch coordinator.
    NeedsFetch,
    /// Well-formed URL on a host no configured provider serves.
    Unsupported,
    /// The input was not a parseable URL.
    Malformed,
}

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub outcome: NavigationOutcome,
    pub chapter_id: Option<String>,
    pub chapter: Option<Chapter>,
    pub should_update_browser_history: bool,
    pub error: Option<String>,
    /// The updated history the caller should commit.
    pub navigation_history: Vec<String>,
}

impl NavigationResult {
    pub(crate) fn miss(
        outcome: NavigationOutcome,
        error: Option<String>,
        ctx: &NavigationContext,
    ) -> Self {
        Self {
            outcome,
            chapter_id: None,
            chapter: None,
            should_update_browser_history: false,
            error,
            navigation_history: ctx.navigation_history.clone(),
        }
    }

    pub(crate) fn hit(outcome: NavigationOutcome, chapter: Chapter, ctx: &NavigationContext) -> Self {
        let navigation_history = ctx.history_with(&chapter.stable_id);
        Self {
            outcome,
            chapter_id: Some(chapter.stable_id.clone()),
            chapter: Some(chapter),
            should_update_browser_history: true,
            error: None,
            navigation_history,
        }
    }
}

/// Result of one `handle_fetch` call.
///
/// Operational failures are carried in `error` rather than thrown, so all
/// callers render a uniform failure state. Cloneable because concurrent
/// callers for the same key share one settled value.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub chapters: HashMap<String, Chapter>,
    pub url_index: HashMap<String, String>,
    pub raw_url_index: HashMap<String, String>,
    pub current_chapter_id: Option<String>,
    pub error: Option<String>,
}

impl FetchOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}
