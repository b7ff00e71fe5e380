use std::sync::{Mutex, PoisonError};

use url::form_urlencoded;

use crate::domain::Chapter;

/// Abstraction over the host environment's history stack.
pub trait BrowserHistory: Send + Sync {
    fn push_state(&self, state: &str, title: &str, url: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub state: String,
    pub title: String,
    pub url: String,
}

/// In-memory history recorder for the session.
#[derive(Default)]
pub struct SessionHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BrowserHistory for SessionHistory {
    fn push_state(&self, state: &str, title: &str, url: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(HistoryEntry {
                state: state.to_string(),
                title: title.to_string(),
                url: url.to_string(),
            });
    }
}

/// Push a resolved chapter onto the history stack.
///
/// The entry URL carries the canonical URL as a `chapter` query parameter
/// and the stable ID as state, so re-entering navigation from back/forward
/// resolves straight to a memory or store hit.
pub fn update_browser_history(history: &dyn BrowserHistory, chapter: &Chapter, stable_id: &str) {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("chapter", &chapter.canonical_url)
        .finish();
    history.push_state(stable_id, chapter.display_title(), &format!("?{query}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Chapter;

    #[test]
    fn test_push_encodes_canonical_url() {
        let history = SessionHistory::new();
        let chapter = Chapter::new(
            "example.com/novel/1",
            "Chapter One".into(),
            "text".into(),
            "https://example.com/novel/1?p=2".into(),
        );

        update_browser_history(&history, &chapter, &chapter.stable_id);

        let entries = history.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].state, chapter.stable_id);
        assert_eq!(entries[0].title, "Chapter One");
        assert_eq!(
            entries[0].url,
            "?chapter=https%3A%2F%2Fexample.com%2Fnovel%2F1%3Fp%3D2"
        );
    }

    #[test]
    fn test_entries_accumulate_in_order() {
        let history = SessionHistory::new();
        let c1 = Chapter::new("a.com/1", "One".into(), "t".into(), "https://a.com/1".into());
        let c2 = Chapter::new("a.com/2", "Two".into(), "t".into(), "https://a.com/2".into());

        update_browser_history(&history, &c1, &c1.stable_id);
        update_browser_history(&history, &c2, &c2.stable_id);

        let entries = history.entries();
        assert_eq!(entries[0].title, "One");
        assert_eq!(entries[1].title, "Two");
    }
}
