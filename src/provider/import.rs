use std::collections::HashMap;

use crate::domain::{Chapter, ImportSource};
use crate::normalizer;
use crate::provider::RawChapterPayload;

/// Transform output: chapters keyed by stable ID plus the index deltas the
/// session and the persistent store both absorb.
#[derive(Debug, Clone, Default)]
pub struct ImportedChapters {
    pub chapters: HashMap<String, Chapter>,
    pub url_index: HashMap<String, String>,
    pub raw_url_index: HashMap<String, String>,
    pub current_chapter_id: Option<String>,
}

/// Turn raw payloads into importable chapters with stable IDs and URL
/// mappings. `requested_url` selects which of the imported chapters is the
/// "current" one (falling back to the first payload).
pub fn transform_imported_chapters(
    payloads: &[RawChapterPayload],
    requested_url: &str,
) -> ImportedChapters {
    let requested_key = normalizer::normalize(requested_url);
    let mut imported = ImportedChapters::default();

    for payload in payloads {
        let key = normalizer::normalize(&payload.canonical_url)
            .or_else(|| normalizer::normalize(&payload.original_url))
            .unwrap_or_else(|| payload.canonical_url.to_ascii_lowercase());

        let stable_id = Chapter::generate_stable_id(&key);

        let mut source_urls = vec![payload.original_url.clone()];
        if payload.canonical_url != payload.original_url {
            source_urls.push(payload.canonical_url.clone());
        }

        let chapter = Chapter {
            stable_id: stable_id.clone(),
            title: payload.title.clone(),
            content: payload.content.clone(),
            canonical_url: payload.canonical_url.clone(),
            original_url: Some(payload.original_url.clone()),
            next_url: payload.next_url.clone(),
            prev_url: payload.prev_url.clone(),
            chapter_number: payload.chapter_number,
            source_urls,
            import_source: ImportSource::new(payload.source_name.clone()),
            translation_result: None,
            created_at: chrono::Utc::now(),
        };

        imported.url_index.insert(key.clone(), stable_id.clone());
        imported
            .raw_url_index
            .insert(payload.original_url.clone(), stable_id.clone());
        imported
            .raw_url_index
            .insert(payload.canonical_url.clone(), stable_id.clone());

        if imported.current_chapter_id.is_none()
            || requested_key.as_deref() == Some(key.as_str())
        {
            imported.current_chapter_id = Some(stable_id.clone());
        }

        imported.chapters.insert(stable_id, chapter);
    }

    imported
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(original: &str, canonical: &str, title: &str) -> RawChapterPayload {
        RawChapterPayload {
            title: title.into(),
            content: format!("Body of {title}"),
            canonical_url: canonical.into(),
            original_url: original.into(),
            next_url: None,
            prev_url: None,
            chapter_number: None,
            source_name: "example.com".into(),
        }
    }

    #[test]
    fn test_transform_assigns_stable_ids_from_normalized_key() {
        let p1 = payload(
            "https://WWW.example.com/novel/1/",
            "https://example.com/novel/1",
            "One",
        );
        let imported = transform_imported_chapters(&[p1], "https://example.com/novel/1");

        assert_eq!(imported.chapters.len(), 1);
        let expected = Chapter::generate_stable_id("example.com/novel/1");
        assert!(imported.chapters.contains_key(&expected));
        assert_eq!(imported.current_chapter_id, Some(expected.clone()));
        assert_eq!(imported.url_index.get("example.com/novel/1"), Some(&expected));
        // Both URL variants land in the raw index
        assert_eq!(imported.raw_url_index.len(), 2);
    }

    #[test]
    fn test_transform_selects_requested_chapter() {
        let p1 = payload(
            "https://example.com/novel/1",
            "https://example.com/novel/1",
            "One",
        );
        let p2 = payload(
            "https://example.com/novel/2",
            "https://example.com/novel/2",
            "Two",
        );
        let imported =
            transform_imported_chapters(&[p1, p2], "https://www.example.com/novel/2/");

        let expected = Chapter::generate_stable_id("example.com/novel/2");
        assert_eq!(imported.current_chapter_id, Some(expected));
    }

    #[test]
    fn test_transform_falls_back_to_first_payload() {
        let p1 = payload(
            "https://example.com/novel/1",
            "https://example.com/novel/1",
            "One",
        );
        let imported = transform_imported_chapters(&[p1], "https://elsewhere.org/x");
        let expected = Chapter::generate_stable_id("example.com/novel/1");
        assert_eq!(imported.current_chapter_id, Some(expected));
    }
}
