use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{LecternError, Result};
use crate::domain::{Chapter, ImportSource, TranslationRecord};
use crate::store::ChapterStore;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| LecternError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            LecternError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn parse_string_list(s: Option<String>) -> Option<Vec<String>> {
        s.and_then(|json| serde_json::from_str(&json).ok())
    }

    fn row_to_chapter(row: &Row<'_>) -> rusqlite::Result<Chapter> {
        let source_urls: String = row.get(9)?;
        Ok(Chapter {
            stable_id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            canonical_url: row.get(3)?,
            original_url: row.get(4)?,
            next_url: row.get(5)?,
            prev_url: row.get(6)?,
            chapter_number: row.get(7)?,
            import_source: ImportSource {
                source_name: row.get(8)?,
                imported_at: row
                    .get::<_, Option<String>>(10)?
                    .and_then(|s| Self::parse_datetime(&s))
                    .unwrap_or_else(Utc::now),
            },
            source_urls: serde_json::from_str(&source_urls).unwrap_or_default(),
            translation_result: None,
            created_at: row
                .get::<_, String>(11)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }

    fn row_to_translation(row: &Row<'_>) -> rusqlite::Result<TranslationRecord> {
        Ok(TranslationRecord {
            stable_id: row.get(0)?,
            translation: row.get(1)?,
            proposal: row.get(2)?,
            footnotes: Self::parse_string_list(row.get(3)?),
            illustrations: Self::parse_string_list(row.get(4)?),
            prompt_tokens: row.get(5)?,
            completion_tokens: row.get(6)?,
            total_tokens: row.get(7)?,
            estimated_cost: row.get(8)?,
            duration_ms: row.get(9)?,
            provider: row.get(10)?,
            model: row.get(11)?,
            temperature: row.get(12)?,
            system_prompt: row.get(13)?,
            version: row.get(14)?,
            label: row.get(15)?,
            is_active: row.get::<_, i64>(16)? != 0,
            created_at: row
                .get::<_, String>(17)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }

    fn insert_chapter(conn: &Connection, chapter: &Chapter) -> Result<()> {
        conn.execute(
            "INSERT INTO chapters (stable_id, title, content, canonical_url, original_url,
                                   next_url, prev_url, chapter_number, source_name,
                                   source_urls, imported_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(stable_id) DO UPDATE SET
                 title = excluded.title,
                 content = excluded.content,
                 canonical_url = excluded.canonical_url,
                 next_url = excluded.next_url,
                 prev_url = excluded.prev_url,
                 source_urls = excluded.source_urls",
            params![
                chapter.stable_id,
                chapter.title,
                chapter.content,
                chapter.canonical_url,
                chapter.original_url,
                chapter.next_url,
                chapter.prev_url,
                chapter.chapter_number,
                chapter.import_source.source_name,
                serde_json::to_string(&chapter.source_urls)
                    .unwrap_or_else(|_| "[]".to_string()),
                chapter.import_source.imported_at.to_rfc3339(),
                chapter.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

const CHAPTER_COLUMNS: &str = "stable_id, title, content, canonical_url, original_url, \
                               next_url, prev_url, chapter_number, source_name, \
                               source_urls, imported_at, created_at";

const TRANSLATION_COLUMNS: &str = "stable_id, translation, proposal, footnotes, illustrations, \
                                   prompt_tokens, completion_tokens, total_tokens, \
                                   estimated_cost, duration_ms, provider, model, temperature, \
                                   system_prompt, version, label, is_active, created_at";

impl ChapterStore for SqliteStore {
    fn put_chapter(&self, chapter: &Chapter) -> Result<()> {
        let conn = self.conn()?;
        Self::insert_chapter(&conn, chapter)
    }

    fn get_chapter_by_stable_id(&self, stable_id: &str) -> Result<Option<Chapter>> {
        let conn = self.conn()?;
        let result = conn
            .query_row(
                &format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE stable_id = ?1"),
                params![stable_id],
                Self::row_to_chapter,
            )
            .optional()?;
        Ok(result)
    }

    fn list_chapters(&self) -> Result<Vec<Chapter>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters ORDER BY source_name, chapter_number, title"
        ))?;
        let chapters = stmt
            .query_map([], Self::row_to_chapter)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(chapters)
    }

    fn add_url_mapping(&self, url: &str, normalized_key: &str, stable_id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO url_mappings (url, normalized_key, stable_id) VALUES (?1, ?2, ?3)
             ON CONFLICT(url) DO UPDATE SET
                 normalized_key = excluded.normalized_key,
                 stable_id = excluded.stable_id",
            params![url, normalized_key, stable_id],
        )?;
        Ok(())
    }

    fn find_stable_id_by_url(&self, url: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let result = conn
            .query_row(
                "SELECT stable_id FROM url_mappings WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(result)
    }

    fn find_stable_id_by_key(&self, normalized_key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let result = conn
            .query_row(
                "SELECT stable_id FROM url_mappings WHERE normalized_key = ?1 LIMIT 1",
                params![normalized_key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(result)
    }

    fn add_translation(&self, record: &TranslationRecord) -> Result<i64> {
        let conn = self.conn()?;
        let footnotes = record
            .footnotes
            .as_ref()
            .map(|f| serde_json::to_string(f).unwrap_or_else(|_| "[]".to_string()));
        let illustrations = record
            .illustrations
            .as_ref()
            .map(|i| serde_json::to_string(i).unwrap_or_else(|_| "[]".to_string()));

        conn.execute(
            &format!(
                "INSERT INTO translations ({TRANSLATION_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
            ),
            params![
                record.stable_id,
                record.translation,
                record.proposal,
                footnotes,
                illustrations,
                record.prompt_tokens,
                record.completion_tokens,
                record.total_tokens,
                record.estimated_cost,
                record.duration_ms,
                record.provider,
                record.model,
                record.temperature,
                record.system_prompt,
                record.version,
                record.label,
                record.is_active as i64,
                record.created_at.to_rfc3339(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn get_active_translation(&self, stable_id: &str) -> Result<Option<TranslationRecord>> {
        let conn = self.conn()?;
        let result = conn
            .query_row(
                &format!(
                    "SELECT {TRANSLATION_COLUMNS} FROM translations
                     WHERE stable_id = ?1 AND is_active = 1"
                ),
                params![stable_id],
                Self::row_to_translation,
            )
            .optional()?;
        Ok(result)
    }

    fn ensure_active_translation(&self, stable_id: &str) -> Result<Option<TranslationRecord>> {
        if let Some(active) = self.get_active_translation(stable_id)? {
            return Ok(Some(active));
        }

        // No active version: promote the most recent one, if any.
        let latest_version: Option<i64> = {
            let conn = self.conn()?;
            conn.query_row(
                "SELECT version FROM translations WHERE stable_id = ?1
                 ORDER BY version DESC, created_at DESC LIMIT 1",
                params![stable_id],
                |row| row.get(0),
            )
            .optional()?
        };

        match latest_version {
            Some(version) => {
                self.set_active_translation(stable_id, version)?;
                self.get_active_translation(stable_id)
            }
            None => Ok(None),
        }
    }

    fn set_active_translation(&self, stable_id: &str, version: i64) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE translations SET is_active = 0 WHERE stable_id = ?1",
            params![stable_id],
        )?;
        let changed = tx.execute(
            "UPDATE translations SET is_active = 1 WHERE stable_id = ?1 AND version = ?2",
            params![stable_id, version],
        )?;
        if changed == 0 {
            return Err(LecternError::Other(format!(
                "No translation version {version} for chapter {stable_id}"
            )));
        }
        tx.commit()?;
        Ok(())
    }

    fn import_chapters(
        &self,
        chapters: &HashMap<String, Chapter>,
        url_index: &HashMap<String, String>,
        raw_url_index: &HashMap<String, String>,
    ) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut new_count = 0;
        for chapter in chapters.values() {
            let exists: i64 = tx.query_row(
                "SELECT COUNT(*) FROM chapters WHERE stable_id = ?1",
                params![chapter.stable_id],
                |row| row.get(0),
            )?;
            if exists == 0 {
                new_count += 1;
            }
            Self::insert_chapter(&tx, chapter)?;
        }

        for (key, stable_id) in url_index {
            tx.execute(
                "INSERT INTO url_mappings (url, normalized_key, stable_id) VALUES (?1, ?1, ?2)
                 ON CONFLICT(url) DO UPDATE SET stable_id = excluded.stable_id",
                params![key, stable_id],
            )?;
        }
        for (url, stable_id) in raw_url_index {
            let key = crate::normalizer::normalize(url).unwrap_or_else(|| url.clone());
            tx.execute(
                "INSERT INTO url_mappings (url, normalized_key, stable_id) VALUES (?1, ?2, ?3)
                 ON CONFLICT(url) DO UPDATE SET stable_id = excluded.stable_id",
                params![url, key, stable_id],
            )?;
        }

        tx.commit()?;
        Ok(new_count)
    }
}
