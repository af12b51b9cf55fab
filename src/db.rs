use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::security::constant_time_compare;

/// An addressable unit of publishable content with a canonical body.
#[derive(Debug, Clone, Serialize)]
pub struct ContentItem {
    pub id: i64,
    pub slug: String,
    pub title: String,
    /// The default-language content, authoritative regardless of
    /// translation state.
    pub body: String,
    pub created_at: String,
}

/// The per-content-item mapping from language code to translated body.
///
/// Keys are unique, order is irrelevant; values are stored
/// already-sanitized. The whole map is replaced on every write, so a
/// language omitted from a submission becomes absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationSet {
    entries: BTreeMap<String, String>,
}

impl TranslationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored body for a language code, if any.
    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    pub fn insert(&mut self, code: impl Into<String>, body: impl Into<String>) {
        self.entries.insert(code.into(), body.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for TranslationSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// SQLite-backed store for content items, their translation sets, and
/// one-time edit tokens. Cloning is cheap; all clones share one
/// connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Initialize database connection and create tables
    pub fn new(database_path: &str) -> Result<Self> {
        let conn = Connection::open(database_path)
            .context(format!("Failed to open database at {}", database_path))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS content_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create content_items table")?;

        // One opaque record per content item: the TranslationSet as JSON.
        conn.execute(
            "CREATE TABLE IF NOT EXISTS translations (
                content_id INTEGER PRIMARY KEY,
                data TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create translations table")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS edit_tokens (
                token TEXT PRIMARY KEY,
                content_id INTEGER NOT NULL,
                issued_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create edit_tokens table")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // ==================== Content Items ====================

    /// Create a content item. The slug must be unique.
    pub fn insert_content(&self, slug: &str, title: &str, body: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let created_at = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO content_items (slug, title, body, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![slug, title, body, created_at],
        )
        .context("Failed to insert content item")?;

        Ok(conn.last_insert_rowid())
    }

    pub fn get_content(&self, id: i64) -> Result<Option<ContentItem>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, slug, title, body, created_at FROM content_items WHERE id = ?1",
        )?;

        let item = stmt
            .query_row(params![id], Self::row_to_content)
            .optional()?;

        Ok(item)
    }

    pub fn get_content_by_slug(&self, slug: &str) -> Result<Option<ContentItem>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, slug, title, body, created_at FROM content_items WHERE slug = ?1",
        )?;

        let item = stmt
            .query_row(params![slug], Self::row_to_content)
            .optional()?;

        Ok(item)
    }

    /// All content slugs, used by the router's closest-match guess.
    pub fn list_slugs(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT slug FROM content_items ORDER BY slug")?;

        let slugs = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(slugs)
    }

    /// Update a content item's canonical body.
    pub fn update_content_body(&self, id: i64, body: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn
            .execute(
                "UPDATE content_items SET body = ?1 WHERE id = ?2",
                params![body, id],
            )
            .context("Failed to update content body")?;

        Ok(rows > 0)
    }

    /// Delete a content item, cascading to its translation set and any
    /// outstanding edit tokens.
    pub fn delete_content(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();

        conn.execute("DELETE FROM translations WHERE content_id = ?1", params![id])?;
        conn.execute("DELETE FROM edit_tokens WHERE content_id = ?1", params![id])?;
        let rows = conn
            .execute("DELETE FROM content_items WHERE id = ?1", params![id])
            .context("Failed to delete content item")?;

        Ok(rows > 0)
    }

    fn row_to_content(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContentItem> {
        Ok(ContentItem {
            id: row.get(0)?,
            slug: row.get(1)?,
            title: row.get(2)?,
            body: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    // ==================== Translation Sets ====================

    /// The stored translation set for a content item, or `None` if it
    /// has never been saved.
    pub fn get_translations(&self, content_id: i64) -> Result<Option<TranslationSet>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT data FROM translations WHERE content_id = ?1")?;

        let data: Option<String> = stmt
            .query_row(params![content_id], |row| row.get(0))
            .optional()?;

        match data {
            Some(json) => {
                let set = serde_json::from_str(&json)
                    .context("Failed to decode stored translation set")?;
                Ok(Some(set))
            }
            None => Ok(None),
        }
    }

    /// Replace a content item's translation set wholesale. A single
    /// upsert statement, so readers see either the old map or the new
    /// one, never a mix.
    pub fn put_translations(&self, content_id: i64, set: &TranslationSet) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let json = serde_json::to_string(set).context("Failed to encode translation set")?;

        conn.execute(
            "INSERT INTO translations (content_id, data) VALUES (?1, ?2)
             ON CONFLICT(content_id) DO UPDATE SET data = excluded.data",
            params![content_id, json],
        )
        .context("Failed to store translation set")?;

        Ok(())
    }

    // ==================== Edit Tokens ====================

    /// Issue a one-time token bound to an edit session on a content
    /// item. The token must accompany the next save of that item.
    /// Tokens from abandoned sessions do not accumulate: rows older
    /// than `ttl_secs` are purged before the new token is inserted.
    pub fn issue_edit_token(&self, content_id: i64, ttl_secs: i64) -> Result<String> {
        let conn = self.conn.lock().unwrap();
        let token = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let cutoff = (now - chrono::Duration::seconds(ttl_secs)).to_rfc3339();

        // RFC 3339 timestamps in UTC compare lexicographically.
        conn.execute(
            "DELETE FROM edit_tokens WHERE issued_at < ?1",
            params![cutoff],
        )
        .context("Failed to purge expired edit tokens")?;

        conn.execute(
            "INSERT INTO edit_tokens (token, content_id, issued_at) VALUES (?1, ?2, ?3)",
            params![token, content_id, now.to_rfc3339()],
        )
        .context("Failed to issue edit token")?;

        Ok(token)
    }

    /// Verify and consume an edit token. Returns `true` only if the
    /// token was issued for this content item, has not expired, and has
    /// not been used before; the token is deleted either way once seen,
    /// so a replayed token always fails.
    pub fn consume_edit_token(&self, content_id: i64, token: &str, ttl_secs: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT token, issued_at FROM edit_tokens WHERE content_id = ?1")?;

        let candidates = stmt
            .query_map(params![content_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut matched = false;
        for (stored, issued_at) in &candidates {
            if constant_time_compare(stored, token) {
                let fresh = chrono::DateTime::parse_from_rfc3339(issued_at)
                    .map(|t| Utc::now().signed_duration_since(t).num_seconds() <= ttl_secs)
                    .unwrap_or(false);
                matched = fresh;
                conn.execute("DELETE FROM edit_tokens WHERE token = ?1", params![stored])?;
                break;
            }
        }

        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ==================== Helper Functions ====================

    /// Create a temporary database for testing
    fn create_test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test_translations.db");
        let db = Database::new(db_path.to_str().unwrap()).expect("Failed to create database");
        (db, temp_dir)
    }

    fn sample_item(db: &Database) -> i64 {
        db.insert_content("my-post", "My Post", "<p>Hello</p>")
            .expect("insert content")
    }

    // ==================== Content Item Tests ====================

    #[test]
    fn test_insert_and_get_content() {
        let (db, _temp_dir) = create_test_db();
        let id = sample_item(&db);

        let item = db.get_content(id).expect("query").expect("item exists");
        assert_eq!(item.slug, "my-post");
        assert_eq!(item.title, "My Post");
        assert_eq!(item.body, "<p>Hello</p>");
    }

    #[test]
    fn test_get_content_missing() {
        let (db, _temp_dir) = create_test_db();
        assert!(db.get_content(999).expect("query").is_none());
    }

    #[test]
    fn test_get_content_by_slug() {
        let (db, _temp_dir) = create_test_db();
        let id = sample_item(&db);

        let item = db
            .get_content_by_slug("my-post")
            .expect("query")
            .expect("item exists");
        assert_eq!(item.id, id);

        assert!(db.get_content_by_slug("nope").expect("query").is_none());
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let (db, _temp_dir) = create_test_db();
        sample_item(&db);
        assert!(db.insert_content("my-post", "Again", "body").is_err());
    }

    #[test]
    fn test_list_slugs_sorted() {
        let (db, _temp_dir) = create_test_db();
        db.insert_content("zebra", "Z", "z").unwrap();
        db.insert_content("alpha", "A", "a").unwrap();

        assert_eq!(db.list_slugs().expect("query"), vec!["alpha", "zebra"]);
    }

    #[test]
    fn test_update_content_body() {
        let (db, _temp_dir) = create_test_db();
        let id = sample_item(&db);

        assert!(db.update_content_body(id, "<p>New</p>").expect("update"));
        let item = db.get_content(id).unwrap().unwrap();
        assert_eq!(item.body, "<p>New</p>");

        assert!(!db.update_content_body(999, "x").expect("update"));
    }

    // ==================== Translation Set Tests ====================

    #[test]
    fn test_get_translations_absent() {
        let (db, _temp_dir) = create_test_db();
        let id = sample_item(&db);
        assert!(db.get_translations(id).expect("query").is_none());
    }

    #[test]
    fn test_put_and_get_translations() {
        let (db, _temp_dir) = create_test_db();
        let id = sample_item(&db);

        let mut set = TranslationSet::new();
        set.insert("de", "<p>Hallo</p>");
        set.insert("fr", "<p>Bonjour</p>");
        db.put_translations(id, &set).expect("put");

        let stored = db.get_translations(id).expect("query").expect("present");
        assert_eq!(stored, set);
        assert_eq!(stored.get("de"), Some("<p>Hallo</p>"));
    }

    #[test]
    fn test_put_replaces_wholesale() {
        let (db, _temp_dir) = create_test_db();
        let id = sample_item(&db);

        let mut first = TranslationSet::new();
        first.insert("de", "<p>Hallo</p>");
        first.insert("fr", "<p>Bonjour</p>");
        db.put_translations(id, &first).expect("put");

        // An omitted language becomes absent, not preserved.
        let mut second = TranslationSet::new();
        second.insert("de", "<p>Moin</p>");
        db.put_translations(id, &second).expect("put");

        let stored = db.get_translations(id).unwrap().unwrap();
        assert_eq!(stored.get("de"), Some("<p>Moin</p>"));
        assert_eq!(stored.get("fr"), None);
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn test_put_empty_set() {
        let (db, _temp_dir) = create_test_db();
        let id = sample_item(&db);

        db.put_translations(id, &TranslationSet::new()).expect("put");
        let stored = db.get_translations(id).unwrap().unwrap();
        assert!(stored.is_empty());
    }

    #[test]
    fn test_delete_content_cascades() {
        let (db, _temp_dir) = create_test_db();
        let id = sample_item(&db);

        let mut set = TranslationSet::new();
        set.insert("de", "<p>Hallo</p>");
        db.put_translations(id, &set).unwrap();
        db.issue_edit_token(id, 900).unwrap();

        assert!(db.delete_content(id).expect("delete"));
        assert!(db.get_content(id).unwrap().is_none());
        assert!(db.get_translations(id).unwrap().is_none());
    }

    // ==================== Edit Token Tests ====================

    #[test]
    fn test_token_single_use() {
        let (db, _temp_dir) = create_test_db();
        let id = sample_item(&db);

        let token = db.issue_edit_token(id, 3600).expect("issue");
        assert!(db.consume_edit_token(id, &token, 3600).expect("consume"));
        // Replay fails: the token was deleted on first use.
        assert!(!db.consume_edit_token(id, &token, 3600).expect("consume"));
    }

    #[test]
    fn test_token_wrong_value() {
        let (db, _temp_dir) = create_test_db();
        let id = sample_item(&db);

        let _token = db.issue_edit_token(id, 3600).expect("issue");
        assert!(!db
            .consume_edit_token(id, "not-the-token", 3600)
            .expect("consume"));
    }

    #[test]
    fn test_token_bound_to_content_item() {
        let (db, _temp_dir) = create_test_db();
        let id = sample_item(&db);
        let other = db.insert_content("other", "Other", "o").unwrap();

        let token = db.issue_edit_token(id, 3600).expect("issue");
        assert!(!db.consume_edit_token(other, &token, 3600).expect("consume"));
        // Still valid for the item it was issued for.
        assert!(db.consume_edit_token(id, &token, 3600).expect("consume"));
    }

    #[test]
    fn test_expired_tokens_purged_on_issue() {
        let (db, _temp_dir) = create_test_db();
        let id = sample_item(&db);

        // Plant a token from an abandoned session, issued well past
        // any reasonable TTL.
        let stale_issued_at = (Utc::now() - chrono::Duration::seconds(3600)).to_rfc3339();
        db.conn
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO edit_tokens (token, content_id, issued_at) VALUES (?1, ?2, ?3)",
                params!["stale-token", id, stale_issued_at],
            )
            .expect("insert stale token");

        let fresh = db.issue_edit_token(id, 900).expect("issue");

        // The abandoned row is gone, not just unusable.
        let stale_rows: i64 = db
            .conn
            .lock()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM edit_tokens WHERE token = 'stale-token'",
                [],
                |row| row.get(0),
            )
            .expect("count");
        assert_eq!(stale_rows, 0);

        // The fresh token is unaffected by the purge.
        assert!(db.consume_edit_token(id, &fresh, 900).expect("consume"));
    }

    #[test]
    fn test_unexpired_tokens_survive_issue() {
        let (db, _temp_dir) = create_test_db();
        let id = sample_item(&db);

        let first = db.issue_edit_token(id, 900).expect("issue");
        let _second = db.issue_edit_token(id, 900).expect("issue");

        // Issuing again within the TTL does not purge live sessions.
        assert!(db.consume_edit_token(id, &first, 900).expect("consume"));
    }

    #[test]
    fn test_token_expiry() {
        let (db, _temp_dir) = create_test_db();
        let id = sample_item(&db);

        let token = db.issue_edit_token(id, 3600).expect("issue");
        // A zero-second TTL has already elapsed by the time we check.
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert!(!db.consume_edit_token(id, &token, 0).expect("consume"));
    }

    // ==================== TranslationSet Type Tests ====================

    #[test]
    fn test_translation_set_json_shape() {
        let mut set = TranslationSet::new();
        set.insert("de", "<p>Hallo</p>");
        set.insert("fr", "");

        let json = serde_json::to_string(&set).expect("serialize");
        assert_eq!(json, r#"{"de":"<p>Hallo</p>","fr":""}"#);

        let back: TranslationSet = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, set);
    }

    #[test]
    fn test_translation_set_from_iter() {
        let set: TranslationSet = vec![("de".to_string(), "Hallo".to_string())]
            .into_iter()
            .collect();
        assert_eq!(set.get("de"), Some("Hallo"));
        assert_eq!(set.len(), 1);
    }
}
