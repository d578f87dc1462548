//! SQLite store for drafts, input snapshots and guidance chunks.
//!
//! One connection behind a mutex, WAL journaling, FTS5 for chunk search.
//! Draft and input rows are keyed `(topic, company)` with upsert semantics.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::schema::{FTS_SCHEMA_SQL, FTS_TRIGGERS_SQL, SCHEMA_SQL};
use crate::types::*;
use esgdraft_core::{Error, Result};

/// SQLite-backed document store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create the store. `db_dir` is the directory; the file is
    /// `db_dir/esgdraft.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("esgdraft.db");

        let conn = Self::create_connection(&db_path)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let stats = store.get_stats()?;
        info!(
            "SqliteStore initialized: {} drafts, {} input snapshots, {} chunks, path={}",
            stats.drafts,
            stats.inputs,
            stats.chunks,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        let full_schema = format!("{}\n{}\n{}", SCHEMA_SQL, FTS_SCHEMA_SQL, FTS_TRIGGERS_SQL);
        conn.execute_batch(&full_schema)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }

    // ---------------------------------------------------------------
    // Drafts
    // ---------------------------------------------------------------

    /// Insert or overwrite the draft text for `(topic, company)`. The status
    /// of an existing row is left untouched.
    pub fn upsert_draft(&self, topic: &str, company: &str, draft: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO drafts (topic, company, draft, status, updated_at) \
             VALUES (?1, ?2, ?3, 'empty', ?4) \
             ON CONFLICT(topic, company) DO UPDATE SET \
                 draft = excluded.draft, updated_at = excluded.updated_at",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![topic, company, draft, Self::now()])
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    /// Load the draft text for `(topic, company)`.
    pub fn load_draft(&self, topic: &str, company: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let draft = conn
            .prepare_cached("SELECT draft FROM drafts WHERE topic = ?1 AND company = ?2")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![topic, company], |row| row.get(0))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(draft)
    }

    /// Delete the draft row. Returns false when no row existed.
    pub fn delete_draft(&self, topic: &str, company: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "DELETE FROM drafts WHERE topic = ?1 AND company = ?2",
                params![topic, company],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Set the lifecycle status, creating the row when absent.
    pub fn set_draft_status(&self, topic: &str, company: &str, status: DraftStatus) -> Result<()> {
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO drafts (topic, company, draft, status, updated_at) \
             VALUES (?1, ?2, '', ?3, ?4) \
             ON CONFLICT(topic, company) DO UPDATE SET \
                 status = excluded.status, updated_at = excluded.updated_at",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![topic, company, status.as_str(), Self::now()])
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    /// Effective status per topic for one company.
    ///
    /// A completed status wins; a saved status or non-empty draft reads as
    /// saved; otherwise an input snapshot with any content reads as saved;
    /// everything else is empty.
    pub fn draft_statuses(&self, company: &str) -> Result<BTreeMap<String, DraftStatus>> {
        let mut statuses = BTreeMap::new();
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare_cached("SELECT topic, status, draft FROM drafts WHERE company = ?1")
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![company], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| Error::Database(e.to_string()))?;

        for row in rows.filter_map(|r| r.ok()) {
            let (topic, status, draft) = row;
            let effective = match DraftStatus::parse(&status) {
                DraftStatus::Completed => DraftStatus::Completed,
                DraftStatus::Saved => DraftStatus::Saved,
                DraftStatus::Empty if !draft.is_empty() => DraftStatus::Saved,
                DraftStatus::Empty => DraftStatus::Empty,
            };
            statuses.insert(topic, effective);
        }

        let mut stmt = conn
            .prepare_cached(
                "SELECT topic, inputs_json, table_json, improvement FROM inputs \
                 WHERE company = ?1",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![company], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| Error::Database(e.to_string()))?;

        for row in rows.filter_map(|r| r.ok()) {
            let (topic, inputs_json, table_json, improvement) = row;
            let has_content = inputs_json != "{}" || table_json != "{}" || !improvement.is_empty();
            if !has_content {
                continue;
            }
            let entry = statuses.entry(topic).or_insert(DraftStatus::Empty);
            if *entry == DraftStatus::Empty {
                *entry = DraftStatus::Saved;
            }
        }

        Ok(statuses)
    }

    // ---------------------------------------------------------------
    // Input snapshots
    // ---------------------------------------------------------------

    /// Insert or overwrite the input snapshot for `(topic, company)`.
    pub fn upsert_inputs(
        &self,
        topic: &str,
        company: &str,
        inputs: &serde_json::Value,
        table: &serde_json::Value,
        improvement: &str,
    ) -> Result<()> {
        let inputs_json = serde_json::to_string(inputs)?;
        let table_json = serde_json::to_string(table)?;

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO inputs (topic, company, inputs_json, table_json, improvement, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(topic, company) DO UPDATE SET \
                 inputs_json = excluded.inputs_json, \
                 table_json = excluded.table_json, \
                 improvement = excluded.improvement, \
                 updated_at = excluded.updated_at",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![topic, company, inputs_json, table_json, improvement, Self::now()])
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    /// Load the input snapshot for `(topic, company)`.
    pub fn load_inputs(&self, topic: &str, company: &str) -> Result<Option<InputRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .prepare_cached(
                "SELECT inputs_json, table_json, improvement, updated_at FROM inputs \
                 WHERE topic = ?1 AND company = ?2",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![topic, company], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(record.map(|(inputs_json, table_json, improvement, updated_at)| InputRecord {
            topic: topic.to_string(),
            company: company.to_string(),
            inputs: serde_json::from_str(&inputs_json).unwrap_or_default(),
            table: serde_json::from_str(&table_json).unwrap_or_default(),
            improvement,
            updated_at,
        }))
    }

    // ---------------------------------------------------------------
    // Guidance chunks
    // ---------------------------------------------------------------

    /// Insert a chunk. Duplicate content (same corpus, chunk id and text)
    /// yields `Error::DuplicateContent`.
    pub fn add_chunk(
        &self,
        corpus: &str,
        title: &str,
        chunk_id: &str,
        content: &str,
        pages: Option<&serde_json::Value>,
    ) -> Result<i64> {
        let mut hasher = Sha256::new();
        hasher.update(corpus.as_bytes());
        hasher.update(chunk_id.as_bytes());
        hasher.update(content.as_bytes());
        let content_hash = hex::encode(hasher.finalize());

        let pages_json = pages.map(|p| serde_json::to_string(p)).transpose()?;

        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO chunks (corpus, title, chunk_id, content, pages_json, content_hash, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![corpus, title, chunk_id, content, pages_json, content_hash, Self::now()])
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint") {
                    Error::DuplicateContent(content_hash.clone())
                } else {
                    Error::Database(e.to_string())
                }
            })?;
        Ok(id)
    }

    /// Chunks whose title contains `topic`, ordered by chunk id.
    pub fn chunks_by_topic(&self, corpus: &str, topic: &str) -> Result<Vec<ChunkRecord>> {
        self.query_chunks(
            "SELECT id, corpus, title, chunk_id, content, pages_json FROM chunks \
             WHERE corpus = ?1 AND instr(title, ?2) > 0 ORDER BY chunk_id",
            corpus,
            topic,
        )
    }

    /// Chunks whose title equals `title` exactly, ordered by chunk id.
    pub fn chunks_by_exact_title(&self, corpus: &str, title: &str) -> Result<Vec<ChunkRecord>> {
        self.query_chunks(
            "SELECT id, corpus, title, chunk_id, content, pages_json FROM chunks \
             WHERE corpus = ?1 AND title = ?2 ORDER BY chunk_id",
            corpus,
            title,
        )
    }

    fn query_chunks(&self, sql: &str, corpus: &str, title: &str) -> Result<Vec<ChunkRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(sql).map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![corpus, title], |row| {
                Ok(ChunkRecord {
                    id: row.get(0)?,
                    corpus: row.get(1)?,
                    title: row.get(2)?,
                    chunk_id: row.get(3)?,
                    content: row.get(4)?,
                    pages: row
                        .get::<_, Option<String>>(5)?
                        .and_then(|s| serde_json::from_str(&s).ok()),
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Full-text chunk search within one corpus, BM25 ranked.
    pub fn search_chunks(&self, corpus: &str, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let fts_query = Self::sanitize_fts_query(query);
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        let sql = "SELECT c.id, c.title, c.chunk_id, c.content, c.pages_json, \
                          chunks_fts.rank AS bm25_score \
                   FROM chunks_fts \
                   JOIN chunks c ON c.id = chunks_fts.rowid \
                   WHERE chunks_fts MATCH ?1 AND c.corpus = ?2 \
                   ORDER BY chunks_fts.rank \
                   LIMIT ?3";

        let mut stmt = conn.prepare_cached(sql).map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![fts_query, corpus, limit as i64], |row| {
                let bm25_score: f64 = row.get("bm25_score").unwrap_or(0.0);
                Ok(SearchHit {
                    id: row.get("id")?,
                    title: row.get("title")?,
                    chunk_id: row.get("chunk_id")?,
                    content: row.get("content")?,
                    // FTS5 rank is negative; negate for a positive score.
                    score: -bm25_score,
                    pages: row
                        .get::<_, Option<String>>("pages_json")?
                        .and_then(|s| serde_json::from_str(&s).ok()),
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Sanitize a user query for FTS5 MATCH syntax.
    /// Wraps each token in double quotes and joins with OR.
    fn sanitize_fts_query(query: &str) -> String {
        let tokens: Vec<String> = query
            .split_whitespace()
            .filter(|t| !t.is_empty())
            .map(|t| format!("\"{}\"", t.replace('"', "")))
            .collect();
        if tokens.is_empty() {
            return String::new();
        }
        tokens.join(" OR ")
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    pub fn get_stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock();
        let count = |sql: &str| -> Result<i64> {
            conn.query_row(sql, [], |row| row.get(0))
                .map_err(|e| Error::Database(e.to_string()))
        };

        Ok(StoreStats {
            drafts: count("SELECT COUNT(*) FROM drafts")?,
            inputs: count("SELECT COUNT(*) FROM inputs")?,
            chunks: count("SELECT COUNT(*) FROM chunks")?,
            db_path: self.db_path.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn draft_upsert_overwrites() {
        let (store, _dir) = test_store();
        store.upsert_draft("KBZ-EN11", "파나시아", "첫 초안").unwrap();
        store.upsert_draft("KBZ-EN11", "파나시아", "수정 초안").unwrap();

        assert_eq!(
            store.load_draft("KBZ-EN11", "파나시아").unwrap().as_deref(),
            Some("수정 초안")
        );
    }

    #[test]
    fn draft_key_is_topic_and_company() {
        let (store, _dir) = test_store();
        store.upsert_draft("KBZ-EN11", "회사A", "A의 초안").unwrap();
        store.upsert_draft("KBZ-EN11", "회사B", "B의 초안").unwrap();

        assert_eq!(
            store.load_draft("KBZ-EN11", "회사A").unwrap().as_deref(),
            Some("A의 초안")
        );
        assert_eq!(
            store.load_draft("KBZ-EN11", "회사B").unwrap().as_deref(),
            Some("B의 초안")
        );
    }

    #[test]
    fn delete_draft_reports_absence() {
        let (store, _dir) = test_store();
        assert!(!store.delete_draft("KBZ-EN11", "회사").unwrap());

        store.upsert_draft("KBZ-EN11", "회사", "초안").unwrap();
        assert!(store.delete_draft("KBZ-EN11", "회사").unwrap());
        assert!(store.load_draft("KBZ-EN11", "회사").unwrap().is_none());
    }

    #[test]
    fn status_precedence() {
        let (store, _dir) = test_store();

        // Non-empty draft without explicit status reads as saved.
        store.upsert_draft("T1", "회사", "초안 내용").unwrap();
        // Explicit completed wins over draft content.
        store.upsert_draft("T2", "회사", "완료된 초안").unwrap();
        store.set_draft_status("T2", "회사", DraftStatus::Completed).unwrap();
        // Row with empty draft and no inputs is empty.
        store.set_draft_status("T3", "회사", DraftStatus::Empty).unwrap();
        // Inputs-only topic reads as saved.
        store
            .upsert_inputs(
                "T4",
                "회사",
                &serde_json::json!({"항목": "값"}),
                &serde_json::json!({}),
                "",
            )
            .unwrap();

        let statuses = store.draft_statuses("회사").unwrap();
        assert_eq!(statuses["T1"], DraftStatus::Saved);
        assert_eq!(statuses["T2"], DraftStatus::Completed);
        assert_eq!(statuses["T3"], DraftStatus::Empty);
        assert_eq!(statuses["T4"], DraftStatus::Saved);
    }

    #[test]
    fn inputs_roundtrip() {
        let (store, _dir) = test_store();
        let inputs = serde_json::json!({"보호종명": "수달"});
        let table = serde_json::json!({"page1_table0_r0_c0": "구분"});

        store.upsert_inputs("KBZ-EN11", "회사", &inputs, &table, "서식지 복원 활동").unwrap();

        let record = store.load_inputs("KBZ-EN11", "회사").unwrap().unwrap();
        assert_eq!(record.inputs, inputs);
        assert_eq!(record.table, table);
        assert_eq!(record.improvement, "서식지 복원 활동");

        assert!(store.load_inputs("KBZ-EN11", "다른회사").unwrap().is_none());
    }

    #[test]
    fn chunk_dedup_by_hash() {
        let (store, _dir) = test_store();
        store
            .add_chunk("esg_manual", "KBZ-EN11 생물다양성", "0001", "본문", None)
            .unwrap();
        let err = store
            .add_chunk("esg_manual", "KBZ-EN11 생물다양성", "0001", "본문", None)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateContent(_)));
    }

    #[test]
    fn chunks_by_topic_ordered() {
        let (store, _dir) = test_store();
        store
            .add_chunk("esg_manual", "KBZ-EN11 생물다양성", "0002", "둘째", None)
            .unwrap();
        store
            .add_chunk("esg_manual", "KBZ-EN11 생물다양성", "0001", "첫째", None)
            .unwrap();
        store
            .add_chunk("esg_manual", "KBZ-SO01 산업안전", "0001", "무관", None)
            .unwrap();

        let chunks = store.chunks_by_topic("esg_manual", "KBZ-EN11").unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chunk_id, "0001");
        assert_eq!(chunks[1].chunk_id, "0002");
    }

    #[test]
    fn search_scoped_to_corpus() {
        let (store, _dir) = test_store();
        store
            .add_chunk("esg_manual", "에너지", "0001", "energy consumption guidance", None)
            .unwrap();
        store
            .add_chunk("gri_standards", "GRI 302", "0001", "energy consumption standard", None)
            .unwrap();

        let hits = store.search_chunks("esg_manual", "energy", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "에너지");
        assert!(hits[0].score > 0.0);
    }
}
