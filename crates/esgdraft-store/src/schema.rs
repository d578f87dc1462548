//! Database schema SQL.

/// Core tables: drafts, inputs, chunks.
///
/// `(topic, company)` uniquely identifies at most one drafts row and one
/// inputs row; upserts rely on the unique indexes.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS drafts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    topic TEXT NOT NULL,
    company TEXT NOT NULL,
    draft TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'empty',
    updated_at TEXT NOT NULL,
    UNIQUE(topic, company)
);

CREATE TABLE IF NOT EXISTS inputs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    topic TEXT NOT NULL,
    company TEXT NOT NULL,
    inputs_json TEXT NOT NULL DEFAULT '{}',
    table_json TEXT NOT NULL DEFAULT '{}',
    improvement TEXT NOT NULL DEFAULT '',
    updated_at TEXT NOT NULL,
    UNIQUE(topic, company)
);

CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    corpus TEXT NOT NULL,
    title TEXT NOT NULL,
    chunk_id TEXT NOT NULL,
    content TEXT NOT NULL,
    pages_json TEXT,
    content_hash TEXT UNIQUE,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_corpus_title ON chunks(corpus, title);
CREATE INDEX IF NOT EXISTS idx_chunks_hash ON chunks(content_hash);
"#;

/// FTS5 virtual table for full-text chunk search.
pub const FTS_SCHEMA_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(
    content,
    content='chunks', content_rowid='id',
    tokenize='unicode61'
);
"#;

/// Triggers to keep the FTS index in sync with the chunks table.
pub const FTS_TRIGGERS_SQL: &str = r#"
CREATE TRIGGER IF NOT EXISTS chunks_ai AFTER INSERT ON chunks BEGIN
    INSERT INTO chunks_fts(rowid, content) VALUES (new.id, new.content);
END;

CREATE TRIGGER IF NOT EXISTS chunks_ad AFTER DELETE ON chunks BEGIN
    INSERT INTO chunks_fts(chunks_fts, rowid, content)
    VALUES ('delete', old.id, old.content);
END;

CREATE TRIGGER IF NOT EXISTS chunks_au AFTER UPDATE ON chunks BEGIN
    INSERT INTO chunks_fts(chunks_fts, rowid, content)
    VALUES ('delete', old.id, old.content);
    INSERT INTO chunks_fts(rowid, content) VALUES (new.id, new.content);
END;
"#;
