//! Corpus import — loads an extracted chunk file into the store.
//!
//! The extraction tooling emits a JSON array of chunk records per corpus;
//! `esgdraft import <file> [corpus]` inserts them, skipping rows already
//! present (by content hash).

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use esgdraft_core::{Error, Result};
use esgdraft_store::SqliteStore;

#[derive(Debug, Deserialize)]
struct ImportChunk {
    title: String,
    #[serde(rename = "chunk_id", alias = "chunkId")]
    chunk_id: String,
    #[serde(alias = "chunk")]
    content: String,
    #[serde(default)]
    pages: Option<serde_json::Value>,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub duplicates: usize,
    pub failed: usize,
}

/// Import all chunks from `path` into `corpus`.
pub fn run_import(store: &SqliteStore, path: &Path, corpus: &str) -> Result<ImportReport> {
    let raw = std::fs::read_to_string(path)?;
    let chunks: Vec<ImportChunk> = serde_json::from_str(&raw)?;

    let mut report = ImportReport::default();
    for chunk in &chunks {
        match store.add_chunk(
            corpus,
            &chunk.title,
            &chunk.chunk_id,
            &chunk.content,
            chunk.pages.as_ref(),
        ) {
            Ok(_) => report.imported += 1,
            Err(Error::DuplicateContent(_)) => report.duplicates += 1,
            Err(e) => {
                warn!("chunk {} failed to import: {}", chunk.chunk_id, e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

pub fn print_report(corpus: &str, report: &ImportReport) {
    println!("Corpus import: {}", corpus);
    println!("  imported:   {}", report.imported);
    println!("  duplicates: {}", report.duplicates);
    println!("  failed:     {}", report.failed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_skips_duplicates_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("db")).unwrap();

        let file = dir.path().join("chunks.json");
        std::fs::write(
            &file,
            serde_json::json!([
                {"title": "KBZ-EN11 생물다양성", "chunk_id": "0001", "chunk": "본문 첫 청크", "pages": [12]},
                {"title": "KBZ-EN11 생물다양성", "chunkId": "0002", "content": "본문 둘째 청크", "pages": "[13]"}
            ])
            .to_string(),
        )
        .unwrap();

        let report = run_import(&store, &file, "esg_manual").unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.duplicates, 0);

        let rerun = run_import(&store, &file, "esg_manual").unwrap();
        assert_eq!(rerun.imported, 0);
        assert_eq!(rerun.duplicates, 2);

        let chunks = store.chunks_by_topic("esg_manual", "KBZ-EN11").unwrap();
        assert_eq!(chunks.len(), 2);
    }
}
