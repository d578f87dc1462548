//! Topic-filtered chunk retrieval with page-set assembly.
//!
//! Page metadata in extracted corpora is not uniform: a chunk may carry an
//! int, an array of ints, or a stringified list. All forms are tolerated;
//! unparseable values are logged and skipped.

use std::collections::BTreeSet;

use tracing::warn;

use esgdraft_core::Result;
use esgdraft_store::{ChunkRecord, SqliteStore};

/// Ordered chunks for a topic plus the union of their page numbers.
#[derive(Debug, Clone)]
pub struct GuidanceFetch {
    pub chunks: Vec<ChunkRecord>,
    pub pages: Vec<u32>,
}

/// Fetch guidance chunks whose title mentions `topic`, ordered by chunk id.
pub fn fetch_topic_guidance(
    store: &SqliteStore,
    corpus: &str,
    topic: &str,
) -> Result<GuidanceFetch> {
    let chunks = store.chunks_by_topic(corpus, topic)?;
    let pages = collect_pages(&chunks);
    Ok(GuidanceFetch { chunks, pages })
}

/// Fetch template chunks whose title equals `topic` exactly.
pub fn fetch_template_guidance(
    store: &SqliteStore,
    corpus: &str,
    topic: &str,
) -> Result<GuidanceFetch> {
    let chunks = store.chunks_by_exact_title(corpus, topic)?;
    let pages = collect_pages(&chunks);
    Ok(GuidanceFetch { chunks, pages })
}

fn collect_pages(chunks: &[ChunkRecord]) -> Vec<u32> {
    let mut pages = BTreeSet::new();
    for chunk in chunks {
        if let Some(value) = &chunk.pages {
            parse_pages(value, &mut pages);
        }
    }
    pages.into_iter().collect()
}

/// Accept int, array-of-int (or numeric strings), or a stringified list.
pub fn parse_pages(value: &serde_json::Value, out: &mut BTreeSet<u32>) {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(page) = n.as_u64() {
                out.insert(page as u32);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                parse_pages(item, out);
            }
        }
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('[') {
                match serde_json::from_str::<serde_json::Value>(trimmed) {
                    Ok(parsed) => parse_pages(&parsed, out),
                    Err(e) => warn!("unparseable pages metadata {:?}: {}", s, e),
                }
            } else if let Ok(page) = trimmed.parse::<u32>() {
                out.insert(page);
            } else {
                warn!("unparseable pages metadata {:?}", s);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages_of(value: serde_json::Value) -> Vec<u32> {
        let mut out = BTreeSet::new();
        parse_pages(&value, &mut out);
        out.into_iter().collect()
    }

    #[test]
    fn pages_from_int() {
        assert_eq!(pages_of(serde_json::json!(12)), vec![12]);
    }

    #[test]
    fn pages_from_array() {
        assert_eq!(pages_of(serde_json::json!([14, 12, 12])), vec![12, 14]);
    }

    #[test]
    fn pages_from_stringified_list() {
        assert_eq!(pages_of(serde_json::json!("[12, 13]")), vec![12, 13]);
        assert_eq!(pages_of(serde_json::json!("7")), vec![7]);
    }

    #[test]
    fn garbage_pages_skipped() {
        assert!(pages_of(serde_json::json!("not pages")).is_empty());
        assert!(pages_of(serde_json::json!(null)).is_empty());
    }

    #[test]
    fn fetch_unions_pages_across_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path()).unwrap();

        store
            .add_chunk(
                "esg_manual",
                "KBZ-EN11 생물다양성",
                "0001",
                "첫 청크",
                Some(&serde_json::json!([12, 13])),
            )
            .unwrap();
        store
            .add_chunk(
                "esg_manual",
                "KBZ-EN11 생물다양성",
                "0002",
                "둘째 청크",
                Some(&serde_json::json!("[13, 15]")),
            )
            .unwrap();

        let fetch = fetch_topic_guidance(&store, "esg_manual", "KBZ-EN11").unwrap();
        assert_eq!(fetch.chunks.len(), 2);
        assert_eq!(fetch.pages, vec![12, 13, 15]);
    }
}
