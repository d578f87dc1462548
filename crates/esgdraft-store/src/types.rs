//! Store record types.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    Empty,
    Saved,
    Completed,
}

impl DraftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Empty => "empty",
            DraftStatus::Saved => "saved",
            DraftStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => DraftStatus::Completed,
            "saved" => DraftStatus::Saved,
            _ => DraftStatus::Empty,
        }
    }
}

/// A persisted narrative draft for one (topic, company) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRecord {
    pub topic: String,
    pub company: String,
    pub draft: String,
    pub status: DraftStatus,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// A persisted input snapshot for one (topic, company) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputRecord {
    pub topic: String,
    pub company: String,
    pub inputs: serde_json::Value,
    pub table: serde_json::Value,
    pub improvement: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// One guidance chunk from an extracted corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: i64,
    pub corpus: String,
    pub title: String,
    #[serde(rename = "chunkId")]
    pub chunk_id: String,
    pub content: String,
    /// Page metadata as stored: int, array of ints, or a stringified list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<serde_json::Value>,
}

/// A full-text search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: i64,
    pub title: String,
    #[serde(rename = "chunkId")]
    pub chunk_id: String,
    pub content: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<serde_json::Value>,
}

/// Store counters for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub drafts: i64,
    pub inputs: i64,
    pub chunks: i64,
    #[serde(rename = "dbPath")]
    pub db_path: String,
}
