//! Shared pipeline records.

use serde::{Deserialize, Serialize};

/// A table extracted from a guidance PDF page, addressed by page number.
///
/// Immutable once loaded; owned by a single request-scoped pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRecord {
    /// The `<table>` markup (with a preceding `<h3>` title when present).
    pub html: String,
    /// Newline-joined plain-text rendering of the fragment.
    pub text: String,
    /// Path of the source fragment file.
    #[serde(rename = "sourcePath")]
    pub source_path: String,
    /// Page number the table was extracted from.
    pub page: u32,
}
