//! Field deduplication and table-marker insertion pipeline.
//!
//! Normalizes and compares free-text field names against table column names,
//! and aligns generated narrative text with pre-extracted HTML tables by
//! similarity-based paragraph placement.

pub mod dedup;
pub mod fields;
pub mod inputs;
pub mod markers;
pub mod normalize;
pub mod similarity;
pub mod types;

pub use dedup::{remove_duplicates, DedupPolicy};
pub use fields::{extract_field_names, extract_guidance_block, parse_markdown_fields, FieldCandidate};
pub use inputs::{format_inputs, format_user_tables, ImageRef, InputValue, TableGrid};
pub use markers::{marker_token, place_markers};
pub use normalize::normalize;
pub use similarity::{is_redundant, is_similar, similarity_ratio, DEFAULT_THRESHOLD};
pub use types::TableRecord;
