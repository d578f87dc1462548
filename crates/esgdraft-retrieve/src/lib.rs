//! Retrieval layer: topic-filtered guidance chunks and extracted tables.

pub mod chunks;
pub mod tables;

pub use chunks::{fetch_template_guidance, fetch_topic_guidance, parse_pages, GuidanceFetch};
pub use tables::{clean_table_html, TableLibrary};
