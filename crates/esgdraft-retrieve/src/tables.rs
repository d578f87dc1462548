//! Extracted-table loading by page number.
//!
//! Tables live as standalone HTML fragments named `page{N}_table*.html`,
//! each holding one `<table>` optionally preceded by an `<h3>` title.
//! Malformed fragments are skipped, never fatal.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use esgdraft_pipeline::TableRecord;

static TABLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static H3_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").unwrap());

/// A directory of extracted table fragments.
#[derive(Debug, Clone)]
pub struct TableLibrary {
    root: PathBuf,
}

impl TableLibrary {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Load all table fragments for the given pages, in page order.
    pub fn tables_for_pages(&self, pages: &[u32]) -> Vec<TableRecord> {
        let mut tables = Vec::new();
        for &page in pages {
            tables.extend(self.tables_for_page(page));
        }
        tables
    }

    /// Load table fragments matching `page{N}_table*.html`, sorted by path.
    pub fn tables_for_page(&self, page: u32) -> Vec<TableRecord> {
        let prefix = format!("page{}_table", page);

        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("table directory {} unreadable: {}", self.root.display(), e);
                return Vec::new();
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|name| name.starts_with(&prefix) && name.ends_with(".html"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        paths
            .into_iter()
            .filter_map(|path| parse_fragment(&path, page))
            .collect()
    }
}

/// Parse one fragment file into a record. Returns None on read failure or
/// when the fragment carries no `<table>`.
fn parse_fragment(path: &Path, page: u32) -> Option<TableRecord> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("table fragment {} unreadable: {}", path.display(), e);
            return None;
        }
    };

    let fragment = Html::parse_fragment(&raw);
    let Some(table) = fragment.select(&TABLE_SEL).next() else {
        debug!("no <table> in fragment {}", path.display());
        return None;
    };

    Some(TableRecord {
        html: table.html(),
        text: fragment_text(&fragment),
        source_path: path.display().to_string(),
        page,
    })
}

/// Plain-text rendering: trimmed text nodes joined by newlines.
fn fragment_text(fragment: &Html) -> String {
    fragment
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reduce a fragment to its `<h3>` title plus `<table>` markup, the display
/// form used by the chat route. Returns None unless both are present.
pub fn clean_table_html(raw: &str) -> Option<String> {
    let fragment = Html::parse_fragment(raw);
    let h3 = fragment.select(&H3_SEL).next()?;
    let table = fragment.select(&TABLE_SEL).next()?;
    Some(format!("{}\n{}", h3.html(), table.html()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fragment(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn loads_tables_in_page_and_path_order() {
        let dir = tempfile::tempdir().unwrap();
        write_fragment(
            dir.path(),
            "page3_table0.html",
            "<h3>표 제목</h3><table><tr><td>3-0</td></tr></table>",
        );
        write_fragment(
            dir.path(),
            "page3_table1.html",
            "<table><tr><td>3-1</td></tr></table>",
        );
        write_fragment(
            dir.path(),
            "page1_table0.html",
            "<table><tr><td>1-0</td></tr></table>",
        );
        // Different page, must not be picked up.
        write_fragment(
            dir.path(),
            "page31_table0.html",
            "<table><tr><td>31-0</td></tr></table>",
        );

        let library = TableLibrary::new(dir.path());
        let tables = library.tables_for_pages(&[1, 3]);

        assert_eq!(tables.len(), 3);
        assert!(tables[0].html.contains("1-0"));
        assert!(tables[1].html.contains("3-0"));
        assert!(tables[2].html.contains("3-1"));
        assert_eq!(tables[0].page, 1);
        assert_eq!(tables[1].page, 3);
    }

    #[test]
    fn fragment_without_table_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_fragment(dir.path(), "page1_table0.html", "<p>no table</p>");
        write_fragment(
            dir.path(),
            "page1_table1.html",
            "<table><tr><td>ok</td></tr></table>",
        );

        let library = TableLibrary::new(dir.path());
        let tables = library.tables_for_page(1);
        assert_eq!(tables.len(), 1);
        assert!(tables[0].html.contains("ok"));
    }

    #[test]
    fn plain_text_rendering_joined_by_newlines() {
        let dir = tempfile::tempdir().unwrap();
        write_fragment(
            dir.path(),
            "page1_table0.html",
            "<h3>배출량</h3><table><tr><td>구분</td><td>2023</td></tr></table>",
        );

        let library = TableLibrary::new(dir.path());
        let tables = library.tables_for_page(1);
        assert_eq!(tables[0].text, "배출량\n구분\n2023");
    }

    #[test]
    fn missing_directory_is_not_fatal() {
        let library = TableLibrary::new("/nonexistent/tables");
        assert!(library.tables_for_page(1).is_empty());
    }

    #[test]
    fn clean_table_requires_title_and_table() {
        let cleaned =
            clean_table_html("<h3>제목</h3><table><tr><td>값</td></tr></table>").unwrap();
        assert!(cleaned.starts_with("<h3>"));
        assert!(cleaned.contains("<table>"));

        assert!(clean_table_html("<table><tr><td>값</td></tr></table>").is_none());
        assert!(clean_table_html("<h3>제목만</h3>").is_none());
    }
}
