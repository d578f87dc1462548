//! User-input payloads: tagged values and the flattened table grid.
//!
//! The frontend sends free-form JSON per field; deserialization resolves it
//! into an explicit variant so prompt rendering is exhaustive instead of
//! shape-probing. Flattened table-cell keys are rebuilt into a sparse grid
//! iterated in sorted (row, col) order.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static CELL_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^page\d+_table\d+_r(\d+)_c(\d+)$").unwrap());

/// An image reference with optional caption data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// One user-provided input value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    /// Plain text answer.
    Text(String),
    /// A single image reference.
    Image(ImageRef),
    /// A list of captioned images (the "관련 이미지" array).
    Images(Vec<ImageRef>),
    /// Year-keyed values; 4-digit year keys sort chronologically.
    YearSeries(BTreeMap<String, String>),
}

/// Sparse table built from flattened `page{p}_table{t}_r{r}_c{c}` cell keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableGrid {
    cells: BTreeMap<(u32, u32), String>,
}

impl TableGrid {
    /// Rebuild the grid from flattened cell keys. Keys that do not match the
    /// cell pattern are ignored.
    pub fn from_flat_keys(cells: &BTreeMap<String, String>) -> Self {
        let mut grid = Self::default();
        for (key, value) in cells {
            if let Some(caps) = CELL_KEY_RE.captures(key) {
                let row: u32 = caps[1].parse().unwrap_or(0);
                let col: u32 = caps[2].parse().unwrap_or(0);
                grid.cells.insert((row, col), value.trim().to_string());
            }
        }
        grid
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Render as table markup in sorted (row, col) order.
    pub fn to_html(&self) -> String {
        if self.cells.is_empty() {
            return String::new();
        }

        let mut lines = vec!["<table>".to_string()];
        let mut current_row: Option<u32> = None;

        for (&(row, _col), value) in &self.cells {
            if current_row != Some(row) {
                if current_row.is_some() {
                    lines.push("</tr>".to_string());
                }
                lines.push("<tr>".to_string());
                current_row = Some(row);
            }
            lines.push(format!("<td>{}</td>", value));
        }
        lines.push("</tr>".to_string());
        lines.push("</table>".to_string());
        lines.join("\n")
    }
}

/// Render input values (and the optional table grid) into prompt lines.
pub fn format_inputs(inputs: &BTreeMap<String, InputValue>, grid: &TableGrid) -> String {
    let mut lines: Vec<String> = Vec::new();

    if !grid.is_empty() {
        lines.push(String::new());
        lines.push(grid.to_html());
        lines.push(String::new());
    }

    for (name, value) in inputs {
        match value {
            InputValue::Text(text) => lines.push(format!("- {}: {}", name, text)),
            InputValue::Image(image) => {
                lines.push(format!("- {}: ![이미지]({})", name, image.url));
            }
            InputValue::Images(images) => {
                for image in images {
                    lines.push(format!(
                        "\n![{}]({})\n**{}**\n{}",
                        image.title, image.url, image.title, image.description
                    ));
                }
            }
            InputValue::YearSeries(series) => {
                for (year, value) in series {
                    lines.push(format!("- {}년 {}: {}", year, name, value));
                }
            }
        }
    }

    lines.join("\n")
}

/// Render the user's completed tables as numbered prompt blocks.
pub fn format_user_tables(filled_tables: &[String]) -> String {
    let mut lines: Vec<String> = Vec::new();
    for (idx, html) in filled_tables.iter().enumerate() {
        lines.push(format!(
            "\n\n📊 사용자 작성 표 {}: (이 표는 고유한 주제를 다루며 반드시 본문에 포함되어야 합니다)\n",
            idx + 1
        ));
        lines.push(format!("<br/>\n{}\n", html));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_variants_resolve_from_json() {
        let text: InputValue = serde_json::from_value(serde_json::json!("예")).unwrap();
        assert_eq!(text, InputValue::Text("예".into()));

        let image: InputValue =
            serde_json::from_value(serde_json::json!({"url": "http://x/img.png"})).unwrap();
        assert!(matches!(image, InputValue::Image(_)));

        let images: InputValue = serde_json::from_value(serde_json::json!([
            {"url": "http://x/a.png", "title": "제목", "description": "설명"}
        ]))
        .unwrap();
        assert!(matches!(images, InputValue::Images(_)));

        let series: InputValue =
            serde_json::from_value(serde_json::json!({"2021": "10", "2022": "12"})).unwrap();
        assert!(matches!(series, InputValue::YearSeries(_)));
    }

    #[test]
    fn grid_reassembly_is_insertion_order_independent() {
        let mut a = BTreeMap::new();
        a.insert("page1_table0_r1_c1".to_string(), "B".to_string());
        a.insert("page1_table0_r0_c0".to_string(), "헤더".to_string());
        a.insert("page1_table0_r1_c0".to_string(), "A".to_string());
        a.insert("page1_table0_r0_c1".to_string(), "값".to_string());
        a.insert("unrelated_key".to_string(), "무시".to_string());

        let grid = TableGrid::from_flat_keys(&a);
        let html = grid.to_html();

        let row0 = html.find("헤더").unwrap();
        let row1 = html.find('A').unwrap();
        assert!(row0 < row1);
        assert_eq!(html.matches("<tr>").count(), 2);
        assert!(!html.contains("무시"));
    }

    #[test]
    fn empty_grid_renders_nothing() {
        assert_eq!(TableGrid::default().to_html(), "");
    }

    #[test]
    fn format_inputs_exhaustive() {
        let mut inputs = BTreeMap::new();
        inputs.insert(
            "법적 보호종 존재 여부".to_string(),
            InputValue::Text("예".to_string()),
        );
        let mut series = BTreeMap::new();
        series.insert("2022".to_string(), "1,024".to_string());
        inputs.insert("온실가스 배출량".to_string(), InputValue::YearSeries(series));
        inputs.insert(
            "관련 이미지".to_string(),
            InputValue::Images(vec![ImageRef {
                url: "http://x/a.png".to_string(),
                title: "서식지".to_string(),
                description: "보호종 서식지 전경".to_string(),
            }]),
        );

        let out = format_inputs(&inputs, &TableGrid::default());
        assert!(out.contains("- 법적 보호종 존재 여부: 예"));
        assert!(out.contains("- 2022년 온실가스 배출량: 1,024"));
        assert!(out.contains("![서식지](http://x/a.png)"));
    }

    #[test]
    fn user_tables_numbered() {
        let out = format_user_tables(&[
            "<table><tr><td>1</td></tr></table>".to_string(),
            "<table><tr><td>2</td></tr></table>".to_string(),
        ]);
        assert!(out.contains("사용자 작성 표 1"));
        assert!(out.contains("사용자 작성 표 2"));
        assert_eq!(out.matches("<table>").count(), 2);
    }
}
