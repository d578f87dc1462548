//! Field-name extraction and field-candidate parsing.
//!
//! Two sources feed the deduplicator: field names pulled out of extracted
//! guidance tables (HTML-first, plain-text fallback), and field candidates
//! parsed from the model's markdown answer to the inference prompt.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::types::TableRecord;

/// Candidates longer than this after cleaning are treated as mis-parsed
/// cells, not field names.
const MAX_FIELD_NAME_CHARS: usize = 50;

/// Unit tokens whose co-occurrence with a digit marks a numeric data row.
const UNIT_TOKENS: &[&str] = &["톤", "TJ", "%", "tCO2eq", "백만원"];

static PAREN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*?\)").unwrap());
static NON_FIELD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\sㄱ-ㅎ가-힣]").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());
static PHRASE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[가-힣]{3,10}(?:\s[가-힣]{2,10})*").unwrap());

static TABLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static THEAD_ROW_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("thead > tr").unwrap());
static ROW_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static CELL_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").unwrap());

static ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s+(?:\*\*)?(.+?)(?:\*\*)?$").unwrap());
static UNIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*단위\*\*:\s*(.+)").unwrap());
static YEARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*연도별 데이터\*\*:\s*(.+)").unwrap());
static DESC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*설명\*\*:\s*(.+)").unwrap());

/// An input field proposed by the model, pending deduplication against the
/// guidance tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCandidate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub years: Vec<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldCandidate {
    fn new(name: String) -> Self {
        Self {
            name,
            unit: None,
            years: Vec::new(),
            description: None,
        }
    }
}

/// Parse the model's markdown field listing into candidates.
///
/// Expects numbered items (`1. **항목명**`, stars optional) followed by
/// indented `**단위**`, `**연도별 데이터**` and `**설명**` lines. Year lists
/// may mix single years and `2021~2023` ranges; unparseable parts are
/// skipped. The last in-progress item is flushed at end of input.
pub fn parse_markdown_fields(markdown: &str) -> Vec<FieldCandidate> {
    let mut fields = Vec::new();
    let mut current: Option<FieldCandidate> = None;

    for raw_line in markdown.lines() {
        let line = raw_line.trim();

        if let Some(caps) = ITEM_RE.captures(line) {
            if let Some(done) = current.take() {
                fields.push(done);
            }
            current = Some(FieldCandidate::new(caps[1].trim().to_string()));
            continue;
        }

        let Some(field) = current.as_mut() else {
            continue;
        };

        if line.contains("**단위**") {
            if let Some(caps) = UNIT_RE.captures(line) {
                field.unit = Some(caps[1].trim().to_string());
            }
        } else if line.contains("**연도별 데이터**") {
            if let Some(caps) = YEARS_RE.captures(line) {
                field.years = parse_years(&caps[1]);
            }
        } else if line.contains("**설명**") {
            if let Some(caps) = DESC_RE.captures(line) {
                field.description = Some(caps[1].trim().to_string());
            }
        }
    }

    if let Some(done) = current {
        fields.push(done);
    }

    fields
}

/// Expand a year expression (`2021~2023`, `2021, 2022`) to a sorted list.
fn parse_years(raw: &str) -> Vec<i32> {
    let mut years = BTreeSet::new();

    for part in raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
    {
        if let Some((start, end)) = part.split_once('~') {
            if let (Ok(s), Ok(e)) = (start.trim().parse::<i32>(), end.trim().parse::<i32>()) {
                if s <= e {
                    years.extend(s..=e);
                }
            }
        } else if let Ok(year) = part.parse::<i32>() {
            years.insert(year);
        }
    }

    years.into_iter().collect()
}

/// Extract candidate field names from table records.
///
/// HTML extraction first (header cells, else first column of body rows);
/// when a record's markup yields nothing usable, the plain-text rendering is
/// mined line by line instead. Returns a sorted set.
pub fn extract_field_names(tables: &[TableRecord]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();

    for record in tables {
        let from_html = extract_from_html(&record.html, &mut names);
        if !from_html {
            extract_from_text(&record.text, &mut names);
        }
    }

    names
}

/// Structured extraction from a table fragment. Returns true when at least
/// one usable name came out of the markup.
fn extract_from_html(html: &str, names: &mut BTreeSet<String>) -> bool {
    let fragment = Html::parse_fragment(html);
    let Some(table) = fragment.select(&TABLE_SEL).next() else {
        return false;
    };

    let mut found = false;

    if let Some(header_row) = table.select(&THEAD_ROW_SEL).next() {
        for cell in header_row.select(&CELL_SEL) {
            let text = clean_field_name(&cell.text().collect::<String>());
            if usable_name(&text) {
                names.insert(text);
                found = true;
            }
        }
    } else {
        for row in table.select(&ROW_SEL) {
            if let Some(cell) = row.select(&CELL_SEL).next() {
                let text = clean_field_name(&cell.text().collect::<String>());
                if usable_name(&text) {
                    names.insert(text);
                    found = true;
                }
            }
        }
    }

    found
}

/// Line-based fallback over the plain-text rendering.
fn extract_from_text(text: &str, names: &mut BTreeSet<String>) {
    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.chars().count() < 4 {
            continue;
        }
        // Boilerplate header cells, never field names.
        if line.starts_with("구분") || line.starts_with("단위") {
            continue;
        }
        // A unit token next to a digit marks a numeric data row.
        let has_digit = line.chars().any(|c| c.is_ascii_digit());
        if has_digit && UNIT_TOKENS.iter().any(|unit| line.contains(unit)) {
            continue;
        }
        // Lines carrying a 4-digit year are data rows, not headers.
        if YEAR_RE.is_match(line) {
            continue;
        }

        for phrase in split_field_phrases(line) {
            names.insert(phrase);
        }
    }
}

/// Split a cleaned line into contiguous Hangul word-run phrases.
fn split_field_phrases(line: &str) -> Vec<String> {
    let cleaned = clean_field_name(line);
    PHRASE_RE
        .find_iter(&cleaned)
        .map(|m| m.as_str().trim().to_string())
        .filter(|phrase| phrase.chars().count() >= 3)
        .collect()
}

/// Clean a raw cell text: drop parenthesized content and punctuation,
/// collapse whitespace.
fn clean_field_name(text: &str) -> String {
    let text = text.replace("\\n", " ").replace('\n', " ");
    let text = PAREN_RE.replace_all(&text, "");
    let text = NON_FIELD_RE.replace_all(&text, "");
    WS_RE.replace_all(&text, " ").trim().to_string()
}

fn usable_name(cleaned: &str) -> bool {
    !cleaned.is_empty() && cleaned.chars().count() <= MAX_FIELD_NAME_CHARS
}

/// Extract the "작성 내용" guidance block from ordered chunk texts: capture
/// from the heading line until the next `▶` or `KBZ-` section boundary.
pub fn extract_guidance_block(chunks: &[String]) -> String {
    let joined = chunks.join("\n");
    let mut capture = false;
    let mut result: Vec<&str> = Vec::new();

    for raw_line in joined.lines() {
        let line = raw_line.trim();
        if line.contains("작성 내용") {
            capture = true;
        } else if line.starts_with('▶') || line.starts_with("KBZ-") {
            if capture {
                break;
            }
        }
        if capture {
            result.push(line);
        }
    }

    result.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(html: &str, text: &str) -> TableRecord {
        TableRecord {
            html: html.to_string(),
            text: text.to_string(),
            source_path: "page1_table0.html".to_string(),
            page: 1,
        }
    }

    #[test]
    fn header_cells_with_units_stripped() {
        let html = "<table><thead><tr><th>배출량 (톤)</th><th>비율(%)</th></tr></thead>\
                    <tbody><tr><td>1,024</td><td>12</td></tr></tbody></table>";
        let names = extract_field_names(&[record(html, "")]);
        let expected: BTreeSet<String> =
            ["배출량".to_string(), "비율".to_string()].into_iter().collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn first_column_when_no_header() {
        let html = "<table><tbody>\
                    <tr><td>온실가스 배출량</td><td>tCO2eq</td></tr>\
                    <tr><td>에너지 사용량</td><td>TJ</td></tr>\
                    </tbody></table>";
        let names = extract_field_names(&[record(html, "")]);
        assert!(names.contains("온실가스 배출량"));
        assert!(names.contains("에너지 사용량"));
    }

    #[test]
    fn overlong_cells_discarded() {
        let long = "가".repeat(60);
        let html = format!(
            "<table><thead><tr><th>{}</th><th>비율</th></tr></thead></table>",
            long
        );
        let names = extract_field_names(&[record(&html, "")]);
        assert_eq!(names.len(), 1);
        assert!(names.contains("비율"));
    }

    #[test]
    fn text_fallback_when_no_table_markup() {
        let text = "구분 단위\n온실가스 배출량 현황\n2023 1,024 톤\n재생에너지 사용 비율";
        let names = extract_field_names(&[record("<p>no table here</p>", text)]);
        assert!(names.contains("온실가스 배출량 현황"));
        assert!(names.contains("재생에너지 사용 비율"));
        // The year row and the boilerplate row contribute nothing.
        assert!(!names.iter().any(|n| n.contains("2023")));
        assert!(!names.iter().any(|n| n.starts_with("구분")));
    }

    #[test]
    fn year_lines_excluded_even_when_field_shaped() {
        let text = "폐기물 발생량 2022 기준";
        let names = extract_field_names(&[record("", text)]);
        assert!(names.is_empty());
    }

    #[test]
    fn unit_with_digit_excluded() {
        let text = "사용량 123 톤";
        let names = extract_field_names(&[record("", text)]);
        assert!(names.is_empty());
    }

    #[test]
    fn malformed_markup_falls_through() {
        let names = extract_field_names(&[record("<table><tr><td", "")]);
        // Nothing usable, nothing fatal.
        assert!(names.is_empty());
    }

    #[test]
    fn parse_markdown_basic() {
        let markdown = "\
1. **총 온실가스 배출량**
- **단위**: tCO2eq
- **연도별 데이터**: 2021~2023
- **설명**: 조직의 온실가스 배출 총량 파악

2. 재생원료 사용 비율
- **단위**: %
- **연도별 데이터**: 2022, 2023";

        let fields = parse_markdown_fields(markdown);
        assert_eq!(fields.len(), 2);

        assert_eq!(fields[0].name, "총 온실가스 배출량");
        assert_eq!(fields[0].unit.as_deref(), Some("tCO2eq"));
        assert_eq!(fields[0].years, vec![2021, 2022, 2023]);
        assert!(fields[0].description.is_some());

        // Last item is flushed even without a following header.
        assert_eq!(fields[1].name, "재생원료 사용 비율");
        assert_eq!(fields[1].years, vec![2022, 2023]);
        assert!(fields[1].description.is_none());
    }

    #[test]
    fn parse_years_skips_garbage() {
        assert_eq!(parse_years("2021~2023년, abc"), vec![] as Vec<i32>);
        assert_eq!(parse_years("2023, 2021"), vec![2021, 2023]);
        assert_eq!(parse_years("2022~2021"), vec![] as Vec<i32>);
    }

    #[test]
    fn guidance_block_bounded_by_section_markers() {
        let chunks = vec![
            "KBZ-EN11 개요".to_string(),
            "작성 내용\n정책, 절차, 활동을 기술\n보호종 현황 포함".to_string(),
            "▶ 작성 예시\n예시 본문".to_string(),
        ];
        let block = extract_guidance_block(&chunks);
        assert!(block.starts_with("작성 내용"));
        assert!(block.contains("보호종 현황 포함"));
        assert!(!block.contains("작성 예시"));
    }

    #[test]
    fn guidance_block_empty_when_absent() {
        let chunks = vec!["지표 설명만 있는 청크".to_string()];
        assert_eq!(extract_guidance_block(&chunks), "");
    }
}
