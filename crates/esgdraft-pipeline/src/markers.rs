//! Table-marker placement and substitution.
//!
//! Generated narrative text and extracted tables arrive from independent
//! pipelines; content similarity re-associates them. Each table gets a
//! `[[TABLE_k]]` placeholder appended to the best-matching paragraph (or to
//! the end of the document when nothing matches), then every placeholder is
//! substituted with the literal table markup.

use tracing::{debug, warn};

use crate::normalize::normalize;
use crate::similarity::similarity_ratio;
use crate::types::TableRecord;

/// Marker token for the table at `index` (zero-based): `[[TABLE_1]]`, ...
pub fn marker_token(index: usize) -> String {
    format!("[[TABLE_{}]]", index + 1)
}

/// Place a marker for every table in `body`, then substitute each marker
/// with its table markup. `threshold` is the minimum paragraph similarity
/// for in-place placement; below it the marker becomes a trailing paragraph.
pub fn place_markers(body: &str, tables: &[TableRecord], threshold: f64) -> String {
    let mut text = body.to_string();

    for (i, table) in tables.iter().enumerate() {
        let marker = marker_token(i);
        if text.contains(&marker) {
            debug!(%marker, "marker already present, skipping placement");
            continue;
        }
        text = insert_marker(&text, &marker, &table.text, threshold);
    }

    for (i, table) in tables.iter().enumerate() {
        let marker = marker_token(i);
        if text.contains(&marker) {
            text = text.replace(&marker, &table.html);
        } else {
            warn!(%marker, "placement anomaly: marker absent at substitution");
        }
    }

    text
}

/// Append `marker` to the paragraph most similar to `table_text`, or as a
/// new trailing paragraph when no paragraph clears `threshold`.
fn insert_marker(text: &str, marker: &str, table_text: &str, threshold: f64) -> String {
    let mut paragraphs: Vec<String> = text.split("\n\n").map(str::to_string).collect();
    let table_norm = normalize(table_text);

    let mut best_score = 0.0;
    let mut best_idx = None;
    for (i, paragraph) in paragraphs.iter().enumerate() {
        let score = similarity_ratio(&normalize(paragraph), &table_norm);
        if score > best_score {
            best_score = score;
            best_idx = Some(i);
        }
    }

    match best_idx {
        Some(i) if best_score > threshold => {
            debug!(%marker, score = best_score, paragraph = i, "marker placed by similarity");
            paragraphs[i] = format!("{}\n{}", paragraphs[i], marker);
        }
        _ => {
            debug!(%marker, score = best_score, "no similar paragraph, appending marker");
            paragraphs.push(marker.to_string());
        }
    }

    paragraphs.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 0.5;

    fn table(html: &str, text: &str) -> TableRecord {
        TableRecord {
            html: html.to_string(),
            text: text.to_string(),
            source_path: String::new(),
            page: 1,
        }
    }

    #[test]
    fn marker_appended_to_most_similar_paragraph() {
        let body = "P1 unrelated paragraph about governance.\n\n\
                    P2 discusses recycled content ratio across product lines.";
        let t = table("<table><tr><td>data</td></tr></table>", "recycled content ratio data");

        let marker = marker_token(0);
        let placed = insert_marker(body, &marker, &t.text, THRESHOLD);

        let paragraphs: Vec<&str> = placed.split("\n\n").collect();
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[1].starts_with("P2"));
        assert!(paragraphs[1].ends_with(&marker));
        assert!(!paragraphs[0].contains(&marker));
    }

    #[test]
    fn marker_appended_as_trailing_paragraph_when_unrelated() {
        let body = "기업 지배구조에 대한 문단.\n\n윤리경영에 대한 문단.";
        let marker = marker_token(0);
        let placed = insert_marker(body, &marker, "recycled content ratio data", THRESHOLD);

        let paragraphs: Vec<&str> = placed.split("\n\n").collect();
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[2], marker);
    }

    #[test]
    fn every_marker_substituted_exactly_once() {
        let body = "온실가스 배출량 현황을 설명하는 문단.\n\n용수 사용량 현황을 설명하는 문단.";
        let tables = vec![
            table("<table><tr><td>ghg</td></tr></table>", "온실가스 배출량 현황"),
            table("<table><tr><td>water</td></tr></table>", "용수 사용량 현황"),
        ];

        let out = place_markers(body, &tables, THRESHOLD);

        assert_eq!(out.matches("<table").count(), 2);
        for i in 0..tables.len() {
            assert!(!out.contains(&marker_token(i)));
        }
        assert!(out.contains("ghg"));
        assert!(out.contains("water"));
    }

    #[test]
    fn preplaced_marker_not_duplicated() {
        let marker = marker_token(0);
        let body = format!("모델이 이미 넣은 마커 문단.\n{}", marker);
        let tables = vec![table("<table><tr><td>x</td></tr></table>", "전혀 다른 내용")];

        let out = place_markers(&body, &tables, THRESHOLD);

        assert_eq!(out.matches("<table").count(), 1);
        assert!(!out.contains(&marker));
    }

    #[test]
    fn round_trip_marker_count() {
        let body = "첫 번째 문단.\n\n두 번째 문단.";
        let tables: Vec<TableRecord> = (0..4)
            .map(|i| {
                table(
                    &format!("<table><tr><td>t{}</td></tr></table>", i),
                    &format!("완전히 무관한 표 내용 {}", i),
                )
            })
            .collect();

        let out = place_markers(body, &tables, THRESHOLD);

        assert_eq!(out.matches("<table").count(), tables.len());
        assert!(!out.contains("[[TABLE_"));
    }

    #[test]
    fn tokens_are_one_based_and_literal() {
        assert_eq!(marker_token(0), "[[TABLE_1]]");
        assert_eq!(marker_token(4), "[[TABLE_5]]");
    }
}
