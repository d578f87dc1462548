//! Regulation template generation.
//!
//! Template chunks are tidied by the model in groups, with strict
//! instructions to emit `[[TABLE_N]]` markers instead of table markup; the
//! marker engine then places any markers the model dropped and substitutes
//! all of them with the extracted tables.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::info;

use crate::routes::error_response;
use crate::routes::report::HistoryItem;
use crate::state::AppState;
use esgdraft_chat::{prompts, CompletionRequest, QueryCorpus};
use esgdraft_pipeline::place_markers;
use esgdraft_retrieve::fetch_template_guidance;
use esgdraft_store::ChunkRecord;

/// Chunks sent to the model per tidy-up call.
const CHUNKS_PER_REQUEST: usize = 10;

static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/template/generate", post(generate_template))
}

#[derive(Debug, Deserialize)]
struct TemplateRequest {
    topic: String,
    company: String,
    #[serde(default)]
    department: String,
    #[serde(default)]
    history: Vec<HistoryItem>,
}

async fn generate_template(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TemplateRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let fetch = match fetch_template_guidance(
        &state.store,
        QueryCorpus::EsgTemplates.as_str(),
        &req.topic,
    ) {
        Ok(fetch) => fetch,
        Err(e) => return error_response(e),
    };

    if fetch.chunks.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "해당 주제에 대한 규정안이 없습니다" })),
        );
    }

    let tables = state.template_tables.tables_for_pages(&fetch.pages);
    let system = prompts::template_system(tables.len());

    let groups: Vec<&[ChunkRecord]> = fetch.chunks.chunks(CHUNKS_PER_REQUEST).collect();
    info!(
        topic = %req.topic,
        groups = groups.len(),
        tables = tables.len(),
        "generating template"
    );

    let mut results = Vec::with_capacity(groups.len());
    for group in groups {
        let group_text = prepare_group_text(group, &req.company);
        let answer = match state
            .llm
            .complete(
                &state.llm_config,
                CompletionRequest::new(system.clone(), prompts::template_user(&group_text))
                    .temperature(0.2),
            )
            .await
        {
            Ok(answer) => answer,
            Err(e) => return error_response(e),
        };
        results.push(answer);
    }

    // The model is told not to emit table markup; strip anything it emitted
    // anyway so the marker pass is the only source of tables.
    let mut output = results.join("\n\n");
    for table in &tables {
        output = output.replace(&table.html, "");
    }

    let output = place_markers(&output, &tables, state.config.marker_threshold);

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "template": output,
            "topic": req.topic,
            "company": req.company,
            "department": req.department,
            "history": req.history,
            "chunkCount": fetch.chunks.len(),
            "tablePaths": tables.iter().map(|t| t.source_path.as_str()).collect::<Vec<_>>(),
        })),
    )
}

/// Join a chunk group and substitute company-name placeholders the source
/// templates use.
fn prepare_group_text(group: &[ChunkRecord], company: &str) -> String {
    let joined = group
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let substituted = joined
        .replace("[기업명]", company)
        .replace("{회사명}", company)
        .replace("기업명 은", &format!("{}은", company))
        .replace("㈜△△△사", company)
        .replace("기업명", company);

    BLANK_RUN_RE.replace_all(&substituted, "\n\n").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> ChunkRecord {
        ChunkRecord {
            id: 0,
            corpus: "esg_templates".to_string(),
            title: "환경경영 규정".to_string(),
            chunk_id: "0001".to_string(),
            content: content.to_string(),
            pages: None,
        }
    }

    #[test]
    fn company_placeholders_substituted() {
        let group = vec![chunk("제1조 [기업명]의 환경방침.\n\n\n\n제2조 ㈜△△△사는 준수한다.")];
        let text = prepare_group_text(&group, "파나시아");
        assert!(text.contains("파나시아의 환경방침"));
        assert!(text.contains("파나시아는 준수한다"));
        assert!(!text.contains("[기업명]"));
        assert!(!text.contains("\n\n\n"));
    }

    #[test]
    fn bare_placeholder_substituted_last() {
        let group = vec![chunk("기업명 은 본 규정을 따른다.")];
        let text = prepare_group_text(&group, "회사");
        assert_eq!(text, "회사은 본 규정을 따른다.");
    }
}
