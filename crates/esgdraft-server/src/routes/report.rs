//! Report drafting routes: guidance fetch, field inference, draft
//! generation, draft/input persistence and indicator status.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::routes::error_response;
use crate::state::AppState;
use esgdraft_chat::{prompts, CompletionRequest, QueryCorpus};
use esgdraft_pipeline::{
    extract_field_names, extract_guidance_block, format_inputs, format_user_tables,
    parse_markdown_fields, remove_duplicates, DedupPolicy, InputValue, TableGrid, TableRecord,
};
use esgdraft_retrieve::fetch_topic_guidance;
use esgdraft_store::DraftStatus;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/report/fetch-data", post(fetch_data))
        .route("/report/infer-required-data", post(infer_required_data))
        .route("/report/generate-draft", post(generate_draft))
        .route("/report/summarize-indicator", post(summarize_indicator))
        .route("/report/save-draft", post(save_draft))
        .route("/report/load-draft", get(load_draft))
        .route("/report/delete-draft", delete(delete_draft))
        .route("/report/indicator-status", get(indicator_status))
        .route("/report/complete-indicator/{topic}", post(complete_indicator))
        .route("/report/save-inputs", post(save_inputs))
        .route("/report/load-inputs", get(load_inputs))
}

// ---------------------------------------------------------------
// Guidance fetch
// ---------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    pub date: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct FetchDataRequest {
    topic: String,
    company: String,
    #[serde(default)]
    department: String,
    #[serde(default)]
    history: Vec<HistoryItem>,
}

async fn fetch_data(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FetchDataRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let fetch = match fetch_topic_guidance(&state.store, QueryCorpus::EsgManual.as_str(), &req.topic)
    {
        Ok(fetch) => fetch,
        Err(e) => return error_response(e),
    };

    let tables = state.manual_tables.tables_for_pages(&fetch.pages);
    let chunks: Vec<&str> = fetch.chunks.iter().map(|c| c.content.as_str()).collect();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "topic": req.topic,
            "company": req.company,
            "department": req.department,
            "history": req.history,
            "chunkCount": chunks.len(),
            "chunks": chunks,
            "tableHtmls": tables.iter().map(|t| t.html.as_str()).collect::<Vec<_>>(),
            "tableTexts": tables.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            "tablePaths": tables.iter().map(|t| t.source_path.as_str()).collect::<Vec<_>>(),
            "pages": fetch.pages,
        })),
    )
}

// ---------------------------------------------------------------
// Required-field inference
// ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct InferDataRequest {
    topic: String,
    #[serde(default)]
    chunks: Vec<String>,
    #[serde(default, rename = "tableTexts")]
    table_texts: Vec<String>,
}

async fn infer_required_data(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InferDataRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let guidance_block = extract_guidance_block(&req.chunks);
    let user = prompts::infer_fields_user(&req.topic, &req.chunks, &guidance_block, &req.table_texts);

    let markdown = match state
        .llm
        .complete(
            &state.llm_config,
            CompletionRequest::new(prompts::INFER_FIELDS_SYSTEM, user).max_tokens(1024),
        )
        .await
    {
        Ok(markdown) => markdown,
        Err(e) => return error_response(e),
    };

    let candidates = parse_markdown_fields(&markdown);
    let table_fields: Vec<String> = extract_field_names(&records_from_texts(&req.table_texts))
        .into_iter()
        .collect();
    let filtered = remove_duplicates(
        candidates,
        &table_fields,
        DedupPolicy::RatioOrContainment,
        state.config.dedup_threshold,
    );

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "topic": req.topic,
            "requiredData": markdown,
            "requiredFields": filtered,
            "tableFieldNames": table_fields,
        })),
    )
}

/// Incoming table content may be raw markup or a plain-text rendering; the
/// extractor handles either, so both record fields carry the same payload.
fn records_from_texts(texts: &[String]) -> Vec<TableRecord> {
    texts
        .iter()
        .map(|text| TableRecord {
            html: text.clone(),
            text: text.clone(),
            source_path: String::new(),
            page: 0,
        })
        .collect()
}

// ---------------------------------------------------------------
// Draft generation
// ---------------------------------------------------------------

/// The frontend sends a single filled table as a bare string and several as
/// a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DraftRequest {
    topic: String,
    #[serde(default)]
    inputs: BTreeMap<String, InputValue>,
    #[serde(default)]
    table: BTreeMap<String, String>,
    #[serde(default, rename = "filledTableHtml")]
    filled_table_html: Option<OneOrMany>,
    #[serde(default)]
    chunks: Vec<String>,
    #[serde(default, rename = "tableTexts")]
    table_texts: Vec<String>,
    #[serde(default)]
    improvement: String,
}

async fn generate_draft(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DraftRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let grid = TableGrid::from_flat_keys(&req.table);
    let filled_tables = req.filled_table_html.map(OneOrMany::into_vec).unwrap_or_default();

    let formatted_inputs = format_inputs(&req.inputs, &grid);
    let formatted_user_tables = format_user_tables(&filled_tables);

    let user = prompts::draft_user(
        &req.topic,
        &req.chunks,
        &req.table_texts,
        &formatted_inputs,
        &formatted_user_tables,
        &req.improvement,
    );

    let draft = match state
        .llm
        .complete(
            &state.llm_config,
            CompletionRequest::new(prompts::DRAFT_SYSTEM, user).max_tokens(3000),
        )
        .await
    {
        Ok(draft) => draft,
        Err(e) => return error_response(e),
    };

    let rendered_tables = draft.matches("<table").count();
    if rendered_tables < filled_tables.len() {
        warn!(
            topic = %req.topic,
            expected = filled_tables.len(),
            rendered = rendered_tables,
            "draft did not carry every user table"
        );
    }

    (StatusCode::OK, Json(serde_json::json!({ "draft": draft })))
}

// ---------------------------------------------------------------
// Indicator summary
// ---------------------------------------------------------------

async fn summarize_indicator(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InferDataRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let user = prompts::summary_user(&req.topic, &req.chunks);

    match state
        .llm
        .complete(&state.llm_config, CompletionRequest::new(prompts::SUMMARY_SYSTEM, user))
        .await
    {
        Ok(summary) => (StatusCode::OK, Json(serde_json::json!({ "summary": summary }))),
        Err(e) => error_response(e),
    }
}

// ---------------------------------------------------------------
// Draft persistence
// ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SaveDraftRequest {
    topic: String,
    company: String,
    #[serde(default)]
    draft: String,
}

#[derive(Debug, Deserialize)]
struct DraftKeyQuery {
    topic: String,
    company: String,
}

async fn save_draft(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveDraftRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.store.upsert_draft(&req.topic, &req.company, &req.draft) {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "draft saved" })),
        ),
        Err(e) => error_response(e),
    }
}

async fn load_draft(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DraftKeyQuery>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.store.load_draft(&query.topic, &query.company) {
        Ok(Some(draft)) => (StatusCode::OK, Json(serde_json::json!({ "draft": draft }))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "draft not found" })),
        ),
        Err(e) => error_response(e),
    }
}

async fn delete_draft(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DraftKeyQuery>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.store.delete_draft(&req.topic, &req.company) {
        Ok(true) => (StatusCode::OK, Json(serde_json::json!({ "deleted": true }))),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "draft not found" })),
        ),
        Err(e) => error_response(e),
    }
}

// ---------------------------------------------------------------
// Indicator status
// ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CompanyQuery {
    company: String,
}

async fn indicator_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CompanyQuery>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.store.draft_statuses(&query.company) {
        Ok(statuses) => {
            let map: BTreeMap<String, &str> = statuses
                .iter()
                .map(|(topic, status)| (topic.clone(), status.as_str()))
                .collect();
            (StatusCode::OK, Json(serde_json::json!(map)))
        }
        Err(e) => error_response(e),
    }
}

async fn complete_indicator(
    State(state): State<Arc<AppState>>,
    Path(topic): Path<String>,
    Query(query): Query<CompanyQuery>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state
        .store
        .set_draft_status(&topic, &query.company, DraftStatus::Completed)
    {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "success": true }))),
        Err(e) => error_response(e),
    }
}

// ---------------------------------------------------------------
// Input snapshots
// ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SaveInputsRequest {
    topic: String,
    company: String,
    #[serde(default = "empty_object")]
    inputs: serde_json::Value,
    #[serde(default = "empty_object")]
    table: serde_json::Value,
    #[serde(default)]
    improvement: String,
}

fn empty_object() -> serde_json::Value {
    serde_json::json!({})
}

async fn save_inputs(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveInputsRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.store.upsert_inputs(
        &req.topic,
        &req.company,
        &req.inputs,
        &req.table,
        &req.improvement,
    ) {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "inputs saved" })),
        ),
        Err(e) => error_response(e),
    }
}

async fn load_inputs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DraftKeyQuery>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.store.load_inputs(&query.topic, &query.company) {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "inputs": record.inputs,
                "table": record.table,
                "improvement": record.improvement,
                "updatedAt": record.updated_at,
            })),
        ),
        // Form state, not a hard resource: absent reads as empty.
        Ok(None) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "inputs": {},
                "table": {},
                "improvement": "",
            })),
        ),
        Err(e) => error_response(e),
    }
}
