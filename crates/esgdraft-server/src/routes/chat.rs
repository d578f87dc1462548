//! Assistant chat over the guidance corpora.
//!
//! The question is classified into a corpus, retrieved against the FTS
//! index, and answered strictly from the retrieved context. GRI standard
//! text is routed through the translation cache in both directions.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::routes::error_response;
use crate::state::AppState;
use esgdraft_chat::translate::{translate_to_english, translate_to_korean};
use esgdraft_chat::{extract_classifier_index, prompts, CompletionRequest, QueryCorpus};
use esgdraft_retrieve::{clean_table_html, parse_pages, TableLibrary};
use esgdraft_store::SearchHit;

/// Retrieval depth for regular questions.
const TOP_K: usize = 5;
/// Retrieval depth when filtering for a specific GRI code.
const CODE_SCAN_K: usize = 100;

static GRI_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{3}-\d+|\d{3}").unwrap());
static ASKED_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{3}-\d+").unwrap());

const TABLE_KEYWORDS: &[&str] = &["표", "테이블", "table"];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(chat))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    // 1. Classify the question into a corpus.
    let corpus = match state
        .llm
        .complete(
            &state.llm_config,
            CompletionRequest::new(prompts::CLASSIFY_SYSTEM, req.message.clone()).temperature(0.0),
        )
        .await
    {
        Ok(reply) => match extract_classifier_index(&reply) {
            Some(index) => QueryCorpus::parse(&index),
            None => {
                warn!("classifier reply carried no index, defaulting to manual corpus");
                QueryCorpus::EsgManual
            }
        },
        Err(e) => return error_response(e),
    };

    // 2. GRI standard text is English; translate the query for retrieval.
    let query = if corpus == QueryCorpus::GriStandards {
        match translate_to_english(
            &state.llm,
            &state.llm_config,
            &state.translation_cache,
            &req.message,
        )
        .await
        {
            Ok(translated) => translated,
            Err(e) => return error_response(e),
        }
    } else {
        req.message.clone()
    };

    // 3. Retrieve, filtering by indicator code when one was asked.
    let code = GRI_CODE_RE
        .find(&req.message)
        .map(|m| m.as_str().to_string());

    let hits = if corpus == QueryCorpus::GriStandards && code.is_some() {
        let code = code.as_deref().unwrap_or_default();
        match state.store.search_chunks(corpus.as_str(), code, CODE_SCAN_K) {
            Ok(all) => all
                .into_iter()
                .filter(|hit| hit.content.contains(code))
                .collect::<Vec<_>>(),
            Err(e) => return error_response(e),
        }
    } else {
        match state.store.search_chunks(corpus.as_str(), &query, TOP_K) {
            Ok(hits) => hits,
            Err(e) => return error_response(e),
        }
    };

    if hits.is_empty() {
        let answer = match &code {
            Some(code) => format!("해당 문서에서 '{}'에 해당하는 내용을 찾지 못했습니다.", code),
            None => "관련 문서를 찾지 못했습니다.".to_string(),
        };
        return chat_reply(answer, corpus, Vec::new(), String::new(), Vec::new());
    }

    // 4. Build the context from chunks sharing the top hit's title.
    let main_title = hits[0].title.clone();
    let same_title: Vec<&SearchHit> = hits.iter().filter(|h| h.title == main_title).collect();
    let context = same_title
        .iter()
        .map(|h| h.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    // 5. Refuse rather than let the model invent a missing indicator.
    if corpus == QueryCorpus::GriStandards {
        let asked: HashSet<&str> = ASKED_CODE_RE
            .find_iter(&req.message)
            .map(|m| m.as_str())
            .collect();
        let in_context: HashSet<&str> = ASKED_CODE_RE
            .find_iter(&context)
            .map(|m| m.as_str())
            .collect();
        if !asked.is_subset(&in_context) {
            return chat_reply(
                "해당 문서에 요청하신 GRI 지표에 대한 내용이 없습니다.".to_string(),
                corpus,
                Vec::new(),
                String::new(),
                Vec::new(),
            );
        }
    }

    // 6. Answer from the context.
    let answer = match state
        .llm
        .complete(
            &state.llm_config,
            CompletionRequest::new(prompts::chat_system(&context, corpus), query).temperature(0.0),
        )
        .await
    {
        Ok(answer) => answer,
        Err(e) => return error_response(e),
    };

    // 7. Attach cleaned tables when the question asks for them.
    let wants_table = {
        let lowered = req.message.to_lowercase();
        TABLE_KEYWORDS.iter().any(|kw| lowered.contains(kw))
    };
    let (table_paths, table_html) = if wants_table {
        load_context_tables(&state, corpus, &same_title)
    } else {
        (Vec::new(), String::new())
    };

    // 8. Suggested follow-ups (skipped for template/sample corpora).
    let suggestions = suggest_questions(&state, corpus, &req.message, &context).await;

    // 9. GRI answers go back to Korean through the cache.
    let final_answer = if corpus == QueryCorpus::GriStandards {
        match translate_to_korean(&state.llm, &state.llm_config, &state.translation_cache, &answer)
            .await
        {
            Ok(translated) => translated,
            Err(e) => return error_response(e),
        }
    } else {
        answer
    };

    chat_reply(final_answer, corpus, table_paths, table_html, suggestions)
}

fn chat_reply(
    answer: String,
    corpus: QueryCorpus,
    table_paths: Vec<String>,
    table_html: String,
    suggestions: Vec<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "answer": answer,
            "source": corpus.as_str(),
            "metadata": { "tables": table_paths },
            "tableHtml": table_html,
            "suggestedQuestions": suggestions,
        })),
    )
}

/// Load, clean and dedupe table fragments for the context's pages.
fn load_context_tables(
    state: &AppState,
    corpus: QueryCorpus,
    hits: &[&SearchHit],
) -> (Vec<String>, String) {
    let mut pages = BTreeSet::new();
    for hit in hits {
        if let Some(value) = &hit.pages {
            parse_pages(value, &mut pages);
        }
    }

    let library: &TableLibrary = match corpus {
        QueryCorpus::EsgTemplates => &state.template_tables,
        _ => &state.manual_tables,
    };

    let pages: Vec<u32> = pages.into_iter().collect();
    let records = library.tables_for_pages(&pages);

    let mut seen = HashSet::new();
    let mut cleaned = Vec::new();
    let mut paths = Vec::new();
    for record in &records {
        let Ok(raw) = std::fs::read_to_string(&record.source_path) else {
            continue;
        };
        if let Some(html) = clean_table_html(&raw) {
            if seen.insert(html.clone()) {
                cleaned.push(html);
                paths.push(record.source_path.clone());
            }
        }
    }

    (paths, cleaned.join("\n<hr/>\n"))
}

/// Generate up to three follow-up questions; static fallbacks on failure.
async fn suggest_questions(
    state: &AppState,
    corpus: QueryCorpus,
    question: &str,
    context: &str,
) -> Vec<String> {
    if matches!(corpus, QueryCorpus::EsgTemplates | QueryCorpus::EsgSamples) {
        return Vec::new();
    }

    match state
        .llm
        .complete(
            &state.llm_config,
            CompletionRequest::new(prompts::SUGGEST_SYSTEM, prompts::suggest_user(question, context))
                .temperature(0.0),
        )
        .await
    {
        Ok(reply) => {
            let lines: Vec<String> = reply
                .lines()
                .map(|line| {
                    line.trim_start_matches(|c: char| "-•0123456789. ".contains(c))
                        .trim()
                        .to_string()
                })
                .filter(|line| !line.is_empty())
                .take(3)
                .collect();
            if lines.is_empty() {
                prompts::SUGGEST_FALLBACKS.iter().map(|s| s.to_string()).collect()
            } else {
                lines
            }
        }
        Err(e) => {
            warn!("follow-up question generation failed: {}", e);
            prompts::SUGGEST_FALLBACKS.iter().map(|s| s.to_string()).collect()
        }
    }
}
