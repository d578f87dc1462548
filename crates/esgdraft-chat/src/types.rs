//! Chat and provider types.

use serde::{Deserialize, Serialize};

/// LLM provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAI,
    Anthropic,
    Groq,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::OpenAI => write!(f, "openai"),
            LlmProvider::Anthropic => write!(f, "anthropic"),
            LlmProvider::Groq => write!(f, "groq"),
        }
    }
}

/// Chat message in conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Which corpus a chat question is answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCorpus {
    /// General questions, report-writing examples, GRI indicator guidance.
    EsgManual,
    /// Verbatim GRI standard text (English source, translated for display).
    GriStandards,
    /// Regulation drafts and template documents.
    EsgTemplates,
    /// Real company case studies.
    EsgSamples,
}

impl QueryCorpus {
    /// Store corpus name.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryCorpus::EsgManual => "esg_manual",
            QueryCorpus::GriStandards => "gri_standards",
            QueryCorpus::EsgTemplates => "esg_templates",
            QueryCorpus::EsgSamples => "esg_samples",
        }
    }

    /// Parse a classifier answer, defaulting to the manual corpus.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "gri_standards" | "GRI_Standards" => QueryCorpus::GriStandards,
            "esg_templates" => QueryCorpus::EsgTemplates,
            "esg_samples" | "esg_sample1" => QueryCorpus::EsgSamples,
            _ => QueryCorpus::EsgManual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_parse_defaults_to_manual() {
        assert_eq!(QueryCorpus::parse("gri_standards"), QueryCorpus::GriStandards);
        assert_eq!(QueryCorpus::parse("esg_sample1"), QueryCorpus::EsgSamples);
        assert_eq!(QueryCorpus::parse("nonsense"), QueryCorpus::EsgManual);
    }
}
