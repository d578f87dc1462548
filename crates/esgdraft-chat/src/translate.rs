//! GRI translation with a persistent cache.
//!
//! The cache is an explicit injected object: loaded once at startup, saved
//! on every mutation. Entries poisoned by model fallback phrases ("훈련
//! 되었습니다" style refusals cached as translations) are purged on load.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use esgdraft_core::Result;

use crate::client::{CompletionRequest, LlmClient};
use crate::config::LlmConfig;
use crate::prompts;

/// Phrases that mark a cached value as a model refusal, not a translation.
pub const FALLBACK_KEYWORDS: &[&str] = &["훈련되었습니다", "훈련 데이터", "as an AI", "I cannot"];

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheData {
    #[serde(default)]
    ko2en: HashMap<String, String>,
    #[serde(default)]
    en2ko: HashMap<String, String>,
}

/// Translation cache keyed by raw source text.
#[derive(Debug)]
pub struct TranslationCache {
    path: PathBuf,
    data: CacheData,
}

impl TranslationCache {
    /// Load the cache file (missing or corrupt file starts empty), then
    /// purge refusal entries.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let data = std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        let mut cache = Self { path, data };
        let purged = cache.purge_fallbacks(FALLBACK_KEYWORDS);
        if purged > 0 {
            info!("purged {} poisoned translation cache entries", purged);
        }
        cache
    }

    pub fn get_ko2en(&self, text: &str) -> Option<&String> {
        self.data.ko2en.get(text)
    }

    pub fn get_en2ko(&self, text: &str) -> Option<&String> {
        self.data.en2ko.get(text)
    }

    pub fn insert_ko2en(&mut self, source: String, translated: String) {
        self.data.ko2en.insert(source, translated);
        self.save();
    }

    pub fn insert_en2ko(&mut self, source: String, translated: String) {
        self.data.en2ko.insert(source, translated);
        self.save();
    }

    /// Remove entries whose value contains any keyword. Returns the number
    /// removed; saves when anything changed.
    pub fn purge_fallbacks(&mut self, keywords: &[&str]) -> usize {
        let poisoned = |v: &String| keywords.iter().any(|kw| v.contains(kw));

        let before = self.data.ko2en.len() + self.data.en2ko.len();
        self.data.ko2en.retain(|_, v| !poisoned(v));
        self.data.en2ko.retain(|_, v| !poisoned(v));
        let removed = before - (self.data.ko2en.len() + self.data.en2ko.len());

        if removed > 0 {
            self.save();
        }
        removed
    }

    fn save(&self) {
        match serde_json::to_string_pretty(&self.data) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    warn!("failed to persist translation cache: {}", e);
                }
            }
            Err(e) => warn!("failed to serialize translation cache: {}", e),
        }
    }
}

/// Translate Korean text to English, cache-first.
pub async fn translate_to_english(
    client: &LlmClient,
    config: &LlmConfig,
    cache: &Mutex<TranslationCache>,
    text: &str,
) -> Result<String> {
    if let Some(cached) = cache.lock().get_ko2en(text) {
        return Ok(cached.clone());
    }

    let translated = client
        .complete(
            config,
            CompletionRequest::new(prompts::TRANSLATE_KO2EN_SYSTEM, text).temperature(0.0),
        )
        .await?;

    cache.lock().insert_ko2en(text.to_string(), translated.clone());
    Ok(translated)
}

/// Translate English text to Korean, cache-first. A refusal-shaped answer is
/// returned as the original text behind a notice and never cached.
pub async fn translate_to_korean(
    client: &LlmClient,
    config: &LlmConfig,
    cache: &Mutex<TranslationCache>,
    text: &str,
) -> Result<String> {
    if let Some(cached) = cache.lock().get_en2ko(text) {
        if !is_fallback(cached) {
            return Ok(cached.clone());
        }
        warn!("poisoned en2ko cache entry ignored, retranslating");
    }

    let translated = client
        .complete(
            config,
            CompletionRequest::new(prompts::TRANSLATE_EN2KO_SYSTEM, text).temperature(0.0),
        )
        .await?;

    if is_fallback(&translated) {
        warn!("translation answer looks like a refusal, returning source text");
        return Ok(format!("아래는 요청하신 GRI 원문입니다.\n\n{}", text));
    }

    cache.lock().insert_en2ko(text.to_string(), translated.clone());
    Ok(translated)
}

fn is_fallback(text: &str) -> bool {
    FALLBACK_KEYWORDS.iter().any(|kw| text.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("translation-cache.json");

        let mut cache = TranslationCache::load(&path);
        cache.insert_ko2en("온실가스".into(), "greenhouse gas".into());
        cache.insert_en2ko("energy".into(), "에너지".into());

        let reloaded = TranslationCache::load(&path);
        assert_eq!(reloaded.get_ko2en("온실가스").map(String::as_str), Some("greenhouse gas"));
        assert_eq!(reloaded.get_en2ko("energy").map(String::as_str), Some("에너지"));
    }

    #[test]
    fn poisoned_entries_purged_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("translation-cache.json");

        let mut cache = TranslationCache::load(&path);
        cache.insert_en2ko("good".into(), "좋은 번역".into());
        cache.insert_en2ko("bad".into(), "이 모델은 2023년까지 훈련되었습니다".into());

        let reloaded = TranslationCache::load(&path);
        assert!(reloaded.get_en2ko("good").is_some());
        assert!(reloaded.get_en2ko("bad").is_none());
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TranslationCache::load(dir.path().join("nope.json"));
        assert!(cache.get_ko2en("x").is_none());
    }
}
