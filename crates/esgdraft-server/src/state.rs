//! Shared application state.

use parking_lot::Mutex;

use esgdraft_chat::{LlmClient, LlmConfig, TranslationCache};
use esgdraft_core::EsgDraftConfig;
use esgdraft_retrieve::TableLibrary;
use esgdraft_store::SqliteStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: EsgDraftConfig,
    pub store: SqliteStore,
    pub llm: LlmClient,
    pub llm_config: LlmConfig,
    pub translation_cache: Mutex<TranslationCache>,
    pub manual_tables: TableLibrary,
    pub template_tables: TableLibrary,
}

impl AppState {
    pub fn new(config: EsgDraftConfig, store: SqliteStore) -> Self {
        let llm_config = LlmConfig::load(&config.data_paths.llm_config_file);
        let translation_cache =
            Mutex::new(TranslationCache::load(&config.data_paths.translation_cache_file));
        let manual_tables = TableLibrary::new(&config.data_paths.manual_tables);
        let template_tables = TableLibrary::new(&config.data_paths.template_tables);

        Self {
            config,
            store,
            llm: LlmClient::new(),
            llm_config,
            translation_cache,
            manual_tables,
            template_tables,
        }
    }
}
