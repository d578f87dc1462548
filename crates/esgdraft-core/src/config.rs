//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Paths to all esgdraft data directories and files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// SQLite database directory (`data/db/`).
    pub db: PathBuf,
    /// Extracted table fragments for the guidance manual (`data/tables/`).
    pub manual_tables: PathBuf,
    /// Extracted table fragments for regulation templates (`data/template_tables/`).
    pub template_tables: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
    /// Translation cache (`data/translation-cache.json`).
    pub translation_cache_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            db: root.join("db"),
            manual_tables: root.join("tables"),
            template_tables: root.join("template_tables"),
            llm_config_file: root.join("llm-config.json"),
            translation_cache_file: root.join("translation-cache.json"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    /// Create all required directories.
    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.db)?;
        std::fs::create_dir_all(&self.manual_tables)?;
        std::fs::create_dir_all(&self.template_tables)?;
        Ok(())
    }
}

/// Top-level esgdraft configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsgDraftConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Similarity threshold for field deduplication.
    pub dedup_threshold: f64,
    /// Minimum paragraph similarity for table marker placement.
    pub marker_threshold: f64,
}

impl EsgDraftConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let dedup_threshold = std::env::var("ESGDRAFT_DEDUP_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.8);

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            data_paths,
            dedup_threshold,
            marker_threshold: 0.5,
        })
    }
}
