//! esgdraft — ESG report-drafting backend server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod import;
mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("ESGDRAFT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "import" => {
                if args.len() < 3 {
                    eprintln!("Usage: esgdraft import <chunks.json> [corpus]");
                    std::process::exit(1);
                }
                let file = PathBuf::from(&args[2]);
                let corpus = args.get(3).map(String::as_str).unwrap_or("esg_manual");

                let data_dir = resolve_data_dir();
                let config = esgdraft_core::EsgDraftConfig::from_env(&data_dir)?;
                let store = esgdraft_store::SqliteStore::open(&config.data_paths.db)
                    .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;

                let report = import::run_import(&store, &file, corpus)
                    .map_err(|e| anyhow::anyhow!("Import failed: {}", e))?;
                import::print_report(corpus, &report);
                std::process::exit(if report.failed == 0 { 0 } else { 1 });
            }
            "--help" | "-h" | "help" => {
                println!("esgdraft — ESG report-drafting backend");
                println!();
                println!("Usage: esgdraft [command]");
                println!();
                println!("Commands:");
                println!("  (none)                       Start the server");
                println!("  import <file> [corpus]       Import an extracted chunk corpus");
                println!("  help                         Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'esgdraft help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    // Normal server startup
    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = esgdraft_core::EsgDraftConfig::from_env(&data_dir)?;
    let port = config.port;

    let store = esgdraft_store::SqliteStore::open(&config.data_paths.db)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;

    let state = Arc::new(AppState::new(config, store));

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("esgdraft server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
