//! QuestForge Engine - Main entry point.
//!
//! Opens the configured game store and verifies every stored game.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use questforge_engine::infrastructure::config::EngineConfig;
use questforge_engine::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine may be run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "questforge_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting QuestForge Engine");

    let config = EngineConfig::from_env()?;
    tracing::info!(
        store = %config.store,
        data_dir = %config.data_dir.display(),
        "Opening game store"
    );

    let app = App::from_config(&config).await?;
    let report = app.use_cases.audit.execute().await?;

    tracing::info!(
        verified = report.verified,
        empty = report.empty,
        nodes = report.nodes,
        failed = report.failures.len(),
        "Store audit finished"
    );

    if !report.is_clean() {
        for failure in &report.failures {
            tracing::error!(game_id = %failure.game_id, error = %failure.error, "Invalid game");
        }
        anyhow::bail!("{} stored game(s) failed verification", report.failures.len());
    }

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
