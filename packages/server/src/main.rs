//! Teamboard API server binary
//!
//! Configuration comes from the environment:
//! - `TEAMBOARD_PORT` - listen port (default 3001)
//! - `TEAMBOARD_DB_PATH` - database file (default ~/.teamboard/database/teamboard.db)
//! - `ANTHROPIC_API_KEY` - enables the assignment advisor
//! - `RUST_LOG` - tracing filter (default "info")

use anyhow::Context;
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 3001;

fn default_db_path() -> anyhow::Result<String> {
    let home_dir = dirs::home_dir().context("Cannot determine home directory")?;
    let path = home_dir
        .join(".teamboard")
        .join("database")
        .join("teamboard.db");
    path.to_str()
        .map(|s| s.to_string())
        .context("Database path is not valid UTF-8")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = match std::env::var("TEAMBOARD_PORT") {
        Ok(value) => value
            .parse::<u16>()
            .with_context(|| format!("Invalid TEAMBOARD_PORT: {}", value))?,
        Err(_) => DEFAULT_PORT,
    };

    let db_path = match std::env::var("TEAMBOARD_DB_PATH") {
        Ok(path) => path,
        Err(_) => default_db_path()?,
    };
    tracing::info!("Opening database at {}", db_path);

    let state = teamboard_server::build_state(&db_path, None).await?;

    // Bring the graph projection up to date with whatever is on disk
    if let Err(e) = state.mindmap.sync().await {
        tracing::warn!("Initial mindmap rebuild failed: {}", e);
    }

    teamboard_server::start_server(state, port).await
}
