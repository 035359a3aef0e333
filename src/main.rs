use clap::Parser;
use datagov::cli::{self, Cli};
use datagov::errors::Result;
use datagov::{config, db};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        // One transient-style message; no retry.
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // 3. Load the main application configuration
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Failed to load application configuration: {}", e))?;
    info!("Configuration loaded (remote: {})", app_config.remote_base_url);

    // 4. Initialize database
    let db_pool = db::init_db(&app_config.database_path)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Dispatch the requested command
    cli::run(cli.command, app_config, db_pool).await
}
