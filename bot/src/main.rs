use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use themery_bot::commands::ServerLocks;
use themery_bot::config::BotConfig;
use themery_bot::db::pool::{create_pool, run_migrations};
use themery_bot::platform::rest::RestClient;
use themery_bot::web::app_state::AppState;
use themery_bot::web::router::build_router;

#[derive(Parser)]
#[command(name = "themery-bot", about = "Save and restore server layouts as named themes")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "themery.toml")]
    config: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = BotConfig::load(&cli.config);

    let pool = create_pool(&config.database.url)
        .await
        .expect("failed to connect to database");

    run_migrations(&pool)
        .await
        .expect("failed to run database migrations");

    let state = Arc::new(AppState {
        db: pool,
        locks: ServerLocks::new(),
        rest: RestClient::new(&config.discord.token, &config.discord.api_base),
    });

    let app = build_router(state);

    info!("Themery starting — listening on {}", config.server.web_address);

    let listener = tokio::net::TcpListener::bind(&config.server.web_address)
        .await
        .expect("failed to bind web listener");

    axum::serve(listener, app).await.expect("server error");
}
