use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use psychat_api::config::AppConfig;
use psychat_api::database::models::ROLE_ADMIN;
use psychat_api::database::{DatabaseManager, MemoryRepository, PgRepository, Repository};
use psychat_api::services::responder;
use psychat_api::state::AppState;

#[derive(Parser)]
#[command(name = "psychat-api")]
#[command(about = "PsyChat backend API server")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides PORT / PSYCHAT_API_PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Use the in-memory repository instead of PostgreSQL")]
    memory: bool,

    #[arg(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        help = "Create missing tables at startup"
    )]
    init_schema: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Grant the admin role to an existing user")]
    Promote { username: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("psychat_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    tracing::info!("Starting PsyChat API in {:?} mode", config.environment);

    let repo = build_repository(&config, args.memory, args.init_schema).await?;

    if let Some(Command::Promote { username }) = args.command {
        return promote(repo.as_ref(), &username).await;
    }

    let responder = responder::from_config(&config.chat).context("invalid chat responder configuration")?;
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState::new(config, repo, Arc::from(responder)).context("invalid security configuration")?;
    let app = psychat_api::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("PsyChat API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn build_repository(
    config: &AppConfig,
    memory: bool,
    init_schema: bool,
) -> anyhow::Result<Arc<dyn Repository>> {
    if memory {
        tracing::warn!("Using in-memory repository; data is lost on exit");
        return Ok(Arc::new(MemoryRepository::new()));
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    if init_schema {
        DatabaseManager::ensure_schema(&pool)
            .await
            .context("failed to initialize schema")?;
    }
    Ok(Arc::new(PgRepository::new(pool)))
}

async fn promote(repo: &dyn Repository, username: &str) -> anyhow::Result<()> {
    let user = repo
        .find_user_by_username(username)
        .await?
        .with_context(|| format!("no user named '{}'", username))?;

    let user = repo.set_user_role(user.id, ROLE_ADMIN).await?;
    tracing::info!("User {} ({}) is now {}", user.id, user.username, user.role);
    Ok(())
}
