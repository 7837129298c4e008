use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use code_camp_api::config::ConfigHandle;
use code_camp_api::database::{
    seed::seed, CampRepository, DatabaseManager, InMemoryCampRepository, PgCampRepository,
};
use code_camp_api::{app, AppState};

#[derive(Debug, Parser)]
#[command(name = "code-camp-api", version, about = "Code camp management API")]
struct Args {
    /// YAML file layered over the environment preset
    #[arg(long, env = "CODECAMP_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides server.port
    #[arg(long)]
    port: Option<u16>,

    /// Seed the demo camp and super-user account
    #[arg(long)]
    seed: bool,

    /// Password for the seeded super-user
    #[arg(long, env = "SEED_USER_PASSWORD", default_value = "P@ssw0rd!", hide_env_values = true)]
    seed_password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, TOKENS_KEY, etc.
    let _ = dotenvy::dotenv();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();

    let config = Arc::new(ConfigHandle::load(args.config.clone()).context("failed to load configuration")?);
    let snapshot = config.snapshot();
    tracing::info!("Starting Code Camp API in {:?} mode", snapshot.environment);

    let (repo, in_memory): (Arc<dyn CampRepository>, bool) = match snapshot.database.url {
        Some(_) => {
            let pool = DatabaseManager::connect(&snapshot.database).await?;
            DatabaseManager::migrate(&pool).await?;
            (Arc::new(PgCampRepository::new(pool)), false)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; starting with the in-memory repository");
            (Arc::new(InMemoryCampRepository::new()), true)
        }
    };

    let state = AppState::new(repo, Arc::clone(&config));

    if args.seed || in_memory {
        seed(state.repo.as_ref(), &state.passwords, &args.seed_password)
            .await
            .context("failed to seed the store")?;
    }

    let port = args.port.unwrap_or(snapshot.server.port);
    let bind_addr = format!("{}:{}", snapshot.server.host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Code Camp API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
