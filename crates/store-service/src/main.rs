//! Music Store Gateway
//!
//! Entry point for the music store HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use store_service::config::Config;
use store_service::observability::metrics::init_metrics_recorder;
use store_service::repositories::{MemoryStore, PgStore, Store};
use store_service::routes::{self, AppState};
use store_service::services::{PaymentProvider, StripeClient};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Per-statement limit applied to every pooled PostgreSQL connection.
const STATEMENT_TIMEOUT_SECONDS: u32 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Local runs may keep settings in .env; real deployments use the environment
    dotenvy::dotenv().ok();

    init_tracing();

    let config = Config::from_env().inspect_err(|e| error!("Refusing to start: {}", e))?;
    info!(
        bind_address = %config.bind_address,
        token_lifetime_seconds = config.token_lifetime_seconds,
        jwt_clock_skew_seconds = config.jwt_clock_skew_seconds,
        payment_currency = %config.payment_currency,
        memory_store = config.uses_memory_store(),
        "Music store configuration"
    );

    // Installed before any component can record
    let metrics_handle = init_metrics_recorder()?;

    let store = open_store(&config).await?;
    let payments: Arc<dyn PaymentProvider> = Arc::new(StripeClient::new(
        config.payment_api_url.clone(),
        config.payment_secret_key.clone(),
    )?);

    let addr: SocketAddr = config
        .bind_address
        .parse()
        .inspect_err(|e| error!("BIND_ADDRESS is not a socket address: {}", e))?;

    let app = routes::build_routes(
        Arc::new(AppState {
            store,
            config,
            payments,
        }),
        metrics_handle,
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Music store accepting requests on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(wait_for_shutdown(drain_period()))
    .await?;

    info!("Music store stopped");
    Ok(())
}

/// `RUST_LOG` filtering; `LOG_FORMAT=json` for machine-readable output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "store_service=debug,music_store=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match std::env::var("LOG_FORMAT") {
        Ok(format) if format.eq_ignore_ascii_case("json") => {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        }
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// PostgreSQL with migrations applied, or the in-process store for a
/// `memory:` URL.
async fn open_store(config: &Config) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    if config.uses_memory_store() {
        warn!("DATABASE_URL selects the in-memory store; nothing is persisted");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&with_statement_timeout(
            &config.database_url,
            STATEMENT_TIMEOUT_SECONDS,
        ))
        .await
        .inspect_err(|e| error!("PostgreSQL unreachable: {}", e))?;

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .inspect_err(|e| error!("Schema migration failed: {}", e))?;
    info!("PostgreSQL store ready");

    Ok(Arc::new(PgStore::new(pool)))
}

/// `DRAIN_SECONDS`, defaulting to no drain.
fn drain_period() -> Duration {
    let seconds = std::env::var("DRAIN_SECONDS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(0);
    Duration::from_secs(seconds)
}

/// Resolves on SIGINT or SIGTERM, after `drain` has elapsed.
async fn wait_for_shutdown(drain: Duration) {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Cannot listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => info!("SIGINT received, shutting down"),
        () = terminate => info!("SIGTERM received, shutting down"),
    }

    if !drain.is_zero() {
        warn!(drain_seconds = drain.as_secs(), "Draining in-flight requests");
        tokio::time::sleep(drain).await;
    }
}

/// Append a libpq `statement_timeout` option to the connection URL.
fn with_statement_timeout(url: &str, seconds: u32) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}options=-c%20statement_timeout%3D{seconds}s")
}
