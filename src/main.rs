//! NT News aggregation dashboard, binary entrypoint.
//! Boots the Axum HTTP server wiring the search/export routes, the shared
//! upstream HTTP client, and the Prometheus endpoint.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nt_news::api::{self, AppState};
use nt_news::config::AppConfig;
use nt_news::metrics::Metrics;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nt_news=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the vars come from the environment.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = AppConfig::from_env();
    // Fatal once at startup rather than a FetchError on every request.
    cfg.ensure_any_configured()?;

    tracing::info!(
        providers = ?cfg.configured_providers(),
        page_size = cfg.page_size,
        "starting with configured providers"
    );

    let metrics = Metrics::init(cfg.fetch_timeout.as_secs());

    // One client process-wide; every adapter shares its connection pool.
    let client = reqwest::Client::new();
    let state = AppState::new(&cfg, &client);
    let router = api::router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    tracing::info!(addr = %cfg.bind_addr, "listening");
    axum::serve(listener, router).await?;

    Ok(())
}
