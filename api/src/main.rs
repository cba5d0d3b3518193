use anyhow::{Context, Result};
use pricing_api::app::{self, AppState};
use pricing_api::config::AppCfg;
use pricing_api::{DemandEstimator, PredictionService};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cfg = AppCfg::load("config.yml")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cfg.log_filter.clone().into()),
        )
        .init();

    // A missing or broken model leaves the server up but unavailable.
    let estimator = DemandEstimator::load(&cfg.model_path);
    let state = AppState::new(PredictionService::new(estimator));

    let app = app::create_router(state);
    let addr = cfg.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!("pricing-api v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);
    axum::serve(listener, app).await?;

    Ok(())
}
