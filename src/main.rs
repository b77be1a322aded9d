use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use case_core::{CaseService, CoreConfig, LocalDirBackend};

/// Main entry point for the case tracker server
///
/// Resolves configuration from the environment (and `.env`), opens the case document in the
/// local data directory, and serves the REST API.
///
/// # Environment Variables
/// - `CASES_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CASES_DATA_DIR`: Directory holding stored documents (default: "case_data")
/// - `CASES_DOCUMENT`: Name or id of the case document (default: "cases.json")
/// - `CASES_FIRST_WEEKDAY`: First column of the calendar (default: Monday)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("case_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("case_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CASES_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::from_lookup(|key| std::env::var(key).ok())?);
    std::fs::create_dir_all(cfg.data_dir())?;
    let backend = Arc::new(LocalDirBackend::new(cfg.data_dir())?);
    let service = CaseService::new(cfg.clone(), backend)?;

    tracing::info!(
        "++ Case document {} in {}",
        service.store().handle().id,
        cfg.data_dir().display()
    );
    tracing::info!("++ Starting case REST on {}", rest_addr);

    api_rest::serve(&rest_addr, AppState::new(service)).await
}
