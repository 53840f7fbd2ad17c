use std::sync::Arc;

use anyhow::Context;

use medrx_api::config::ApiConfig;
use medrx_infra::{EntityDirectory, InMemoryDirectory, seed::seed_catalog};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    medrx_observability::init();

    let config = ApiConfig::from_env().context("failed to load configuration")?;

    let directory: Arc<dyn EntityDirectory> = Arc::new(InMemoryDirectory::new());
    if config.seed_catalog {
        seed_catalog(directory.as_ref()).context("failed to seed the medication catalog")?;
    }

    let app = medrx_api::app::build_app(&config, directory);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
