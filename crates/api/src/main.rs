use std::sync::Arc;

use anyhow::Context;

use identity_api::app::{self, AppServices};
use identity_infra::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging comes up first so configuration warnings are not lost.
    let log_format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    identity_observability::init(log_format);

    let settings = Settings::from_env().context("invalid configuration")?;
    tracing::debug!(?settings, "configuration loaded");

    let services = AppServices::in_memory(&settings).context("failed to wire services")?;
    let app = app::build_app(Arc::new(services));

    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
