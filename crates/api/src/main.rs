use anyhow::Context;

use stockledger_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    stockledger_observability::init(config.log_format);

    if config.jwt_secret_is_default {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let services = stockledger_api::app::services::build_services(&config).await?;
    let app = stockledger_api::app::build_app(services, config.jwt_secret.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
