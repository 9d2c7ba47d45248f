use anyhow::Context;
use llama_gateway::{api, gateway::Gateway, settings};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // .env first so RUST_LOG can come from it; real environment variables win
    let env_file = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    match env_file {
        Ok(path) => tracing::info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Failed to read .env file, ignoring it: {}", e),
    }

    let config = settings::resolve()?;
    tracing::info!(
        "Configuration: model={}, max_tokens={}, temperature={}, context_length={}",
        config.model_path.display(),
        config.max_tokens,
        config.default_temperature,
        config.context_length
    );

    let gateway = tokio::task::spawn_blocking(move || Gateway::new(config))
        .await
        .context("model loading task failed")??;
    let addr = gateway.config().bind_addr;

    api::serve(Arc::new(gateway), addr)
        .await
        .context("HTTP server failed")?;
    Ok(())
}
