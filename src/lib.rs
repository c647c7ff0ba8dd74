pub mod api;
pub mod cli;
pub mod config;
pub mod core_state;
pub mod db;
pub mod models;
pub mod pipeline;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Serve the API until Ctrl-C.
pub async fn run(config: config::ServerConfig) -> Result<(), String> {
    tracing::info!(
        "{} starting v{}",
        config::APP_NAME,
        config::APP_VERSION
    );

    let core = core_state::CoreState::from_config(&config).map_err(|e| e.to_string())?;
    tracing::info!(
        database = %config.database_path.display(),
        knowledge = core.knowledge().backend(),
        llm = core.chat_model().is_some(),
        "State initialized"
    );

    let mut server = api::start_api_server(Arc::new(core), config.bind, &config.api_keys).await?;
    tracing::info!(addr = %server.session.server_addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }

    server.shutdown();
    server.wait().await;
    Ok(())
}
