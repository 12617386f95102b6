use std::sync::Arc;

use doibot_core::config::{AppConfig, ConfigError, LoadOptions};
use doibot_discord::events::{EventDispatcher, SlashCommandHandler};
use doibot_discord::gateway::{GatewayRunner, NoopGatewayTransport, ReconnectPolicy};
use doibot_metadata::{CrossrefClient, CrossrefPreviewService};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub gateway_runner: GatewayRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("metadata http client build failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let works_client = CrossrefClient::new(&config.crossref).map_err(BootstrapError::HttpClient)?;
    let preview_service = CrossrefPreviewService::new(works_client);

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(SlashCommandHandler::new(preview_service));
    info!(
        event_name = "system.bootstrap.dispatcher_ready",
        handler_count = dispatcher.handler_count(),
        "command dispatcher wired"
    );

    // The concrete gateway connection (session handshake, command sync) is
    // the platform client's concern; the runner drives whatever transport is
    // plugged in here.
    let gateway_runner =
        GatewayRunner::new(Arc::new(NoopGatewayTransport), dispatcher, ReconnectPolicy::default());
    info!(
        event_name = "system.bootstrap.gateway_transport_mode",
        transport_mode = "noop",
        "gateway runner transport mode initialized"
    );

    Ok(Application { config, gateway_runner })
}
