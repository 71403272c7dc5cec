use clap::Parser;
use tracing::{error, info};

use storefront_sim::app_system::{demo, setup_tracing, StorefrontSystem, SystemError};
use storefront_sim::config::{AppConfig, Command};
use storefront_sim::webhooks;

#[tokio::main]
async fn main() -> Result<(), SystemError> {
    dotenvy::dotenv().ok();
    let config = AppConfig::parse();

    // Setup tracing once for the entire application
    setup_tracing(config.log_format);

    let system = StorefrontSystem::new(&config.system_settings());

    let result = match &config.command {
        Command::Serve { bind, webhook_secret } => {
            if webhook_secret.is_none() {
                info!("No webhook secret configured; signed gateway endpoint will answer 503");
            }
            let state = system.webhook_state(webhook_secret.as_deref());
            webhooks::serve(*bind, state).await.map_err(SystemError::from)
        }
        Command::Demo { interactive } => demo::run(&system, &config, *interactive).await,
    };

    if let Err(e) = &result {
        error!(error = %e, "Storefront stopped with an error");
    }

    // Shutdown system gracefully
    system.shutdown().await?;
    result
}
