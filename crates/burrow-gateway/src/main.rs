use std::sync::Arc;

use burrow_gateway::telemetry::init_tracing;
use burrow_gateway::{App, AppState, Config};
use burrow_generator::RandomGenerator;
use burrow_storage::open_storage;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // a missing .env is fine
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    init_tracing(config.log_format);

    info!(
        server_address = %config.server_address,
        base_url = %config.base_url,
        backend = %config.storage.backend_kind(),
        "starting burrow"
    );

    let storage = match open_storage(&config.storage).await {
        Ok(storage) => storage,
        Err(err) => {
            error!(error = %err, "failed to open storage");
            return Err(err.into());
        }
    };

    let state = AppState::new(storage, Arc::new(RandomGenerator::new()), config.base_url);
    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    info!(listen_addr = %listener.local_addr()?, "http server listening");

    axum::serve(listener, App::router(state)).await?;
    Ok(())
}
