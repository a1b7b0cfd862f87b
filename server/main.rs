//! Chest X-ray prediction service.
//!
//! Run with:
//!   cargo run --release --bin xray-server
//!
//! Endpoints:
//!   GET  /         liveness check
//!   POST /predict  multipart upload under field `file`, returns
//!                  `{"prediction": "Normal" | "Pneumonia", "confidence": p}`

mod state;
mod routes;
mod handlers;
mod util;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::info;
use tiny_http::Server;

use xray_classifier::{check_servable, AppConfig, Network};

use state::AppState;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load().context("failed to load configuration")?;

    // The service is useless without a model, so a bad artifact is fatal.
    let network = Network::load_json(&config.model.path)
        .with_context(|| format!("failed to load model from {}", config.model.path.display()))?;
    check_servable(&network)
        .with_context(|| format!("model at {} cannot serve predictions", config.model.path.display()))?;
    info!(
        "loaded model from {} ({} parameters)",
        config.model.path.display(),
        network.parameter_count()
    );

    let shared_state = Arc::new(AppState::new(Arc::new(network)));

    let server = Server::http(&config.server.bind_addr)
        .map_err(|e| anyhow!("failed to bind {}: {}", config.server.bind_addr, e))?;
    info!("listening on http://{}", config.server.bind_addr);

    // One thread per request; the model is shared read-only.
    for request in server.incoming_requests() {
        let state = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state);
        });
    }

    Ok(())
}
