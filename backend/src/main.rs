//! Dashboard server entry-point: loads settings, wires adapters, and serves
//! the REST API.

mod server;

use actix_web::cookie::SameSite;
use actix_web::web;
use color_eyre::eyre::{Result, WrapErr};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, build_runtime, create_server, load_session_key};
use staffdesk::inbound::http::health::HealthState;
use staffdesk::settings::ServerSettings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(%error, "tracing init failed");
    }

    let settings = ServerSettings::load().wrap_err("failed to load settings")?;
    let key = load_session_key(&settings)?;
    let runtime = build_runtime(&settings)?;
    let bind_addr = settings.bind_addr()?;

    let config = ServerConfig::new(key, settings.cookie_secure, SameSite::Lax, bind_addr, runtime);
    info!(addr = %config.bind_addr(), "starting server");

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    let result = server.await;
    health_state.mark_unhealthy();
    result.wrap_err("server terminated abnormally")
}
