//! Builders wiring configured adapters into the action runtime.

use std::sync::Arc;

use actix_web::cookie::Key;
use color_eyre::eyre::{Result, WrapErr, bail};
use tracing::{info, warn};

use staffdesk::domain::ActionRuntime;
use staffdesk::domain::ports::{BackendClientFactory, NoopRevalidator, Revalidator};
use staffdesk::outbound::memory::InMemoryBackend;
use staffdesk::outbound::postgrest::PostgrestClientFactory;
use staffdesk::outbound::revalidation::HttpRevalidator;
use staffdesk::settings::{BackendSettings, ServerSettings};

const MIN_KEY_MATERIAL: usize = 32;

fn build_client_factory(settings: &ServerSettings) -> Result<Arc<dyn BackendClientFactory>> {
    match settings.backend()? {
        BackendSettings::Postgrest(endpoints) => {
            info!(rest_url = %endpoints.rest_url, "using hosted data API");
            let factory = PostgrestClientFactory::new(endpoints, settings.request_timeout())
                .wrap_err("failed to build data API client")?;
            Ok(Arc::new(factory))
        }
        BackendSettings::Memory => {
            warn!("no data API configured; using in-memory backend");
            Ok(Arc::new(InMemoryBackend::new()))
        }
    }
}

fn build_revalidator(settings: &ServerSettings) -> Result<Arc<dyn Revalidator>> {
    match settings.revalidation()? {
        Some((endpoint, secret)) => {
            let revalidator = HttpRevalidator::new(endpoint, secret, settings.request_timeout())
                .wrap_err("failed to build revalidation client")?;
            Ok(Arc::new(revalidator))
        }
        None => Ok(Arc::new(NoopRevalidator)),
    }
}

/// Runtime over the configured backend and revalidation endpoint.
pub fn build_runtime(settings: &ServerSettings) -> Result<ActionRuntime> {
    Ok(ActionRuntime::new(
        build_client_factory(settings)?,
        build_revalidator(settings)?,
    ))
}

/// Session key derived from the key file.
///
/// A random key is used when the file is unreadable and ephemeral keys are
/// allowed, or in debug builds.
pub fn load_session_key(settings: &ServerSettings) -> Result<Key> {
    let key_path = settings.session_key_file();
    match std::fs::read(&key_path) {
        Ok(bytes) if bytes.len() < MIN_KEY_MATERIAL => bail!(
            "session key at {} must hold at least {MIN_KEY_MATERIAL} bytes",
            key_path.display()
        ),
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(error) if cfg!(debug_assertions) || settings.session_allow_ephemeral => {
            warn!(path = %key_path.display(), %error, "using temporary session key (dev only)");
            Ok(Key::generate())
        }
        Err(error) => bail!(
            "failed to read session key at {}: {error}",
            key_path.display()
        ),
    }
}
