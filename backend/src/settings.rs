//! Server settings loaded via OrthoConfig.
//!
//! Values come from `STAFFDESK_*` environment variables, a configuration
//! file, or the command line. Without a data API URL the server runs against
//! the in-memory backend.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::outbound::postgrest::PostgrestEndpoints;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid bind address `{value}`")]
    BindAddr { value: String },
    #[error("invalid {name} URL `{value}`: {reason}")]
    Url {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("{name} is required when {requires} is set")]
    Missing {
        name: &'static str,
        requires: &'static str,
    },
}

/// Hosted services the server talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSettings {
    /// Process-local tables and accounts.
    Memory,
    Postgrest(PostgrestEndpoints),
}

/// Configuration for the dashboard server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STAFFDESK")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// Base URL of the data API (`/rest/v1`).
    pub rest_url: Option<String>,
    /// Base URL of the identity provider (`/auth/v1`).
    pub auth_url: Option<String>,
    /// Project API key sent with every backend request.
    pub api_key: Option<String>,
    /// Frontend endpoint that drops cached views.
    pub revalidate_url: Option<String>,
    /// Shared secret for the revalidation endpoint.
    pub revalidate_secret: Option<String>,
    /// Timeout applied to outbound requests, in seconds.
    pub request_timeout_secs: Option<u64>,
    /// File holding the session cookie key material.
    pub session_key_file: Option<PathBuf>,
    /// Fall back to a random session key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub session_allow_ephemeral: bool,
    /// Mark the session cookie `Secure`.
    #[ortho_config(default = true)]
    pub cookie_secure: bool,
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, SettingsError> {
    Url::parse(value).map_err(|error| SettingsError::Url {
        name,
        value: value.to_owned(),
        reason: error.to_string(),
    })
}

impl ServerSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|_| SettingsError::BindAddr {
            value: value.to_owned(),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    /// Backend selection; the auth URL defaults to `<rest origin>/auth/v1`.
    pub fn backend(&self) -> Result<BackendSettings, SettingsError> {
        let Some(rest) = self.rest_url.as_deref() else {
            return Ok(BackendSettings::Memory);
        };
        let rest_url = parse_url("rest", rest)?;
        let auth_url = match self.auth_url.as_deref() {
            Some(auth) => parse_url("auth", auth)?,
            None => rest_url.join("/auth/v1").map_err(|error| SettingsError::Url {
                name: "auth",
                value: rest.to_owned(),
                reason: error.to_string(),
            })?,
        };
        let api_key = self.api_key.clone().ok_or(SettingsError::Missing {
            name: "api_key",
            requires: "rest_url",
        })?;
        Ok(BackendSettings::Postgrest(PostgrestEndpoints {
            rest_url,
            auth_url,
            api_key,
        }))
    }

    /// Revalidation endpoint and secret, when configured.
    pub fn revalidation(&self) -> Result<Option<(Url, String)>, SettingsError> {
        let Some(endpoint) = self.revalidate_url.as_deref() else {
            return Ok(None);
        };
        let endpoint = parse_url("revalidate", endpoint)?;
        let secret = self
            .revalidate_secret
            .clone()
            .ok_or(SettingsError::Missing {
                name: "revalidate_secret",
                requires: "revalidate_url",
            })?;
        Ok(Some((endpoint, secret)))
    }
}
