//! Startup configuration.
//!
//! Everything is read once from the environment (after `.env` has been
//! loaded by `main`). Secrets may also come from `/run/secrets/<NAME>` files.

use std::{fs::read_to_string, time::Duration};

use reqwest::Url;
use thiserror::Error;
use tracing::{debug, info};

const SECRETS_DIR: &str = "/run/secrets";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No {0} Specified")]
    Missing(&'static str),

    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Either ADMIN_PASSWORD_HASH or ADMIN_PASSWORD must be specified")]
    MissingPassword,
}

/// Where the admin password comes from. Plaintext is hashed at startup.
#[derive(Clone, Debug)]
pub enum PasswordSource {
    Hash(String),
    Plain(String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub backend_url: Url,
    pub admin_username: String,
    pub admin_password: PasswordSource,
    pub session_secret: Option<String>,
    pub session_timeout: Option<i64>,
    pub cookie_secure: bool,
    pub template_dir: String,
    pub template_dev_mode: bool,
    pub static_dir: String,
    pub backend_timeout: Duration,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), |key| read_secret(key))
    }

    /// Builds the config from arbitrary lookups so tests don't have to touch
    /// the process environment.
    pub fn from_lookup<E, S>(env: E, secret: S) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
        S: Fn(&str) -> Option<String>,
    {
        let env_or_secret = |key: &str| env(key).or_else(|| secret(key));

        let backend_url = env("BACKEND_URL").ok_or(ConfigError::Missing("BACKEND_URL"))?;
        let backend_url = Url::parse(&backend_url).map_err(|e| ConfigError::Invalid {
            key: "BACKEND_URL",
            reason: e.to_string(),
        })?;

        let admin_username =
            env_or_secret("ADMIN_USERNAME").ok_or(ConfigError::Missing("ADMIN_USERNAME"))?;

        let admin_password = match (
            env_or_secret("ADMIN_PASSWORD_HASH"),
            env_or_secret("ADMIN_PASSWORD"),
        ) {
            (Some(hash), _) => PasswordSource::Hash(hash),
            (None, Some(plain)) => PasswordSource::Plain(plain),
            (None, None) => return Err(ConfigError::MissingPassword),
        };

        let session_secret = env_or_secret("SESSION_SECRET");
        if let Some(secret) = &session_secret {
            if secret.len() < 64 {
                return Err(ConfigError::Invalid {
                    key: "SESSION_SECRET",
                    reason: "must be at least 64 bytes".to_string(),
                });
            }
        }

        let session_timeout = env("SESSION_TIMEOUT")
            .map(|v| parse("SESSION_TIMEOUT", &v))
            .transpose()?;

        Ok(Self {
            host: env("HOST").unwrap_or_else(|| "0.0.0.0:8000".to_string()),
            backend_url,
            admin_username,
            admin_password,
            session_secret,
            session_timeout,
            cookie_secure: flag(env("COOKIE_SECURE")),
            template_dir: env("TEMPLATE_DIR").unwrap_or_else(|| "templates/".to_string()),
            template_dev_mode: flag(env("TEMPLATE_DEV_MODE")),
            static_dir: env("STATIC_DIR").unwrap_or_else(|| "static/".to_string()),
            backend_timeout: Duration::from_secs(or_default(
                "BACKEND_TIMEOUT_SECS",
                env("BACKEND_TIMEOUT_SECS"),
                10,
            )?),
            request_timeout: Duration::from_secs(or_default(
                "REQUEST_TIMEOUT_SECS",
                env("REQUEST_TIMEOUT_SECS"),
                30,
            )?),
            max_upload_bytes: or_default("MAX_UPLOAD_BYTES", env("MAX_UPLOAD_BYTES"), 10 << 20)?,
        })
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

fn or_default<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => parse(key, &v),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn flag(value: Option<String>) -> bool {
    value.is_some_and(|v| v == "true" || v == "1")
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("{SECRETS_DIR}/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| debug!("Secret file {path} not readable: {e}"))
        .ok()
}
