// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read once from the process environment at startup (a
//! `.env` file in the working directory is loaded first, if present) and then
//! passed by value into the components that need it.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SECRET` | HMAC secret used to sign and verify tokens | Required |
//! | `DATABASE_URL` | SQLite connection string | `sqlite://realworld.db` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3000` |
//! | `AUTH_COOKIE` | Cookie name read when no `Authorization` header is sent | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug,sqlx=warn` |

use std::env;
use std::net::SocketAddr;

use thiserror::Error;

use crate::logging::LogFormat;

pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const AUTH_COOKIE_ENV: &str = "AUTH_COOKIE";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://realworld.db";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

/// Audience stamped into every token; the package name of this service.
pub const TOKEN_AUDIENCE: &str = env!("CARGO_PKG_NAME");

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Token signing configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// Symmetric HMAC secret
    pub secret: String,
    /// Expected `aud` claim
    pub audience: String,
    /// Cookie consulted when no `Authorization` header is present
    pub cookie: Option<String>,
}

impl AuthConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            audience: TOKEN_AUDIENCE.to_string(),
            cookie: None,
        }
    }

    /// Read the token from the named cookie when the header is absent.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("audience", &self.audience)
            .field("cookie", &self.cookie)
            .finish()
    }
}

/// Complete process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the environment, priming it from `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let secret = get(JWT_SECRET_ENV).ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;
        let mut auth = AuthConfig::new(secret);
        if let Some(cookie) = get(AUTH_COOKIE_ENV) {
            auth = auth.with_cookie(cookie);
        }

        let port = match get(PORT_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: LOG_FORMAT_ENV,
                value: raw,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            auth,
            database_url: get(DATABASE_URL_ENV).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            log_format,
        })
    }

    /// Socket address to bind the HTTP listener to.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: HOST_ENV,
                value: self.host.clone(),
            })
    }
}
