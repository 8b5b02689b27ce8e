// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! The gate runs before the handlers of a router subtree:
//!
//! 1. Read `Authorization: <scheme> <token>` (or the configured cookie).
//! 2. Verify the token with the [`TokenCodec`].
//! 3. Publish an [`AuthContext`] into the request extensions.
//!
//! In [`AuthMode::Optional`] only a *missing* credential is tolerated; a
//! present but invalid one is rejected exactly as in required mode.
//!
//! ```rust,ignore
//! let gate = AuthGate::new(codec, AuthMode::Required);
//! let routes = Router::new()
//!     .route("/user", get(current_user))
//!     .layer(axum::middleware::from_fn_with_state(gate, authenticate));
//! ```

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE, HOST},
        HeaderMap,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::extractor::AuthContext;
use super::{AuthError, IdentityPayload, TokenCodec};
use crate::error::ApiError;

/// Whether a route subtree requires credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Required,
    Optional,
}

/// Per-subtree gate configuration.
#[derive(Clone)]
pub struct AuthGate {
    codec: Arc<TokenCodec>,
    mode: AuthMode,
    cookie: Option<String>,
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>, mode: AuthMode) -> Self {
        Self {
            codec,
            mode,
            cookie: None,
        }
    }

    /// Fall back to this cookie when no `Authorization` header is sent.
    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Resolve the caller's identity from request headers.
    ///
    /// `Ok(None)` only happens in optional mode with no credentials at all.
    pub fn resolve(&self, headers: &HeaderMap) -> Result<Option<IdentityPayload>, AuthError> {
        let token = match extract_token(headers, self.cookie.as_deref())? {
            Some(token) => token,
            None => {
                return match self.mode {
                    AuthMode::Required => Err(AuthError::MissingCredentials),
                    AuthMode::Optional => Ok(None),
                }
            }
        };

        self.codec.verify(&token).map(Some)
    }
}

/// Authentication middleware function.
pub async fn authenticate(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    match gate.resolve(request.headers()) {
        Ok(identity) => {
            request.extensions_mut().insert(AuthContext::new(identity));
            next.run(request).await
        }
        Err(err) => {
            tracing::debug!(
                code = err.error_code(),
                reason = %err,
                path = %request.uri().path(),
                "rejected credentials"
            );
            let realm = request_url(&request);
            ApiError::from(err.challenge(Some(realm.as_str()))).into_response()
        }
    }
}

/// Pull the raw token from the header or, failing that, the cookie.
fn extract_token(headers: &HeaderMap, cookie: Option<&str>) -> Result<Option<String>, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AuthError::MalformedCredentials)?;
        // A blank header counts as no header.
        if !value.trim().is_empty() {
            let mut parts = value.split_whitespace();
            return match (parts.next(), parts.next(), parts.next()) {
                (Some(_scheme), Some(token), None) => Ok(Some(token.to_string())),
                _ => Err(AuthError::MalformedCredentials),
            };
        }
    }

    Ok(cookie.and_then(|name| read_cookie(headers, name)))
}

fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Best-effort absolute URL of the request, used as the challenge realm.
fn request_url(request: &Request) -> String {
    // Nested routers strip their prefix from `uri()`; prefer the original.
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or_else(|| request.uri());
    if uri.scheme().is_some() {
        return uri.to_string();
    }
    match request.headers().get(HOST).and_then(|host| host.to_str().ok()) {
        Some(host) => format!("http://{host}{uri}"),
        None => uri.to_string(),
    }
}
