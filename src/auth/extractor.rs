// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the identity published by the auth gate.
//!
//! ```rust,ignore
//! async fn current_user(Auth(identity): Auth) -> impl IntoResponse { .. }
//! async fn get_profile(MaybeAuth(viewer): MaybeAuth) -> impl IntoResponse { .. }
//! ```
//!
//! Both read the [`AuthContext`] left in request extensions by
//! [`authenticate`](super::middleware::authenticate); neither looks at headers
//! again.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, IdentityPayload};
use crate::error::ApiError;

/// Per-request authentication outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    identity: Option<IdentityPayload>,
}

impl AuthContext {
    pub fn new(identity: Option<IdentityPayload>) -> Self {
        Self { identity }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<&IdentityPayload> {
        self.identity.as_ref()
    }
}

/// Identity of a caller that must be authenticated.
#[derive(Debug, Clone)]
pub struct Auth(pub IdentityPayload);

impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .and_then(|context| context.identity.clone())
            .map(Auth)
            .ok_or_else(|| AuthError::MissingCredentials.into())
    }
}

/// Identity of the caller, if any credentials were presented.
#[derive(Debug, Clone)]
pub struct MaybeAuth(pub Option<IdentityPayload>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeAuth {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(
            parts
                .extensions
                .get::<AuthContext>()
                .and_then(|context| context.identity.clone()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{normalize, NormalizedBody};
    use axum::http::{Request, StatusCode};

    fn parts_with(context: Option<AuthContext>) -> Parts {
        let mut request = Request::builder().uri("/").body(()).unwrap();
        if let Some(context) = context {
            request.extensions_mut().insert(context);
        }
        request.into_parts().0
    }

    fn jake() -> IdentityPayload {
        IdentityPayload::new("u1", "jake@jake.jake", "jake")
    }

    #[tokio::test]
    async fn auth_reads_identity() {
        let mut parts = parts_with(Some(AuthContext::new(Some(jake()))));
        let Auth(identity) = Auth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(identity, jake());
    }

    #[tokio::test]
    async fn auth_rejects_anonymous_context() {
        let mut parts = parts_with(Some(AuthContext::anonymous()));
        let err = Auth::from_request_parts(&mut parts, &()).await.unwrap_err();
        let normalized = normalize(&err);
        assert_eq!(normalized.status, StatusCode::UNAUTHORIZED);
        assert!(matches!(normalized.body, NormalizedBody::Errors(ref e) if e.contains_key("invalid_request")));
    }

    #[tokio::test]
    async fn maybe_auth_is_none_without_context() {
        let mut parts = parts_with(None);
        let MaybeAuth(identity) = MaybeAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn maybe_auth_reads_identity() {
        let mut parts = parts_with(Some(AuthContext::new(Some(jake()))));
        let MaybeAuth(identity) = MaybeAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(identity, Some(jake()));
    }
}
