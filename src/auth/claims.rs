// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the authenticated identity they carry.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// The authenticated principal.
///
/// Reconstructed from a verified token on every request, never stored on its
/// own. A payload that fails validation is rejected as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct IdentityPayload {
    /// Stable user identifier (`users.id`)
    #[validate(length(min = 1))]
    pub uid: String,
    /// Email address at the time the token was minted
    #[validate(email)]
    pub email: String,
    /// Username at the time the token was minted
    pub username: String,
}

impl IdentityPayload {
    pub fn new(
        uid: impl Into<String>,
        email: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            username: username.into(),
        }
    }
}

/// Full claim set signed into a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(flatten)]
    pub identity: IdentityPayload,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
    /// Audience, the service's package name
    pub aud: String,
}
