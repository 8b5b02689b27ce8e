// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token minting and verification (HS256).
//!
//! Tokens are never stored server side. Validity is the signature plus a
//! fixed 24 hour lifetime; there is no revocation.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use validator::Validate;

use super::claims::{IdentityPayload, TokenClaims};
use super::error::{AuthError, TokenFailure};
use crate::config::AuthConfig;

/// Token lifetime in seconds (24 hours).
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Signs and verifies identity tokens with a symmetric secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    audience: String,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            audience: config.audience.clone(),
        }
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Mint a token issued now.
    pub fn mint(&self, payload: &IdentityPayload) -> Result<String, AuthError> {
        self.mint_at(payload, Utc::now())
    }

    /// Mint a token as if issued at `issued_at`.
    pub fn mint_at(
        &self,
        payload: &IdentityPayload,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let iat = issued_at.timestamp();
        let claims = TokenClaims {
            identity: payload.clone(),
            iat,
            exp: iat + TOKEN_TTL_SECS,
            aud: self.audience.clone(),
        };
        encode(&Header::new(ALGORITHM), &claims, &self.encoding).map_err(AuthError::Signing)
    }

    /// Verify a token and return the identity it carries.
    ///
    /// Signature, expiry (`now < exp`, no leeway) and audience are checked
    /// first; the claims must then form a valid [`IdentityPayload`].
    pub fn verify(&self, token: &str) -> Result<IdentityPayload, AuthError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "aud"]);

        let data = decode::<serde_json::Value>(token, &self.decoding, &validation)
            .map_err(|e| AuthError::InvalidToken(classify(e.kind())))?;

        let exp = data.claims.get("exp").and_then(serde_json::Value::as_i64);
        if exp.is_none_or(|exp| exp <= Utc::now().timestamp()) {
            return Err(AuthError::InvalidToken(TokenFailure::Expired));
        }

        let payload: IdentityPayload =
            serde_json::from_value(data.claims).map_err(|_| AuthError::InvalidPayload)?;
        payload.validate().map_err(|_| AuthError::InvalidPayload)?;

        Ok(payload)
    }
}

fn classify(kind: &ErrorKind) -> TokenFailure {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenFailure::Signature,
        ErrorKind::ExpiredSignature => TokenFailure::Expired,
        ErrorKind::InvalidAudience => TokenFailure::Audience,
        _ => TokenFailure::Malformed,
    }
}
