// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use crate::error::HttpException;

/// Why a presented token was refused by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFailure {
    /// Signature does not match the configured secret
    Signature,
    /// `exp` is not in the future
    Expired,
    /// `aud` does not name this service
    Audience,
    /// Not a decodable JWT at all
    Malformed,
}

impl TokenFailure {
    /// Reason code reported by the codec.
    pub fn reason(&self) -> &'static str {
        match self {
            TokenFailure::Signature | TokenFailure::Audience => "invalid_token",
            TokenFailure::Expired => "expired",
            TokenFailure::Malformed => "invalid_request",
        }
    }
}

/// Authentication error type.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// `Authorization` header is not `<scheme> <token>`
    #[error("invalid credentials structure")]
    MalformedCredentials,
    /// No header and no cookie on a route that requires auth
    #[error("no authorization included in request")]
    MissingCredentials,
    /// Token failed signature, expiry, audience or decoding checks
    #[error("token verification failure ({})", .0.reason())]
    InvalidToken(TokenFailure),
    /// Token verified but its claims are not a valid identity
    #[error("JWT payload validation failed")]
    InvalidPayload,
    /// Token could not be produced
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// `error` parameter of the bearer challenge.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MalformedCredentials | AuthError::MissingCredentials => "invalid_request",
            AuthError::InvalidToken(_) | AuthError::InvalidPayload => "invalid_token",
            AuthError::Signing(_) => "server_error",
        }
    }

    /// `error_description` parameter of the bearer challenge.
    pub fn description(&self) -> &'static str {
        match self {
            AuthError::MalformedCredentials => "invalid credentials structure",
            AuthError::MissingCredentials => "no authorization included in request",
            AuthError::InvalidToken(TokenFailure::Expired) => "token expired",
            AuthError::InvalidToken(_) => "token verification failure",
            AuthError::InvalidPayload => "JWT payload validation failed",
            AuthError::Signing(_) => "token could not be issued",
        }
    }

    /// 401 response carrying this error as a bearer challenge.
    pub fn challenge(&self, realm: Option<&str>) -> HttpException {
        HttpException::unauthorized(realm, self.error_code(), self.description())
    }
}
