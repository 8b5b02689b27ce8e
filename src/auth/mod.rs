// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless JWT authentication for the RealWorld API.
//!
//! ## Auth Flow
//!
//! 1. Client registers or logs in and receives a token in `user.token`
//! 2. Client sends `Authorization: Token <jwt>` (any single-word scheme works)
//! 3. Server:
//!    - Verifies the HS256 signature against `JWT_SECRET`
//!    - Checks `exp` (24 hour lifetime, no leeway) and `aud`
//!    - Validates the `{ uid, email, username }` payload
//!
//! ## Route Modes
//!
//! | Mode | No credentials | Invalid credentials |
//! |------|----------------|---------------------|
//! | Required | 401 `invalid_request` | 401 `invalid_token` |
//! | Optional | anonymous | 401 `invalid_token` |

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod token;

pub use claims::{IdentityPayload, TokenClaims};
pub use error::{AuthError, TokenFailure};
pub use extractor::{Auth, AuthContext, MaybeAuth};
pub use middleware::{authenticate, AuthGate, AuthMode};
pub use token::{TokenCodec, TOKEN_TTL_SECS};
