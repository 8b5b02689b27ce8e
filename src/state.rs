// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthGate, AuthMode, TokenCodec};
use crate::config::AuthConfig;
use crate::storage::Database;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenCodec>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(db: Database, auth: AuthConfig) -> Self {
        Self {
            db,
            tokens: Arc::new(TokenCodec::new(&auth)),
            auth,
        }
    }

    /// Auth gate for a route subtree in the given mode.
    pub fn gate(&self, mode: AuthMode) -> AuthGate {
        AuthGate::new(self.tokens.clone(), mode).with_cookie(self.auth.cookie.clone())
    }
}
