// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! RealWorld Server - Users, Profiles and Follows
//!
//! A Conduit-style REST backend with stateless JWT authentication and a
//! single, uniform error envelope.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and router (Axum)
//! - `auth` - Token codec, auth gate and extractors
//! - `error` - Error taxonomy and response normalization
//! - `service` - User and profile business logic
//! - `storage` - SQLite persistence (sqlx)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;
pub mod state;
pub mod storage;
