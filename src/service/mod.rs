// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Business logic behind the HTTP handlers.

pub mod password;
pub mod users;

pub use users::UserService;
