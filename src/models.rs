// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. Every body is wrapped in a
//! single top-level key (`user` or `profile`), as RealWorld clients expect.
//!
//! Request types derive `Validate`; field failures are reported as 422 with
//! dotted keys such as `user.email`.

use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::storage::User;

/// Message reported for passwords that fail the strength rule.
pub const PASSWORD_RULE_MESSAGE: &str =
    "must be at least 8 characters and contain uppercase, lowercase, and numbers";

const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 100;
const PASSWORD_SYMBOLS: &str = "@$!%*?&";

/// Registration password rule: 8 to 100 characters from `[A-Za-z0-9@$!%*?&]`,
/// with at least one lowercase letter, one uppercase letter and one digit.
fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c));
    let strong = password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit());

    if (PASSWORD_MIN..=PASSWORD_MAX).contains(&len) && allowed && strong {
        Ok(())
    } else {
        Err(ValidationError::new("password").with_message(Cow::Borrowed(PASSWORD_RULE_MESSAGE)))
    }
}

// =============================================================================
// Requests
// =============================================================================

/// `POST /api/users` body.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewUserRequest {
    #[validate(nested)]
    pub user: NewUserPayload,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewUserPayload {
    #[validate(email)]
    #[schema(example = "jake@jake.jake")]
    pub email: String,
    #[validate(length(min = 2))]
    #[schema(example = "jake")]
    pub username: String,
    #[validate(custom(function = "validate_password"))]
    #[schema(example = "hunter2A")]
    pub password: String,
    #[validate(length(min = 2))]
    #[serde(default)]
    pub bio: Option<String>,
    #[validate(url)]
    #[serde(default)]
    pub image: Option<String>,
}

/// `POST /api/users/login` body.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(nested)]
    pub user: LoginPayload,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(email)]
    #[schema(example = "jake@jake.jake")]
    pub email: String,
    #[validate(length(min = 1, message = "can't be blank"))]
    #[schema(example = "hunter2A")]
    pub password: String,
}

/// `PUT /api/user` body. Absent fields are left unchanged; `bio` and `image`
/// may also be sent as `null` to clear them.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(nested)]
    pub user: UpdateUserPayload,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserPayload {
    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
    #[validate(length(min = 2))]
    #[serde(default)]
    pub username: Option<String>,
    #[validate(custom(function = "validate_password"))]
    #[serde(default)]
    pub password: Option<String>,
    /// `Some(None)` clears the bio
    #[validate(length(min = 2))]
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, example = "I work at statefarm")]
    pub bio: Option<Option<String>>,
    /// `Some(None)` clears the image
    #[validate(url)]
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, example = "https://api.realworld.io/images/smiley-cyrus.jpg")]
    pub image: Option<Option<String>>,
}

/// Keep an explicit `null` apart from an absent field.
fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

// =============================================================================
// Responses
// =============================================================================

/// `{ "user": ... }` envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserResponse {
    pub user: UserBody,
}

/// The authenticated user, with a freshly minted token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserBody {
    pub email: String,
    /// JWT for the `Authorization: Token <jwt>` header
    pub token: String,
    pub username: String,
    pub bio: Option<String>,
    pub image: Option<String>,
}

impl UserResponse {
    pub fn new(user: User, token: String) -> Self {
        Self {
            user: UserBody {
                email: user.email,
                token,
                username: user.username,
                bio: user.bio,
                image: user.image,
            },
        }
    }
}

/// `{ "profile": ... }` envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ProfileResponse {
    pub profile: Profile,
}

/// Public view of a user, relative to the viewer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Profile {
    pub username: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    /// Whether the viewer follows this user; `false` for anonymous viewers
    pub following: bool,
}

impl ProfileResponse {
    pub fn new(user: User, following: bool) -> Self {
        Self {
            profile: Profile {
                username: user.username,
                bio: user.bio,
                image: user.image,
                following,
            },
        }
    }
}
