// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User and profile operations.
//!
//! Every operation that returns a `{ user }` body mints a fresh token from
//! the stored row, so email or username changes are reflected immediately.

use axum::http::StatusCode;
use tracing::info;

use super::password::{hash_password, verify_password};
use crate::auth::{IdentityPayload, TokenCodec};
use crate::error::{error_map, ApiError, RealWorldError};
use crate::models::{
    LoginRequest, NewUserRequest, ProfileResponse, UpdateUserRequest, UserResponse,
};
use crate::storage::{Database, NewUser, UniqueField, User, UserChanges};

const ENTITY: &str = "user";

/// User operations bound to a database and token codec.
pub struct UserService<'a> {
    db: &'a Database,
    tokens: &'a TokenCodec,
}

impl<'a> UserService<'a> {
    pub fn new(db: &'a Database, tokens: &'a TokenCodec) -> Self {
        Self { db, tokens }
    }

    /// Create an account and sign the new user in.
    pub async fn register(&self, request: NewUserRequest) -> Result<UserResponse, ApiError> {
        let user = request.user;
        self.assert_no_conflicts(
            [
                (UniqueField::Email, Some(user.email.as_str())),
                (UniqueField::Username, Some(user.username.as_str())),
            ],
            None,
        )
        .await?;

        let created = self
            .db
            .users()
            .create(NewUser {
                email: user.email,
                username: user.username,
                password_hash: hash_password(&user.password)?,
                bio: user.bio,
                image: user.image,
            })
            .await?;

        info!(user_id = %created.id, "user registered");
        self.signed_in(created)
    }

    /// Exchange email and password for a token.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> Result<UserResponse, ApiError> {
        let credentials = request.user;
        let user = match self.db.users().find_by_email(&credentials.email).await {
            Ok(user) => user,
            Err(err) if err.is_not_found() => return Err(invalid_credentials()),
            Err(err) => return Err(err.into()),
        };

        if !verify_password(&credentials.password, &user.password_hash) {
            return Err(invalid_credentials());
        }

        self.signed_in(user)
    }

    /// The caller's own account.
    pub async fn current(&self, uid: &str) -> Result<UserResponse, ApiError> {
        let user = self.db.users().find_by_id(uid).await?;
        self.signed_in(user)
    }

    /// Apply a partial update to the caller's own account.
    pub async fn update(&self, uid: &str, request: UpdateUserRequest) -> Result<UserResponse, ApiError> {
        let changes = request.user;
        self.assert_no_conflicts(
            [
                (UniqueField::Email, changes.email.as_deref()),
                (UniqueField::Username, changes.username.as_deref()),
            ],
            Some(uid),
        )
        .await?;

        let password_hash = changes
            .password
            .as_deref()
            .map(hash_password)
            .transpose()?;

        let updated = self
            .db
            .users()
            .update(
                uid,
                UserChanges {
                    email: changes.email,
                    username: changes.username,
                    password_hash,
                    bio: changes.bio,
                    image: changes.image,
                },
            )
            .await?;

        self.signed_in(updated)
    }

    /// Public profile of `username`, as seen by `viewer`.
    pub async fn profile(&self, username: &str, viewer: Option<&str>) -> Result<ProfileResponse, ApiError> {
        let users = self.db.users();
        let target = users.find_by_username(username).await?;
        let following = match viewer {
            Some(viewer) => users.is_following(viewer, &target.id).await?,
            None => false,
        };
        Ok(ProfileResponse::new(target, following))
    }

    pub async fn follow(&self, username: &str, uid: &str) -> Result<ProfileResponse, ApiError> {
        let users = self.db.users();
        let target = users.find_by_username(username).await?;
        if target.id == uid {
            return Err(ApiError::self_follow());
        }
        users.follow(uid, &target.id).await?;
        Ok(ProfileResponse::new(target, true))
    }

    pub async fn unfollow(&self, username: &str, uid: &str) -> Result<ProfileResponse, ApiError> {
        let users = self.db.users();
        let target = users.find_by_username(username).await?;
        if target.id == uid {
            return Err(ApiError::self_follow());
        }
        users.unfollow(uid, &target.id).await?;
        Ok(ProfileResponse::new(target, false))
    }

    /// Fail with a 409 naming every unique field whose value is already used
    /// by another row. `None` values are skipped.
    async fn assert_no_conflicts<const N: usize>(
        &self,
        fields: [(UniqueField, Option<&str>); N],
        except_id: Option<&str>,
    ) -> Result<(), ApiError> {
        let users = self.db.users();
        let mut taken = Vec::new();
        for (field, value) in fields {
            let Some(value) = value else { continue };
            if users.field_taken(field, value, except_id).await? {
                taken.push(field.as_str());
            }
        }

        if taken.is_empty() {
            Ok(())
        } else {
            Err(ApiError::conflict(ENTITY, taken))
        }
    }

    fn signed_in(&self, user: User) -> Result<UserResponse, ApiError> {
        let identity = IdentityPayload::new(&user.id, &user.email, &user.username);
        let token = self.tokens.mint(&identity)?;
        Ok(UserResponse::new(user, token))
    }
}

fn invalid_credentials() -> ApiError {
    RealWorldError::new(error_map("email or password", "is invalid"))
        .with_status(StatusCode::UNAUTHORIZED)
        .into()
}
