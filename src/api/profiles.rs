// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public profiles and follow edges.

use axum::{extract::State, Json};

use super::extract::PathParams;
use crate::{
    auth::{Auth, MaybeAuth},
    error::{ApiError, ErrorBody},
    models::ProfileResponse,
    service::UserService,
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/profiles/{username}",
    params(("username" = String, Path, description = "Username of the profile")),
    tag = "Profile",
    security((), ("Token" = [])),
    responses(
        (status = 200, description = "Profile, with `following` relative to the caller", body = ProfileResponse),
        (status = 400, description = "Undecodable username segment", body = ErrorBody),
        (status = 401, description = "Invalid token", body = ErrorBody),
        (status = 404, description = "No such user", body = ErrorBody)
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    MaybeAuth(viewer): MaybeAuth,
    PathParams(username): PathParams<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let viewer = viewer.as_ref().map(|identity| identity.uid.as_str());
    let response = UserService::new(&state.db, &state.tokens)
        .profile(&username, viewer)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/profiles/{username}/follow",
    params(("username" = String, Path, description = "Username to follow")),
    tag = "Profile",
    security(("Token" = [])),
    responses(
        (status = 200, description = "Now following", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "No such user", body = ErrorBody),
        (status = 422, description = "Cannot follow yourself", body = ErrorBody)
    )
)]
pub async fn follow(
    State(state): State<AppState>,
    Auth(identity): Auth,
    PathParams(username): PathParams<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let response = UserService::new(&state.db, &state.tokens)
        .follow(&username, &identity.uid)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/api/profiles/{username}/follow",
    params(("username" = String, Path, description = "Username to unfollow")),
    tag = "Profile",
    security(("Token" = [])),
    responses(
        (status = 200, description = "No longer following", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "No such user", body = ErrorBody),
        (status = 422, description = "Cannot unfollow yourself", body = ErrorBody)
    )
)]
pub async fn unfollow(
    State(state): State<AppState>,
    Auth(identity): Auth,
    PathParams(username): PathParams<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let response = UserService::new(&state.db, &state.tokens)
        .unfollow(&username, &identity.uid)
        .await?;
    Ok(Json(response))
}
