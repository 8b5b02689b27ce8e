// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration, login and the caller's own account.

use axum::{extract::State, http::StatusCode, Json};

use super::extract::ValidatedJson;
use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::{LoginRequest, NewUserRequest, UpdateUserRequest, UserResponse},
    service::UserService,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = NewUserRequest,
    tag = "Users",
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 409, description = "Email or username already taken", body = ErrorBody),
        (status = 422, description = "Invalid request body", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<NewUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let response = UserService::new(&state.db, &state.tokens)
        .register(request)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginRequest,
    tag = "Users",
    responses(
        (status = 200, description = "Signed in", body = UserResponse),
        (status = 401, description = "Email or password is invalid", body = ErrorBody),
        (status = 422, description = "Invalid request body", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let response = UserService::new(&state.db, &state.tokens)
        .login(request)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/user",
    tag = "User",
    security(("Token" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn current_user(
    State(state): State<AppState>,
    Auth(identity): Auth,
) -> Result<Json<UserResponse>, ApiError> {
    let response = UserService::new(&state.db, &state.tokens)
        .current(&identity.uid)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/api/user",
    request_body = UpdateUserRequest,
    tag = "User",
    security(("Token" = [])),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 409, description = "Email or username already taken", body = ErrorBody),
        (status = 422, description = "Invalid request body", body = ErrorBody)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Auth(identity): Auth,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let response = UserService::new(&state.db, &state.tokens)
        .update(&identity.uid, request)
        .await?;
    Ok(Json(response))
}
