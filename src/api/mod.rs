// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # HTTP API
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | POST | `/api/users` | none |
//! | POST | `/api/users/login` | none |
//! | GET, PUT | `/api/user` | required |
//! | GET | `/api/profiles/{username}` | optional |
//! | POST, DELETE | `/api/profiles/{username}/follow` | required |
//! | GET | `/health/live`, `/health/ready` | none |
//!
//! Swagger UI is served at `/docs`, the document at `/api-doc/openapi.json`.

use axum::{
    middleware::from_fn_with_state,
    response::Redirect,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{authenticate, AuthMode, IdentityPayload},
    error::ErrorBody,
    models::{
        LoginPayload, LoginRequest, NewUserPayload, NewUserRequest, Profile, ProfileResponse,
        UpdateUserPayload, UpdateUserRequest, UserBody, UserResponse,
    },
    state::AppState,
};

pub mod extract;
pub mod health;
pub mod profiles;
pub mod users;

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/users", post(users::register))
        .route("/users/login", post(users::login));

    let authenticated = Router::new()
        .route("/user", get(users::current_user).put(users::update_user))
        .route(
            "/profiles/{username}/follow",
            post(profiles::follow).delete(profiles::unfollow),
        )
        .route_layer(from_fn_with_state(
            state.gate(AuthMode::Required),
            authenticate,
        ));

    let maybe_authenticated = Router::new()
        .route("/profiles/{username}", get(profiles::get_profile))
        .route_layer(from_fn_with_state(
            state.gate(AuthMode::Optional),
            authenticate,
        ));

    let api_routes = public
        .merge(authenticated)
        .merge(maybe_authenticated)
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .route("/", get(|| async { Redirect::temporary("/docs") }))
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
}

/// Registers the `Token` header scheme used by authenticated routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "Token",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "Prefix the token with \"Token \", e.g. \"Token xxxx.yyyy.zzzz\"",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "RealWorld API",
        description = "Users, profiles and follows with JWT authentication."
    ),
    paths(
        users::register,
        users::login,
        users::current_user,
        users::update_user,
        profiles::get_profile,
        profiles::follow,
        profiles::unfollow,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            NewUserRequest,
            NewUserPayload,
            LoginRequest,
            LoginPayload,
            UpdateUserRequest,
            UpdateUserPayload,
            UserResponse,
            UserBody,
            ProfileResponse,
            Profile,
            IdentityPayload,
            ErrorBody,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Users", description = "Registration and login"),
        (name = "User", description = "The authenticated user's account"),
        (name = "Profile", description = "Public profiles and follows"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
