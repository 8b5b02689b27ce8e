// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! End-to-end tests driving the full router against in-memory SQLite.

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, WWW_AUTHENTICATE},
        Method, Request, StatusCode,
    },
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use realworld_server::{
    api::router,
    auth::{IdentityPayload, TokenCodec},
    config::AuthConfig,
    state::AppState,
    storage::Database,
};

const SECRET: &str = "integration-secret";

struct TestApp {
    router: Router,
    codec: TokenCodec,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_auth(AuthConfig::new(SECRET)).await
    }

    async fn with_auth(auth: AuthConfig) -> Self {
        let db = Database::in_memory().await.unwrap();
        Self {
            codec: TokenCodec::new(&auth),
            router: router(AppState::new(db, auth)),
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, axum::http::HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Token {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    /// Register `name` and return its token.
    async fn register(&self, name: &str) -> String {
        let (status, _, body) = self
            .send(
                Method::POST,
                "/api/users",
                None,
                Some(json!({"user": {
                    "email": format!("{name}@example.com"),
                    "username": name,
                    "password": "hunter2A"
                }})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["user"]["token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn register_login_and_fetch_current_user() {
    let app = TestApp::new().await;
    let token = app.register("jake").await;

    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({"user": {"email": "jake@example.com", "password": "hunter2A"}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "jake");
    assert_eq!(body["user"]["bio"], Value::Null);

    let (status, _, body) = app.send(Method::GET, "/api/user", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "jake@example.com");
    assert!(body["user"]["token"].is_string());
}

#[tokio::test]
async fn current_user_without_token_is_challenged() {
    let app = TestApp::new().await;
    let (status, headers, body) = app.send(Method::GET, "/api/user", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"errors":{"invalid_request":["no authorization included in request"]}})
    );
    let challenge = headers[WWW_AUTHENTICATE].to_str().unwrap();
    assert!(challenge.starts_with("Bearer realm=\""), "{challenge}");
    assert!(challenge.ends_with(r#"error="invalid_request", error_description="no authorization included in request""#));
}

#[tokio::test]
async fn malformed_authorization_header() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .uri("/api/user")
        .header(AUTHORIZATION, "abc def ghi")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = app.dispatch(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({"errors":{"invalid_request":["invalid credentials structure"]}})
    );
}

#[tokio::test]
async fn expired_and_foreign_tokens_are_rejected() {
    let app = TestApp::new().await;
    app.register("jake").await;
    let identity = IdentityPayload::new("any", "jake@example.com", "jake");

    let expired = app
        .codec
        .mint_at(&identity, Utc::now() - Duration::hours(25))
        .unwrap();
    let (status, _, body) = app.send(Method::GET, "/api/user", Some(expired.as_str()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"errors":{"invalid_token":["token expired"]}}));

    let foreign = TokenCodec::new(&AuthConfig::new("someone-else"))
        .mint(&identity)
        .unwrap();
    let (status, _, body) = app.send(Method::GET, "/api/user", Some(foreign.as_str()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"errors":{"invalid_token":["token verification failure"]}}));
}

#[tokio::test]
async fn token_from_cookie_when_configured() {
    let app = TestApp::with_auth(AuthConfig::new(SECRET).with_cookie("jwt")).await;
    let token = app.register("jake").await;

    let request = Request::builder()
        .uri("/api/user")
        .header(COOKIE, format!("jwt={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = app.dispatch(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "jake");
}

#[tokio::test]
async fn duplicate_registration_reports_both_fields() {
    let app = TestApp::new().await;
    app.register("jake").await;

    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/users",
            None,
            Some(json!({"user": {"email": "jake@example.com", "username": "jake", "password": "hunter2A"}})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        json!({"errors":{"user.email":["is already taken"],"user.username":["is already taken"]}})
    );
}

#[tokio::test]
async fn invalid_registration_is_422() {
    let app = TestApp::new().await;
    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/users",
            None,
            Some(json!({"user": {"email": "not-an-email", "username": "jake", "password": "weakpass"}})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["user.email"], json!(["must be a valid email"]));
    assert_eq!(
        body["errors"]["user.password"],
        json!(["must be at least 8 characters and contain uppercase, lowercase, and numbers"])
    );
}

#[tokio::test]
async fn wrong_password_is_401() {
    let app = TestApp::new().await;
    app.register("jake").await;

    let (status, headers, body) = app
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({"user": {"email": "jake@example.com", "password": "Wrong123"}})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"errors":{"email or password":["is invalid"]}}));
    assert!(headers.get(WWW_AUTHENTICATE).is_none());
}

#[tokio::test]
async fn update_user_returns_fresh_token() {
    let app = TestApp::new().await;
    let token = app.register("jake").await;

    let (status, _, body) = app
        .send(
            Method::PUT,
            "/api/user",
            Some(token.as_str()),
            Some(json!({"user": {"username": "jacob", "bio": "I work at statefarm"}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "jacob");
    assert_eq!(body["user"]["bio"], "I work at statefarm");

    let fresh = body["user"]["token"].as_str().unwrap();
    assert_eq!(app.codec.verify(fresh).unwrap().username, "jacob");
}

#[tokio::test]
async fn update_user_null_clears_bio_and_image() {
    let app = TestApp::new().await;
    let token = app.register("jake").await;

    let (status, _, body) = app
        .send(
            Method::PUT,
            "/api/user",
            Some(token.as_str()),
            Some(json!({"user": {
                "bio": "I work at statefarm",
                "image": "https://api.realworld.io/images/smiley-cyrus.jpg"
            }})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["bio"], "I work at statefarm");

    let (status, _, body) = app
        .send(
            Method::PUT,
            "/api/user",
            Some(token.as_str()),
            Some(json!({"user": {"bio": null, "image": null}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["bio"], Value::Null);
    assert_eq!(body["user"]["image"], Value::Null);

    let (_, _, body) = app.send(Method::GET, "/api/profiles/jake", None, None).await;
    assert_eq!(body["profile"]["bio"], Value::Null);
    assert_eq!(body["profile"]["image"], Value::Null);
}

#[tokio::test]
async fn profile_following_depends_on_viewer() {
    let app = TestApp::new().await;
    let jake = app.register("jake").await;
    app.register("anna").await;

    let (status, _, body) = app
        .send(Method::POST, "/api/profiles/anna/follow", Some(jake.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["following"], true);

    let (_, _, body) = app.send(Method::GET, "/api/profiles/anna", Some(jake.as_str()), None).await;
    assert_eq!(
        body,
        json!({"profile": {"username": "anna", "bio": null, "image": null, "following": true}})
    );

    let (status, _, body) = app.send(Method::GET, "/api/profiles/anna", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["following"], false);

    let (status, _, body) = app
        .send(Method::DELETE, "/api/profiles/anna/follow", Some(jake.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["following"], false);
}

#[tokio::test]
async fn optional_route_rejects_invalid_token() {
    let app = TestApp::new().await;
    app.register("anna").await;

    let (status, headers, body) = app
        .send(Method::GET, "/api/profiles/anna", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"errors":{"invalid_token":["token verification failure"]}}));
    assert!(headers.contains_key(WWW_AUTHENTICATE));
}

#[tokio::test]
async fn following_yourself_is_422() {
    let app = TestApp::new().await;
    let jake = app.register("jake").await;

    let (status, _, body) = app
        .send(Method::POST, "/api/profiles/jake/follow", Some(jake.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body,
        json!({"errors":{"profile":["cannot be followed/unfollowed by yourself"]}})
    );
}

#[tokio::test]
async fn unknown_profile_is_404() {
    let app = TestApp::new().await;
    let (status, _, body) = app.send(Method::GET, "/api/profiles/ghost", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"errors":{"user":["not found"]}}));
}

#[tokio::test]
async fn undecodable_username_uses_error_envelope() {
    let app = TestApp::new().await;
    let token = app.register("jake").await;

    for (method, uri, token) in [
        (Method::GET, "/api/profiles/%FF", None),
        (Method::POST, "/api/profiles/%FF/follow", Some(token.as_str())),
        (Method::DELETE, "/api/profiles/%FF/follow", Some(token.as_str())),
    ] {
        let (status, headers, body) = app.send(method, uri, token, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        let message = body["errors"]["params"][0].as_str().unwrap();
        assert!(message.contains("username"), "{message}");
    }
}

#[tokio::test]
async fn token_for_deleted_user_is_404() {
    let app = TestApp::new().await;
    let identity = IdentityPayload::new("no-such-id", "ghost@example.com", "ghost");
    let token = app.codec.mint(&identity).unwrap();

    let (status, _, body) = app.send(Method::GET, "/api/user", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"errors":{"user":["not found"]}}));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;
    let (status, _, body) = app.send(Method::GET, "/api-doc/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/users"].is_object());
    assert_eq!(body["components"]["securitySchemes"]["Token"]["name"], "Authorization");
}

#[tokio::test]
async fn challenge_realm_is_the_full_request_url() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .uri("/api/user")
        .header(axum::http::header::HOST, "localhost:3000")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = app.dispatch(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        headers[WWW_AUTHENTICATE],
        r#"Bearer realm="http://localhost:3000/api/user", error="invalid_request", error_description="no authorization included in request""#
    );
}
