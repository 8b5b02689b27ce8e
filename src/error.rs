// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Error Normalization
//!
//! Every failure a handler can produce is an [`ApiError`]. The enum is closed:
//! [`normalize`] matches it exhaustively, so a new variant cannot be added
//! without deciding how it renders.
//!
//! All error responses share one envelope:
//!
//! ```json
//! { "errors": { "user.email": ["is already taken"] } }
//! ```
//!
//! Statuses in [`NORMAL_STATUS_CODES`] are expected client-facing outcomes and
//! are never logged. Anything else is logged with full detail server-side,
//! while the body only carries a generic message.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use axum::{
    body::{Body, Bytes},
    extract::rejection::{JsonRejection, PathRejection},
    http::{
        header::{CONTENT_TYPE, WWW_AUTHENTICATE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::auth::AuthError;
use crate::storage::DataAccessError;

/// Field-or-category name to ordered messages.
pub type ErrorMap = BTreeMap<String, Vec<String>>;

/// Statuses that represent expected outcomes and are not logged.
pub const NORMAL_STATUS_CODES: [u16; 6] = [400, 401, 403, 404, 409, 422];

/// Message used for the catch-all `unknown` category.
pub const DEFAULT_ERROR_MESSAGE: &str = "an error occurred";

/// Entity name used when a not-found error carries no model metadata.
pub const DEFAULT_ENTITY_NAME: &str = "database";

static CHALLENGE_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\berror="([^"]+)""#).expect("valid regex"));
static CHALLENGE_DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\berror_description="([^"]+)""#).expect("valid regex"));
static MISSING_RECORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"No '([^']+)' record").expect("valid regex"));

/// Build a map with a single key and message.
pub fn error_map(key: impl Into<String>, message: impl Into<String>) -> ErrorMap {
    ErrorMap::from([(key.into(), vec![message.into()])])
}

/// Wire envelope for error responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub errors: ErrorMap,
}

/// Free-form domain error with an explicit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealWorldError {
    pub status: StatusCode,
    pub errors: ErrorMap,
}

impl RealWorldError {
    /// A 400 error carrying the given field messages.
    pub fn new(errors: ErrorMap) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            errors,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl std::fmt::Display for RealWorldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered = serde_json::to_string(&self.errors).map_err(|_| std::fmt::Error)?;
        write!(f, "{rendered}")
    }
}

/// A pre-built HTTP response raised as an error.
///
/// This is how the auth gate reports rejections: a status, headers (notably
/// `WWW-Authenticate`) and a body, which the normalizer re-renders.
#[derive(Debug, Clone)]
pub struct HttpException {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpException {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// 401 with a bearer challenge and a matching JSON body.
    ///
    /// The challenge has the form
    /// `Bearer realm="<realm>", error="<code>", error_description="<text>"`;
    /// the realm is omitted when unknown.
    pub fn unauthorized(realm: Option<&str>, code: &str, description: &str) -> Self {
        let challenge = match realm {
            Some(realm) => format!(
                r#"Bearer realm="{}", error="{code}", error_description="{description}""#,
                realm.replace('"', "%22")
            ),
            None => format!(r#"Bearer error="{code}", error_description="{description}""#),
        };

        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            headers.insert(WWW_AUTHENTICATE, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let body = serde_json::to_vec(&ErrorBody {
            errors: error_map(code, description),
        })
        .unwrap_or_default();

        Self::new(StatusCode::UNAUTHORIZED, headers, body)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    fn is_json(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"))
    }
}

impl std::fmt::Display for HttpException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}: {}", self.status, String::from_utf8_lossy(&self.body))
    }
}

/// Every failure a request can end in.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unique fields already used by another row
    #[error("conflicting {entity} fields: {fields:?}")]
    Conflict { entity: String, fields: Vec<String> },

    /// Action aimed at the caller themself where that is not allowed
    #[error("self-referencing {target}: {message}")]
    SelfReference { target: String, message: String },

    /// Free-form domain error
    #[error("{0}")]
    RealWorld(RealWorldError),

    /// Request body failed schema validation
    #[error("validation failed: {0:?}")]
    Validation(ErrorMap),

    /// Pre-built HTTP response, e.g. an auth challenge
    #[error("{0}")]
    Http(HttpException),

    /// Persistence-layer failure
    #[error(transparent)]
    Database(#[from] DataAccessError),

    /// Anything unclassified
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl ApiError {
    pub fn conflict<I, S>(entity: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ApiError::Conflict {
            entity: entity.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// The caller tried to follow or unfollow their own profile.
    pub fn self_follow() -> Self {
        ApiError::SelfReference {
            target: "profile".to_string(),
            message: "cannot be followed/unfollowed by yourself".to_string(),
        }
    }

    pub fn unknown(message: impl std::fmt::Display) -> Self {
        ApiError::Unknown(anyhow::anyhow!("{message}"))
    }
}

impl From<RealWorldError> for ApiError {
    fn from(err: RealWorldError) -> Self {
        ApiError::RealWorld(err)
    }
}

impl From<HttpException> for ApiError {
    fn from(err: HttpException) -> Self {
        ApiError::Http(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err.into())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Signing(_) => ApiError::Unknown(anyhow::Error::new(err)),
            other => ApiError::Http(other.challenge(None)),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut map = ErrorMap::new();
        flatten_validation_errors(&errors, None, &mut map);
        ApiError::Validation(map)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(error_map("body", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        RealWorldError::new(error_map("params", rejection.body_text()))
            .with_status(rejection.status())
            .into()
    }
}

/// Body of a normalized error.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedBody {
    /// `{ "errors": ... }` envelope
    Errors(ErrorMap),
    /// Body forwarded unchanged from an [`HttpException`]
    Passthrough {
        content_type: Option<HeaderValue>,
        body: Bytes,
    },
}

/// Wire-ready rendering of an [`ApiError`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedError {
    pub status: StatusCode,
    pub body: NormalizedBody,
    /// Challenge forwarded from an auth rejection
    pub www_authenticate: Option<HeaderValue>,
    pub should_log: bool,
}

impl NormalizedError {
    fn errors(status: StatusCode, errors: ErrorMap) -> Self {
        Self {
            status,
            body: NormalizedBody::Errors(errors),
            www_authenticate: None,
            should_log: should_log(status),
        }
    }
}

/// Whether a response with this status is logged.
pub fn should_log(status: StatusCode) -> bool {
    !NORMAL_STATUS_CODES.contains(&status.as_u16())
}

/// Map an error to its status and body.
pub fn normalize(err: &ApiError) -> NormalizedError {
    match err {
        ApiError::Conflict { entity, fields } => {
            let errors = fields
                .iter()
                .map(|field| (format!("{entity}.{field}"), vec!["is already taken".to_string()]))
                .collect();
            NormalizedError::errors(StatusCode::CONFLICT, errors)
        }
        ApiError::SelfReference { target, message } => {
            NormalizedError::errors(StatusCode::UNPROCESSABLE_ENTITY, error_map(target, message))
        }
        ApiError::RealWorld(err) => NormalizedError::errors(err.status, err.errors.clone()),
        ApiError::Validation(errors) => {
            NormalizedError::errors(StatusCode::UNPROCESSABLE_ENTITY, errors.clone())
        }
        ApiError::Http(exception) => normalize_exception(exception),
        ApiError::Database(DataAccessError::NotFound { model, cause }) => NormalizedError::errors(
            StatusCode::NOT_FOUND,
            error_map(entity_name(model.as_deref(), cause.as_deref()), "not found"),
        ),
        ApiError::Database(_) => NormalizedError::errors(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_map("database", "error occurred"),
        ),
        ApiError::Unknown(_) => NormalizedError::errors(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_map("unknown", DEFAULT_ERROR_MESSAGE),
        ),
    }
}

fn normalize_exception(exception: &HttpException) -> NormalizedError {
    let status = exception.status();

    if let Some(challenge) = exception.headers().get(WWW_AUTHENTICATE) {
        let (error, description) = parse_www_authenticate(&String::from_utf8_lossy(challenge.as_bytes()));
        let mut normalized = NormalizedError::errors(status, error_map(error, description));
        normalized.www_authenticate = Some(challenge.clone());
        return normalized;
    }

    let content_type = if exception.is_json() {
        Some(HeaderValue::from_static("application/json"))
    } else {
        exception.headers().get(CONTENT_TYPE).cloned()
    };

    NormalizedError {
        status,
        body: NormalizedBody::Passthrough {
            content_type,
            body: exception.body().clone(),
        },
        www_authenticate: None,
        should_log: should_log(status),
    }
}

/// Extract `error` and `error_description` from a `WWW-Authenticate` value.
///
/// Missing parameters fall back to `unknown` and the default message.
pub fn parse_www_authenticate(header: &str) -> (String, String) {
    let capture = |re: &Regex| {
        re.captures(header)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    };
    let error = capture(&CHALLENGE_ERROR).unwrap_or_else(|| "unknown".to_string());
    let description =
        capture(&CHALLENGE_DESCRIPTION).unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());
    (error, description)
}

/// Entity key for a not-found error.
///
/// A `No 'Model' record` cause wins over the model name.
pub fn entity_name(model: Option<&str>, cause: Option<&str>) -> String {
    if let Some(name) = cause
        .and_then(|cause| MISSING_RECORD.captures(cause))
        .and_then(|caps| caps.get(1))
    {
        return camel_case(name.as_str());
    }

    match model {
        Some(model) if !model.is_empty() => camel_case(model),
        _ => DEFAULT_ENTITY_NAME.to_string(),
    }
}

/// `User` -> `user`, `UserFollow` -> `userFollow`, `user_follows` -> `userFollows`.
fn camel_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut upper_next = false;
    for ch in input.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            upper_next = !out.is_empty();
            continue;
        }
        if out.is_empty() {
            out.extend(ch.to_lowercase());
        } else if upper_next {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        upper_next = false;
    }
    out
}

fn flatten_validation_errors(errors: &ValidationErrors, prefix: Option<&str>, out: &mut ErrorMap) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = out.entry(path).or_default();
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| default_message(&error.code, error.params.get("min")));
                    if !messages.contains(&message) {
                        messages.push(message);
                    }
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_validation_errors(inner, Some(path.as_str()), out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten_validation_errors(inner, Some(format!("{path}.{index}").as_str()), out);
                }
            }
        }
    }
}

fn default_message(code: &Cow<'static, str>, min: Option<&serde_json::Value>) -> String {
    match code.as_ref() {
        "email" => "must be a valid email".to_string(),
        "url" => "must be a valid URL".to_string(),
        "length" => match min {
            Some(min) => format!("must be at least {min} characters"),
            None => "has an invalid length".to_string(),
        },
        "required" => "is required".to_string(),
        _ => "is invalid".to_string(),
    }
}

impl IntoResponse for NormalizedError {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            NormalizedBody::Errors(errors) => {
                (self.status, Json(ErrorBody { errors })).into_response()
            }
            NormalizedBody::Passthrough { content_type, body } => {
                let mut response = Response::new(Body::from(body));
                *response.status_mut() = self.status;
                if let Some(content_type) = content_type {
                    response.headers_mut().insert(CONTENT_TYPE, content_type);
                }
                response
            }
        };
        if let Some(challenge) = self.www_authenticate {
            response.headers_mut().insert(WWW_AUTHENTICATE, challenge);
        }
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let normalized = normalize(&self);
        if normalized.should_log {
            tracing::error!(status = %normalized.status, error = ?self, "request failed");
        }
        normalized.into_response()
    }
}
