//! Authentication middleware and handlers.
//!
//! Password-based authentication against an Argon2 hash taken from
//! `SPENDWISE_PASSWORD_HASH`. Setting it to
//! `DANGEROUSLY_ALLOW_UNAUTHENTICATED_USERS` turns authentication off.
//!
//! Session tokens are random UUIDs kept in a server-side set and carried in
//! an HTTP-only cookie. Logging out or restarting the server drops them.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use axum::Form;
use serde::{Deserialize, Serialize};
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::config::AuthMode;
use crate::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// Paths reachable without a session.
const PUBLIC_PATHS: [&str; 3] = ["/health", "/auth/login", "/auth/ping"];

#[derive(Debug, Deserialize)]
pub struct LoginFormData {
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub authenticated: bool,
    pub auth_required: bool,
}

fn has_valid_session(state: &AppState, cookies: &Cookies) -> bool {
    let Some(cookie) = cookies.get(SESSION_COOKIE) else {
        return false;
    };
    state
        .sessions
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .contains(cookie.value())
}

/// Rejects requests without a valid session with 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    cookies: Cookies,
    request: Request<Body>,
    next: Next,
) -> Response {
    if matches!(state.config.auth_mode, AuthMode::Unauthenticated) {
        return next.run(request).await;
    }

    if PUBLIC_PATHS.contains(&request.uri().path()) || has_valid_session(&state, &cookies) {
        return next.run(request).await;
    }

    tracing::debug!(path = %request.uri().path(), "Rejecting unauthenticated request");
    AppError::Unauthorized.into_response()
}

pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<LoginFormData>,
) -> Response {
    let password_hash = match &state.config.auth_mode {
        AuthMode::Unauthenticated => return StatusCode::NO_CONTENT.into_response(),
        AuthMode::Password(hash) => hash,
    };

    if !verify_password(&form.password, password_hash) {
        tracing::warn!("Failed login attempt");
        return AppError::Unauthorized.into_response();
    }

    let session_token = Uuid::new_v4().to_string();
    state
        .sessions
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .insert(session_token.clone());

    let cookie = Cookie::build((SESSION_COOKIE, session_token))
        .path("/")
        .http_only(true)
        .same_site(tower_cookies::cookie::SameSite::Strict)
        .build();
    cookies.add(cookie);

    tracing::info!("User logged in");
    StatusCode::NO_CONTENT.into_response()
}

pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> StatusCode {
    if let Some(session_cookie) = cookies.get(SESSION_COOKIE) {
        state
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(session_cookie.value());
    }

    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .build();
    cookies.remove(cookie);

    StatusCode::NO_CONTENT
}

/// Lets the client check whether its session is still alive.
pub async fn ping(State(state): State<AppState>, cookies: Cookies) -> Json<SessionStatus> {
    let auth_required = matches!(state.config.auth_mode, AuthMode::Password(_));
    Json(SessionStatus {
        authenticated: !auth_required || has_valid_session(&state, &cookies),
        auth_required,
    })
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::error!("Invalid password hash format in SPENDWISE_PASSWORD_HASH");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
