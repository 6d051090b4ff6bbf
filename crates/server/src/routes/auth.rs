use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use tracing::{info, warn};

use common::types::Message;
use service::auth::domain::{AdminIdentity, AdminProfile, CreateAdminInput, LoginInput};

use crate::errors::JsonApiError;
use crate::state::ServerState;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Serialize)]
pub struct LoginOutput {
    pub token: String,
    pub user: AdminProfile,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, JsonApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| JsonApiError::bad_request(e.body_text()))
}

#[utoipa::path(
    post, path = "/login", tag = "auth",
    request_body = crate::openapi::LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = crate::openapi::LoginResponseDoc),
        (status = 400, description = "Bad Request", body = crate::openapi::ErrorDoc),
        (status = 401, description = "Invalid credentials", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let input = json_body(payload)?;
    let session = state.auth.login(input).await?;

    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);

    Ok((jar, Json(LoginOutput { token: session.token, user: session.user })))
}

#[utoipa::path(
    post, path = "/admins", tag = "auth",
    request_body = crate::openapi::CreateAdminRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Admin created", body = crate::openapi::MessageDoc),
        (status = 400, description = "Validation failed or admin already exists", body = crate::openapi::ErrorDoc),
        (status = 401, description = "Missing or invalid token", body = crate::openapi::ErrorDoc)
    )
)]
pub async fn create_admin(
    State(state): State<ServerState>,
    Extension(caller): Extension<AdminIdentity>,
    payload: Result<Json<CreateAdminInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Message>), JsonApiError> {
    let input = json_body(payload)?;
    let created = state.auth.create_admin(input).await?;
    info!(created_by = %caller.id, admin_id = %created.id, "admin created via api");
    Ok((StatusCode::CREATED, Json(Message::new("Admin created successfully"))))
}

/// `Authorization: Bearer <token>`, falling back to the `auth_token` cookie.
fn token_from_headers(headers: &HeaderMap) -> Result<Option<String>, &'static str> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let raw = value.to_str().map_err(|_| "Authorization header is not valid text")?;
        return match raw.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(Some(t.trim().to_string())),
            _ => Err("Authorization header must use the Bearer scheme"),
        };
    }
    let jar = CookieJar::from_headers(headers);
    Ok(jar
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty()))
}

/// Route middleware for protected operations: rejects with 401 JSON unless a
/// valid token is present, and hands the caller's identity to the handler.
pub async fn require_bearer_token(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();
    let token = match token_from_headers(req.headers()) {
        Ok(Some(t)) => t,
        Ok(None) => {
            warn!(path = %path, "missing Authorization header and auth_token cookie");
            return Err(JsonApiError::unauthorized("No token, authorization denied"));
        }
        Err(reason) => {
            warn!(path = %path, reason, "malformed Authorization header");
            return Err(JsonApiError::unauthorized("Token is not valid"));
        }
    };

    match state.auth.verify_token(&token) {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            Ok(next.run(req).await)
        }
        Err(e) => {
            warn!(path = %path, err = %e, "token validation failed");
            Err(JsonApiError::unauthorized("Token is not valid"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        h.insert(header::COOKIE, HeaderValue::from_static("auth_token=xyz"));
        assert_eq!(token_from_headers(&h), Ok(Some("abc".to_string())));
    }

    #[test]
    fn cookie_is_fallback() {
        let mut h = HeaderMap::new();
        h.insert(header::COOKIE, HeaderValue::from_static("theme=dark; auth_token=xyz"));
        assert_eq!(token_from_headers(&h), Ok(Some("xyz".to_string())));
        assert_eq!(token_from_headers(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(token_from_headers(&h).is_err());
    }
}
