//! Simple bearer token authentication middleware.
//!
//! Development: accepts a dev credential pair, returns a static-prefix
//! token. Production: replace with JWT + OAuth2; the session layer also
//! supplies the tenant scope that decides which opportunities are visible.

use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rest::ErrorResponse;

/// Hard-coded API token prefix for development. Production: use JWT.
const DEV_TOKEN_PREFIX: &str = "dt_dev_";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: String,
    pub expires_at: DateTime<Utc>,
}

/// Validate a login request and return a bearer token.
pub fn authenticate(req: &LoginRequest) -> Result<LoginResponse, String> {
    // Development: accept admin/admin or any user with password "pipeline2024"
    if (req.username == "admin" && req.password == "admin") || req.password == "pipeline2024" {
        Ok(LoginResponse {
            token: generate_token(),
            user: req.username.clone(),
            expires_at: Utc::now() + Duration::hours(24),
        })
    } else {
        Err("Invalid credentials".to_string())
    }
}

/// POST /api/v1/auth/login — exchange credentials for a bearer token.
pub async fn handle_login(
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<ErrorResponse>)> {
    match authenticate(&req) {
        Ok(resp) => Ok(Json(resp)),
        Err(msg) => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "auth_failed".to_string(),
                message: msg,
            }),
        )),
    }
}

/// Generate a random bearer token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    format!(
        "{}{}",
        DEV_TOKEN_PREFIX,
        bytes
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<String>()
    )
}

/// Check a presented bearer token.
fn token_is_valid(token: &str) -> bool {
    token.starts_with(DEV_TOKEN_PREFIX) && token.len() > DEV_TOKEN_PREFIX.len()
}

/// Axum middleware that rejects unauthenticated attribution requests
/// before any computation happens. Skips login and health probes.
pub async fn auth_middleware(req: Request, next: Next) -> Response {
    let path = req.uri().path();

    if path.ends_with("/auth/login")
        || path.starts_with("/health")
        || path.starts_with("/ready")
        || path.starts_with("/live")
    {
        return next.run(req).await;
    }

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) if value.starts_with("Bearer ") => {
            if token_is_valid(&value[7..]) {
                next.run(req).await
            } else {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: "invalid_token".to_string(),
                        message: "Invalid or expired bearer token".to_string(),
                    }),
                )
                    .into_response()
            }
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "missing_auth".to_string(),
                message: "Authorization header with Bearer token required".to_string(),
            }),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticate_accepts_dev_credentials() {
        let resp = authenticate(&LoginRequest {
            username: "admin".to_string(),
            password: "admin".to_string(),
        })
        .unwrap();
        assert!(resp.token.starts_with(DEV_TOKEN_PREFIX));
        assert!(resp.expires_at > Utc::now());
    }

    #[test]
    fn test_authenticate_rejects_bad_credentials() {
        assert!(authenticate(&LoginRequest {
            username: "admin".to_string(),
            password: "wrong".to_string(),
        })
        .is_err());
    }

    #[test]
    fn test_issued_tokens_validate() {
        let resp = authenticate(&LoginRequest {
            username: "rep".to_string(),
            password: "pipeline2024".to_string(),
        })
        .unwrap();
        assert!(token_is_valid(&resp.token));
        assert!(!token_is_valid("dt_dev_"));
        assert!(!token_is_valid("someone-elses-token"));
    }
}
