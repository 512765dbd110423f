//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The `{msg}` error type every handler returns
//! - Bearer token verification for protected routes

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::services::{AuthError, AuthService, ProfileError, ProfileService, TokenService};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub profile_service: Arc<ProfileService>,
    pub token_service: Arc<TokenService>,
}

/// ID of the user a verified bearer token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub i64);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or_else(|| ApiError::Unauthorized(MISSING_TOKEN.to_string()))
    }
}

const MISSING_TOKEN: &str = "No token, authorization denied";
const INVALID_TOKEN: &str = "Token is not valid";

/// Body of every non-500 error response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBody {
    pub msg: String,
}

/// Errors a handler can return
#[derive(Debug)]
pub enum ApiError {
    /// 400 with `{msg}`
    BadRequest(String),
    /// 401 with `{msg}`
    Unauthorized(String),
    /// 404 with `{msg}`
    NotFound(String),
    /// 500 with a plain-text body; the cause is logged, not returned
    ServerError(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::BadRequest(msg) | ApiError::Unauthorized(msg) | ApiError::NotFound(msg) => {
                (status, Json(MessageBody { msg })).into_response()
            }
            ApiError::ServerError(err) => {
                tracing::error!(error = ?err, "Request failed");
                (status, "Server error").into_response()
            }
        }
    }
}

/// JSON body extractor whose rejections are `{msg}` 400s
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => ApiError::BadRequest(msg),
            AuthError::Conflict | AuthError::InvalidCredentials => {
                ApiError::BadRequest(e.to_string())
            }
            AuthError::Internal(err) => ApiError::ServerError(err),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::NotFound => ApiError::NotFound(e.to_string()),
            ProfileError::Internal(err) => ApiError::ServerError(err),
        }
    }
}

/// Extract a bearer token from the `Authorization` header
fn extract_bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware
///
/// Verifies the bearer token's signature and expiry, then makes the user ID
/// available to handlers as [`AuthenticatedUser`]. The token is trusted as
/// is; the user row is not looked up here.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| ApiError::Unauthorized(MISSING_TOKEN.to_string()))?;

    let claims = state.token_service.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ApiError::Unauthorized(INVALID_TOKEN.to_string())
    })?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser(claims.id));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http;

    fn request_with_header(value: &str) -> Request {
        http::Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        let request = request_with_header("Bearer test-token-123");
        assert_eq!(extract_bearer_token(&request), Some("test-token-123"));
    }

    #[test]
    fn test_extract_bearer_token_none() {
        let request = http::Request::builder()
            .uri("/test")
            .body(Body::empty())
            .unwrap();
        assert!(extract_bearer_token(&request).is_none());
    }

    #[test]
    fn test_extract_bearer_token_wrong_scheme() {
        assert!(extract_bearer_token(&request_with_header("Basic abc")).is_none());
        assert!(extract_bearer_token(&request_with_header("Bearer ")).is_none());
    }

    #[tokio::test]
    async fn test_client_errors_carry_msg_body() {
        let response = ApiError::BadRequest("User already exists".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body, serde_json::json!({"msg": "User already exists"}));
    }

    #[tokio::test]
    async fn test_server_error_hides_cause() {
        let response =
            ApiError::ServerError(anyhow::anyhow!("database is on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "Server error");
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            ApiError::from(AuthError::Conflict).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::Validation("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::Internal(anyhow::anyhow!("boom"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_profile_error_mapping() {
        let err = ApiError::from(ProfileError::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(matches!(err, ApiError::NotFound(msg) if msg == "User not found"));
    }
}
