//! Authentication API endpoints
//!
//! - POST /api/register - User registration
//! - POST /api/login - User login
//!
//! Both answer with `{token}`, a bearer token valid for one hour.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::services::Credentials;

/// Request body for register and login
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl From<CredentialsRequest> for Credentials {
    fn from(body: CredentialsRequest) -> Self {
        Credentials::new(body.username, body.password)
    }
}

/// Response for successful authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Build the public auth routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// POST /api/register
async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = state.auth_service.register(body.into()).await?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

/// POST /api/login
async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.auth_service.login(body.into()).await?;
    Ok(Json(TokenResponse { token }))
}
