//! Home location endpoints (bearer token required)
//!
//! - GET /api/homeLocation
//! - PUT /api/homeLocation

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, ApiJson, AppState, AuthenticatedUser};
use crate::models::HomeLocation;

#[derive(Debug, Deserialize)]
pub struct HomeLocationRequest {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HomeLocationResponse {
    #[serde(rename = "homeLocation")]
    pub home_location: Option<HomeLocation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HomeLocationUpdated {
    pub msg: String,
    #[serde(rename = "homeLocation")]
    pub home_location: HomeLocation,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/homeLocation", get(get_home_location).put(set_home_location))
}

/// GET /api/homeLocation - `homeLocation` is null until first saved
async fn get_home_location(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<HomeLocationResponse>, ApiError> {
    let home_location = state.profile_service.get_home_location(user_id).await?;
    Ok(Json(HomeLocationResponse { home_location }))
}

/// PUT /api/homeLocation
async fn set_home_location(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    ApiJson(body): ApiJson<HomeLocationRequest>,
) -> Result<Json<HomeLocationUpdated>, ApiError> {
    let home_location = state
        .profile_service
        .set_home_location(user_id, body.lat, body.lng)
        .await?;

    Ok(Json(HomeLocationUpdated {
        msg: "Home location updated".to_string(),
        home_location,
    }))
}
