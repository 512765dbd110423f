//! Profile service
//!
//! Reads and overwrites the authenticated user's home location. Writes are
//! last-write-wins. Latitude and longitude are stored as given, without
//! range checks.

use crate::db::repositories::UserRepository;
use crate::models::HomeLocation;
use anyhow::Context;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("User not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct ProfileService {
    user_repo: Arc<dyn UserRepository>,
}

impl ProfileService {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Stored home location, `None` if never set
    pub async fn get_home_location(
        &self,
        user_id: i64,
    ) -> Result<Option<HomeLocation>, ProfileError> {
        let user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to load user")?
            .ok_or(ProfileError::NotFound)?;

        Ok(user.home_location)
    }

    /// Overwrite the home location and return what was stored
    pub async fn set_home_location(
        &self,
        user_id: i64,
        lat: f64,
        lng: f64,
    ) -> Result<HomeLocation, ProfileError> {
        let user = self
            .user_repo
            .update_home_location(user_id, HomeLocation::new(lat, lng))
            .await
            .context("Failed to update home location")?
            .ok_or(ProfileError::NotFound)?;

        tracing::info!(user_id, lat, lng, "Home location updated");

        user.home_location
            .ok_or_else(|| ProfileError::Internal(anyhow::anyhow!("Home location not persisted")))
    }
}
