//! Data models
//!
//! Entities shared by the API and the map client:
//! - `User` with its optional home location
//! - `Claims` carried inside bearer tokens
//! - `LatLng` / `Bounds` geographic primitives

mod claims;
mod geo;
mod user;

pub use claims::Claims;
pub use geo::{Bounds, HomeLocation, LatLng};
pub use user::User;
