//! homemap - home location service with a map client
//!
//! The server side is a small authentication API with a per-user home
//! location. The `map` module is the client side: marker management, the
//! click-to-set-home workflow, and GeoJSON overlays of public facilities.

pub mod api;
pub mod config;
pub mod db;
pub mod map;
pub mod models;
pub mod services;
