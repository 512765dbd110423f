//! Map client library
//!
//! The client half of homemap: a [`MapViewController`] that owns the marker
//! collection and the click, confirm, save workflow for the user's home
//! location, and an overlay loader that turns remote GeoJSON point features
//! into markers.
//!
//! Drawing is left to a [`MapLayer`] implementation; the controller only
//! tells it which markers and popups exist.

pub mod client;
pub mod controller;
pub mod marker;
pub mod overlay;

use serde::{Deserialize, Serialize};

pub use crate::models::{Bounds, LatLng};
pub use client::{ClientError, HttpApiClient, ProfileClient};
pub use controller::{ControllerState, MapViewController, MapViewport};
pub use marker::{ConfirmPopup, IconVariant, MapLayer, Marker, MarkerId, MarkerSet};
pub use overlay::{
    point_markers, DetailLine, Feature, FeatureCollection, FeatureSource, Geometry,
    HttpFeatureSource, OverlayError, OverlayLoader,
};

/// Categories of public facilities shown as overlays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    Schools,
    Kindergartens,
    SocialChildProjects,
    SocialTeenagerProjects,
}

impl OverlayKind {
    pub const ALL: [OverlayKind; 4] = [
        OverlayKind::Schools,
        OverlayKind::Kindergartens,
        OverlayKind::SocialChildProjects,
        OverlayKind::SocialTeenagerProjects,
    ];

    /// Marker icon used for this category
    pub fn icon(self) -> IconVariant {
        match self {
            OverlayKind::Schools | OverlayKind::Kindergartens => IconVariant::School,
            OverlayKind::SocialChildProjects | OverlayKind::SocialTeenagerProjects => {
                IconVariant::Generic
            }
        }
    }
}

impl std::fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OverlayKind::Schools => "schools",
            OverlayKind::Kindergartens => "kindergartens",
            OverlayKind::SocialChildProjects => "social_child_projects",
            OverlayKind::SocialTeenagerProjects => "social_teenager_projects",
        };
        f.write_str(name)
    }
}
