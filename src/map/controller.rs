//! Map view controller
//!
//! Owns the markers on the map and drives the home location workflow:
//!
//! ```text
//! Loading --initialize--> Idle --on_map_click--> Confirming
//!                          ^                        |
//!                          +--on_confirm/on_cancel--+
//! ```
//!
//! Every transition takes `&mut self`, so events are handled one at a time.
//! A click that arrives before `initialize` has finished is dropped.

use crate::config::{MapConfig, OverlayConfig};
use crate::map::client::ProfileClient;
use crate::map::marker::{ConfirmPopup, MapLayer, Marker, MarkerId, MarkerSet};
use crate::map::overlay::{FeatureSource, OverlayError, OverlayLoader};
use crate::models::{Bounds, HomeLocation, LatLng};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerState {
    /// Waiting for the stored home location
    Loading,
    Idle,
    /// A Yes/No popup is open at `at`
    Confirming { at: LatLng },
}

/// Initial view and panning limits
#[derive(Debug, Clone, PartialEq)]
pub struct MapViewport {
    pub center: LatLng,
    pub zoom: u8,
    pub max_bounds: Bounds,
    pub tile_url: String,
    pub attribution: String,
}

impl MapViewport {
    pub fn from_config(config: &MapConfig) -> Self {
        Self {
            center: config.center,
            zoom: config.zoom,
            max_bounds: config.max_bounds,
            tile_url: config.tile_url.clone(),
            attribution: config.attribution.clone(),
        }
    }
}

impl Default for MapViewport {
    fn default() -> Self {
        Self::from_config(&MapConfig::default())
    }
}

pub struct MapViewController<L: MapLayer, P: ProfileClient> {
    markers: MarkerSet<L>,
    profile: P,
    viewport: MapViewport,
    state: ControllerState,
    home: Option<MarkerId>,
    overlays: OverlayLoader,
}

impl<L: MapLayer, P: ProfileClient> MapViewController<L, P> {
    pub fn new(layer: L, profile: P, viewport: MapViewport) -> Self {
        Self {
            markers: MarkerSet::new(layer),
            profile,
            viewport,
            state: ControllerState::Loading,
            home: None,
            overlays: OverlayLoader::new(),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn viewport(&self) -> &MapViewport {
        &self.viewport
    }

    pub fn layer(&self) -> &L {
        self.markers.layer()
    }

    /// Current markers in insertion order
    pub fn markers(&self) -> impl Iterator<Item = (MarkerId, &Marker)> {
        self.markers.iter()
    }

    pub fn home_marker(&self) -> Option<&Marker> {
        self.home.and_then(|id| self.markers.get(id))
    }

    /// Fetch the stored home location and show it.
    ///
    /// A failed fetch is logged and leaves the map without a home marker.
    /// Ends in `Idle` either way.
    pub async fn initialize(&mut self) {
        if self.state != ControllerState::Loading {
            return;
        }

        match self.profile.get_home_location().await {
            Ok(Some(location)) => self.show_home(location),
            Ok(None) => tracing::debug!("No home location saved yet"),
            Err(e) => tracing::warn!(error = %e, "Failed to fetch home location"),
        }

        self.state = ControllerState::Idle;
    }

    /// Ask whether the clicked point should become the home location
    pub fn on_map_click(&mut self, at: LatLng) {
        if self.state != ControllerState::Idle {
            tracing::debug!(state = ?self.state, "Map click ignored");
            return;
        }

        self.markers.layer_mut().open_popup(&ConfirmPopup::set_home(at));
        self.state = ControllerState::Confirming { at };
    }

    /// "Yes": save the pending location and move the home marker.
    ///
    /// Returns the saved location, or `None` if nothing was pending or the
    /// save failed. On failure the markers are left as they were.
    pub async fn on_confirm(&mut self) -> Option<HomeLocation> {
        let ControllerState::Confirming { at } = self.state else {
            return None;
        };

        self.markers.layer_mut().close_popup();
        self.state = ControllerState::Idle;

        match self.profile.set_home_location(at).await {
            Ok(saved) => {
                self.show_home(saved);
                Some(saved)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save home location");
                None
            }
        }
    }

    /// "No" or popup dismissed
    pub fn on_cancel(&mut self) {
        if let ControllerState::Confirming { .. } = self.state {
            self.markers.layer_mut().close_popup();
            self.state = ControllerState::Idle;
        }
    }

    pub fn add_marker(&mut self, marker: Marker) -> MarkerId {
        self.markers.add(marker)
    }

    pub fn remove_marker(&mut self, id: MarkerId) -> Option<Marker> {
        if self.home == Some(id) {
            self.home = None;
        }
        self.overlays.forget(id);
        self.markers.remove(id)
    }

    /// Clear the map, home marker included
    pub fn remove_all_markers(&mut self) {
        self.markers.clear();
        self.home = None;
        self.overlays.clear();
    }

    /// Replace the current overlay markers with features from `overlay`.
    ///
    /// The home marker and markers added with [`Self::add_marker`] stay.
    pub async fn load_features<S>(
        &mut self,
        source: &S,
        overlay: &OverlayConfig,
    ) -> Result<usize, OverlayError>
    where
        S: FeatureSource + ?Sized,
    {
        self.overlays.load(source, overlay, &mut self.markers).await
    }

    fn show_home(&mut self, location: HomeLocation) {
        if let Some(old) = self.home.take() {
            self.markers.remove(old);
        }
        self.home = Some(self.markers.add(Marker::home(location)));
    }
}
