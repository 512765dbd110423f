//! GeoJSON feature overlays
//!
//! Fetches a FeatureCollection and turns its point features into markers.
//! GeoJSON positions are `[lng, lat]`; markers are built with the order
//! swapped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::OverlayConfig;
use crate::map::marker::{IconVariant, MapLayer, Marker, MarkerId, MarkerSet};
use crate::models::LatLng;

/// Popup text for features without a usable label
pub const UNNAMED_LOCATION: &str = "Unnamed location";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Decode a response body that must be a GeoJSON FeatureCollection.
    ///
    /// ArcGIS reports query failures as `{"error": {...}}` with HTTP 200;
    /// those become [`OverlayError::Service`].
    pub fn from_json(value: Value) -> Result<Self, OverlayError> {
        if let Some(error) = value.get("error") {
            return Err(OverlayError::Service {
                code: error.get("code").and_then(Value::as_i64),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        match value.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => Ok(serde_json::from_value(value)?),
            other => Err(OverlayError::NotFeatureCollection(
                other.unwrap_or("missing").to_string(),
            )),
        }
    }
}

/// One popup line built from feature properties
///
/// The values of `keys` that are present are joined with spaces; a line
/// whose keys are all missing is left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailLine {
    pub keys: Vec<String>,
    /// Text shown before the values, e.g. `Phone`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl DetailLine {
    pub fn new(keys: &[&str]) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            prefix: None,
        }
    }

    pub fn prefixed(prefix: &str, key: &str) -> Self {
        Self {
            keys: vec![key.to_string()],
            prefix: Some(prefix.to_string()),
        }
    }

    /// Address and contact lines of the Chemnitz facility layers
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(&["KURZBEZEICHNUNG"]),
            Self::new(&["STRASSE"]),
            Self::new(&["PLZ", "ORT"]),
            Self::prefixed("Phone", "TELEFON"),
            Self::prefixed("Fax", "FAX"),
            Self::prefixed("Email", "EMAIL"),
            Self::prefixed("Profile", "PROFILE"),
            Self::prefixed("Website", "WWW"),
        ]
    }

    fn render(&self, feature: &Feature) -> Option<String> {
        let values: Vec<String> = self.keys.iter().filter_map(|k| feature.label(k)).collect();
        if values.is_empty() {
            return None;
        }
        let values = values.join(" ");
        Some(match &self.prefix {
            Some(prefix) => format!("{}: {}", prefix, values),
            None => values,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<serde_json::Map<String, Value>>,
}

/// Geometry with its coordinates left untyped; only points are read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

impl Geometry {
    /// Position of a Point geometry, in marker order
    pub fn point(&self) -> Option<LatLng> {
        if self.kind != "Point" {
            return None;
        }
        let coords = self.coordinates.as_array()?;
        let lng = coords.first()?.as_f64()?;
        let lat = coords.get(1)?.as_f64()?;
        Some(LatLng::from_lng_lat([lng, lat]))
    }
}

impl Feature {
    /// Label text from a string or numeric property
    pub fn label(&self, key: &str) -> Option<String> {
        match self.properties.as_ref()?.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Popup text: the label (or [`UNNAMED_LOCATION`]) on the first line,
    /// then every detail line that has a value, one per line.
    pub fn popup_text(&self, label_key: &str, details: &[DetailLine]) -> String {
        let mut lines = vec![self
            .label(label_key)
            .unwrap_or_else(|| UNNAMED_LOCATION.to_string())];
        lines.extend(details.iter().filter_map(|line| line.render(self)));
        lines.join("\n")
    }
}

/// One marker per point feature, lazily.
///
/// Features without geometry or with a non-point geometry are skipped.
pub fn point_markers<'a>(
    collection: &'a FeatureCollection,
    icon: IconVariant,
    label_key: &'a str,
    details: &'a [DetailLine],
) -> impl Iterator<Item = Marker> + 'a {
    collection.features.iter().filter_map(move |feature| {
        let position = feature.geometry.as_ref()?.point()?;
        Some(Marker::new(
            position,
            icon,
            feature.popup_text(label_key, details),
        ))
    })
}

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Feature request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Feature service returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Error object in an otherwise successful response
    #[error("Feature service error: {message}")]
    Service { code: Option<i64>, message: String },

    #[error("Expected a FeatureCollection, got type '{0}'")]
    NotFeatureCollection(String),

    #[error("Invalid GeoJSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Somewhere feature collections come from
#[async_trait]
pub trait FeatureSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FeatureCollection, OverlayError>;
}

/// Fetches feature collections over HTTP
pub struct HttpFeatureSource {
    client: reqwest::Client,
}

impl HttpFeatureSource {
    pub fn new() -> Result<Self, OverlayError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("homemap/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeatureSource for HttpFeatureSource {
    async fn fetch(&self, url: &str) -> Result<FeatureCollection, OverlayError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(OverlayError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        FeatureCollection::from_json(response.json::<Value>().await?)
    }
}

/// Tracks which markers came from overlays so a reload can replace them
#[derive(Debug, Default)]
pub struct OverlayLoader {
    loaded: Vec<MarkerId>,
}

impl OverlayLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace previously loaded overlay markers with the features at
    /// `overlay.url`.
    ///
    /// On fetch failure nothing on the map changes. Markers this loader did
    /// not add are never touched. Returns the number of markers added.
    pub async fn load<S, L>(
        &mut self,
        source: &S,
        overlay: &OverlayConfig,
        markers: &mut MarkerSet<L>,
    ) -> Result<usize, OverlayError>
    where
        S: FeatureSource + ?Sized,
        L: MapLayer,
    {
        let collection = match source.fetch(&overlay.url).await {
            Ok(collection) => collection,
            Err(e) => {
                tracing::warn!(overlay = %overlay.kind, error = %e, "Failed to load overlay");
                return Err(e);
            }
        };

        for id in self.loaded.drain(..) {
            markers.remove(id);
        }

        let icon = overlay.kind.icon();
        for marker in point_markers(&collection, icon, &overlay.label_property, &overlay.details) {
            self.loaded.push(markers.add(marker));
        }

        tracing::info!(
            overlay = %overlay.kind,
            features = collection.features.len(),
            markers = self.loaded.len(),
            "Overlay loaded"
        );

        Ok(self.loaded.len())
    }

    /// Stop tracking a marker removed by someone else
    pub fn forget(&mut self, id: MarkerId) {
        self.loaded.retain(|loaded| *loaded != id);
    }

    pub fn clear(&mut self) {
        self.loaded.clear();
    }

    pub fn loaded(&self) -> &[MarkerId] {
        &self.loaded
    }
}
