//! Configuration management
//!
//! Configuration is loaded once at startup from `config.yml` (if present),
//! then environment variables prefixed with `HOMEMAP_` override individual
//! fields. The resulting [`Config`] is passed explicitly to whatever needs it.
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::map::{Bounds, DetailLine, LatLng, OverlayKind};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Token signing configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Map client configuration
    #[serde(default)]
    pub map: MapConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin, `*` allows any
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors_origin() -> String {
    "*".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/homemap.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Token signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign bearer tokens. Must be set before startup.
    #[serde(default)]
    pub jwt_secret: String,
    /// Token lifetime in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_seconds: default_token_ttl(),
        }
    }
}

/// Longest accepted token lifetime (30 days)
pub const MAX_TOKEN_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

fn default_token_ttl() -> i64 {
    60 * 60
}

/// Map client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Tile URL template
    #[serde(default = "default_tile_url")]
    pub tile_url: String,
    /// Tile attribution text
    #[serde(default = "default_attribution")]
    pub attribution: String,
    /// Initial map centre
    #[serde(default = "default_center")]
    pub center: LatLng,
    /// Initial zoom level
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    /// Panning limit
    #[serde(default = "default_max_bounds")]
    pub max_bounds: Bounds,
    /// Feature overlays offered to the user
    #[serde(default = "default_overlays")]
    pub overlays: Vec<OverlayConfig>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_url: default_tile_url(),
            attribution: default_attribution(),
            center: default_center(),
            zoom: default_zoom(),
            max_bounds: default_max_bounds(),
            overlays: default_overlays(),
        }
    }
}

fn default_tile_url() -> String {
    "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string()
}

fn default_attribution() -> String {
    "© OpenStreetMap contributors".to_string()
}

fn default_center() -> LatLng {
    LatLng::new(50.8333, 12.9167)
}

fn default_zoom() -> u8 {
    13
}

fn default_max_bounds() -> Bounds {
    Bounds::new(LatLng::new(50.75, 12.75), LatLng::new(50.90, 13.00))
}

const ARCGIS_BASE: &str =
    "https://services6.arcgis.com/jiszdsDupTUO3fSM/arcgis/rest/services";

fn default_overlays() -> Vec<OverlayConfig> {
    [
        (OverlayKind::Schools, "Schulen_OpenData"),
        (OverlayKind::Kindergartens, "Kindertageseinrichtungen_Sicht"),
        (OverlayKind::SocialChildProjects, "Schulsozialarbeit_FL_1"),
        (OverlayKind::SocialTeenagerProjects, "Jugendberufshilfen_FL_1"),
    ]
    .into_iter()
    .map(|(kind, service)| OverlayConfig {
        kind,
        url: format!(
            "{}/{}/FeatureServer/0/query?outFields=*&where=1%3D1&f=geojson",
            ARCGIS_BASE, service
        ),
        label_property: default_label_property(),
        details: DetailLine::defaults(),
    })
    .collect()
}

/// One remote GeoJSON overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Overlay category, decides the marker icon
    pub kind: OverlayKind,
    /// Feature query URL returning a GeoJSON FeatureCollection
    pub url: String,
    /// Feature property used as popup text
    #[serde(default = "default_label_property")]
    pub label_property: String,
    /// Popup lines shown under the label
    #[serde(default = "DetailLine::defaults")]
    pub details: Vec<DetailLine>,
}

fn default_label_property() -> String {
    "BEZEICHNUNG".to_string()
}

impl MapConfig {
    /// Find the overlay configured for a category
    pub fn overlay(&self, kind: OverlayKind) -> Option<&OverlayConfig> {
        self.overlays.iter().find(|o| o.kind == kind)
    }
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables:
    /// - HOMEMAP_SERVER_HOST
    /// - HOMEMAP_SERVER_PORT
    /// - HOMEMAP_SERVER_CORS_ORIGIN
    /// - HOMEMAP_DATABASE_DRIVER
    /// - HOMEMAP_DATABASE_URL
    /// - HOMEMAP_JWT_SECRET
    /// - HOMEMAP_TOKEN_TTL_SECONDS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("HOMEMAP_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("HOMEMAP_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("HOMEMAP_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(driver) = std::env::var("HOMEMAP_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("HOMEMAP_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(secret) = std::env::var("HOMEMAP_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(ttl) = std::env::var("HOMEMAP_TOKEN_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<i64>() {
                self.auth.token_ttl_seconds = ttl;
            }
        }
    }

    /// Reject configurations the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.jwt_secret must be set (or HOMEMAP_JWT_SECRET)".to_string(),
            ));
        }
        if self.auth.token_ttl_seconds <= 0 || self.auth.token_ttl_seconds > MAX_TOKEN_TTL_SECONDS
        {
            return Err(ConfigError::ValidationError(format!(
                "auth.token_ttl_seconds must be between 1 and {}",
                MAX_TOKEN_TTL_SECONDS
            )));
        }
        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
