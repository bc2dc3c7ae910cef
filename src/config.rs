//! Runtime configuration.
//!
//! Defaults describe Decatur, IL. A JSON file may replace any part of them and a few environment
//! variables override the file.

use std::env::VarError;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geo::Coord;
use crate::geocode::{AnyGeocoder, DEFAULT_GOOGLE_URL, DEFAULT_NOMINATIM_URL, GeocodeError, GoogleGeocoder, NominatimClient};
use crate::route::{DEFAULT_OSRM_URL, OsrmClient, RouteError};
use crate::sampler::SamplerConfig;
use crate::session::ScoringConfig;
use crate::station::{Station, StationRegistry};
use crate::BoundingBox;

pub const ENV_GEOCODER: &str = "DRILL_GEOCODER";
pub const ENV_GEOCODER_URL: &str = "DRILL_GEOCODER_URL";
pub const ENV_GOOGLE_API_KEY: &str = "DRILL_GOOGLE_API_KEY";
pub const ENV_ROUTING_URL: &str = "DRILL_ROUTING_URL";
pub const ENV_MAX_ATTEMPTS: &str = "DRILL_MAX_ATTEMPTS";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },

    #[error("cannot parse configuration: {0}")]
    Parse(String),

    #[error("{name}: {message}")]
    Variable { name: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// South west and north east corners of the city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityBounds {
    pub south_west: Coord,
    pub north_east: Coord,
}

impl Default for CityBounds {
    fn default() -> Self {
        Self {
            south_west: Coord::new(39.80, -89.05),
            north_east: Coord::new(39.90, -88.85),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocoderProvider {
    #[default]
    Nominatim,
    Google,
}

impl std::str::FromStr for GeocoderProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nominatim" => Ok(GeocoderProvider::Nominatim),
            "google" => Ok(GeocoderProvider::Google),
            other => Err(format!("unknown geocoder '{other}', expected nominatim or google")),
        }
    }
}

impl fmt::Display for GeocoderProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocoderProvider::Nominatim => write!(f, "nominatim"),
            GeocoderProvider::Google => write!(f, "google"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub provider: GeocoderProvider,
    /// Provider endpoint, the public service when missing.
    pub url: Option<String>,
    pub user_agent: String,
    pub google_api_key: Option<String>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            provider: GeocoderProvider::default(),
            url: None,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            google_api_key: None,
        }
    }
}

impl GeocoderConfig {
    pub fn url(&self) -> &str {
        match (&self.url, self.provider) {
            (Some(url), _) => url.as_str(),
            (None, GeocoderProvider::Nominatim) => DEFAULT_NOMINATIM_URL,
            (None, GeocoderProvider::Google) => DEFAULT_GOOGLE_URL,
        }
    }

    pub fn build(&self) -> Result<AnyGeocoder, GeocodeError> {
        match self.provider {
            GeocoderProvider::Nominatim => Ok(AnyGeocoder::Nominatim(NominatimClient::new(self.url(), &self.user_agent)?)),
            GeocoderProvider::Google => {
                let key = self.google_api_key.clone().unwrap_or_default();
                Ok(AnyGeocoder::Google(GoogleGeocoder::new(self.url(), key)?))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrillConfig {
    pub bounds: CityBounds,
    pub sampler: SamplerConfig,
    pub scoring: ScoringConfig,
    pub geocoder: GeocoderConfig,
    pub routing_url: String,
    /// Replaces the built-in Decatur stations when present.
    pub stations: Option<Vec<Station>>,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            bounds: CityBounds::default(),
            sampler: SamplerConfig::default(),
            scoring: ScoringConfig::default(),
            geocoder: GeocoderConfig::default(),
            routing_url: DEFAULT_OSRM_URL.to_string(),
            stations: None,
        }
    }
}

impl DrillConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_json(&json)
    }

    /// Applies the `DRILL_*` environment variables on top of this configuration.
    pub fn env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|name| std::env::var(name))
    }

    fn apply_vars(mut self, lookup: impl Fn(&str) -> Result<String, VarError>) -> Result<Self, ConfigError> {
        let var = |name: &str| -> Result<Option<String>, ConfigError> {
            match lookup(name) {
                Ok(value) => Ok(Some(value)),
                Err(VarError::NotPresent) => Ok(None),
                Err(VarError::NotUnicode(_)) => Err(ConfigError::Variable {
                    name: name.to_string(),
                    message: "value is not valid unicode".to_string(),
                }),
            }
        };

        if let Some(provider) = var(ENV_GEOCODER)? {
            self.geocoder.provider = provider.parse().map_err(|message| ConfigError::Variable {
                name: ENV_GEOCODER.to_string(),
                message,
            })?;
        }

        if let Some(url) = var(ENV_GEOCODER_URL)? {
            self.geocoder.url = Some(url);
        }

        if let Some(key) = var(ENV_GOOGLE_API_KEY)? {
            self.geocoder.google_api_key = Some(key);
        }

        if let Some(url) = var(ENV_ROUTING_URL)? {
            self.routing_url = url;
        }

        if let Some(attempts) = var(ENV_MAX_ATTEMPTS)? {
            self.sampler.max_attempts = attempts.trim().parse().map_err(|e| ConfigError::Variable {
                name: ENV_MAX_ATTEMPTS.to_string(),
                message: format!("'{attempts}' is not a number: {e}"),
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (sw, ne) = (&self.bounds.south_west, &self.bounds.north_east);
        if !(sw.lat < ne.lat && sw.lng < ne.lng) {
            return Err(ConfigError::Invalid(format!("city bounds {sw} .. {ne} are empty")));
        }

        if !(0.0 <= self.scoring.close_ft && self.scoring.close_ft <= self.scoring.medium_ft) {
            return Err(ConfigError::Invalid(format!(
                "scoring thresholds must satisfy 0 <= close ({}) <= medium ({})",
                self.scoring.close_ft, self.scoring.medium_ft
            )));
        }

        if self.sampler.city.trim().is_empty() {
            return Err(ConfigError::Invalid("city name is empty".to_string()));
        }

        Ok(())
    }

    pub fn city_box(&self) -> BoundingBox {
        BoundingBox::from_coords(self.bounds.south_west, self.bounds.north_east)
    }

    pub fn stations(&self) -> StationRegistry {
        match &self.stations {
            Some(stations) => StationRegistry::new(stations.clone()),
            None => StationRegistry::decatur(),
        }
    }

    pub fn route_provider(&self) -> Result<OsrmClient, RouteError> {
        OsrmClient::new(&self.routing_url)
    }

    /// Logs the effective settings. The api key is never printed.
    pub fn log(&self) {
        log::info!(
            "City: {} ({} .. {})",
            self.sampler.city,
            self.bounds.south_west,
            self.bounds.north_east
        );
        log::info!(
            "Geocoder: {} at {}{}",
            self.geocoder.provider,
            self.geocoder.url(),
            if self.geocoder.google_api_key.is_some() { " (api key set)" } else { "" }
        );
        log::info!("Routing: {}", self.routing_url);
        log::info!(
            "Up to {} attempts per round, tiers at {} / {} ft",
            self.sampler.max_attempts,
            self.scoring.close_ft,
            self.scoring.medium_ft
        );
        match &self.stations {
            Some(stations) => log::info!("{} configured stations", stations.len()),
            None => log::info!("Built-in Decatur stations"),
        }
    }
}
