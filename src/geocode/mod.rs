//! Forward and reverse geocoding providers.

mod google;
mod nominatim;

use serde::{Deserialize, Serialize};

use crate::geo::Coord;

pub use self::google::{DEFAULT_GOOGLE_URL, GoogleGeocoder};
pub use self::nominatim::{DEFAULT_NOMINATIM_URL, NominatimClient};

/// Address components returned by a reverse geocoding lookup. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub house_number: Option<String>,
    pub road: Option<String>,
    /// City, town or village, whichever the provider reports first.
    pub locality: Option<String>,
    /// State or region.
    pub region: Option<String>,
    pub postcode: Option<String>,
}

impl Address {
    /// Builds an address, turning blank components into `None`.
    pub fn new(
        house_number: Option<&str>,
        road: Option<&str>,
        locality: Option<&str>,
        region: Option<&str>,
    ) -> Self {
        Self {
            house_number: non_blank(house_number),
            road: non_blank(road),
            locality: non_blank(locality),
            region: non_blank(region),
            postcode: None,
        }
    }
}

pub(crate) fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoder request failed: {0}")]
    Network(String),

    #[error("geocoder returned status {status}: {message}")]
    Status { status: String, message: String },

    #[error("geocoder returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("geocoder is misconfigured: {0}")]
    Config(String),
}

impl From<reqwest::Error> for GeocodeError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            GeocodeError::InvalidResponse(value.to_string())
        } else {
            GeocodeError::Network(value.to_string())
        }
    }
}

/// A geocoding provider.
///
/// `Ok(None)` means the provider answered but has no match; errors mean the provider could not be used.
#[allow(async_fn_in_trait)]
pub trait Geocoder {
    /// Resolves a coordinate into address components.
    async fn reverse(&self, coord: Coord) -> Result<Option<Address>, GeocodeError>;

    /// Resolves a free-text address into a coordinate.
    async fn forward(&self, query: &str) -> Result<Option<Coord>, GeocodeError>;
}

/// One of the supported providers, picked at runtime from configuration.
#[derive(Clone)]
pub enum AnyGeocoder {
    Nominatim(NominatimClient),
    Google(GoogleGeocoder),
}

impl Geocoder for AnyGeocoder {
    async fn reverse(&self, coord: Coord) -> Result<Option<Address>, GeocodeError> {
        match self {
            AnyGeocoder::Nominatim(g) => g.reverse(coord).await,
            AnyGeocoder::Google(g) => g.reverse(coord).await,
        }
    }

    async fn forward(&self, query: &str) -> Result<Option<Coord>, GeocodeError> {
        match self {
            AnyGeocoder::Nominatim(g) => g.forward(query).await,
            AnyGeocoder::Google(g) => g.forward(query).await,
        }
    }
}

/// Makes sure `base` ends with a slash so relative paths are appended instead of replacing its last segment.
pub(crate) fn parse_base_url(base: &str) -> Result<reqwest::Url, GeocodeError> {
    let normalized = if base.ends_with('/') { base.to_string() } else { format!("{base}/") };
    normalized
        .parse()
        .map_err(|e| GeocodeError::Config(format!("{} is not a valid url: {}", base, e)))
}
