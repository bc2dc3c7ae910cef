use reqwest::Url;
use serde::Deserialize;

use crate::geo::Coord;

use super::{Address, GeocodeError, Geocoder};

pub const DEFAULT_GOOGLE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Google Geocoding API client.
#[derive(Clone)]
pub struct GoogleGeocoder {
    inner: reqwest::Client,
    url: Url,
    api_key: String,
}

#[derive(Deserialize, Debug)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize, Debug)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
    geometry: Geometry,
}

#[derive(Deserialize, Debug)]
struct AddressComponent {
    long_name: String,
    short_name: String,
    types: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct Geometry {
    location: Location,
}

#[derive(Deserialize, Debug)]
struct Location {
    lat: f64,
    lng: f64,
}

fn component<'a>(components: &'a [AddressComponent], kind: &str) -> Option<&'a AddressComponent> {
    components.iter().find(|c| c.types.iter().any(|t| t == kind))
}

impl GeocodeResult {
    fn into_address(self) -> Address {
        let comps = &self.address_components;
        let long_name = |kind: &str| component(comps, kind).map(|c| c.long_name.as_str());

        let locality = long_name("locality").or_else(|| long_name("postal_town"));
        // state abbreviation, "IL" rather than "Illinois"
        let region = component(comps, "administrative_area_level_1").map(|c| c.short_name.as_str());

        let mut address = Address::new(long_name("street_number"), long_name("route"), locality, region);
        address.postcode = super::non_blank(long_name("postal_code"));
        address
    }
}

impl GeocodeResponse {
    /// Keeps the first result. `ZERO_RESULTS` is an empty answer, any other non-OK status is an error.
    fn into_first_result(self) -> Result<Option<GeocodeResult>, GeocodeError> {
        match self.status.as_str() {
            "OK" => Ok(self.results.into_iter().next()),
            "ZERO_RESULTS" => Ok(None),
            _ => Err(GeocodeError::Status {
                message: self.error_message.unwrap_or_default(),
                status: self.status,
            }),
        }
    }
}

impl GoogleGeocoder {
    pub fn new(url: &str, api_key: impl Into<String>) -> Result<Self, GeocodeError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GeocodeError::Config("google geocoder needs an api key".to_string()));
        }

        let url = url
            .parse()
            .map_err(|e| GeocodeError::Config(format!("{} is not a valid url: {}", url, e)))?;

        Ok(Self {
            inner: reqwest::Client::new(),
            url,
            api_key,
        })
    }

    async fn request(&self, param: (&str, &str)) -> Result<Option<GeocodeResult>, GeocodeError> {
        let response: GeocodeResponse = self
            .inner
            .get(self.url.clone())
            .query(&[param, ("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.into_first_result()
    }
}

impl Geocoder for GoogleGeocoder {
    async fn reverse(&self, coord: Coord) -> Result<Option<Address>, GeocodeError> {
        let latlng = format!("{},{}", coord.lat, coord.lng);
        Ok(self.request(("latlng", latlng.as_str())).await?.map(GeocodeResult::into_address))
    }

    async fn forward(&self, query: &str) -> Result<Option<Coord>, GeocodeError> {
        Ok(self
            .request(("address", query))
            .await?
            .map(|r| Coord::new(r.geometry.location.lat, r.geometry.location.lng)))
    }
}
