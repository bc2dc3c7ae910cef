use reqwest::Url;
use serde::Deserialize;

use crate::geo::Coord;

use super::{Address, GeocodeError, Geocoder, parse_base_url};

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/";

/// OpenStreetMap Nominatim client. Nominatim requires an identifying User-Agent on every request.
#[derive(Clone)]
pub struct NominatimClient {
    inner: reqwest::Client,
    base: Url,
}

#[derive(Deserialize, Debug, Default)]
struct NominatimAddress {
    #[serde(default)]
    house_number: Option<String>,
    #[serde(default)]
    road: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    town: Option<String>,
    #[serde(default)]
    village: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    postcode: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ReverseResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Deserialize, Debug)]
struct SearchResult {
    lat: String,
    lon: String,
}

impl NominatimAddress {
    fn into_address(self) -> Address {
        let locality = self.city.or(self.town).or(self.village);
        let mut address = Address::new(
            self.house_number.as_deref(),
            self.road.as_deref(),
            locality.as_deref(),
            self.state.as_deref(),
        );
        address.postcode = super::non_blank(self.postcode.as_deref());
        address
    }
}

impl ReverseResponse {
    fn into_address(self) -> Option<Address> {
        if let Some(error) = self.error {
            log::debug!("Nominatim has no address here: {error}");
            return None;
        }

        self.address.map(NominatimAddress::into_address)
    }
}

fn parse_search_result(results: Vec<SearchResult>) -> Result<Option<Coord>, GeocodeError> {
    match results.into_iter().next() {
        None => Ok(None),
        Some(r) => {
            let lat: f64 = r.lat.parse().map_err(|_| GeocodeError::InvalidResponse(format!("bad latitude '{}'", r.lat)))?;
            let lng: f64 = r.lon.parse().map_err(|_| GeocodeError::InvalidResponse(format!("bad longitude '{}'", r.lon)))?;
            Ok(Some(Coord::new(lat, lng)))
        }
    }
}

impl NominatimClient {
    pub fn new(base: &str, user_agent: &str) -> Result<Self, GeocodeError> {
        let inner = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| GeocodeError::Config(format!("cannot build http client: {e}")))?;
        let base = parse_base_url(base)?;

        Ok(Self { inner, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, GeocodeError> {
        self.base
            .join(path)
            .map_err(|e| GeocodeError::Config(format!("error joining url: {e}")))
    }
}

impl Geocoder for NominatimClient {
    async fn reverse(&self, coord: Coord) -> Result<Option<Address>, GeocodeError> {
        let response: ReverseResponse = self
            .inner
            .get(self.endpoint("reverse")?)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", coord.lat.to_string()),
                ("lon", coord.lng.to_string()),
                ("zoom", "18".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.into_address())
    }

    async fn forward(&self, query: &str) -> Result<Option<Coord>, GeocodeError> {
        let results: Vec<SearchResult> = self
            .inner
            .get(self.endpoint("search")?)
            .query(&[("format", "jsonv2"), ("limit", "1"), ("q", query)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_search_result(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_response_test() {
        let body = r#"{
            "place_id": 1,
            "lat": "39.8654", "lon": "-88.9519",
            "address": {
                "house_number": "1415", "road": "North Water Street",
                "city": "Decatur", "county": "Macon County",
                "state": "Illinois", "postcode": "62526", "country": "United States"
            }
        }"#;
        let response: ReverseResponse = serde_json::from_str(body).unwrap();
        let address = response.into_address().unwrap();
        assert_eq!(address.house_number.as_deref(), Some("1415"));
        assert_eq!(address.road.as_deref(), Some("North Water Street"));
        assert_eq!(address.locality.as_deref(), Some("Decatur"));
        assert_eq!(address.region.as_deref(), Some("Illinois"));
        assert_eq!(address.postcode.as_deref(), Some("62526"));
    }

    #[test]
    fn reverse_locality_fallback_test() {
        let body = r#"{"address": {"road": "County Road 12", "village": "Forsyth"}}"#;
        let response: ReverseResponse = serde_json::from_str(body).unwrap();
        let address = response.into_address().unwrap();
        assert_eq!(address.locality.as_deref(), Some("Forsyth"));
        assert_eq!(address.house_number, None);

        let body = r#"{"address": {"town": "Mt Zion", "village": "Ignored"}}"#;
        let response: ReverseResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.into_address().unwrap().locality.as_deref(), Some("Mt Zion"));
    }

    #[test]
    fn reverse_error_test() {
        let response: ReverseResponse = serde_json::from_str(r#"{"error": "Unable to geocode"}"#).unwrap();
        assert_eq!(response.into_address(), None);
    }

    #[test]
    fn search_result_test() {
        let results: Vec<SearchResult> = serde_json::from_str(r#"[{"lat": "39.84479", "lon": "-88.91433", "display_name": "x"}]"#).unwrap();
        assert_eq!(parse_search_result(results), Ok(Some(Coord::new(39.84479, -88.91433))));
        assert_eq!(parse_search_result(vec![]), Ok(None));

        let results = vec![SearchResult { lat: "north".to_string(), lon: "0".to_string() }];
        assert!(matches!(parse_search_result(results), Err(GeocodeError::InvalidResponse(_))));
    }

    #[test]
    fn client_new_test() {
        assert!(NominatimClient::new(DEFAULT_NOMINATIM_URL, "decatur-drill/0.1").is_ok());
        assert!(NominatimClient::new("::", "decatur-drill/0.1").is_err());
    }
}
