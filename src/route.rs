//! Driving routes and comparison against a path traced by the player.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::geo::{Coord, path_length_m};
use crate::geocode::parse_base_url;

pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org/";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("routing request failed: {0}")]
    Network(String),

    #[error("routing service answered {code}: {message}")]
    Service { code: String, message: String },

    #[error("no route between {from} and {to}")]
    NoRoute { from: Coord, to: Coord },

    #[error("routing service is misconfigured: {0}")]
    Config(String),
}

impl From<reqwest::Error> for RouteError {
    fn from(value: reqwest::Error) -> Self {
        RouteError::Network(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub path: Vec<Coord>,
    pub distance_m: f64,
    pub duration_s: f64,
}

/// Provides driving routes between two coordinates.
#[allow(async_fn_in_trait)]
pub trait RouteProvider {
    async fn route(&self, from: Coord, to: Coord) -> Result<Route, RouteError>;
}

/// Client of the OSRM route service.
#[derive(Clone)]
pub struct OsrmClient {
    inner: reqwest::Client,
    base: Url,
}

#[derive(Deserialize, Debug)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize, Debug)]
struct OsrmRoute {
    geometry: LineString,
    distance: f64,
    duration: f64,
}

#[derive(Deserialize, Debug)]
struct LineString {
    /// `[lng, lat]` pairs.
    coordinates: Vec<[f64; 2]>,
}

impl OsrmResponse {
    fn into_route(self, from: Coord, to: Coord) -> Result<Route, RouteError> {
        if self.code != "Ok" {
            return Err(RouteError::Service {
                message: self.message.unwrap_or_default(),
                code: self.code,
            });
        }

        let route = self.routes.into_iter().next().ok_or(RouteError::NoRoute { from, to })?;
        Ok(Route {
            path: route.geometry.coordinates.iter().map(|[lng, lat]| Coord::new(*lat, *lng)).collect(),
            distance_m: route.distance,
            duration_s: route.duration,
        })
    }
}

impl OsrmClient {
    pub fn new(base: &str) -> Result<Self, RouteError> {
        let base = parse_base_url(base).map_err(|e| RouteError::Config(e.to_string()))?;

        Ok(Self {
            inner: reqwest::Client::new(),
            base,
        })
    }

    fn route_url(&self, from: &Coord, to: &Coord) -> Result<Url, RouteError> {
        let path = format!("route/v1/driving/{},{};{},{}", from.lng, from.lat, to.lng, to.lat);
        self.base
            .join(&path)
            .map_err(|e| RouteError::Config(format!("error joining url: {e}")))
    }
}

impl RouteProvider for OsrmClient {
    async fn route(&self, from: Coord, to: Coord) -> Result<Route, RouteError> {
        let url = self.route_url(&from, &to)?;
        log::debug!("Requesting route {url}");

        // OSRM answers 400 with a json body for unroutable requests, so the status is not checked here
        let response: OsrmResponse = self
            .inner
            .get(url)
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?
            .json()
            .await?;

        response.into_route(from, to)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteComparison {
    pub traced_m: f64,
    pub route_m: f64,
    /// Traced minus route length. Positive when the traced path is longer.
    pub difference_m: f64,
    /// Traced over route length, `None` for an empty route.
    pub ratio: Option<f64>,
}

impl RouteComparison {
    pub fn message(&self) -> String {
        match self.ratio {
            Some(ratio) => format!(
                "Your path: {:.0} m, driving route: {:.0} m ({:+.0} m, {:.0}%).",
                self.traced_m,
                self.route_m,
                self.difference_m,
                ratio * 100.0
            ),
            None => format!("Your path: {:.0} m, the driving route is empty.", self.traced_m),
        }
    }
}

/// Compares a traced path with a provider route. The provider's distance wins over the route geometry.
pub fn compare_paths(traced: &[Coord], route: &Route) -> RouteComparison {
    let traced_m = path_length_m(traced);
    let route_m = if route.distance_m > 0.0 {
        route.distance_m
    } else {
        path_length_m(&route.path)
    };

    RouteComparison {
        traced_m,
        route_m,
        difference_m: traced_m - route_m,
        ratio: (route_m > 0.0).then(|| traced_m / route_m),
    }
}

#[cfg(test)]
mod tests {
    use crate::geo::offset_north;

    use super::*;

    const BODY: &str = r#"{
        "code": "Ok",
        "routes": [{
            "geometry": {"type": "LineString", "coordinates": [[-88.9519, 39.8654], [-88.9519, 39.8600], [-88.9400, 39.8600]]},
            "legs": [],
            "weight_name": "routability",
            "weight": 180.2,
            "duration": 165.4,
            "distance": 1622.5
        }],
        "waypoints": []
    }"#;

    #[test]
    fn parse_route_test() {
        let response: OsrmResponse = serde_json::from_str(BODY).unwrap();
        let route = response.into_route(Coord::new(39.8654, -88.9519), Coord::new(39.86, -88.94)).unwrap();

        assert_eq!(route.path.len(), 3);
        assert_eq!(route.path[0], Coord::new(39.8654, -88.9519));
        assert_eq!(route.distance_m, 1622.5);
        assert_eq!(route.duration_s, 165.4);
    }

    #[test]
    fn service_error_test() {
        let from = Coord::new(39.8654, -88.9519);
        let to = Coord::new(0.0, 0.0);

        let response: OsrmResponse = serde_json::from_str(r#"{"code": "NoRoute", "message": "Impossible route"}"#).unwrap();
        assert_eq!(response.into_route(from, to), Err(RouteError::Service {
            code: "NoRoute".to_string(),
            message: "Impossible route".to_string(),
        }));

        let response: OsrmResponse = serde_json::from_str(r#"{"code": "Ok", "routes": []}"#).unwrap();
        assert_eq!(response.into_route(from, to), Err(RouteError::NoRoute { from, to }));
    }

    #[test]
    fn route_url_test() {
        let client = OsrmClient::new("http://localhost:5000").unwrap();
        let url = client.route_url(&Coord::new(39.8, -88.9), &Coord::new(39.9, -88.95)).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/route/v1/driving/-88.9,39.8;-88.95,39.9");
    }

    #[test]
    fn compare_paths_test() {
        let start = Coord::new(39.84, -88.95);
        let traced = vec![start, offset_north(&start, 600.0)];
        let route = Route {
            path: vec![start, offset_north(&start, 500.0)],
            distance_m: 0.0,
            duration_s: 60.0,
        };

        let comparison = compare_paths(&traced, &route);
        assert!((comparison.traced_m - 600.0).abs() < 1e-6);
        assert!((comparison.route_m - 500.0).abs() < 1e-6);
        assert!((comparison.difference_m - 100.0).abs() < 1e-6);
        assert!((comparison.ratio.unwrap() - 1.2).abs() < 1e-9);

        let route = Route { distance_m: 750.0, ..route };
        assert_eq!(compare_paths(&traced, &route).route_m, 750.0);
    }

    #[test]
    fn compare_against_empty_route_test() {
        let route = Route { path: vec![], distance_m: 0.0, duration_s: 0.0 };
        let comparison = compare_paths(&[Coord::new(39.84, -88.95)], &route);
        assert_eq!(comparison.traced_m, 0.0);
        assert_eq!(comparison.ratio, None);
        assert_eq!(comparison.message(), "Your path: 0 m, the driving route is empty.");
    }
}
