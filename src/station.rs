//! Fire stations the drill can be centered on.

use serde::{Deserialize, Serialize};

use crate::geo::Coord;
use crate::geocode::Geocoder;

/// Color used when a station does not define one.
pub const DEFAULT_STATION_COLOR: &str = "#999999";

/// A fire station. The coordinate is `None` until it has been geocoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub coord: Option<Coord>,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    DEFAULT_STATION_COLOR.to_string()
}

impl Station {
    pub fn new(id: impl Into<String>, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            coord: None,
            color: default_color(),
        }
    }

    pub fn with_coord(mut self, coord: Coord) -> Self {
        self.coord = Some(coord);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.coord.is_some()
    }
}

/// Holds every known station, in display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationRegistry {
    stations: Vec<Station>,
}

impl StationRegistry {
    pub fn new(stations: Vec<Station>) -> Self {
        Self { stations }
    }

    /// The seven Decatur Fire Department stations with their surveyed coordinates.
    pub fn decatur() -> Self {
        Self::new(vec![
            Station::new("1", "Station 1 - Headquarters", "1415 N Water Street, Decatur, IL 62526")
                .with_coord(Coord::new(39.8654, -88.9519))
                .with_color("#ff5555"),
            Station::new("2", "Station 2", "2707 E William Street, Decatur, IL 62521")
                .with_coord(Coord::new(39.84479, -88.91433))
                .with_color("#ff9955"),
            Station::new("3", "Station 3", "855 N Fairview Avenue, Decatur, IL 62526")
                .with_coord(Coord::new(39.8526, -88.9804))
                .with_color("#ffee55"),
            Station::new("4", "Station 4", "2760 N 22nd Street, Decatur, IL 62526")
                .with_coord(Coord::new(39.8868, -88.9296))
                .with_color("#55ff55"),
            Station::new("5", "Station 5", "3808 Greenridge Drive, Decatur, IL 62526")
                .with_coord(Coord::new(39.8953, -88.9458))
                .with_color("#55ddff"),
            Station::new("6", "Station 6", "1880 S US Route BUS 51, Decatur, IL 62521")
                .with_coord(Coord::new(39.82031, -88.95992))
                .with_color("#9977ff"),
            Station::new("7", "Station 7", "3540 E Chestnut Avenue, Decatur, IL 62521")
                .with_coord(Coord::new(39.82831, -88.87796))
                .with_color("#ff77dd"),
        ])
    }

    pub fn get(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter()
    }

    /// Stations whose coordinate is known.
    pub fn resolved(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter().filter(|s| s.is_resolved())
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Forward-geocodes every station without a coordinate, one request per station.
    ///
    /// Stations the geocoder cannot find, or fails on, stay unresolved and are tried again on the
    /// next call. Returns how many stations were resolved.
    pub async fn resolve_missing<G: Geocoder>(&mut self, geocoder: &G) -> usize {
        let mut resolved = 0;
        for station in self.stations.iter_mut().filter(|s| !s.is_resolved()) {
            match geocoder.forward(&station.address).await {
                Ok(Some(coord)) => {
                    log::info!("Resolved {} ({}) to {}", station.name, station.address, coord);
                    station.coord = Some(coord);
                    resolved += 1;
                }
                Ok(None) => log::warn!("Could not geocode {} ({})", station.name, station.address),
                Err(e) => log::warn!("Could not geocode {} ({}): {}", station.name, station.address, e),
            }
        }

        resolved
    }
}

#[cfg(test)]
mod tests {
    use crate::geocode::GeocodeError;
    use crate::geocode::test::FakeGeocoder;

    use super::*;

    #[test]
    fn decatur_registry_test() {
        let registry = StationRegistry::decatur();
        assert_eq!(registry.len(), 7);
        assert_eq!(registry.resolved().count(), 7);
        assert_eq!(registry.get("4").unwrap().color, "#55ff55");
        assert!(registry.get("8").is_none());
    }

    #[test]
    fn station_deserialize_defaults_test() {
        let station: Station = serde_json::from_str(r#"{"id": "9", "name": "Station 9", "address": "1 Main St"}"#).unwrap();
        assert_eq!(station.coord, None);
        assert_eq!(station.color, DEFAULT_STATION_COLOR);
    }

    #[tokio::test]
    async fn resolve_missing_test() {
        let mut registry = StationRegistry::new(vec![
            Station::new("1", "Known", "known address").with_coord(Coord::new(39.86, -88.95)),
            Station::new("2", "Found", "found address"),
            Station::new("3", "Lost", "lost address"),
        ]);
        let geocoder = FakeGeocoder::default().with_forward("found address", Coord::new(39.84, -88.91));

        let resolved = registry.resolve_missing(&geocoder).await;

        assert_eq!(resolved, 1);
        assert_eq!(registry.get("2").unwrap().coord, Some(Coord::new(39.84, -88.91)));
        assert_eq!(registry.get("3").unwrap().coord, None);
        assert_eq!(geocoder.forward_calls(), 2, "one request per unresolved station");
    }

    #[tokio::test]
    async fn resolve_missing_continues_after_error_test() {
        let mut registry = StationRegistry::new(vec![
            Station::new("1", "Down", "down address"),
            Station::new("2", "Found", "found address"),
        ]);
        let geocoder = FakeGeocoder::default()
            .with_forward_error("down address", GeocodeError::Network("down".to_string()))
            .with_forward("found address", Coord::new(39.84, -88.91));

        assert_eq!(registry.resolve_missing(&geocoder).await, 1);
        assert_eq!(registry.get("1").unwrap().coord, None);
        assert_eq!(registry.get("2").unwrap().coord, Some(Coord::new(39.84, -88.91)));
    }
}
