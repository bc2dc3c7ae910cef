//! Geographic coordinates and great-circle distances.

use std::fmt;
use std::str::FromStr;

use ::geo::algorithm::Distance;
use ::geo::{Haversine, Point as GeoPoint};
use serde::{Deserialize, Serialize};

use super::Point;

// geo 0.30 keeps its constant private; same value through the public measure
const MEAN_EARTH_RADIUS: f64 = Haversine.radius();

/// Sphere radius used for distances, in meters. Same as the web map provider's spherical geometry.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

// geo measures on its mean radius, distances are rescaled to ours
const RADIUS_SCALE: f64 = EARTH_RADIUS_M / MEAN_EARTH_RADIUS;

pub const FEET_PER_METER: f64 = 3.28084;

/// A latitude / longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lng: f64,
}

impl Coord {
    #[inline]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Planar point with `x` as longitude and `y` as latitude.
    #[inline]
    pub fn to_point(&self) -> Point {
        Point { x: self.lng, y: self.lat }
    }

    #[inline]
    pub fn from_point(point: &Point) -> Self {
        Self { lat: point.y, lng: point.x }
    }

    #[inline]
    pub fn to_geo(&self) -> GeoPoint<f64> {
        GeoPoint::new(self.lng, self.lat)
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_to(&self, other: &Coord) -> f64 {
        haversine_m(self, other)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinate '{0}', expected 'lat,lng'")]
pub struct ParseCoordError(String);

impl FromStr for Coord {
    type Err = ParseCoordError;

    /// Parses `"lat,lng"`, whitespace around either number is allowed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCoordError(s.to_string());
        let (lat, lng) = s.split_once(',').ok_or_else(err)?;
        let lat: f64 = lat.trim().parse().map_err(|_| err())?;
        let lng: f64 = lng.trim().parse().map_err(|_| err())?;

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(err());
        }

        Ok(Coord { lat, lng })
    }
}

/// Haversine distance between `a` and `b` in meters.
pub fn haversine_m(a: &Coord, b: &Coord) -> f64 {
    Haversine.distance(a.to_geo(), b.to_geo()) * RADIUS_SCALE
}

#[inline]
pub fn meters_to_feet(m: f64) -> f64 {
    m * FEET_PER_METER
}

/// Length in meters of the polyline through `path`.
pub fn path_length_m(path: &[Coord]) -> f64 {
    path.windows(2).fold(0.0, |length, w| length + haversine_m(&w[0], &w[1]))
}

/// Returns the coordinate `distance_m` meters north of `from`.
pub fn offset_north(from: &Coord, distance_m: f64) -> Coord {
    Coord {
        lat: from.lat + (distance_m / EARTH_RADIUS_M).to_degrees(),
        lng: from.lng,
    }
}
