//! Rejection sampling of real street addresses.
//!
//! A random point is drawn in the bounding box of the region, filtered by the region polygon,
//! reverse geocoded and validated. Each draw consumes one attempt of a fixed budget.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geo::Coord;
use crate::geocode::{Address, Geocoder};
use crate::partition::StationArea;
use crate::utils::collapse_whitespace;
use crate::BoundingBox;

pub const DEFAULT_MAX_ATTEMPTS: usize = 30;

/// Settings for the address sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Upper bound of random points tried per round, including those rejected before geocoding.
    pub max_attempts: usize,
    /// Locality an address must belong to, compared case-insensitively.
    pub city: String,
    /// State written in the label when the provider does not report one.
    pub default_region: Option<String>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            city: "Decatur".to_string(),
            default_region: Some("IL".to_string()),
        }
    }
}

/// A sampled address: where it is and how it reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillTarget {
    pub coord: Coord,
    pub label: String,
    pub address: Address,
    /// Station whose area the address was drawn from, if any.
    pub station_id: Option<String>,
}

/// Where random points are drawn from.
#[derive(Debug, Clone, Copy)]
pub enum Region<'a> {
    /// The whole city box.
    City(&'a BoundingBox),
    /// One station's area, sampled through its bounding box.
    Area(&'a StationArea),
}

impl<'a> Region<'a> {
    fn bounding_box(&self) -> BoundingBox {
        match self {
            Region::City(bbox) => (*bbox).clone(),
            Region::Area(area) => area.bounding_box(),
        }
    }

    fn accepts(&self, coord: &Coord) -> bool {
        match self {
            Region::City(_) => true,
            Region::Area(area) => area.contains_coord(coord),
        }
    }

    fn station_id(&self) -> Option<String> {
        match self {
            Region::City(_) => None,
            Region::Area(area) => Some(area.station_id().to_string()),
        }
    }
}

/// Why a candidate point was thrown away.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    OutsideArea,
    GeocoderUnavailable(String),
    NoResult,
    MissingHouseNumber,
    /// The house number would not survive as the first token of the label, e.g. "1204 1/2".
    MalformedHouseNumber(String),
    MissingRoad,
    WrongLocality(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SamplerState {
    /// Still drawing points; `attempts` have been used so far.
    Sampling { attempts: usize },
    Succeeded(DrillTarget),
    Exhausted { attempts: usize },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SampleError {
    #[error("could not find a random {city} address after {attempts} attempts")]
    Exhausted { city: String, attempts: usize },
}

/// Checks that `address` is a house address in the configured city and formats its label.
pub fn validate(address: &Address, config: &SamplerConfig) -> Result<String, Rejection> {
    match &address.house_number {
        Some(house) if !house.chars().any(|c| c.is_ascii_digit()) => return Err(Rejection::MissingHouseNumber),
        Some(house) if house.chars().any(|c| c.is_whitespace() || c == ',') => {
            return Err(Rejection::MalformedHouseNumber(house.clone()));
        }
        Some(_) => {}
        None => return Err(Rejection::MissingHouseNumber),
    }

    if address.road.is_none() {
        return Err(Rejection::MissingRoad);
    }

    let same_city = address
        .locality
        .as_deref()
        .map_or(false, |l| l.trim().to_lowercase() == config.city.trim().to_lowercase());
    if !same_city {
        return Err(Rejection::WrongLocality(address.locality.clone()));
    }

    Ok(format_label(address, config.default_region.as_deref()))
}

/// Formats `"{house} {road}, {city}, {state}"`, leaving out missing parts and collapsing whitespace.
pub fn format_label(address: &Address, default_region: Option<&str>) -> String {
    let street = collapse_whitespace(&format!(
        "{} {}",
        address.house_number.as_deref().unwrap_or_default(),
        address.road.as_deref().unwrap_or_default()
    ));
    let region = address.region.as_deref().or(default_region);

    [Some(street.as_str()), address.locality.as_deref(), region]
        .into_iter()
        .flatten()
        .map(collapse_whitespace)
        .filter(|part| !part.is_empty())
        .collect::<Vec<String>>()
        .join(", ")
}

/// Splits a label back into its house number and road.
pub fn parse_label(label: &str) -> Option<(String, String)> {
    let street = label.split(',').next()?.trim();
    let (house, road) = street.split_once(' ')?;
    let road = road.trim();

    if house.chars().any(|c| c.is_ascii_digit()) && !road.is_empty() {
        Some((house.to_string(), road.to_string()))
    } else {
        None
    }
}

/// Bounded rejection sampler.
///
/// Every call to [Self::step] consumes one attempt and moves the state to `Succeeded`, to `Exhausted`
/// once the budget is spent, or leaves it `Sampling`.
pub struct AddressSampler<'a, G, R> {
    geocoder: &'a G,
    rng: &'a mut R,
    region: Region<'a>,
    bounding_box: BoundingBox,
    config: &'a SamplerConfig,
    state: SamplerState,
    rejections: Vec<Rejection>,
}

impl<'a, G: Geocoder, R: Rng> AddressSampler<'a, G, R> {
    pub fn new(geocoder: &'a G, rng: &'a mut R, region: Region<'a>, config: &'a SamplerConfig) -> Self {
        let state = if config.max_attempts == 0 {
            SamplerState::Exhausted { attempts: 0 }
        } else {
            SamplerState::Sampling { attempts: 0 }
        };

        Self {
            bounding_box: region.bounding_box(),
            geocoder,
            rng,
            region,
            config,
            state,
            rejections: Vec::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> &SamplerState {
        &self.state
    }

    /// Every rejection so far, in order.
    #[inline]
    pub fn rejections(&self) -> &[Rejection] {
        &self.rejections
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        !matches!(self.state, SamplerState::Sampling { .. })
    }

    /// Tries one random point. Does nothing once the sampler is done.
    pub async fn step(&mut self) -> &SamplerState {
        let attempts = match self.state {
            SamplerState::Sampling { attempts } => attempts + 1,
            _ => return &self.state,
        };

        let coord = Coord::from_point(&self.bounding_box.sample(self.rng));
        let outcome = self.try_point(coord).await;
        match outcome {
            Ok(target) => {
                log::info!("Found {} at {} after {} attempt(s)", target.label, target.coord, attempts);
                self.state = SamplerState::Succeeded(target);
            }
            Err(rejection) => {
                log::debug!("Attempt {attempts}: rejected {coord}: {:?}", rejection);
                self.rejections.push(rejection);
                self.state = if attempts >= self.config.max_attempts {
                    log::warn!("Gave up after {attempts} attempts");
                    SamplerState::Exhausted { attempts }
                } else {
                    SamplerState::Sampling { attempts }
                };
            }
        }

        &self.state
    }

    /// Steps until the sampler succeeds or runs out of attempts.
    pub async fn run(mut self) -> Result<DrillTarget, SampleError> {
        while !self.is_done() {
            self.step().await;
        }

        match self.state {
            SamplerState::Succeeded(target) => Ok(target),
            SamplerState::Exhausted { attempts } | SamplerState::Sampling { attempts } => Err(SampleError::Exhausted {
                city: self.config.city.clone(),
                attempts,
            }),
        }
    }

    async fn try_point(&self, coord: Coord) -> Result<DrillTarget, Rejection> {
        if !self.region.accepts(&coord) {
            return Err(Rejection::OutsideArea);
        }

        let address = match self.geocoder.reverse(coord).await {
            Ok(Some(address)) => address,
            Ok(None) => return Err(Rejection::NoResult),
            Err(e) => return Err(Rejection::GeocoderUnavailable(e.to_string())),
        };

        let label = validate(&address, self.config)?;
        Ok(DrillTarget {
            coord,
            label,
            address,
            station_id: self.region.station_id(),
        })
    }
}
