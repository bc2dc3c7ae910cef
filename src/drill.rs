//! Ties stations, areas, sampling and the session together.

use rand::Rng;

use crate::config::DrillConfig;
use crate::geo::Coord;
use crate::geocode::Geocoder;
use crate::partition::PartitionBuilder;
use crate::sampler::{AddressSampler, DrillTarget, Region};
use crate::session::{DrillSession, GuessResult, RoundError};
use crate::station::StationRegistry;
use crate::StationAreas;

/// A drill: the stations and their areas, plus the round currently being played.
pub struct Drill<G, R> {
    config: DrillConfig,
    stations: StationRegistry,
    areas: Option<StationAreas>,
    geocoder: G,
    rng: R,
    session: DrillSession,
}

impl<G: Geocoder, R: Rng> Drill<G, R> {
    pub fn new(config: DrillConfig, geocoder: G, rng: R) -> Self {
        let mut drill = Self {
            stations: config.stations(),
            session: DrillSession::new(config.scoring.clone()),
            areas: None,
            config,
            geocoder,
            rng,
        };
        drill.rebuild_areas();

        drill
    }

    #[inline]
    pub fn config(&self) -> &DrillConfig {
        &self.config
    }

    #[inline]
    pub fn stations(&self) -> &StationRegistry {
        &self.stations
    }

    /// Station areas, `None` when they could not be built and rounds cover the whole city.
    #[inline]
    pub fn areas(&self) -> Option<&StationAreas> {
        self.areas.as_ref()
    }

    #[inline]
    pub fn session(&self) -> &DrillSession {
        &self.session
    }

    /// Geocodes the stations that have no coordinate yet and rebuilds the areas when any was resolved.
    ///
    /// Stations the geocoder fails on stay unresolved and out of the partition.
    pub async fn resolve_stations(&mut self) -> usize {
        let resolved = self.stations.resolve_missing(&self.geocoder).await;
        if resolved > 0 {
            self.rebuild_areas();
        }

        resolved
    }

    /// Partitions the city between the resolved stations. On failure the areas are dropped.
    pub fn rebuild_areas(&mut self) -> Option<&StationAreas> {
        let result = PartitionBuilder::default()
            .set_bounding_box(self.config.city_box())
            .from_stations(&self.stations)
            .build();

        self.areas = match result {
            Ok(areas) => {
                log::info!("Built {} station areas", areas.len());
                let raw = areas.iter().filter(|a| !a.is_clipped()).count();
                if raw > 0 {
                    log::warn!("{raw} area(s) could not be clipped to the city bounds");
                }
                Some(areas)
            }
            Err(e) => {
                log::warn!("Cannot build station areas ({e}), rounds will cover the whole city");
                None
            }
        };

        self.areas.as_ref()
    }

    /// Starts a round and samples its target, inside the area of `station` when one is given.
    ///
    /// Falls back to the whole city when `station` has no area.
    pub async fn new_round(&mut self, station: Option<&str>) -> Result<&DrillTarget, RoundError> {
        if let Some(id) = station {
            if self.stations.get(id).is_none() {
                return Err(RoundError::UnknownStation(id.to_string()));
            }
        }

        let ticket = self.session.begin_round();
        let city_box = self.config.city_box();

        let area = station.and_then(|id| self.areas.as_ref().and_then(|areas| areas.get(id)));
        let region = match (station, area) {
            (_, Some(area)) => Region::Area(area),
            (Some(id), None) => {
                log::warn!("Station {id} has no area, sampling the whole city");
                Region::City(&city_box)
            }
            (None, None) => Region::City(&city_box),
        };

        let result = AddressSampler::new(&self.geocoder, &mut self.rng, region, &self.config.sampler)
            .run()
            .await;

        self.session.complete_round(ticket, result)
    }

    pub fn guess(&mut self, coord: Coord) -> Option<&GuessResult> {
        self.session.guess(coord)
    }

    pub fn abandon(&mut self) {
        self.session.abandon();
    }
}
