use delaunator::triangulate;

use crate::station::StationRegistry;
use crate::utils::dist2;

use super::cell_builder::{CellBuilder, SAME_SITE_EPSILON2};
use super::{BoundingBox, ClipBehavior, PartitionError, Point, Site, StationArea, StationAreas};

/// Provides a convenient way to partition a bounding box between station sites.
#[derive(Default)]
pub struct PartitionBuilder {
    sites: Option<Vec<Site>>,
    bounding_box: BoundingBox,
    clip_behavior: ClipBehavior,
}

impl PartitionBuilder {

    /// Sets the [BoundingBox] (the city boundary) the areas are clipped to.
    pub fn set_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = bounding_box;
        self
    }

    /// Sets the [ClipBehavior] to be used when building the areas.
    pub fn set_clip_behavior(mut self, clip_behavior: ClipBehavior) -> Self {
        self.clip_behavior = clip_behavior;
        self
    }

    /// Sets the [Site]s, one per area that should be constructed.
    pub fn set_sites(mut self, sites: Vec<Site>) -> Self {
        self.sites.replace(sites);
        self
    }

    /// Uses every station with a known coordinate as a site. Unresolved stations are left out.
    pub fn from_stations(self, registry: &StationRegistry) -> Self {
        let sites = registry
            .iter()
            .filter_map(|s| match s.coord {
                Some(coord) => Some(Site::new(s.id.clone(), coord.to_point())),
                None => {
                    log::debug!("Station {} has no coordinate yet, leaving it out of the partition", s.id);
                    None
                }
            })
            .collect();

        self.set_sites(sites)
    }

    /// Consumes this builder and partitions the bounding box.
    ///
    /// Fails when fewer than two distinct sites are available, when a site is not a finite position,
    /// when two sites share an id or when the bounding box has no area.
    pub fn build(mut self) -> Result<StationAreas, PartitionError> {
        let sites = self.sites.take().unwrap_or_default();
        self.validate(&sites)?;

        let positions: Vec<Point> = sites.iter().map(|s| s.position.clone()).collect();
        let triangulation = triangulate(&positions);
        log::debug!(
            "Triangulated {} sites into {} triangles",
            positions.len(),
            triangulation.triangles.len() / 3
        );

        let result = CellBuilder::new(&positions, self.bounding_box.clone(), self.clip_behavior)
            .build(&positions, &triangulation);

        let areas = sites
            .into_iter()
            .zip(result.cells)
            .zip(result.clipped)
            .map(|((site, polygon), clipped)| StationArea::new(site.id, site.position, polygon, clipped))
            .collect();

        Ok(StationAreas {
            areas,
            bounding_box: self.bounding_box,
            clip_behavior: self.clip_behavior,
        })
    }

    fn validate(&self, sites: &[Site]) -> Result<(), PartitionError> {
        if self.bounding_box.is_empty() {
            return Err(PartitionError::EmptyBoundingBox);
        }

        for (i, site) in sites.iter().enumerate() {
            if !(site.position.x.is_finite() && site.position.y.is_finite()) {
                return Err(PartitionError::InvalidSite(site.id.clone()));
            }

            if sites[..i].iter().any(|other| other.id == site.id) {
                return Err(PartitionError::DuplicateSiteId(site.id.clone()));
            }
        }

        let distinct = sites
            .iter()
            .enumerate()
            .filter(|(i, site)| {
                !sites[..*i]
                    .iter()
                    .any(|other| dist2(&other.position, &site.position) <= SAME_SITE_EPSILON2)
            })
            .count();

        if distinct < 2 {
            return Err(PartitionError::NotEnoughSites { distinct });
        }

        Ok(())
    }

    fn create_builder_from_areas_without_sites(areas: &StationAreas) -> Self {
        Self {
            bounding_box: areas.bounding_box().clone(),
            clip_behavior: areas.clip_behavior(),
            sites: None,
        }
    }
}

impl From<&StationAreas> for PartitionBuilder {
    /// Creates a builder with the same configuration that produced `areas`.
    /// Useful for recomputing areas after station positions are re-established.
    fn from(areas: &StationAreas) -> Self {
        let mut builder = Self::create_builder_from_areas_without_sites(areas);
        builder.sites = Some(areas.sites());

        builder
    }
}
