//! Station service areas: a Voronoi partition of the station sites, clipped to the city box.
//!
//! The tessellation is the dual of the Delaunay triangulation computed by [delaunator]: each cell
//! is bounded by the perpendicular bisectors between its site and the site's Delaunay neighbors.
//! Refer to https://mapbox.github.io/delaunator/ for the half-edge data structure.

mod builder;
mod cell_builder;

use ::geo::algorithm::{bounding_rect::BoundingRect, contains::Contains};
use ::geo::{Point as GeoPoint, Polygon as GeoPolygon};
use delaunator::EMPTY;

use crate::geo::Coord;
use crate::{BoundingBox, Point, Polygon};

pub use self::builder::PartitionBuilder;

/// Defines how the Voronoi cells are treated relative to the bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipBehavior {
    /// Cells are left unclipped, bounded only by an envelope around the box and every site.
    None,

    /// Cells are intersected with the bounding box. A cell whose intersection degenerates keeps its unclipped shape.
    #[default]
    Clip,
}

/// A site of the partition: a station id and its position (`x` longitude, `y` latitude).
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub id: String,
    pub position: Point,
}

impl Site {
    pub fn new(id: impl Into<String>, position: Point) -> Self {
        Self { id: id.into(), position }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PartitionError {
    #[error("at least 2 distinct sites are required, got {distinct}")]
    NotEnoughSites { distinct: usize },

    #[error("bounding box has no area")]
    EmptyBoundingBox,

    #[error("site '{0}' has a non-finite position")]
    InvalidSite(String),

    #[error("site id '{0}' is used more than once")]
    DuplicateSiteId(String),
}

/// The service area of one station.
#[derive(Debug, Clone, PartialEq)]
pub struct StationArea {
    station_id: String,
    site: Point,
    polygon: Polygon,
    // queried once per sampled point
    shape: GeoPolygon<f64>,
    clipped: bool,
}

impl StationArea {
    pub(crate) fn new(station_id: String, site: Point, polygon: Polygon, clipped: bool) -> Self {
        Self {
            shape: polygon.to_geo(),
            station_id,
            site,
            polygon,
            clipped,
        }
    }

    #[inline]
    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    /// Position of the station this area was built around.
    #[inline]
    pub fn site(&self) -> &Point {
        &self.site
    }

    #[inline]
    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// False when the cell could not be clipped to the city box and the raw cell is used instead.
    #[inline]
    pub fn is_clipped(&self) -> bool {
        self.clipped
    }

    /// Whether `point` is in the interior of the area. Shared edges belong to neither neighbor.
    #[inline]
    pub fn contains(&self, point: &Point) -> bool {
        self.shape.contains(&GeoPoint::new(point.x, point.y))
    }

    #[inline]
    pub fn contains_coord(&self, coord: &Coord) -> bool {
        self.contains(&coord.to_point())
    }

    pub fn bounding_box(&self) -> BoundingBox {
        // areas are never built from degenerate polygons
        self.shape
            .bounding_rect()
            .map(|rect| BoundingBox::from_rect(&rect))
            .unwrap_or_else(|| BoundingBox::new(self.site.clone(), 0.0, 0.0))
    }
}

/// One area per station, in the order the sites were given.
#[derive(Debug, Clone)]
pub struct StationAreas {
    areas: Vec<StationArea>,
    bounding_box: BoundingBox,
    clip_behavior: ClipBehavior,
}

impl StationAreas {
    pub fn get(&self, station_id: &str) -> Option<&StationArea> {
        self.areas.iter().find(|a| a.station_id == station_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StationArea> {
        self.areas.iter()
    }

    /// Finds the area containing `point`. A point exactly on a shared edge has no area.
    pub fn locate(&self, point: &Point) -> Option<&StationArea> {
        self.areas.iter().find(|a| a.contains(point))
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// The city box the areas were clipped to.
    #[inline]
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    #[inline]
    pub fn clip_behavior(&self) -> ClipBehavior {
        self.clip_behavior
    }

    pub fn sites(&self) -> Vec<Site> {
        self.areas.iter().map(|a| Site::new(a.station_id.clone(), a.site.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::station::{Station, StationRegistry};
    use crate::utils::test::validate_areas;

    use super::*;

    fn decatur_box() -> BoundingBox {
        BoundingBox::from_coords(Coord::new(39.80, -89.05), Coord::new(39.90, -88.85))
    }

    fn decatur_areas() -> StationAreas {
        PartitionBuilder::default()
            .set_bounding_box(decatur_box())
            .from_stations(&StationRegistry::decatur())
            .build()
            .expect("Decatur stations must partition")
    }

    #[test]
    fn decatur_partition_test() {
        let areas = decatur_areas();
        assert_eq!(areas.len(), 7);

        let sites: Vec<Point> = StationRegistry::decatur().resolved().map(|s| s.coord.unwrap().to_point()).collect();
        validate_areas(&areas, &sites);
    }

    #[test]
    fn areas_stay_inside_city_box_test() {
        let areas = decatur_areas();
        for area in areas.iter() {
            assert!(area.is_clipped());
            assert!(decatur_box().contains_box(&area.bounding_box(), 1e-9), "area {} leaks out of the city", area.station_id());
        }
    }

    #[test]
    fn areas_are_disjoint_test() {
        use rand::{SeedableRng, rngs::StdRng};

        let areas = decatur_areas();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..2_000 {
            let p = areas.bounding_box().sample(&mut rng);
            let owners: Vec<&str> = areas.iter().filter(|a| a.contains(&p)).map(|a| a.station_id()).collect();
            assert!(owners.len() <= 1, "{:?} is inside {:?}", p, owners);
        }
    }

    #[test]
    fn areas_match_nearest_station_test() {
        use rand::{SeedableRng, rngs::StdRng};
        use crate::utils::dist2;

        let areas = decatur_areas();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2_000 {
            let p = areas.bounding_box().sample(&mut rng);
            if let Some(area) = areas.locate(&p) {
                let nearest = areas.iter()
                    .min_by(|a, b| dist2(a.site(), &p).partial_cmp(&dist2(b.site(), &p)).unwrap())
                    .unwrap();
                assert_eq!(area.station_id(), nearest.station_id());
            }
        }
    }

    #[test]
    fn partition_is_idempotent_test() {
        let first = decatur_areas();
        let second = PartitionBuilder::from(&first).build().unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.station_id(), b.station_id());
            assert!((a.polygon().signed_area() - b.polygon().signed_area()).abs() < 1e-12);
            assert_eq!(a.bounding_box(), b.bounding_box());
        }
    }

    #[test]
    fn unresolved_stations_are_skipped_test() {
        let registry = StationRegistry::new(vec![
            Station::new("1", "A", "a").with_coord(Coord::new(39.85, -88.95)),
            Station::new("2", "B", "b"),
            Station::new("3", "C", "c").with_coord(Coord::new(39.83, -88.90)),
        ]);
        let areas = PartitionBuilder::default()
            .set_bounding_box(decatur_box())
            .from_stations(&registry)
            .build()
            .unwrap();

        assert_eq!(areas.len(), 2);
        assert!(areas.get("2").is_none());
    }

    #[test]
    fn not_enough_sites_test() {
        let registry = StationRegistry::new(vec![
            Station::new("1", "A", "a").with_coord(Coord::new(39.85, -88.95)),
            Station::new("2", "B", "b"),
        ]);
        let result = PartitionBuilder::default()
            .set_bounding_box(decatur_box())
            .from_stations(&registry)
            .build();
        assert_eq!(result.unwrap_err(), PartitionError::NotEnoughSites { distinct: 1 });

        let same_place = vec![Site::new("1", Point { x: 0.1, y: 0.1 }), Site::new("2", Point { x: 0.1, y: 0.1 })];
        let result = PartitionBuilder::default().set_sites(same_place).build();
        assert_eq!(result.unwrap_err(), PartitionError::NotEnoughSites { distinct: 1 });
    }

    #[test]
    fn nearly_coincident_sites_are_one_site_test() {
        let sites = vec![
            Site::new("1", Point { x: -88.95, y: 39.85 }),
            Site::new("2", Point { x: -88.95 + 1e-11, y: 39.85 }),
        ];
        let result = PartitionBuilder::default().set_bounding_box(decatur_box()).set_sites(sites).build();
        assert_eq!(result.unwrap_err(), PartitionError::NotEnoughSites { distinct: 1 });
    }

    #[test]
    fn invalid_input_test() {
        let sites = vec![Site::new("1", Point { x: 0.1, y: 0.1 }), Site::new("2", Point { x: -0.1, y: 0.1 })];

        let result = PartitionBuilder::default()
            .set_bounding_box(BoundingBox::new_centered(0.0, 1.0))
            .set_sites(sites.clone())
            .build();
        assert_eq!(result.unwrap_err(), PartitionError::EmptyBoundingBox);

        let mut duplicated = sites.clone();
        duplicated[1].id = "1".to_string();
        let result = PartitionBuilder::default().set_sites(duplicated).build();
        assert_eq!(result.unwrap_err(), PartitionError::DuplicateSiteId("1".to_string()));

        let mut nan = sites;
        nan[0].position.x = f64::NAN;
        let result = PartitionBuilder::default().set_sites(nan).build();
        assert_eq!(result.unwrap_err(), PartitionError::InvalidSite("1".to_string()));
    }
}
