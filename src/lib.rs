//! Address drill for dispatchers learning a city.
//!
//! The city is split between its fire stations with a Voronoi partition computed from the Delaunay
//! triangulation of the station positions, clipped to the city bounds. A round picks a random real
//! street address, optionally inside one station's area, and scores how far the player's guess lands
//! from it.
//!
//! ```no_run
//! use decatur_drill::config::DrillConfig;
//! use decatur_drill::drill::Drill;
//! use rand::SeedableRng;
//!
//! # async fn play() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DrillConfig::default();
//! let geocoder = config.geocoder.build()?;
//! let mut drill = Drill::new(config, geocoder, rand::rngs::StdRng::from_entropy());
//!
//! let target = drill.new_round(Some("1")).await?.clone();
//! println!("Find {}", target.label);
//! # Ok(())
//! # }
//! ```

mod bounding_box;
mod iterator;
mod polygon;
mod utils;

pub mod config;
pub mod drill;
pub mod geo;
pub mod geocode;
pub mod partition;
pub mod route;
pub mod sampler;
pub mod session;
pub mod station;
pub mod svg;

pub use delaunator::{EMPTY, Point};

pub use self::bounding_box::BoundingBox;
pub use self::geo::Coord;
pub use self::partition::{ClipBehavior, PartitionBuilder, PartitionError, StationArea, StationAreas};
pub use self::polygon::Polygon;
pub use self::utils::collapse_whitespace;
