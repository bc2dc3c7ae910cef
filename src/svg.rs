//! Renders station areas as SVG, the command line stand-in for a map.

use crate::station::{DEFAULT_STATION_COLOR, StationRegistry};
use crate::{BoundingBox, Point, StationAreas};

const CANVAS_WIDTH: f64 = 800.;
const POINT_SIZE: usize = 4;
const SITE_COLOR: &str = "black";
const LINE_WIDTH: usize = 1;
const BOX_COLOR: &str = "#333333";
const AREA_OPACITY: f64 = 0.15;

/// Equirectangular projection of the city box onto the canvas, north up.
struct Projection {
    bounding_box: BoundingBox,
    width: f64,
    height: f64,
}

impl Projection {
    fn new(bounding_box: &BoundingBox) -> Self {
        // a degree of longitude shrinks with latitude
        let lat_scale = bounding_box.center().y.to_radians().cos();
        let height = CANVAS_WIDTH * bounding_box.height() / (bounding_box.width() * lat_scale);

        Self {
            bounding_box: bounding_box.clone(),
            width: CANVAS_WIDTH,
            height,
        }
    }

    fn project(&self, p: &Point) -> (f64, f64) {
        let bbox = &self.bounding_box;
        (
            (p.x - bbox.left()) / bbox.width() * self.width,
            (bbox.top() - p.y) / bbox.height() * self.height,
        )
    }
}

/// Renders every area filled with its station color, the station sites and the city box outline.
pub fn render_areas(areas: &StationAreas, stations: &StationRegistry) -> String {
    let projection = Projection::new(areas.bounding_box());

    format!(
        r#"<svg viewBox="0 0 {width:.0} {height:.0}" xmlns="http://www.w3.org/2000/svg">
<rect width="100%" height="100%" fill="white" />
{areas}
{sites}
<rect x="0" y="0" width="{width:.0}" height="{height:.0}" fill="none" style="stroke:{box_color};stroke-width:{line_width}" />
</svg>
"#,
        width = projection.width,
        height = projection.height,
        areas = render_area_polygons(&projection, areas, stations),
        sites = render_sites(&projection, areas),
        box_color = BOX_COLOR,
        line_width = LINE_WIDTH,
    )
}

fn render_area_polygons(projection: &Projection, areas: &StationAreas, stations: &StationRegistry) -> String {
    areas.iter().fold(String::new(), |acc, area| {
        let color = stations.get(area.station_id()).map_or(DEFAULT_STATION_COLOR, |s| s.color.as_str());
        let path = area
            .polygon()
            .rings()
            .iter()
            .map(|ring| {
                let points = ring
                    .iter()
                    .map(|p| {
                        let (x, y) = projection.project(p);
                        format!("{x:.2},{y:.2}")
                    })
                    .collect::<Vec<String>>()
                    .join(" L ");
                format!("M {points} Z")
            })
            .collect::<Vec<String>>()
            .join(" ");

        acc + &format!(
            r#"<path id="station-{id}" d="{path}" fill="{color}" fill-opacity="{opacity}" fill-rule="evenodd" style="stroke:{color};stroke-width:{width}" />"#,
            id = area.station_id(),
            opacity = AREA_OPACITY,
            width = LINE_WIDTH,
        ) + "\n"
    })
}

fn render_sites(projection: &Projection, areas: &StationAreas) -> String {
    areas.iter().fold(String::new(), |acc, area| {
        let (x, y) = projection.project(area.site());
        acc + &format!(
            r#"<circle cx="{x:.2}" cy="{y:.2}" r="{size}" fill="{color}"><title>{id}</title></circle>"#,
            size = POINT_SIZE,
            color = SITE_COLOR,
            id = area.station_id(),
        ) + "\n"
    })
}

#[cfg(test)]
mod tests {
    use crate::geo::Coord;
    use crate::partition::PartitionBuilder;

    use super::*;

    #[test]
    fn render_decatur_test() {
        let stations = StationRegistry::decatur();
        let areas = PartitionBuilder::default()
            .set_bounding_box(BoundingBox::from_coords(Coord::new(39.80, -89.05), Coord::new(39.90, -88.85)))
            .from_stations(&stations)
            .build()
            .unwrap();

        let svg = render_areas(&areas, &stations);
        assert!(svg.starts_with("<svg viewBox=\"0 0 800 "));
        assert_eq!(svg.matches("<path ").count(), 7);
        assert_eq!(svg.matches("<circle ").count(), 7);
        assert!(svg.contains(r#"id="station-1""#));
        assert!(svg.contains("#ff5555"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn projection_test() {
        let bbox = BoundingBox::from_coords(Coord::new(-0.5, 0.0), Coord::new(0.5, 2.0));
        let projection = Projection::new(&bbox);
        assert!((projection.height - 400.0).abs() < 1e-9);

        let (x, y) = projection.project(&Point { x: 0.0, y: 0.5 });
        assert!(x.abs() < 1e-9 && y.abs() < 1e-9);
        let (x, y) = projection.project(&Point { x: 2.0, y: -0.5 });
        assert!((x - 800.0).abs() < 1e-9 && (y - 400.0).abs() < 1e-9);
    }
}
