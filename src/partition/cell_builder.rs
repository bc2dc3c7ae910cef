use delaunator::Triangulation;

use crate::iterator::{NeighborSiteIterator, leftmost_incoming_halfedges};
use crate::utils::dist2;

use super::{BoundingBox, ClipBehavior, EMPTY, Point, Polygon};

/// Squared distance under which two sites are considered the same position.
pub(super) const SAME_SITE_EPSILON2: f64 = 1e-20;

#[derive(Debug)]
pub struct CellBuilder {
    bounding_box: BoundingBox,
    envelope: BoundingBox,
    clip_behavior: ClipBehavior,
}

pub struct CellBuilderResult {
    pub cells: Vec<Polygon>,
    /// Whether each cell was clipped to the bounding box. False when clipping was disabled or degenerated.
    pub clipped: Vec<bool>,
}

impl CellBuilder {
    /// Creates a builder for the given sites.
    ///
    /// Raw (unclipped) cells are bounded by an envelope that holds both the bounding box and every site,
    /// grown by its own size so no real Voronoi edge inside the bounding box is cut by it.
    pub fn new(sites: &[Point], bounding_box: BoundingBox, clip_behavior: ClipBehavior) -> Self {
        let envelope = sites
            .iter()
            .fold(bounding_box.clone(), |acc, site| acc.union_point(site));
        let margin = envelope.width().max(envelope.height());

        Self {
            envelope: envelope.expand(margin),
            bounding_box,
            clip_behavior,
        }
    }

    pub fn build(self, sites: &[Point], triangulation: &Triangulation) -> CellBuilderResult {
        let site_to_incoming_leftmost_halfedge = leftmost_incoming_halfedges(triangulation, sites.len());
        let mut cells = Vec::with_capacity(sites.len());
        let mut clipped = Vec::with_capacity(sites.len());

        for site in 0..sites.len() {
            let leftmost_edge = site_to_incoming_leftmost_halfedge[site];
            let raw = if leftmost_edge != EMPTY {
                let neighbors = NeighborSiteIterator::new(triangulation, leftmost_edge);
                self.raw_cell(&sites[site], neighbors.map(|n| &sites[n]))
            } else {
                // degenerated triangulation (collinear or duplicated sites), every other site bounds the cell
                self.raw_cell(&sites[site], sites.iter())
            };

            let (cell, was_clipped) = self.clip(site, raw);
            cells.push(cell);
            clipped.push(was_clipped);
        }

        CellBuilderResult { cells, clipped }
    }

    /// Intersects the envelope with the half-planes closer to `site` than to each neighbor.
    fn raw_cell<'a>(&self, site: &Point, neighbors: impl Iterator<Item = &'a Point>) -> Polygon {
        neighbors
            .filter(|n| dist2(site, n) > SAME_SITE_EPSILON2)
            .fold(Polygon::from_bounding_box(&self.envelope), |cell, neighbor| {
                cell.clip_half_plane(|p| dist2(p, site) - dist2(p, neighbor))
            })
    }

    /// Clips a raw cell to the bounding box. Falls back to the raw cell if the result has no area.
    fn clip(&self, site: usize, raw: Polygon) -> (Polygon, bool) {
        match self.clip_behavior {
            ClipBehavior::None => (raw, false),
            ClipBehavior::Clip => {
                let clipped = raw.clip_to_box(&self.bounding_box);
                if clipped.is_degenerate() {
                    log::warn!("Cell {site} does not intersect the bounding box; keeping the unclipped cell");
                    (raw, false)
                } else {
                    (clipped, true)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use delaunator::triangulate;

    use super::*;

    fn build(sites: &[Point], bbox: BoundingBox, clip_behavior: ClipBehavior) -> CellBuilderResult {
        let triangulation = triangulate(sites);
        CellBuilder::new(sites, bbox, clip_behavior).build(sites, &triangulation)
    }

    #[test]
    fn two_sites_split_box_test() {
        let sites = vec![Point { x: -0.5, y: 0.0 }, Point { x: 0.5, y: 0.0 }];
        let result = build(&sites, BoundingBox::default(), ClipBehavior::Clip);

        assert_eq!(result.cells.len(), 2);
        assert!(result.clipped.iter().all(|c| *c));
        for cell in &result.cells {
            assert!((cell.signed_area() - 2.0).abs() < 1e-9, "each half of the 2x2 box");
        }
        assert!(result.cells[0].contains(&Point { x: -0.9, y: 0.9 }));
        assert!(!result.cells[0].contains(&Point { x: 0.1, y: 0.0 }));
    }

    #[test]
    fn collinear_sites_test() {
        let sites = vec![Point { x: -0.6, y: 0.0 }, Point { x: 0.0, y: 0.0 }, Point { x: 0.6, y: 0.0 }];
        let result = build(&sites, BoundingBox::default(), ClipBehavior::Clip);

        let total: f64 = result.cells.iter().map(|c| c.signed_area()).sum();
        assert!((total - 4.0).abs() < 1e-9);
        assert!((result.cells[1].signed_area() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn cells_cover_box_test() {
        let sites = vec![
            Point { x: -0.5, y: -0.5 },
            Point { x: 0.5, y: -0.4 },
            Point { x: 0.1, y: 0.6 },
            Point { x: -0.7, y: 0.3 },
            Point { x: 0.0, y: 0.0 },
        ];
        let result = build(&sites, BoundingBox::default(), ClipBehavior::Clip);

        let total: f64 = result.cells.iter().map(|c| c.signed_area()).sum();
        assert!((total - 4.0).abs() < 1e-9, "cells must tile the box, got {total}");
    }

    #[test]
    fn site_outside_box_keeps_raw_cell_test() {
        let sites = vec![Point { x: -0.5, y: 0.0 }, Point { x: 0.5, y: 0.0 }, Point { x: 10.0, y: 0.0 }];
        let result = build(&sites, BoundingBox::default(), ClipBehavior::Clip);

        assert_eq!(result.clipped, vec![true, true, false]);
        assert!(result.cells[2].contains(&sites[2]));
    }

    #[test]
    fn no_clip_test() {
        let sites = vec![Point { x: -0.5, y: 0.0 }, Point { x: 0.5, y: 0.0 }, Point { x: 0.0, y: 0.5 }];
        let result = build(&sites, BoundingBox::default(), ClipBehavior::None);

        assert!(result.clipped.iter().all(|c| !*c));
        let total: f64 = result.cells.iter().map(|c| c.signed_area()).sum();
        assert!(total > 4.0);
    }
}
