use delaunator::{Triangulation, next_halfedge};

use super::EMPTY;

/// Iterator that walks through all the edges connected to a provided starting point.
/// The iteration happens in a counterclock-wise manner.
///
/// Note: this really only returns edges for triangles around the site. On the convex hull, the rightmost edge will not be returned because there is no incoming rightmost edge.
#[derive(Clone)]
pub struct EdgesAroundSiteIterator<'t> {
    triangulation: &'t Triangulation,
    start: usize,
    next: usize
}

impl<'t> EdgesAroundSiteIterator<'t> {
    /// Creates iterator based on a incoming edge to a site.
    /// This must be the left-most incoming edge to the site to avoid early iteration stop around the convex hull.
    pub fn new(triangulation: &'t Triangulation, incoming_edge: usize) -> Self {
        Self {
            triangulation,
            start: incoming_edge,
            next: incoming_edge
        }
    }
}

impl<'t> Iterator for EdgesAroundSiteIterator<'t> {
    type Item = usize;
    /// Walks all half-edges around the starting point and returning the associated surrounding incoming edges
    fn next(&mut self) -> Option<Self::Item> {
        let incoming = self.next;

        if incoming != EMPTY {
            let outgoing = next_halfedge(incoming);

            // then take the oposite half-edge, it will be the incoming edge for the opposite triangle
            self.next = self.triangulation.halfedges[outgoing];

            // if we are back to the begining, there is nothing else to do
            if self.next == self.start {
                self.next = EMPTY
            }

            Some(incoming)
        } else {
            None
        }
    }
}

/// Iterates over the Delaunay neighbors of a site.
///
/// Every site sharing a Voronoi edge with the source site is a Delaunay neighbor, which is what the
/// partitioner needs to bound a cell.
#[derive(Clone)]
pub struct NeighborSiteIterator<'t> {
    iter: EdgesAroundSiteIterator<'t>,
    triangulation: &'t Triangulation,
    last: usize,
}

impl<'t> NeighborSiteIterator<'t> {
    /// Creates iterator from the site's left-most incoming half-edge.
    pub fn new(triangulation: &'t Triangulation, incoming_leftmost_edge: usize) -> Self {
        Self {
            iter: EdgesAroundSiteIterator::new(triangulation, incoming_leftmost_edge),
            triangulation,
            last: EMPTY,
        }
    }
}

impl<'t> Iterator for NeighborSiteIterator<'t> {
    type Item = usize;

    /// Walks all half-edges around the starting point and returning the associated surrounding sites
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(incoming) = self.iter.next() {
            self.last = incoming;

            // get site from where the incoming edge came from
            Some(self.triangulation.triangles[incoming])
        } else if self.last != EMPTY {
            // check if there is a next site on the hull
            let outgoing = next_halfedge(self.last);
            self.last = EMPTY;

            if self.triangulation.halfedges[outgoing] == EMPTY {
                // this means we are on the hull and reached the rightmost outgoing edge
                Some(self.triangulation.triangles[next_halfedge(outgoing)])
            } else {
                // this means site is not on hull, and we have already iterated over all neighbors
                None
            }
        } else {
            None
        }
    }
}

/// Creates a map between each site and its left-most incoming half-edge.
///
/// This is especially important for the sites along the convex hull boundary when iterating over its neighoring sites.
/// Sites that are not part of the triangulation (duplicates) are mapped to `EMPTY`.
pub fn leftmost_incoming_halfedges(triangulation: &Triangulation, num_of_sites: usize) -> Vec<usize> {
    let mut site_to_halfedge = vec![EMPTY; num_of_sites];
    for e in 0..triangulation.triangles.len() {
        let s = crate::utils::site_of_incoming(triangulation, e);
        if site_to_halfedge[s] == EMPTY || triangulation.halfedges[e] == EMPTY {
            site_to_halfedge[s] = e;
        }
    }

    site_to_halfedge
}

#[cfg(test)]
mod test {
    use delaunator::{Point, triangulate};
    use super::*;

    fn neighbors_of(sites: &[Point], site: usize) -> Vec<usize> {
        let triangulation = triangulate(sites);
        let leftmost = leftmost_incoming_halfedges(&triangulation, sites.len());
        let mut neighbors: Vec<usize> = NeighborSiteIterator::new(&triangulation, leftmost[site]).collect();
        neighbors.sort_unstable();
        neighbors
    }

    #[test]
    fn iter_neighbors_hull_test() {
        let sites = vec![Point { x: -0.5, y: 0.0 }, Point { x: 0.5, y: 0.0 }, Point { x: 0.0, y: 0.0 }, Point { x: 0.0, y: 0.5 }, Point { x: 0.0, y: -0.5 }];
        assert_eq!(neighbors_of(&sites, 0), vec![2, 3, 4], "There are 3 neighboring sites");
    }

    #[test]
    fn iter_neighbors_inner_test() {
        let sites = vec![Point { x: -0.5, y: 0.0 }, Point { x: 0.5, y: 0.0 }, Point { x: 0.0, y: 0.0 }, Point { x: 0.0, y: 0.5 }, Point { x: 0.0, y: -0.5 }];
        assert_eq!(neighbors_of(&sites, 2), vec![0, 1, 3, 4], "There are 4 neighboring sites");
    }

    #[test]
    fn iter_neighbors_triangle_test() {
        let sites = vec![Point { x: 0.0, y: 0.0 }, Point { x: 1.0, y: 0.0 }, Point { x: 0.0, y: 1.0 }];
        for site in 0..3 {
            let expected: Vec<usize> = (0..3).filter(|&s| s != site).collect();
            assert_eq!(neighbors_of(&sites, site), expected);
        }
    }
}
