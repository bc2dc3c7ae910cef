use ::geo::algorithm::{bounding_rect::BoundingRect, contains::Contains};
use ::geo::{LineString, Point as GeoPoint, Polygon as GeoPolygon};

use crate::utils::{abs_diff_eq, dist2};

use super::{BoundingBox, Point};

/// Orientation values below this are treated as collinear when checking convexity.
#[cfg(test)]
const ORIENTATION_EPSILON: f64 = 1e-12;

/// Squared distance under which two consecutive vertices are merged after clipping.
const MERGE_EPSILON2: f64 = 1e-24;

/// A polygon made of one or more closed rings.
///
/// The first ring is the exterior, stored counter-clockwise. Additional rings are holes.
/// Containment follows the even-odd rule across all rings. Rings are implicitly closed:
/// the last vertex connects back to the first one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    rings: Vec<Vec<Point>>,
}

impl Polygon {
    /// Creates a polygon with a single exterior ring. The ring is reoriented counter-clockwise if needed.
    pub fn new(exterior: Vec<Point>) -> Self {
        Self::with_rings(vec![exterior])
    }

    /// Creates a polygon from an exterior ring followed by hole rings.
    pub fn with_rings(mut rings: Vec<Vec<Point>>) -> Self {
        if let Some(exterior) = rings.first_mut() {
            if ring_signed_area(exterior) < 0.0 {
                exterior.reverse();
            }
        }

        Self { rings }
    }

    /// Rectangle matching the bounding box, counter-clockwise.
    pub fn from_bounding_box(bbox: &BoundingBox) -> Self {
        Self { rings: vec![bbox.corners().to_vec()] }
    }

    #[inline]
    pub fn exterior(&self) -> &[Point] {
        self.rings.first().map(|r| r.as_slice()).unwrap_or(&[])
    }

    #[inline]
    pub fn rings(&self) -> &[Vec<Point>] {
        &self.rings
    }

    /// A polygon is degenerate if its exterior does not enclose any area.
    pub fn is_degenerate(&self) -> bool {
        self.exterior().len() < 3 || abs_diff_eq(self.signed_area(), 0.0, f64::EPSILON)
    }

    /// Signed area of the polygon: exterior area minus the hole areas. Positive for a counter-clockwise exterior.
    pub fn signed_area(&self) -> f64 {
        let mut rings = self.rings.iter();
        let exterior = rings.next().map(|r| ring_signed_area(r)).unwrap_or(0.0);
        rings.fold(exterior, |acc, hole| acc - ring_signed_area(hole).abs())
    }

    /// Axis-aligned box around the exterior ring.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.to_geo().bounding_rect().map(|rect| BoundingBox::from_rect(&rect))
    }

    /// Converts to a `geo` polygon, `x` and `y` unchanged. The first ring becomes the exterior.
    pub fn to_geo(&self) -> GeoPolygon<f64> {
        let mut rings = self
            .rings
            .iter()
            .map(|ring| LineString::from(ring.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>()));
        let exterior = rings.next().unwrap_or_else(|| LineString::new(vec![]));

        GeoPolygon::new(exterior, rings.collect())
    }

    /// Checks whether the exterior ring is convex.
    #[cfg(test)]
    pub fn is_convex(&self) -> bool {
        use robust::{Coord as RobustCoord, orient2d};

        let robust_coord = |p: &Point| RobustCoord { x: p.x, y: p.y };
        let ring = self.exterior();
        if ring.len() < 3 {
            return false;
        }

        let n = ring.len();
        (0..n).all(|i| {
            let a = &ring[i];
            let b = &ring[(i + 1) % n];
            let c = &ring[(i + 2) % n];
            orient2d(robust_coord(a), robust_coord(b), robust_coord(c)) >= -ORIENTATION_EPSILON
        })
    }

    /// Whether `point` lies in the interior. Points on an edge or inside a hole are not contained.
    ///
    /// Converts the polygon on every call, hold on to [Self::to_geo] for repeated queries.
    pub fn contains(&self, point: &Point) -> bool {
        self.to_geo().contains(&GeoPoint::new(point.x, point.y))
    }

    /// Same as [Self::contains] but also accepts points within `epsilon` of any edge.
    #[cfg(test)]
    pub fn contains_or_touches(&self, point: &Point, epsilon: f64) -> bool {
        self.contains(point)
            || self.rings.iter().any(|ring| {
                ring_edges(ring).any(|(a, b)| segment_dist2(point, a, b) <= epsilon * epsilon)
            })
    }

    /// Clips the exterior ring against the half-plane where `side(p) <= 0`.
    ///
    /// `side` must be an affine function of the point so that edge intersections
    /// can be found by linear interpolation (Sutherland-Hodgman). Holes are dropped.
    pub fn clip_half_plane(&self, side: impl Fn(&Point) -> f64) -> Polygon {
        let ring = self.exterior();
        let mut clipped: Vec<Point> = Vec::with_capacity(ring.len() + 1);

        for (a, b) in ring_edges(ring) {
            let sa = side(a);
            let sb = side(b);

            if sa <= 0.0 {
                push_vertex(&mut clipped, a.clone());
            }

            if (sa < 0.0 && sb > 0.0) || (sa > 0.0 && sb < 0.0) {
                let t = sa / (sa - sb);
                push_vertex(&mut clipped, Point { x: a.x + t * (b.x - a.x), y: a.y + t * (b.y - a.y) });
            }
        }

        // the ring is closed, the last vertex may duplicate the first one
        while clipped.len() > 1 && dist2(&clipped[0], &clipped[clipped.len() - 1]) <= MERGE_EPSILON2 {
            clipped.pop();
        }

        Polygon { rings: vec![clipped] }
    }

    /// Intersects the exterior ring with a bounding box.
    pub fn clip_to_box(&self, bbox: &BoundingBox) -> Polygon {
        let (left, right, bottom, top) = (bbox.left(), bbox.right(), bbox.bottom(), bbox.top());
        self.clip_half_plane(|p| left - p.x)
            .clip_half_plane(|p| p.x - right)
            .clip_half_plane(|p| bottom - p.y)
            .clip_half_plane(|p| p.y - top)
    }
}

fn push_vertex(ring: &mut Vec<Point>, p: Point) {
    if ring.last().map_or(true, |last| dist2(last, &p) > MERGE_EPSILON2) {
        ring.push(p);
    }
}

/// Iterates (current, next) vertex pairs of a closed ring.
fn ring_edges(ring: &[Point]) -> impl Iterator<Item = (&Point, &Point)> {
    ring.iter().zip(ring.iter().cycle().skip(1))
}

fn ring_signed_area(ring: &[Point]) -> f64 {
    ring_edges(ring).fold(0.0, |acc, (a, b)| acc + (a.x * b.y - b.x * a.y)) / 2.0
}

/// Squared distance from `p` to the segment `a` -> `b`.
#[cfg(test)]
fn segment_dist2(p: &Point, a: &Point, b: &Point) -> f64 {
    let len2 = dist2(a, b);
    if len2 == 0.0 {
        return dist2(p, a);
    }

    let t = (((p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y)) / len2).clamp(0.0, 1.0);
    dist2(p, &Point { x: a.x + t * (b.x - a.x), y: a.y + t * (b.y - a.y) })
}
