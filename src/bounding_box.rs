use ::geo::Rect;
use rand::Rng;

use crate::geo::Coord;
use crate::utils::abs_diff_eq;

use super::Point;
const EQ_EPSILON: f64 = 4. * std::f64::EPSILON;

/// Defines a rectangular, axis-aligned bounding box.
///
/// In geographic use `x` is the longitude and `y` the latitude.
#[derive(Debug, Clone)]
pub struct BoundingBox {
    /// The center point of a rectangle.
    center: Point,

    /// The top right point of a rectangle.
    top_right: Point,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new_centered_square(2.0) // square from [-1, 1] on xy
    }
}

impl PartialEq for BoundingBox {
    fn eq(&self, other: &Self) -> bool {
        abs_diff_eq(self.center.x, other.center.x, EQ_EPSILON)
            && abs_diff_eq(self.center.y, other.center.y, EQ_EPSILON)
            && abs_diff_eq(self.top_right.x, other.top_right.x, EQ_EPSILON)
            && abs_diff_eq(self.top_right.y, other.top_right.y, EQ_EPSILON)
    }
}

impl BoundingBox {
    /// Constructs a new bounding box.
    ///
    /// # Arguments
    ///
    /// * `origin` - The position of the center of the bounding box
    /// * `width` - The bounding box's width
    /// * `height` - The bounding box's height
    ///
    pub fn new(origin: Point, width: f64, height: f64) -> Self {
        Self {
            top_right: Point { x: origin.x + width / 2.0, y: origin.y + height / 2.0 },
            center: origin,
        }
    }

    /// Constructs a new bounding box centeterd at origin with the provided width and height.
    pub fn new_centered(width: f64, height: f64) -> Self {
        Self::new(Point { x: 0.0, y: 0.0 }, width, height)
    }

    /// Constructs a new square bounding box centeterd at origin with the provided width.
    pub fn new_centered_square(width: f64) -> Self {
        Self::new_centered(width, width)
    }

    /// Constructs a bounding box from its bottom left and top right corners.
    /// Corners are swapped per axis if given in the wrong order.
    pub fn from_corners(a: &Point, b: &Point) -> Self {
        let (left, right) = if a.x <= b.x { (a.x, b.x) } else { (b.x, a.x) };
        let (bottom, top) = if a.y <= b.y { (a.y, b.y) } else { (b.y, a.y) };

        Self {
            center: Point { x: (left + right) / 2.0, y: (bottom + top) / 2.0 },
            top_right: Point { x: right, y: top },
        }
    }

    /// Constructs a bounding box from south-west and north-east geographic corners.
    pub fn from_coords(south_west: Coord, north_east: Coord) -> Self {
        Self::from_corners(&south_west.to_point(), &north_east.to_point())
    }

    /// Constructs a bounding box from a `geo` rectangle, such as the output of `BoundingRect`.
    pub fn from_rect(rect: &Rect<f64>) -> Self {
        let (min, max) = (rect.min(), rect.max());
        Self::from_corners(&Point { x: min.x, y: min.y }, &Point { x: max.x, y: max.y })
    }

    /// Gets the position of the box's center.
    #[inline]
    pub fn center(&self) -> &Point {
        &self.center
    }

    /// Gets the position of the top right corner of the bounding box.
    #[inline]
    pub fn top_right(&self) -> &Point {
        &self.top_right
    }

    /// Gets the position of the bottom left corner of the bounding box.
    #[inline]
    pub fn bottom_left(&self) -> Point {
        Point { x: self.left(), y: self.bottom() }
    }

    /// Gets the width of the bounding box.
    #[inline]
    pub fn width(&self) -> f64 {
        2.0 * (self.top_right.x - self.center.x)
    }

    /// Gets the height of the bounding box.
    #[inline]
    pub fn height(&self) -> f64 {
        2.0 * (self.top_right.y - self.center.y)
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.top_right.x - self.width()
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.top_right.x
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.top_right.y
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top_right.y - self.height()
    }

    /// A box is empty when it has no area.
    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Returns whether a given point is inside (or on the edges) of the bounding box.
    #[inline]
    pub fn is_inside(&self, point: &Point) -> bool {
        // left.x <= point.x <= right.x
        let horizonal_ok = (self.left() <= point.x) && (point.x <= self.right());
        // bottom.y <= point.y <= top.y
        let vertical_ok = (self.bottom() <= point.y) && (point.y <= self.top());

        horizonal_ok && vertical_ok
    }

    /// Same as inside, but return false if point is on the box edge.
    #[inline]
    pub fn is_exclusively_inside(&self, point: &Point) -> bool {
        let horizonal_ok = (self.left() < point.x) && (point.x < self.right());
        let vertical_ok = (self.bottom() < point.y) && (point.y < self.top());

        horizonal_ok && vertical_ok
    }

    /// Returns whether `other` lies completely inside (or on the edges of) this box, allowing `epsilon` of slack.
    pub fn contains_box(&self, other: &BoundingBox, epsilon: f64) -> bool {
        other.left() >= self.left() - epsilon
            && other.right() <= self.right() + epsilon
            && other.bottom() >= self.bottom() - epsilon
            && other.top() <= self.top() + epsilon
    }

    /// Returns a box grown by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self::new(self.center.clone(), self.width() + 2.0 * margin, self.height() + 2.0 * margin)
    }

    /// Returns the smallest box containing both this box and `point`.
    pub fn union_point(&self, point: &Point) -> Self {
        let bottom_left = Point { x: self.left().min(point.x), y: self.bottom().min(point.y) };
        let top_right = Point { x: self.right().max(point.x), y: self.top().max(point.y) };
        Self::from_corners(&bottom_left, &top_right)
    }

    /// The four corners, counter-clockwise, starting at the bottom left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point { x: self.left(), y: self.bottom() },
            Point { x: self.right(), y: self.bottom() },
            Point { x: self.right(), y: self.top() },
            Point { x: self.left(), y: self.top() },
        ]
    }

    /// Draws a point uniformly at random inside the box.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Point {
        let x = if self.width() > 0.0 { rng.gen_range(self.left()..self.right()) } else { self.left() };
        let y = if self.height() > 0.0 { rng.gen_range(self.bottom()..self.top()) } else { self.bottom() };
        Point { x, y }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn from_corners_test() {
        let bbox = BoundingBox::from_corners(&Point { x: 2.0, y: -1.0 }, &Point { x: -2.0, y: 3.0 });
        assert_eq!(bbox.left(), -2.0);
        assert_eq!(bbox.right(), 2.0);
        assert_eq!(bbox.bottom(), -1.0);
        assert_eq!(bbox.top(), 3.0);
        assert_eq!(bbox.width(), 4.0);
        assert_eq!(bbox.height(), 4.0);
        assert_eq!(bbox.center(), &Point { x: 0.0, y: 1.0 });
    }

    #[test]
    fn from_coords_uses_lng_as_x_test() {
        let bbox = BoundingBox::from_coords(Coord::new(39.80, -89.05), Coord::new(39.90, -88.85));
        assert!(abs_diff_eq(bbox.left(), -89.05, 1e-12));
        assert!(abs_diff_eq(bbox.right(), -88.85, 1e-12));
        assert!(abs_diff_eq(bbox.bottom(), 39.80, 1e-12));
        assert!(abs_diff_eq(bbox.top(), 39.90, 1e-12));
    }

    #[test]
    fn inside_tests() {
        let bbox = BoundingBox::default();
        assert!(bbox.is_inside(&Point { x: 1.0, y: 0.0 }));
        assert!(!bbox.is_exclusively_inside(&Point { x: 1.0, y: 0.0 }));
        assert!(bbox.is_exclusively_inside(&Point { x: 0.5, y: -0.5 }));
        assert!(!bbox.is_inside(&Point { x: 1.1, y: 0.0 }));
    }

    #[test]
    fn from_rect_test() {
        use ::geo::algorithm::bounding_rect::BoundingRect;
        use ::geo::LineString;

        let line = LineString::from(vec![(1.0, 5.0), (-3.0, 2.0), (0.0, -1.0)]);
        let bbox = BoundingBox::from_rect(&line.bounding_rect().unwrap());
        assert_eq!(bbox, BoundingBox::from_corners(&Point { x: -3.0, y: -1.0 }, &Point { x: 1.0, y: 5.0 }));
    }

    #[test]
    fn contains_box_and_union_test() {
        let outer = BoundingBox::default();
        let inner = BoundingBox::new_centered_square(1.0);
        assert!(outer.contains_box(&inner, 0.0));
        assert!(!inner.contains_box(&outer, 0.0));

        let grown = inner.union_point(&Point { x: 3.0, y: 0.0 });
        assert_eq!(grown.right(), 3.0);
        assert_eq!(grown.left(), -0.5);
        assert!(!outer.contains_box(&grown, 0.0));
    }

    #[test]
    fn sample_stays_inside_test() {
        let mut rng = StdRng::seed_from_u64(7);
        let bbox = BoundingBox::from_corners(&Point { x: -89.05, y: 39.80 }, &Point { x: -88.85, y: 39.90 });
        for _ in 0..1_000 {
            assert!(bbox.is_inside(&bbox.sample(&mut rng)));
        }
    }

    #[test]
    fn empty_box_test() {
        assert!(BoundingBox::new_centered(0.0, 1.0).is_empty());
        assert!(!BoundingBox::default().is_empty());
    }
}
