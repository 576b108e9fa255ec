//! Segment and rectangle intersection predicates.

use crate::canvas::Side;

use super::types::{Point, Rect};

/// Parametric segment/segment test.
///
/// Parallel segments (zero determinant) never intersect, collinear overlap
/// included. Touching at an endpoint counts.
pub fn segment_intersect(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    let d = (p4.y - p3.y) * (p2.x - p1.x) - (p4.x - p3.x) * (p2.y - p1.y);
    if d == 0.0 {
        return false;
    }

    let ua = ((p4.x - p3.x) * (p1.y - p3.y) - (p4.y - p3.y) * (p1.x - p3.x)) / d;
    let ub = ((p2.x - p1.x) * (p1.y - p3.y) - (p2.y - p1.y) * (p1.x - p3.x)) / d;

    (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub)
}

/// True if the segment crosses any of the rectangle's four borders.
///
/// A segment lying entirely inside the rectangle does not count.
pub fn segment_intersects_rect(p1: Point, p2: Point, rect: &Rect) -> bool {
    let top_left = Point::new(rect.x, rect.y);
    let top_right = Point::new(rect.right(), rect.y);
    let bottom_left = Point::new(rect.x, rect.bottom());
    let bottom_right = Point::new(rect.right(), rect.bottom());

    segment_intersect(p1, p2, top_left, top_right)
        || segment_intersect(p1, p2, top_right, bottom_right)
        || segment_intersect(p1, p2, bottom_left, bottom_right)
        || segment_intersect(p1, p2, top_left, bottom_left)
}

/// Midpoint of the rectangle border named by `side`.
pub fn connection_point(rect: &Rect, side: Side) -> Point {
    match side {
        Side::Top => Point::new(rect.x + rect.width / 2.0, rect.y),
        Side::Right => Point::new(rect.right(), rect.y + rect.height / 2.0),
        Side::Bottom => Point::new(rect.x + rect.width / 2.0, rect.bottom()),
        Side::Left => Point::new(rect.x, rect.y + rect.height / 2.0),
    }
}
