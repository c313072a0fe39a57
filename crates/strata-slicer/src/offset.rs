//! Contour offsetting by shifting edges and re-intersecting neighbours.

use strata_math::{Point2, Point3, Tolerance, Vec2};
use tracing::debug;

use crate::contour::Contour;
use crate::geometry::{dist_squared, line_line_intersection, Segment2};

/// Offset a closed contour by `distance`.
///
/// The contour is first normalized to counter-clockwise winding. Every
/// edge is shifted perpendicular to itself by `distance` (negative moves
/// toward the interior on the left, positive moves outward) and each new
/// corner is the intersection of the two shifted lines meeting at the
/// original vertex. Where those lines are parallel the vertex itself is
/// shifted instead.
///
/// Returns `None` when the contour has fewer than three distinct points
/// or when the offset collapses it: the result is no longer CCW, or every
/// edge has turned around. Partial self-intersections are not clipped.
pub fn offset_contour(contour: &Contour, distance: f64) -> Option<Contour> {
    let ccw = contour.clone().make_ccw();
    let points = distinct_points(ccw.points());
    let n = points.len();
    if n < 3 {
        return None;
    }

    let mut offset_points = Vec::with_capacity(n);
    for i in 0..n {
        let prev = &points[(i + n - 1) % n];
        let cur = &points[i];
        let next = &points[(i + 1) % n];

        let (incoming, normal) = shifted_edge(prev, cur, distance);
        let (outgoing, _) = shifted_edge(cur, next, distance);

        let corner = match line_line_intersection(&incoming, &outgoing) {
            Some((point, _)) => point,
            None => xy(cur) + normal * distance,
        };
        offset_points.push(Point3::new(corner.x, corner.y, cur.z));
    }

    let result = Contour::new(offset_points);
    if !result.is_ccw() || all_edges_reversed(&points, result.points()) {
        debug!(distance, points = n, "Offset collapsed contour");
        return None;
    }

    Some(result)
}

/// An offset past the inradius of a convex loop turns it inside out
/// without changing its winding; every edge then points backwards.
fn all_edges_reversed(source: &[Point3], offset: &[Point3]) -> bool {
    let n = source.len();
    (0..n).all(|i| {
        let j = (i + 1) % n;
        let before = xy(&source[j]) - xy(&source[i]);
        let after = xy(&offset[j]) - xy(&offset[i]);
        before.dot(&after) < 0.0
    })
}

/// Offset every contour of a layer by `0, d, 2d, ..., count * d`.
///
/// Returns one group per input contour holding its successful offsets in
/// order; collapsed offsets are left out of the group.
pub fn offset_series(contours: &[Contour], distance: f64, count: usize) -> Vec<Vec<Contour>> {
    contours
        .iter()
        .map(|contour| {
            (0..=count)
                .filter_map(|i| offset_contour(contour, distance * i as f64))
                .collect()
        })
        .collect()
}

fn xy(p: &Point3) -> Point2 {
    Point2::new(p.x, p.y)
}

/// The segment `a -> b` moved by `distance` along its right-hand normal,
/// together with that unit normal.
fn shifted_edge(a: &Point3, b: &Point3, distance: f64) -> (Segment2, Vec2) {
    let (a, b) = (xy(a), xy(b));
    let dir = (b - a).normalize();
    let normal = Vec2::new(dir.y, -dir.x);
    let shift = normal * distance;
    ([a + shift, b + shift], normal)
}

/// Drop points that coincide with their predecessor, including the
/// implied closing segment.
fn distinct_points(points: &[Point3]) -> Vec<Point3> {
    let tol2 = Tolerance::DEFAULT.linear * Tolerance::DEFAULT.linear;
    let mut out: Vec<Point3> = Vec::with_capacity(points.len());
    for p in points {
        match out.last() {
            Some(last) if dist_squared(&xy(last), &xy(p)) < tol2 => {}
            _ => out.push(*p),
        }
    }
    while out.len() > 1 {
        match (out.first(), out.last()) {
            (Some(first), Some(last)) if dist_squared(&xy(first), &xy(last)) < tol2 => {
                out.pop();
            }
            _ => break,
        }
    }
    out
}
