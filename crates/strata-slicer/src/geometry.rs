//! Geometry primitives: plane tests, triangle/plane intersection and
//! 2D line helpers used by the offsetter.

use strata_math::{Point2, Point3, Tolerance, Vec2, Vec3};

/// A triangle as three vertices in mesh winding order.
pub type Triangle = [Point3; 3];

/// A 2D line segment; intersection helpers treat it as the infinite line
/// through both points.
pub type Segment2 = [Point2; 2];

/// Classify `point` against the plane through `origin` with `normal`.
///
/// Returns whether the point lies on the plane (within tolerance) and its
/// signed distance `dot(point - origin, normal)`.
pub fn point_on_plane(origin: &Point3, normal: &Vec3, point: &Point3) -> (bool, f64) {
    let dist = (point - origin).dot(normal);
    (Tolerance::DEFAULT.is_zero(dist), dist)
}

/// Intersect a triangle with a plane.
///
/// Vertices lying on the plane are returned as-is, in vertex order, and
/// every edge whose endpoints are strictly on opposite sides contributes
/// its interpolated crossing point. The result has 0 points (no contact),
/// 1 (a vertex touches the plane), 2 (a proper crossing) or 3 (the
/// triangle is coplanar). When vertices 0 and 2 are the only ones on the
/// plane they are returned as (2, 0) so the segment follows the winding.
pub fn triangle_plane_intersection(
    triangle: &Triangle,
    origin: &Point3,
    normal: &Vec3,
) -> Vec<Point3> {
    let classified = triangle.map(|v| point_on_plane(origin, normal, &v));
    let on = classified.map(|(on, _)| on);
    let dist = classified.map(|(_, d)| d);

    let mut points: Vec<Point3> = Vec::with_capacity(3);
    for (vertex, _) in triangle.iter().zip(on).filter(|(_, on)| *on) {
        points.push(*vertex);
    }

    if on.iter().all(|&o| o) {
        return points;
    }

    if on[0] && on[2] {
        points = vec![triangle[2], triangle[0]];
    }

    for (a, b) in [(0, 1), (1, 2), (2, 0)] {
        if !on[a] && !on[b] && (dist[a] > 0.0) != (dist[b] > 0.0) {
            points.push(edge_crossing(
                (&triangle[a], dist[a]),
                (&triangle[b], dist[b]),
            ));
        }
    }

    points
}

/// Zero crossing of an edge whose endpoints straddle the plane.
///
/// Always interpolates from the endpoint below the plane, so the two
/// triangles sharing a mesh edge produce bit-identical points.
fn edge_crossing(a: (&Point3, f64), b: (&Point3, f64)) -> Point3 {
    let ((below, d_below), (above, d_above)) = if a.1 < 0.0 { (a, b) } else { (b, a) };
    let d = d_below.abs();
    let t = d / (d + d_above.abs());
    *below + (*above - *below) * t
}

/// Parameter of the projection of `point` onto the line `start -> end`.
///
/// 0 maps to `start`, 1 to `end`. Degenerate segments return 0.
pub fn closest_parameter_on_line(start: &Point2, end: &Point2, point: &Point2) -> f64 {
    let dir = end - start;
    let len2 = dir.norm_squared();
    if len2.sqrt() <= Tolerance::DEFAULT.linear {
        return 0.0;
    }
    (point - start).dot(&dir) / len2
}

/// Inclusive range check.
pub fn in_bounds(min: f64, max: f64, value: f64) -> bool {
    min <= value && value <= max
}

/// Squared distance between two 2D points.
pub fn dist_squared(p1: &Point2, p2: &Point2) -> f64 {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    dx * dx + dy * dy
}

/// 2D cross product (z component of the 3D cross product).
fn cross(a: &Vec2, b: &Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Intersect the infinite lines through two segments.
///
/// Returns the intersection point and its parameter along `a`
/// (`a[0] + t * (a[1] - a[0])`). The parameter is not clamped: values
/// outside `[0, 1]` are extrapolated intersections. Parallel or
/// coincident lines have no single intersection and return `None`.
pub fn line_line_intersection(a: &Segment2, b: &Segment2) -> Option<(Point2, f64)> {
    let r = a[1] - a[0];
    let s = b[1] - b[0];
    let denom = cross(&r, &s);

    if denom.abs() <= Tolerance::DEFAULT.linear * r.norm() * s.norm() {
        return None;
    }

    let t = cross(&(b[0] - a[0]), &s) / denom;
    Some((a[0] + r * t, t))
}
