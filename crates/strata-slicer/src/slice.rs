//! Mesh slicing - intersect a triangle mesh with horizontal planes.

use std::fmt;

use rayon::prelude::*;
use strata_math::{Point3, Vec3};
use tracing::{debug, info};

use crate::error::{Result, SlicerError};
use crate::geometry::{triangle_plane_intersection, Triangle};
use crate::mesh::TriangleMesh;

/// A segment where one triangle crosses one slicing plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// First endpoint.
    pub start: Point3,
    /// Second endpoint.
    pub end: Point3,
}

impl Edge {
    /// Create an edge.
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// The same segment walked the other way.
    pub fn reversed(&self) -> Self {
        Self::new(self.end, self.start)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.1},{:.1},{:.1} -> {:.1},{:.1},{:.1})",
            self.start.x, self.start.y, self.start.z, self.end.x, self.end.y, self.end.z
        )
    }
}

/// Unordered intersection edges ("edge soup") of one slicing plane.
#[derive(Debug, Clone)]
pub struct LayerEdges {
    /// Plane index (0 = bottom plane).
    pub index: usize,
    /// Plane height (mm).
    pub z: f64,
    /// Crossing edges, in no particular order.
    pub edges: Vec<Edge>,
    /// Boundaries of triangles lying in the plane. Kept apart from
    /// `edges` and never stitched: the walls meeting the plane already
    /// outline the section.
    pub coplanar: Vec<Edge>,
}

/// Upper bound on the number of slicing planes.
pub const MAX_PLANES: usize = 1_000_000;

/// Heights of the slicing planes between `bottom` and `top`.
///
/// Planes sit at `bottom + i * dz` for `i` in `0..=ceil((top - bottom) / dz)`,
/// so the last plane may lie above `top` by less than `dz`.
pub fn plane_heights(bottom: f64, top: f64, dz: f64) -> Result<Vec<f64>> {
    if !dz.is_finite() || dz <= 0.0 {
        return Err(SlicerError::InvalidSettings(format!(
            "layer height must be positive, got {dz}"
        )));
    }
    if !bottom.is_finite() || !top.is_finite() || top < bottom {
        return Err(SlicerError::SliceFailed(format!(
            "invalid vertical bounds [{bottom}, {top}]"
        )));
    }

    let span = ((top - bottom) / dz).ceil();
    if span >= MAX_PLANES as f64 {
        return Err(SlicerError::InvalidSettings(format!(
            "layer height {dz} gives more than {MAX_PLANES} planes over [{bottom}, {top}]"
        )));
    }
    let num_layers = span as usize;
    Ok((0..=num_layers).map(|i| bottom + i as f64 * dz).collect())
}

/// A triangle with its Z range, computed once.
#[derive(Debug, Clone, Copy)]
struct BoundedTriangle {
    vertices: Triangle,
    z_min: f64,
    z_max: f64,
}

impl BoundedTriangle {
    fn new(vertices: Triangle) -> Self {
        let [v0, v1, v2] = vertices;
        Self {
            vertices,
            z_min: v0.z.min(v1.z).min(v2.z),
            z_max: v0.z.max(v1.z).max(v2.z),
        }
    }
}

/// Slice a mesh into per-plane edge soups.
///
/// Each triangle is only tested against the planes its Z range can
/// reach. Returns one [`LayerEdges`] per plane height, bottom to top.
pub fn slice_mesh(mesh: &TriangleMesh, bottom: f64, top: f64, dz: f64) -> Result<Vec<LayerEdges>> {
    mesh.validate()?;
    let heights = plane_heights(bottom, top, dz)?;

    let triangles: Vec<BoundedTriangle> = mesh.iter_triangles().map(BoundedTriangle::new).collect();
    let candidates = bucket_triangles(&triangles, bottom, dz, heights.len());

    debug!(
        triangles = triangles.len(),
        planes = heights.len(),
        candidates = candidates.iter().map(Vec::len).sum::<usize>(),
        "Bucketed triangles by plane"
    );

    let layers: Vec<LayerEdges> = heights
        .par_iter()
        .zip(candidates.par_iter())
        .enumerate()
        .map(|(index, (&z, bucket))| {
            let (edges, coplanar) = slice_plane(&triangles, bucket, z);
            LayerEdges {
                index,
                z,
                edges,
                coplanar,
            }
        })
        .collect();

    info!(
        planes = layers.len(),
        edges = layers.iter().map(|l| l.edges.len()).sum::<usize>(),
        coplanar = layers.iter().map(|l| l.coplanar.len()).sum::<usize>(),
        "Sliced mesh into edge soups"
    );

    Ok(layers)
}

/// For each plane, the indices of triangles that may intersect it.
///
/// A triangle starts at the plane just below its lowest vertex and stays a
/// candidate while the previous plane is below its highest vertex.
fn bucket_triangles(
    triangles: &[BoundedTriangle],
    bottom: f64,
    dz: f64,
    plane_count: usize,
) -> Vec<Vec<usize>> {
    let mut buckets = vec![Vec::new(); plane_count];

    for (ti, tri) in triangles.iter().enumerate() {
        let first = ((tri.z_min - bottom) / dz).floor();
        // Negative (below the bottom plane) and NaN both start at plane 0.
        let mut j = if first > 0.0 { first as usize } else { 0 };
        while j < plane_count && bottom + (j as f64 - 1.0) * dz < tri.z_max {
            buckets[j].push(ti);
            j += 1;
        }
    }

    buckets
}

/// Intersect the candidate triangles with the plane at `z`.
///
/// Returns the crossing edges and, separately, the boundary edges of
/// triangles lying in the plane.
fn slice_plane(
    triangles: &[BoundedTriangle],
    candidates: &[usize],
    z: f64,
) -> (Vec<Edge>, Vec<Edge>) {
    let origin = Point3::new(0.0, 0.0, z);
    let normal = Vec3::z();
    let mut edges = Vec::new();
    let mut coplanar = Vec::new();

    for &ti in candidates {
        let ix = triangle_plane_intersection(&triangles[ti].vertices, &origin, &normal);
        match ix.as_slice() {
            [a, b] => edges.push(Edge::new(*a, *b)),
            [a, b, c] => {
                coplanar.push(Edge::new(*a, *b));
                coplanar.push(Edge::new(*b, *c));
                coplanar.push(Edge::new(*c, *a));
            }
            _ => {}
        }
    }

    (edges, coplanar)
}
