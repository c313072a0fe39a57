//! Triangle mesh input and placement on the print bed.

use serde::{Deserialize, Serialize};
use strata_math::{Point3, Transform};
use tracing::debug;

use crate::error::{Result, SlicerError};
use crate::geometry::Triangle;

/// An indexed triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Triangles as indices into `vertices`, in mesh winding order.
    pub triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Create a mesh from vertices and triangle indices.
    pub fn new(vertices: Vec<Point3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
        }
    }

    /// Does the mesh have no triangles?
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty() || self.vertices.is_empty()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Check that every triangle references an existing vertex.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(SlicerError::EmptyMesh);
        }
        let count = self.vertices.len();
        for (i, tri) in self.triangles.iter().enumerate() {
            if let Some(&bad) = tri.iter().find(|&&idx| idx as usize >= count) {
                return Err(SlicerError::DegenerateMesh(format!(
                    "triangle {i} references vertex {bad} but the mesh has {count} vertices"
                )));
            }
        }
        Ok(())
    }

    /// Iterate over triangles as vertex positions.
    ///
    /// Indices must be valid; see [`TriangleMesh::validate`].
    pub fn iter_triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.triangles.iter().map(move |t| {
            [
                self.vertices[t[0] as usize],
                self.vertices[t[1] as usize],
                self.vertices[t[2] as usize],
            ]
        })
    }

    /// Apply an affine transform to every vertex.
    pub fn transform(&mut self, transform: &Transform) {
        for v in &mut self.vertices {
            *v = transform.apply_point(v);
        }
    }
}

/// Compute the bounding box of a mesh.
/// Returns (min, max), or `None` for a mesh without vertices.
pub fn mesh_bounds(mesh: &TriangleMesh) -> Option<(Point3, Point3)> {
    let first = mesh.vertices.first()?;
    let mut min = *first;
    let mut max = *first;

    for v in &mesh.vertices {
        min = min.inf(v);
        max = max.sup(v);
    }

    Some((min, max))
}

/// Printable volume of the machine (mm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildVolume {
    /// Minimum corner.
    pub min: [f64; 3],
    /// Maximum corner.
    pub max: [f64; 3],
}

impl Default for BuildVolume {
    fn default() -> Self {
        Self {
            min: [0.0, 0.0, 0.0],
            max: [220.0, 220.0, 100.0],
        }
    }
}

impl BuildVolume {
    /// Extent along each axis.
    pub fn dimensions(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

/// A mesh placed on the bed, with its vertical extent.
#[derive(Debug, Clone)]
pub struct FittedMesh {
    /// The transformed mesh.
    pub mesh: TriangleMesh,
    /// Lowest Z of the placed mesh.
    pub bottom: f64,
    /// Highest Z of the placed mesh.
    pub top: f64,
    /// Uniform scale that was applied (at most 1).
    pub scale: f64,
}

/// Scale a mesh down to fit the build volume and place it on the bed.
///
/// The model is never enlarged. It is centered on the bed in X and Y and
/// dropped so its lowest point rests on the bed floor.
pub fn fit_to_bed(mut mesh: TriangleMesh, bed: &BuildVolume) -> Result<FittedMesh> {
    if mesh.is_empty() {
        return Err(SlicerError::EmptyMesh);
    }
    let (obj_min, obj_max) = mesh_bounds(&mesh).ok_or(SlicerError::EmptyMesh)?;
    let obj_dim = obj_max - obj_min;
    let bed_dim = bed.dimensions();

    let scale = (0..3)
        .filter(|&axis| obj_dim[axis] > 0.0)
        .map(|axis| bed_dim[axis] / obj_dim[axis])
        .fold(1.0_f64, f64::min);

    let mut obj_center = midpoint(&obj_min, &obj_max);
    obj_center.z = obj_min.z;
    let bed_center = Point3::new(
        (bed.min[0] + bed.max[0]) / 2.0,
        (bed.min[1] + bed.max[1]) / 2.0,
        bed.min[2],
    );

    // p' = p * scale + offset, with offset chosen so obj_center lands on bed_center
    let offset = obj_center.coords * (1.0 - scale) + (bed_center - obj_center);
    let transform =
        Transform::translation(offset.x, offset.y, offset.z).then(&Transform::uniform_scale(scale));
    mesh.transform(&transform);

    let bottom = obj_min.z * scale + offset.z;
    let top = obj_max.z * scale + offset.z;

    debug!(scale, bottom, top, "Placed mesh on bed");

    Ok(FittedMesh {
        mesh,
        bottom,
        top,
        scale,
    })
}

fn midpoint(a: &Point3, b: &Point3) -> Point3 {
    Point3::from((a.coords + b.coords) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_box_mesh(size: [f64; 3], origin: [f64; 3]) -> TriangleMesh {
        let [sx, sy, sz] = size;
        let [ox, oy, oz] = origin;
        let vertices = vec![
            Point3::new(ox, oy, oz),
            Point3::new(ox + sx, oy, oz),
            Point3::new(ox + sx, oy + sy, oz),
            Point3::new(ox, oy + sy, oz),
            Point3::new(ox, oy, oz + sz),
            Point3::new(ox + sx, oy, oz + sz),
            Point3::new(ox + sx, oy + sy, oz + sz),
            Point3::new(ox, oy + sy, oz + sz),
        ];
        let triangles = vec![
            [0, 2, 1], [0, 3, 2],
            [4, 5, 6], [4, 6, 7],
            [0, 1, 5], [0, 5, 4],
            [2, 3, 7], [2, 7, 6],
            [0, 4, 7], [0, 7, 3],
            [1, 2, 6], [1, 6, 5],
        ];
        TriangleMesh::new(vertices, triangles)
    }

    #[test]
    fn test_mesh_bounds() {
        let mesh = make_box_mesh([10.0, 20.0, 30.0], [-5.0, 0.0, 1.0]);
        let (min, max) = mesh_bounds(&mesh).unwrap();
        assert_relative_eq!(min.x, -5.0);
        assert_relative_eq!(min.z, 1.0);
        assert_relative_eq!(max.y, 20.0);
        assert_relative_eq!(max.z, 31.0);
        assert!(mesh_bounds(&TriangleMesh::default()).is_none());
    }

    #[test]
    fn test_validate_rejects_bad_index() {
        let mut mesh = make_box_mesh([1.0, 1.0, 1.0], [0.0, 0.0, 0.0]);
        assert!(mesh.validate().is_ok());
        mesh.triangles.push([0, 1, 42]);
        assert!(matches!(mesh.validate(), Err(SlicerError::DegenerateMesh(_))));
        assert!(matches!(
            TriangleMesh::default().validate(),
            Err(SlicerError::EmptyMesh)
        ));
    }

    #[test]
    fn test_fit_small_mesh_is_centered_not_scaled() {
        let mesh = make_box_mesh([10.0, 10.0, 10.0], [-50.0, 3.0, 7.0]);
        let fitted = fit_to_bed(mesh, &BuildVolume::default()).unwrap();
        assert_relative_eq!(fitted.scale, 1.0);
        assert_relative_eq!(fitted.bottom, 0.0, epsilon = 1e-9);
        assert_relative_eq!(fitted.top, 10.0, epsilon = 1e-9);

        let (min, max) = mesh_bounds(&fitted.mesh).unwrap();
        assert_relative_eq!((min.x + max.x) / 2.0, 110.0, epsilon = 1e-9);
        assert_relative_eq!((min.y + max.y) / 2.0, 110.0, epsilon = 1e-9);
        assert_relative_eq!(min.z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_large_mesh_is_scaled_down() {
        let mesh = make_box_mesh([100.0, 100.0, 400.0], [0.0, 0.0, 0.0]);
        let fitted = fit_to_bed(mesh, &BuildVolume::default()).unwrap();
        assert_relative_eq!(fitted.scale, 0.25);
        assert_relative_eq!(fitted.bottom, 0.0, epsilon = 1e-9);
        assert_relative_eq!(fitted.top, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_empty_mesh() {
        assert!(matches!(
            fit_to_bed(TriangleMesh::default(), &BuildVolume::default()),
            Err(SlicerError::EmptyMesh)
        ));
    }
}
