//! STL input.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use strata_math::Point3;
use strata_slicer::TriangleMesh;
use tracing::debug;

/// Load an ASCII or binary STL file as an indexed triangle mesh.
pub fn load_stl(path: &Path) -> Result<TriangleMesh> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let stl = stl_io::read_stl(&mut file)
        .with_context(|| format!("failed to read STL {}", path.display()))?;

    let vertices = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();
    let triangles = stl
        .faces
        .iter()
        .map(|face| face.vertices.map(|i| i as u32))
        .collect();

    let mesh = TriangleMesh::new(vertices, triangles);
    debug!(
        vertices = mesh.vertices.len(),
        triangles = mesh.triangle_count(),
        "Loaded STL"
    );
    Ok(mesh)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use stl_io::{Normal, Triangle, Vertex};

    /// Write an axis-aligned box as STL.
    pub(crate) fn write_box_stl(path: &Path, size: [f32; 3]) {
        let [sx, sy, sz] = size;
        let c = [
            [0.0, 0.0, 0.0],
            [sx, 0.0, 0.0],
            [sx, sy, 0.0],
            [0.0, sy, 0.0],
            [0.0, 0.0, sz],
            [sx, 0.0, sz],
            [sx, sy, sz],
            [0.0, sy, sz],
        ];
        let faces: [[usize; 3]; 12] = [
            [0, 2, 1], [0, 3, 2],
            [4, 5, 6], [4, 6, 7],
            [0, 1, 5], [0, 5, 4],
            [2, 3, 7], [2, 7, 6],
            [0, 4, 7], [0, 7, 3],
            [1, 2, 6], [1, 6, 5],
        ];
        let triangles: Vec<Triangle> = faces
            .iter()
            .map(|f| Triangle {
                normal: Normal::new([0.0, 0.0, 0.0]),
                vertices: f.map(|i| Vertex::new(c[i])),
            })
            .collect();
        let mut file = File::create(path).unwrap();
        stl_io::write_stl(&mut file, triangles.iter()).unwrap();
    }

    #[test]
    fn test_load_box() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("box.stl");
        write_box_stl(&path, [2.0, 3.0, 4.0]);

        let mesh = load_stl(&path).unwrap();
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.validate().is_ok());
        let (min, max) = strata_slicer::mesh_bounds(&mesh).unwrap();
        assert_eq!((min.x, min.y, min.z), (0.0, 0.0, 0.0));
        assert_eq!((max.x, max.y, max.z), (2.0, 3.0, 4.0));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_stl(&dir.path().join("nope.stl")).is_err());
    }
}
