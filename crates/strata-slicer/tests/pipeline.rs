//! End-to-end slicing through the public API.

use approx::assert_relative_eq;
use strata_math::Point3;
use strata_slicer::{
    fit_to_bed, load_contours, offset_contour, slice, write_contours, BuildVolume, SliceSettings,
    TriangleMesh,
};

/// Axis-aligned box with outward-facing triangles whose walls carry a ring
/// of vertices at every height in `levels` (first and last are the caps).
fn layered_box(sx: f64, sy: f64, levels: &[f64]) -> TriangleMesh {
    let corners = [(0.0, 0.0), (sx, 0.0), (sx, sy), (0.0, sy)];
    let vertices = levels
        .iter()
        .flat_map(|&z| corners.iter().map(move |&(x, y)| Point3::new(x, y, z)))
        .collect();

    let ring = |k: usize, c: usize| (k * 4 + c % 4) as u32;
    let top = levels.len() - 1;
    let mut triangles = vec![
        [ring(0, 0), ring(0, 2), ring(0, 1)],
        [ring(0, 0), ring(0, 3), ring(0, 2)],
        [ring(top, 0), ring(top, 1), ring(top, 2)],
        [ring(top, 0), ring(top, 2), ring(top, 3)],
    ];
    for k in 0..top {
        for c in 0..4 {
            triangles.push([ring(k, c), ring(k, c + 1), ring(k + 1, c + 1)]);
            triangles.push([ring(k, c), ring(k + 1, c + 1), ring(k + 1, c)]);
        }
    }
    TriangleMesh::new(vertices, triangles)
}

fn box_mesh(sx: f64, sy: f64, sz: f64) -> TriangleMesh {
    layered_box(sx, sy, &[0.0, sz])
}

#[test]
fn test_cube_layers() {
    let fitted = fit_to_bed(box_mesh(10.0, 10.0, 10.0), &BuildVolume::default()).unwrap();
    assert_relative_eq!(fitted.scale, 1.0);

    let result = slice(&fitted, &SliceSettings { layer_height: 0.5 }).unwrap();
    assert_eq!(result.layers.len(), 21);
    assert_eq!(result.stats.layer_count, 21);

    for layer in &result.layers {
        assert_eq!(layer.contours.len(), 1, "layer {}", layer.index);
        let contour = &layer.contours[0];
        assert!(contour.is_ccw());
        assert_relative_eq!(contour.signed_area(), 100.0, epsilon = 1e-6);
        assert_relative_eq!(contour.perimeter(), 40.0, epsilon = 1e-6);
        for p in contour.points() {
            assert_relative_eq!(p.z, layer.z);
        }
    }
}

#[test]
fn test_cube_cap_layers_are_single_squares() {
    let fitted = fit_to_bed(box_mesh(10.0, 10.0, 10.0), &BuildVolume::default()).unwrap();
    let result = slice(&fitted, &SliceSettings { layer_height: 5.0 }).unwrap();
    assert_eq!(result.layers.len(), 3);

    for layer in [&result.layers[0], &result.layers[2]] {
        assert_eq!(layer.contours.len(), 1, "z = {}", layer.z);
        assert_eq!(layer.contours[0].len(), 4, "z = {}", layer.z);
        assert_relative_eq!(layer.contours[0].signed_area(), 100.0, epsilon = 1e-6);
    }
}

#[test]
fn test_plane_through_wall_vertices() {
    // The walls are split at z = 5, so that plane passes through a ring of
    // vertices and along horizontal edges shared by two bands of triangles.
    let mesh = layered_box(10.0, 10.0, &[0.0, 5.0, 10.0]);
    let fitted = fit_to_bed(mesh, &BuildVolume::default()).unwrap();
    let result = slice(&fitted, &SliceSettings { layer_height: 5.0 }).unwrap();
    assert_eq!(result.layers.len(), 3);

    let split = &result.layers[1];
    assert_relative_eq!(split.z, 5.0);
    assert_eq!(split.contours.len(), 1);
    assert_eq!(split.contours[0].len(), 4);
    assert_relative_eq!(split.contours[0].signed_area(), 100.0, epsilon = 1e-6);
    assert!(split.contours[0].is_ccw());

    let fine = slice(&fitted, &SliceSettings { layer_height: 0.5 }).unwrap();
    for layer in &fine.layers {
        assert_eq!(layer.contours.len(), 1, "layer {}", layer.index);
        assert_relative_eq!(layer.contours[0].signed_area(), 100.0, epsilon = 1e-6);
    }
}

#[test]
fn test_oversized_model_is_scaled_down() {
    let fitted = fit_to_bed(box_mesh(440.0, 100.0, 50.0), &BuildVolume::default()).unwrap();
    assert_relative_eq!(fitted.scale, 0.5);
    assert_relative_eq!(fitted.bottom, 0.0);
    assert_relative_eq!(fitted.top, 25.0);

    let result = slice(&fitted, &SliceSettings { layer_height: 1.0 }).unwrap();
    let mid = &result.layers[10];
    assert_eq!(mid.contours.len(), 1);
    assert_relative_eq!(mid.contours[0].signed_area(), 220.0 * 50.0, epsilon = 1e-6);
}

#[test]
fn test_contour_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube_contour.txt");

    let fitted = fit_to_bed(box_mesh(10.0, 10.0, 10.0), &BuildVolume::default()).unwrap();
    let result = slice(&fitted, &SliceSettings::default()).unwrap();
    write_contours(&path, &result.layers).unwrap();

    let loaded = load_contours(&path).unwrap();
    assert_eq!(loaded.len(), result.layers.len());
    for (layer, contours) in result.layers.iter().zip(&loaded) {
        assert_eq!(layer.contours.len(), contours.len());
        for (a, b) in layer.contours.iter().zip(contours) {
            assert_eq!(a.len(), b.len());
            for (p, q) in a.points().iter().zip(b.points()) {
                assert!((p - q).abs().max() <= 5e-4);
            }
        }
    }

    // Offsetting a reloaded contour behaves like offsetting the original.
    let original = &result.layers[5].contours[0];
    let reloaded = &loaded[5][0];
    let a = offset_contour(original, -1.0).unwrap();
    let b = offset_contour(reloaded, -1.0).unwrap();
    assert_relative_eq!(a.signed_area(), 64.0, epsilon = 1e-6);
    assert_relative_eq!(b.signed_area(), 64.0, epsilon = 1e-2);
}

#[test]
fn test_missing_contour_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_contours(dir.path().join("nope.txt")).is_err());
}
