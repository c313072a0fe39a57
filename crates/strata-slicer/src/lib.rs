#![warn(missing_docs)]

//! Planar slicing for 3D printing.
//!
//! This crate turns a closed triangle mesh into closed contours, one set
//! per horizontal layer, and offsets those contours into shells. The
//! pipeline is:
//!
//! 1. [`fit_to_bed`] scales and places the mesh on the build plate
//! 2. [`slice_mesh`] intersects triangles with planes into edge soups
//! 3. [`create_contours`] stitches each soup into closed [`Contour`]s
//! 4. [`offset_contour`] shifts a contour inward or outward
//!
//! Contours can be saved with [`write_contours`] and reloaded with
//! [`load_contours`] so offsetting can rerun without slicing again.
//!
//! # Example
//!
//! ```ignore
//! use strata_slicer::{fit_to_bed, slice, BuildVolume, SliceSettings};
//!
//! let fitted = fit_to_bed(mesh, &BuildVolume::default())?;
//! let result = slice(&fitted, &SliceSettings::default())?;
//!
//! println!("Layers: {}", result.stats.layer_count);
//! println!("Contours: {}", result.stats.contour_count);
//! ```

pub mod contour;
pub mod contour_io;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod offset;
pub mod slice;

pub use contour::{build_contours, create_contours, Contour, SliceLayer, Stitched};
pub use contour_io::{format_contours, load_contours, parse_contours, write_contours};
pub use error::{Result, SlicerError};
pub use geometry::{
    closest_parameter_on_line, dist_squared, in_bounds, line_line_intersection, point_on_plane,
    triangle_plane_intersection, Segment2, Triangle,
};
pub use mesh::{fit_to_bed, mesh_bounds, BuildVolume, FittedMesh, TriangleMesh};
pub use offset::{offset_contour, offset_series};
pub use slice::{plane_heights, slice_mesh, Edge, LayerEdges, MAX_PLANES};

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Slicing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceSettings {
    /// Vertical distance between slicing planes (mm).
    pub layer_height: f64,
}

impl Default for SliceSettings {
    fn default() -> Self {
        Self { layer_height: 0.4 }
    }
}

impl SliceSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.layer_height.is_finite() || self.layer_height <= 0.0 {
            return Err(SlicerError::InvalidSettings(
                "layer_height must be a positive number of mm".into(),
            ));
        }
        Ok(())
    }
}

/// Statistics about a slicing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceStats {
    /// Number of layers (slicing planes).
    pub layer_count: usize,
    /// Total closed contours over all layers.
    pub contour_count: usize,
    /// Raw intersection edges produced by the slicer.
    pub edge_count: usize,
    /// Edges that did not end up in any contour.
    pub discarded_edges: usize,
    /// Lowest Z of the sliced mesh.
    pub bottom: f64,
    /// Highest Z of the sliced mesh.
    pub top: f64,
    /// Time spent intersecting triangles (seconds).
    pub slice_seconds: f64,
    /// Time spent stitching contours (seconds).
    pub stitch_seconds: f64,
}

/// Result of slicing operation.
#[derive(Debug, Clone)]
pub struct SliceResult {
    /// Layers with their contours, bottom to top.
    pub layers: Vec<SliceLayer>,
    /// Slicing statistics.
    pub stats: SliceStats,
}

/// Slice a placed mesh with the given settings.
///
/// This is the main entry point for slicing. It:
/// 1. Computes the plane heights from the mesh's vertical extent
/// 2. Intersects the mesh with every plane
/// 3. Stitches each plane's edges into closed contours
pub fn slice(fitted: &FittedMesh, settings: &SliceSettings) -> Result<SliceResult> {
    settings.validate()?;

    info!(
        triangles = fitted.mesh.triangle_count(),
        layer_height = settings.layer_height,
        "Starting mesh slicing"
    );

    let t_start = Instant::now();
    let soups = slice_mesh(
        &fitted.mesh,
        fitted.bottom,
        fitted.top,
        settings.layer_height,
    )?;
    let t_slice = Instant::now();
    let layers = create_contours(&soups);
    let t_stitch = Instant::now();

    let stats = SliceStats {
        layer_count: layers.len(),
        contour_count: layers.iter().map(|l| l.contours.len()).sum(),
        edge_count: soups.iter().map(|s| s.edges.len() + s.coplanar.len()).sum(),
        discarded_edges: layers.iter().map(|l| l.discarded_edges).sum(),
        bottom: fitted.bottom,
        top: fitted.top,
        slice_seconds: (t_slice - t_start).as_secs_f64(),
        stitch_seconds: (t_stitch - t_slice).as_secs_f64(),
    };

    info!(
        layers = stats.layer_count,
        contours = stats.contour_count,
        slice_s = format!("{:.3}", stats.slice_seconds),
        stitch_s = format!("{:.3}", stats.stitch_seconds),
        "Slicing complete"
    );

    Ok(SliceResult { layers, stats })
}
