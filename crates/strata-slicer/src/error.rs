//! Error types for the slicer.

use thiserror::Error;

/// Errors that can occur during slicing.
#[derive(Error, Debug)]
pub enum SlicerError {
    /// Mesh has no triangles.
    #[error("mesh is empty")]
    EmptyMesh,

    /// Mesh has degenerate geometry.
    #[error("mesh has degenerate geometry: {0}")]
    DegenerateMesh(String),

    /// Invalid slice settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Slicing operation failed.
    #[error("slicing failed: {0}")]
    SliceFailed(String),

    /// A vertex in a contour file is not three whitespace-separated floats.
    #[error("failed to parse vertex {token:?} (layer {layer}, contour {contour}, vertex {vertex})")]
    ContourParse {
        /// Layer (line) index.
        layer: usize,
        /// Contour index within the layer.
        contour: usize,
        /// Vertex index within the contour.
        vertex: usize,
        /// The offending text.
        token: String,
    },

    /// Reading or writing a contour file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for slicer operations.
pub type Result<T> = std::result::Result<T, SlicerError>;
