#![warn(missing_docs)]

//! G-code generation for the strata slicer.
//!
//! This crate converts layers of closed contours into G-code for a
//! single-extruder FDM printer.
//!
//! # Example
//!
//! ```ignore
//! use strata_slicer::{slice, SliceSettings};
//! use strata_slicer_gcode::{generate_gcode, GcodeSettings};
//!
//! let result = slice(&fitted, &SliceSettings::default())?;
//! let gcode = generate_gcode(&result.layers, &GcodeSettings::default());
//! std::fs::write("output.gcode", gcode)?;
//! ```

pub mod gcode;
pub mod printer;

pub use gcode::{generate_gcode, Extrusion, GcodeGenerator, GcodeSettings};
pub use printer::PrinterProfile;
