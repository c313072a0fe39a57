//! Printer profile definitions.

use serde::{Deserialize, Serialize};
use strata_math::Point3;
use strata_slicer::BuildVolume;

/// Printer profile with machine-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterProfile {
    /// Profile name.
    pub name: String,
    /// Printable volume (mm).
    pub build_volume: BuildVolume,
    /// Hot end temperature (°C).
    pub nozzle_temp: u32,
    /// Bed temperature (°C).
    pub bed_temp: u32,
    /// Part cooling fan PWM value (0-255).
    pub fan_speed: u32,
    /// X position the head parks at when the print is done (mm).
    pub park_x: f64,
    /// Y position the bed is presented at when the print is done (mm).
    pub park_y: f64,
    /// Feedrate of the final park move (mm/min).
    pub park_feedrate: f64,
}

impl Default for PrinterProfile {
    fn default() -> Self {
        Self::generic()
    }
}

impl PrinterProfile {
    /// Generic 220x220x100 PLA printer.
    pub fn generic() -> Self {
        Self {
            name: "Generic".into(),
            build_volume: BuildVolume::default(),
            nozzle_temp: 190,
            bed_temp: 50,
            fan_speed: 255,
            park_x: 0.0,
            park_y: 180.0,
            park_feedrate: 9000.0,
        }
    }

    /// Check if a position is within the build volume.
    pub fn in_bounds(&self, p: &Point3) -> bool {
        let BuildVolume { min, max } = self.build_volume;
        (0..3).all(|axis| p[axis] >= min[axis] && p[axis] <= max[axis])
    }
}
