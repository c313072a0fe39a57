//! G-code program generation.

use serde::{Deserialize, Serialize};
use strata_math::Point3;
use strata_slicer::Contour;
use tracing::{info, warn};

use crate::printer::PrinterProfile;

/// Settings for G-code generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcodeSettings {
    /// Target printer.
    pub printer: PrinterProfile,
    /// Feedrate for travel and extrusion moves (mm/min).
    pub feedrate: f64,
    /// Filament advanced per mm of path.
    pub extrusion_per_mm: f64,
}

impl Default for GcodeSettings {
    fn default() -> Self {
        Self {
            printer: PrinterProfile::generic(),
            feedrate: 600.0,
            extrusion_per_mm: 0.5,
        }
    }
}

/// Running extruder position for one generation session.
///
/// Threaded through every extrusion move. It only grows while a contour
/// is printed and is reset together with the machine's E axis (`G92 E0`)
/// when the contour is closed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Extrusion {
    total: f64,
}

impl Extrusion {
    /// Current E position.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Advance for a move of `length` mm and return the new E position.
    pub fn advance(&mut self, length: f64, per_mm: f64) -> f64 {
        self.total += length * per_mm;
        self.total
    }

    /// Return to zero, matching a `G92 E0`.
    pub fn reset(&mut self) {
        self.total = 0.0;
    }
}

/// Builds a G-code program line by line.
#[derive(Debug, Clone)]
pub struct GcodeGenerator {
    settings: GcodeSettings,
    lines: Vec<String>,
}

impl GcodeGenerator {
    /// Create a generator with an empty program.
    pub fn new(settings: GcodeSettings) -> Self {
        Self {
            settings,
            lines: Vec::new(),
        }
    }

    /// Home, switch to absolute positioning, start the fan and heat up.
    pub fn header(&mut self) {
        let printer = &self.settings.printer;
        let header = [
            "G28".to_string(),
            "G90".to_string(),
            format!("M106 S{}", printer.fan_speed),
            format!("M109 S{} T0", printer.nozzle_temp),
            format!("M190 S{}", printer.bed_temp),
        ];
        self.lines.extend(header);
    }

    /// Cool down, stop the fan and present the bed.
    pub fn footer(&mut self) {
        let printer = &self.settings.printer;
        let footer = [
            "M104 S0".to_string(),
            "M140 S0".to_string(),
            "M107".to_string(),
            format!(
                "G1 X{} Y{} F{}",
                printer.park_x, printer.park_y, printer.park_feedrate
            ),
        ];
        self.lines.extend(footer);
    }

    /// Print one closed contour.
    ///
    /// Travels to the first point, extrudes to every following point and
    /// back to the first, then resets the extruder position.
    pub fn contour(&mut self, contour: &Contour, extrusion: &mut Extrusion) {
        let points = contour.points();
        let Some(first) = points.first() else {
            return;
        };

        if points.iter().any(|p| !self.settings.printer.in_bounds(p)) {
            warn!(
                z = first.z,
                printer = %self.settings.printer.name,
                "Contour leaves the build volume"
            );
        }

        self.travel(first);
        for pair in points.windows(2) {
            self.extrude(&pair[0], &pair[1], extrusion);
        }
        if let Some(last) = points.last() {
            self.extrude(last, first, extrusion);
        }
        self.lines.push("G92 E0".to_string());
        extrusion.reset();
    }

    fn travel(&mut self, target: &Point3) {
        self.lines.push(format!(
            "G0 X{:.3} Y{:.3} Z{:.3} F{}",
            target.x, target.y, target.z, self.settings.feedrate
        ));
    }

    fn extrude(&mut self, from: &Point3, to: &Point3, extrusion: &mut Extrusion) {
        let e = extrusion.advance((to - from).norm(), self.settings.extrusion_per_mm);
        self.lines.push(format!(
            "G1 X{:.3} Y{:.3} Z{:.3} E{:.3} F{}",
            to.x, to.y, to.z, e, self.settings.feedrate
        ));
    }

    /// Number of lines emitted so far.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Lines emitted so far, without terminators.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Render the program, each line terminated by ` ;`.
    pub fn finish(self) -> String {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.len() + 3).sum());
        for line in &self.lines {
            out.push_str(line);
            out.push_str(" ;\n");
        }
        out
    }
}

/// Generate a complete program printing every contour, layer by layer.
pub fn generate_gcode<L: AsRef<[Contour]>>(layers: &[L], settings: &GcodeSettings) -> String {
    let mut generator = GcodeGenerator::new(settings.clone());
    let mut extrusion = Extrusion::default();
    generator.header();
    for layer in layers {
        for contour in layer.as_ref() {
            generator.contour(contour, &mut extrusion);
        }
    }
    generator.footer();

    info!(lines = generator.line_count(), "Generated G-code");
    generator.finish()
}
