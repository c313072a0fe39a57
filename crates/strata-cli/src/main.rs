//! strata CLI - planar slicer for FDM printing
//!
//! Slices an STL model into contours and G-code, and re-runs contour
//! offsetting from a saved contour file without slicing again.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{warn, Level};

use strata_slicer::{
    fit_to_bed, format_contours, load_contours, offset_series, slice, SliceSettings,
};
use strata_slicer_gcode::{generate_gcode, GcodeSettings};

mod stl;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Planar slicer: STL to contours and G-code", long_about = None)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct Paths {
    /// Directory holding `<model>.stl`
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Directory for generated files
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
    /// JSON file with G-code settings (printer, feedrate, extrusion)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Slice a model into G-code and a contour file
    Slice {
        /// Model name (reads `<data-dir>/<model>.stl`)
        model: String,
        /// Distance between layers (mm)
        #[arg(long, default_value_t = 0.4)]
        layer_height: f64,
        #[command(flatten)]
        paths: Paths,
    },
    /// Offset the contours of one layer of a sliced model into G-code
    Offset {
        /// Model name (reads `<output-dir>/<model>_contour.txt`)
        model: String,
        /// Layer index in the contour file
        #[arg(long)]
        layer: usize,
        /// Offset step (mm); negative shrinks
        #[arg(long, allow_hyphen_values = true)]
        distance: f64,
        /// Number of offsets after the original contour
        #[arg(long, default_value_t = 1)]
        count: usize,
        #[command(flatten)]
        paths: Paths,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Slice {
            model,
            layer_height,
            paths,
        } => {
            slice_model(&model, layer_height, &paths)?;
        }
        Commands::Offset {
            model,
            layer,
            distance,
            count,
            paths,
        } => {
            offset_model(&model, layer, distance, count, &paths)?;
        }
    }

    Ok(())
}

fn load_settings(config: Option<&Path>) -> Result<GcodeSettings> {
    match config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("invalid G-code settings in {}", path.display()))
        }
        None => Ok(GcodeSettings::default()),
    }
}

fn slice_model(model: &str, layer_height: f64, paths: &Paths) -> Result<()> {
    let stl_path = paths.data_dir.join(format!("{model}.stl"));
    if !stl_path.exists() {
        bail!("{model} does not exist ({})", stl_path.display());
    }
    let gcode_settings = load_settings(paths.config.as_deref())?;
    let slice_settings = SliceSettings { layer_height };
    slice_settings.validate()?;

    let mesh = stl::load_stl(&stl_path)?;
    println!(
        "Slicing {} with slice height {:.3}...",
        stl_path.display(),
        layer_height
    );

    let fitted = fit_to_bed(mesh, &gcode_settings.printer.build_volume)?;
    let result = slice(&fitted, &slice_settings)?;
    println!(
        "\tSliced into {} layers, with {} total contours.",
        result.stats.layer_count, result.stats.contour_count
    );
    println!(
        "\t[Slicing: {:.3}s, Stitching: {:.3}s]",
        result.stats.slice_seconds, result.stats.stitch_seconds
    );

    let gcode = generate_gcode(&result.layers, &gcode_settings);
    let contours = format_contours(&result.layers);

    fs::create_dir_all(&paths.output_dir)?;
    let gcode_path = paths.output_dir.join(format!("{model}.gcode"));
    let contour_path = paths.output_dir.join(format!("{model}_contour.txt"));
    write_outputs(&[
        (gcode_path.as_path(), gcode.as_str()),
        (contour_path.as_path(), contours.as_str()),
    ])?;

    println!(
        "Successfully wrote GCode to {} [{} lines]",
        gcode_path.display(),
        gcode.lines().count()
    );
    println!(
        "Saved contour information to {} [{} lines]",
        contour_path.display(),
        result.layers.len()
    );

    Ok(())
}

/// Write every file or none: on failure the files already written are removed.
fn write_outputs(outputs: &[(&Path, &str)]) -> Result<()> {
    for (i, (path, contents)) in outputs.iter().enumerate() {
        if let Err(err) = fs::write(path, contents) {
            for (written, _) in &outputs[..i] {
                if let Err(cleanup) = fs::remove_file(written) {
                    warn!(path = %written.display(), error = %cleanup, "Failed to remove partial output");
                }
            }
            return Err(err).with_context(|| format!("failed to write {}", path.display()));
        }
    }
    Ok(())
}

fn offset_model(
    model: &str,
    layer: usize,
    distance: f64,
    count: usize,
    paths: &Paths,
) -> Result<()> {
    let contour_path = paths.output_dir.join(format!("{model}_contour.txt"));
    if !contour_path.exists() {
        bail!("{model} contour does not exist. Run `strata slice {model}` first.");
    }
    let gcode_settings = load_settings(paths.config.as_deref())?;

    let layers = load_contours(&contour_path)?;
    let contours = layers.get(layer).ok_or_else(|| {
        anyhow!(
            "layer {layer} is out of range ({} has {} layers)",
            contour_path.display(),
            layers.len()
        )
    })?;

    let groups = offset_series(contours, distance, count);
    let gcode = generate_gcode(&groups, &gcode_settings);

    let gcode_path = paths.output_dir.join(format!("{model}_offset.gcode"));
    fs::write(&gcode_path, &gcode)?;
    println!(
        "Successfully wrote GCode to {} [{} lines]",
        gcode_path.display(),
        gcode.lines().count()
    );

    Ok(())
}
