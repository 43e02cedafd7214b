//! archdraw CLI - drawing generation for building models
//!
//! Reads a JSON building model, generates plan, section or elevation
//! drawings and writes them as JSON.

use anyhow::{bail, Context, Result};
use archdraw_drafting::{
    CardinalDirection, ElevationRequest, ElevationViewGenerator, PlanViewGenerator,
    SectionPlane, SectionRequest, SectionViewGenerator, ViewResult,
};
use archdraw_math::{Point3, Vec3};
use archdraw_model::{BuildingModel, ElementKind, ModelProvider};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;

use config::DrawingConfig;

#[derive(Parser)]
#[command(name = "archdraw")]
#[command(about = "Generate architectural drawings from building models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Horizontal plan cuts at one or more levels
    Plan {
        /// Input model (.json)
        model: PathBuf,
        /// Cut heights
        #[arg(short, long = "level", required = true, num_args = 1..)]
        levels: Vec<f64>,
        #[command(flatten)]
        io: OutputArgs,
    },
    /// Section through an arbitrary plane
    Section {
        /// Input model (.json)
        model: PathBuf,
        /// A point on the plane, as x,y,z
        #[arg(long, value_parser = parse_vec3)]
        origin: [f64; 3],
        /// Plane normal, pointing at the retained half, as x,y,z
        #[arg(long, value_parser = parse_vec3)]
        normal: [f64; 3],
        /// Drawing up direction, as x,y,z
        #[arg(long, value_parser = parse_vec3)]
        up: Option<[f64; 3]>,
        #[command(flatten)]
        io: OutputArgs,
    },
    /// Cardinal elevation
    Elevation {
        /// Input model (.json)
        model: PathBuf,
        /// north, south, east or west
        #[arg(short, long, default_value = "south")]
        direction: String,
        #[command(flatten)]
        io: OutputArgs,
    },
    /// Display information about a model
    Info {
        /// Input model (.json)
        model: PathBuf,
    },
}

#[derive(clap::Args)]
struct OutputArgs {
    /// TOML drawing configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { model, levels, io } => {
            let model = load_model(&model)?;
            let config = DrawingConfig::load(io.config.as_deref())?;
            let views: Vec<ViewResult> = PlanViewGenerator
                .generate_multi_level(&model, &levels, &config.plan_request())?
                .into_iter()
                .map(ViewResult::Plan)
                .collect();
            for view in &views {
                report(view);
            }
            write_output(&views, io.output.as_deref())?;
        }
        Commands::Section {
            model,
            origin,
            normal,
            up,
            io,
        } => {
            let model = load_model(&model)?;
            let config = DrawingConfig::load(io.config.as_deref())?;
            let origin = Point3::from(origin);
            let normal = Vec3::from(normal);
            let plane = match up {
                Some(up) => SectionPlane::new(origin, normal, Vec3::from(up)),
                None => SectionPlane::with_default_up(origin, normal),
            };
            let request = SectionRequest {
                plane: Some(plane),
                view_depth: config.section.view_depth,
                settings: config.drawing,
            };
            let view = ViewResult::Section(SectionViewGenerator.generate(&model, &request)?);
            report(&view);
            write_output(&view, io.output.as_deref())?;
        }
        Commands::Elevation {
            model,
            direction,
            io,
        } => {
            let model = load_model(&model)?;
            let config = DrawingConfig::load(io.config.as_deref())?;
            let (direction, fallback) = CardinalDirection::parse_lenient(&direction);
            let request = ElevationRequest {
                direction,
                settings: config.drawing,
            };
            let mut view = ElevationViewGenerator.generate(&model, &request)?;
            view.diagnostics.extend(fallback);
            let view = ViewResult::Elevation(view);
            report(&view);
            write_output(&view, io.output.as_deref())?;
        }
        Commands::Info { model: path } => {
            show_info(&path)?;
        }
    }

    Ok(())
}

fn parse_vec3(s: &str) -> std::result::Result<[f64; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z but got {s:?}"));
    }
    let mut out = [0.0; 3];
    for (slot, part) in out.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("{part:?} is not a number"))?;
    }
    Ok(out)
}

fn load_model(path: &Path) -> Result<BuildingModel> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read model {}", path.display()))?;
    let model = BuildingModel::from_json(&json)?;
    model.validate()?;
    tracing::info!(
        path = %path.display(),
        elements = model.elements.len(),
        materials = model.materials.len(),
        "loaded model"
    );
    Ok(model)
}

fn report(view: &ViewResult) {
    let bounds = view.bounds();
    tracing::info!(
        width = bounds.width(),
        height = bounds.height(),
        diagnostics = view.diagnostics().len(),
        "generated view"
    );
    for diagnostic in view.diagnostics() {
        tracing::warn!(
            kind = ?diagnostic.kind,
            element = ?diagnostic.element,
            "{}",
            diagnostic.message
        );
    }
}

fn write_output<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote drawing");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn show_info(path: &Path) -> Result<()> {
    let model = load_model(path)?;
    if model.elements.is_empty() {
        bail!("model {} has no elements", path.display());
    }

    println!("archdraw model: {}", path.display());
    println!("  Version: {}", model.version);
    println!("  Elements: {}", model.elements.len());
    println!("  Materials: {}", model.materials.len());
    println!("  Annotations: {}", model.annotations.len());

    println!("\nElements by kind:");
    for kind in ElementKind::ALL {
        let count = model.elements_of(kind).count();
        if count > 0 {
            println!("  {kind:?}: {count}");
        }
    }

    if let Some((lo, hi)) = model.bounds() {
        println!("\nBounds:");
        println!("  Min: ({:.3}, {:.3}, {:.3})", lo.x, lo.y, lo.z);
        println!("  Max: ({:.3}, {:.3}, {:.3})", hi.x, hi.y, hi.z);
    }

    Ok(())
}
