//! tattlab - headless tattoo placement driver
//!
//! Stands in for the interactive front end: loads a tattoo image, places it
//! on a stand-in arm at scripted pointer positions through the placement
//! command queue, then writes the canvas as PNG and the decals as OBJ.

mod export;
mod scene;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use glam::{Affine3A, Quat, Vec2};
use tattlab_config::{PlacementMode, TattooConfig};
use tattoo::{
    CanvasTexture, PlacementCommand, PlacementOutcome, PlacementPipeline, TattooImage,
    command_channel,
};
use tracing::{info, warn};

use scene::Camera;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    /// Paint into the UV canvas
    Canvas,
    /// Build clipped decal meshes
    Decal,
    /// Paint when the arm has UVs, otherwise build decals
    Auto,
}

impl From<ModeArg> for PlacementMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Canvas => PlacementMode::Canvas,
            ModeArg::Decal => PlacementMode::Decal,
            ModeArg::Auto => PlacementMode::Auto,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "tattlab")]
#[command(about = "Place tattoo images on a mesh and export the result")]
#[command(version)]
struct Cli {
    /// JSON config file (defaults to $TATTLAB_CONFIG, then built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tattoo image (PNG). A placeholder disc is used when omitted.
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Output directory for canvas.png and decals.obj
    #[arg(short, long, default_value = "tattlab-out")]
    output: PathBuf,

    /// Placement technique
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Stamp size scale
    #[arg(long)]
    scale: Option<f32>,

    /// Pointer position in normalized device coordinates, e.g. `0.2,-0.1`.
    /// Repeat for several placements.
    #[arg(long = "at", value_parser = parse_ndc, default_value = "0.1,0.05")]
    at: Vec<Vec2>,

    /// Register the arm without UVs
    #[arg(long)]
    no_uvs: bool,

    /// Arm rotation about its long axis, in degrees
    #[arg(long, default_value_t = 0.0)]
    rotate: f32,
}

fn parse_ndc(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|e| format!("invalid coordinate '{v}': {e}"))
    };
    let ndc = Vec2::new(parse(x)?, parse(y)?);
    if ndc.abs().max_element() > 1.0 {
        return Err(format!("coordinates must lie in [-1, 1], got {ndc}"));
    }
    Ok(ndc)
}

fn load_config(cli: &Cli) -> Result<TattooConfig> {
    let mut config = match &cli.config {
        Some(path) => TattooConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => TattooConfig::from_env().context("failed to load config")?,
    };
    if let Some(mode) = cli.mode {
        config.session.mode = mode.into();
    }
    if let Some(scale) = cli.scale {
        config.stamp.size_scale = scale;
    }
    config.validate()?;
    Ok(config)
}

fn load_image(cli: &Cli) -> Result<TattooImage> {
    match &cli.image {
        Some(path) => {
            let decoded = image::open(path)
                .with_context(|| format!("failed to decode {}", path.display()))?;
            Ok(TattooImage::from_dynamic(&decoded)?)
        }
        None => scene::placeholder_tattoo(128, [180, 20, 40]),
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let tattoo = load_image(&cli)?;

    let mut pipeline = PlacementPipeline::from_config(&config);
    let surface = pipeline
        .registry_mut()
        .add_canvas(CanvasTexture::from_config(&config.canvas));
    let arm = std::sync::Arc::new(scene::arm_mesh(64, 16, !cli.no_uvs)?);
    let transform = Affine3A::from_quat(Quat::from_rotation_y(cli.rotate.to_radians()));
    let paintable = (!cli.no_uvs).then_some(surface);
    pipeline.registry_mut().add_target(arm, transform, paintable)?;

    let camera = Camera::default();
    let (commands, queue) = command_channel();

    commands.send(PlacementCommand::LoadImage(tattoo))?;
    for ndc in &cli.at {
        commands.send(PlacementCommand::RequestArm)?;
        commands.send(PlacementCommand::Advance(config.arm_delay()))?;
        commands.send(PlacementCommand::Pointer(camera.ray(*ndc)))?;
    }

    let mut placed = 0usize;
    for result in pipeline.drain(&queue) {
        match result {
            Ok(PlacementOutcome::Painted { region, .. }) => {
                placed += 1;
                info!("Painted stamp: {:?}", region);
            }
            Ok(PlacementOutcome::Decal { id, triangles, .. }) => {
                placed += 1;
                info!("Built decal {:?} with {} triangles", id, triangles);
            }
            Ok(PlacementOutcome::Empty { object }) => {
                warn!("Placement on {:?} produced no geometry", object);
            }
            Ok(_) => {}
            Err(e) => warn!("Placement failed: {}", e),
        }
    }
    if placed == 0 && !cli.at.is_empty() {
        bail!("no placement succeeded");
    }

    fs::create_dir_all(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;

    let registry = pipeline.registry();
    if let Some(canvas) = registry.canvas(surface) {
        export::write_canvas_png(canvas, &cli.output.join("canvas.png"))?;
    }
    if !registry.decals().is_empty() {
        export::write_decals_obj(registry.decals(), &cli.output.join("decals.obj"))?;
    }

    info!("{} of {} placements succeeded", placed, cli.at.len());
    Ok(())
}
