use anyhow::{bail, Context, Result};
use clap::Parser;
use image::imageops;
use std::path::PathBuf;
use stickerfx::loader;
use stickerfx::media::{rasterize, ImageObject};
use stickerfx::output::{ExtractOptions, MismatchPolicy};
use stickerfx::segmentation::{
    ExecutionHint, FloodConfig, FloodEngine, NormalizedPoint, SegmentationEngine,
    SegmentationSession,
};
use stickerfx::surface::Surface;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source image to cut a sticker from
    image: PathBuf,

    /// Foreground click as normalized "x,y" (0..1 of the image size)
    #[arg(short, long, value_parser = parse_point, conflicts_with = "scribble")]
    point: Option<NormalizedPoint>,

    /// Scribble sample as normalized "x,y"; repeat in stroke order
    #[arg(short, long, value_parser = parse_point)]
    scribble: Vec<NormalizedPoint>,

    /// Where to write the cutout PNG
    #[arg(short, long, default_value = "sticker.png")]
    output: PathBuf,

    /// Also write the source with the selection highlighted
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Colour distance tolerance for the built-in engine
    #[arg(long, default_value_t = 0.12)]
    tolerance: f32,

    /// Crop the cutout to the selected region
    #[arg(long)]
    trim: bool,

    /// Print the cutout as a data URI
    #[arg(long)]
    data_uri: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn parse_point(s: &str) -> Result<NormalizedPoint, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"x,y\", got {s:?}"))?;
    let x: f32 = x.trim().parse().map_err(|_| format!("invalid x in {s:?}"))?;
    let y: f32 = y.trim().parse().map_err(|_| format!("invalid y in {s:?}"))?;
    if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
        return Err("coordinates must be between 0.0 and 1.0".to_string());
    }
    Ok(NormalizedPoint::new(x, y))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let source = loader::load_rgba(&args.image)?;
    tracing::info!(
        "Loaded {} ({}x{})",
        args.image.display(),
        source.width(),
        source.height()
    );
    let object = ImageObject::at_natural_size(0.0, 0.0, source);

    let mut engine = FloodEngine::new(FloodConfig {
        tolerance: args.tolerance,
        ..FloodConfig::default()
    });
    engine
        .initialize("builtin:flood", ExecutionHint::Cpu)
        .await
        .context("Failed to initialize segmentation engine")?;

    let mut session = SegmentationSession::new();
    if !args.scribble.is_empty() {
        for point in &args.scribble {
            session.record_scribble(*point);
        }
    } else if let Some(point) = args.point {
        session.record_click(point);
    } else {
        bail!("Nothing to select. Pass --point x,y or one or more --scribble x,y");
    }

    if args.overlay.is_some() {
        session.attach_overlay(Surface::new(0, 0));
    }

    session
        .request_segmentation(&engine, &object)
        .await
        .context("Failed to segment image")?;

    if let Some(path) = &args.overlay {
        session.redraw_overlay()?;
        let mut composite = rasterize(&object);
        if let Some(overlay) = session.overlay() {
            imageops::overlay(composite.as_image_mut(), overlay.as_image(), 0, 0);
        }
        composite
            .as_image()
            .save(path)
            .with_context(|| format!("Failed to write overlay to {}", path.display()))?;
        tracing::info!("Overlay written to {}", path.display());
    }

    let options = ExtractOptions {
        on_mismatch: MismatchPolicy::Resample,
        trim: args.trim,
    };
    let artifact = session.extract(&object, &options)?;
    std::fs::write(&args.output, artifact.png_bytes())
        .with_context(|| format!("Failed to write cutout to {}", args.output.display()))?;
    tracing::info!(
        "Sticker {}x{} written to {}",
        artifact.width(),
        artifact.height(),
        args.output.display()
    );

    if args.data_uri {
        println!("{}", artifact.to_data_uri());
    }

    Ok(())
}
