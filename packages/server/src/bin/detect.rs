//! Game authoring tool: detect the differences between two images.
//!
//! Prints the classification of the pair and optionally writes the difference
//! snapshot consumed by the server and a black-on-white visualization.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin sabun-detect -- --original a.bmp --modified b.bmp --radius 3 \
//!     --output data/games/cats.json --visualization cats-diff.png
//! ```

use std::{error::Error, path::PathBuf};

use clap::Parser;
use sabun_server::{
    domain::{DifferenceDetector, DifferenceRepository, ExtensionRadius, GameId},
    infrastructure::repository::JsonDifferenceRepository,
};
use sabun_shared::logger::setup_logger;

#[derive(Debug, Parser)]
#[command(name = "sabun-detect", version, about = "Detect the differences between two images")]
struct Args {
    /// Original image (640x480)
    #[arg(long)]
    original: PathBuf,

    /// Modified image (640x480)
    #[arg(long)]
    modified: PathBuf,

    /// Extension radius: 0, 3, 9 or 15
    #[arg(long, default_value_t = 3)]
    radius: u32,

    /// Write the difference snapshot to `<dir>/<game-id>.json`
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write the black-on-white difference image
    #[arg(long)]
    visualization: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    if let Err(e) = run(args).await {
        tracing::error!("Detection failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let radius = ExtensionRadius::new(args.radius)?;
    let original = image::open(&args.original)?.to_rgb8();
    let modified = image::open(&args.modified)?.to_rgb8();

    let report = DifferenceDetector::new(radius).detect(&original, &modified)?;
    tracing::info!(
        "Found {} difference(s) at radius {} ({:.2}% of pixels differ)",
        report.difference_count(),
        radius.value(),
        report.raw_ratio() * 100.0
    );
    println!("{}", serde_json::to_string_pretty(&report.classification())?);

    if let Some(path) = &args.visualization {
        report.render().save(path)?;
        tracing::info!("Wrote visualization to {}", path.display());
    }

    if let Some(path) = &args.output {
        if !report.is_valid() {
            tracing::warn!("Saving a game outside of the 3 to 9 differences range");
        }
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or("output path has no file name")?;
        let game_id = GameId::new(stem.to_string())?;
        let directory = path.parent().map(PathBuf::from).unwrap_or_default();
        JsonDifferenceRepository::new(directory)
            .save(&game_id, report.snapshot())
            .await?;
    }
    Ok(())
}
