//! skytiles - split a star catalog into cube-face level-of-detail tiles.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use skytiles::catalog::{build_face_tree, read_catalog};
use skytiles::tiles::{collect_tiles, write_tiles};
use skytiles::BuildConfig;

#[derive(Parser, Debug)]
#[command(version, about = "Split a star catalog into cube-face level-of-detail tiles")]
struct Args {
    /// HYG-style CSV star catalog.
    catalog: PathBuf,

    /// TOML build configuration; defaults are used if it does not exist.
    #[arg(short, long, default_value = "skytiles.toml")]
    config: PathBuf,

    /// Stars per node, overrides the config file.
    #[arg(long)]
    capacity: Option<usize>,

    /// Deepest node level, overrides the config file.
    #[arg(long)]
    max_depth: Option<u8>,

    /// Output directory, overrides the config file.
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("skytiles v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let mut config = BuildConfig::load(&args.config)?;
    if let Some(capacity) = args.capacity {
        config.capacity = capacity;
    }
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(out) = args.out {
        config.output_dir = out;
    }
    info!("  Capacity: {}", config.capacity);
    info!("  Max depth: {}", config.max_depth);
    info!("  Output: {}", config.output_dir.display());

    let file = File::open(&args.catalog)
        .with_context(|| format!("opening catalog {}", args.catalog.display()))?;
    let faces = read_catalog(BufReader::new(file), config.min_magnitude)?;

    let mut total = 0;
    for (face, stars) in faces {
        info!(%face, stars = stars.len(), "organizing stars for face");
        let tree = build_face_tree(stars, &config)
            .with_context(|| format!("building tree for face {face}"))?;
        let tiles = collect_tiles(&tree, face);
        total += write_tiles(&config.output_dir, &tiles)
            .with_context(|| format!("writing tiles for face {face}"))?;
    }

    info!(tiles = total, "done");
    Ok(())
}
