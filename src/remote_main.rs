//! prodimg-remote
//!
//! Standalone binary for inventory exports: reads a JSON array of product
//! records, downloads every product image, normalizes it and writes an
//! upload manifest next to the assets.

use anyhow::Result;
use clap::Parser;
use prodimg::config::{ProcessingConfig, Variant, DEFAULT_ASSET_PREFIX};
use prodimg::logging::init_logging;
use prodimg::remote::{load_products, write_manifest, Manifest, RemoteProcessor};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "prodimg-remote")]
#[command(about = "Download and normalize product images from an inventory export")]
#[command(version)]
struct RemoteCli {
    /// JSON file with an array of {sku, name, image_url, images}
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "processed-images")]
    output: PathBuf,

    /// Padding in pixels (default: 50)
    #[arg(short, long, default_value = "50")]
    padding: u32,

    /// WebP quality 1-100 (default: 85)
    #[arg(short, long, default_value = "85", value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Downscale sources larger than WIDTHxHEIGHT before padding
    #[arg(long, default_value = "1200x1200")]
    max_size: Variant,

    /// Download timeout per image, in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Prefix for asset URLs in the manifest
    #[arg(long, default_value = DEFAULT_ASSET_PREFIX)]
    asset_prefix: String,

    /// Treat every image entry as a local path instead of downloading URLs
    #[arg(long)]
    no_download: bool,

    /// Print the full results as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let cli = RemoteCli::parse();
    init_logging(cli.verbose)?;

    let records = load_products(&cli.input)?;

    let config = ProcessingConfig {
        padding: cli.padding,
        quality: cli.quality,
        max_source_size: cli.max_size,
        download_timeout: Duration::from_secs(cli.timeout),
        asset_prefix: cli.asset_prefix.clone(),
        ..Default::default()
    };
    let processor = RemoteProcessor::new(config)?;
    let results = processor.process_products(&records, &cli.output, !cli.no_download)?;

    let manifest = Manifest::from_results(&results, &cli.asset_prefix);
    let manifest_path = write_manifest(&manifest, &cli.output)?;

    info!(
        products = %format!("{}/{}", results.processed_products, results.total_products),
        images = results.processed_images,
        failed = results.failed_images,
        output = %cli.output.display(),
        manifest = %manifest_path.display(),
        "processing complete"
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    Ok(if results.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
