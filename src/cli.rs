use clap::{Args, Parser, Subcommand};
use prodimg::config::{ProcessingConfig, Variant};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prodimg")]
#[command(about = "Normalize product photos into padded WebP assets grouped by SKU")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Pad, convert and name every photo of an input tree
    Process(ProcessArgs),
    /// Rename existing photos in place to <sku>_<n>.<ext>
    Rename(RenameArgs),
    /// Audit an output tree without modifying it
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct ProcessArgs {
    /// Input folder: either input/<brand>/<images> or input/<images>
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output folder
    #[arg(short, long)]
    pub output: PathBuf,

    /// Brand name for flat input folders (default: unknown)
    #[arg(short, long)]
    pub brand: Option<String>,

    /// Padding in pixels (default: 50)
    #[arg(short, long, default_value = "50")]
    pub padding: u32,

    /// WebP quality 1-100 (default: 85)
    #[arg(short, long, default_value = "85", value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,

    /// Thumbnail size as WIDTHxHEIGHT, replaces the default 400x400
    #[arg(short, long)]
    pub size: Option<Variant>,

    /// File name pattern (default: *)
    #[arg(long, default_value = "*")]
    pub pattern: String,

    /// Put all output files directly in the output folder
    #[arg(long)]
    pub flatten_output: bool,

    /// Encode WebP losslessly
    #[arg(long)]
    pub lossless: bool,
}

impl ProcessArgs {
    pub fn to_config(&self) -> ProcessingConfig {
        ProcessingConfig {
            padding: self.padding,
            quality: self.quality,
            lossless: self.lossless,
            output_size: self.size,
            scope_override: self.brand.clone(),
            file_pattern: self.pattern.clone(),
            flatten_output: self.flatten_output,
            ..Default::default()
        }
    }
}

#[derive(Args)]
pub struct RenameArgs {
    /// Brand folder, or parent folder containing brand folders
    pub folder: PathBuf,

    /// Also create missing size variants (400x400, 150x150)
    #[arg(long)]
    pub create_sizes: bool,

    /// WebP quality for created variants (default: 85)
    #[arg(short, long, default_value = "85", value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Folder to verify, e.g. brand-images
    pub folder: PathBuf,
}
