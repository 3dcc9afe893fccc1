//! prodimg - product photo normalization library
//!
//! Turns a folder of raw product photos into a predictable WebP asset set
//! for product cards and marketplace uploads.
//!
//! ## Features
//!
//! - **SKU grouping** from file names (`ABC123_front.jpg` -> `abc123`)
//! - **Deterministic numbering** by case-insensitive file name order
//! - **Transparent padding** around every photo, alpha preserved
//! - **Centered thumbnails** of a fixed size (400x400 by default)
//! - **Lossy WebP** output with configurable quality
//!
//! Input trees are either nested (`input/<brand>/<images>`) or flat
//! (`input/<images>`), output is always `output/<brand>/<sku>_<n>.webp`
//! plus `output/<brand>/<sku>_<n>_400x400.webp`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use prodimg::{process_directory, ProcessingConfig};
//! use std::path::Path;
//!
//! let config = ProcessingConfig {
//!     padding: 10,
//!     quality: 80,
//!     ..Default::default()
//! };
//!
//! let stats = process_directory(Path::new("input"), Path::new("brand-images"), &config)
//!     .expect("Processing failed");
//! println!("{}", stats);
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod grouping;
pub mod logging;
pub mod naming;
pub mod remote;
pub mod rename;
pub mod sku;
pub mod transform;
pub mod verify;

pub use batch::{BatchProcessor, Layout, ProcessingStats, Scope};
pub use config::{ProcessingConfig, Variant};
pub use error::{ProcessError, Result};
pub use sku::{extract_sku, Sku};
pub use transform::{encode_webp, fit_within, to_canonical, to_variant};

/// Process an input tree into an output tree
///
/// # Arguments
///
/// * `input_root` - Folder holding brand subfolders or the photos themselves
/// * `output_root` - Folder that receives `<brand>/<sku>_<n>.webp`
/// * `config` - Processing options
///
/// # Example
///
/// ```rust,no_run
/// use prodimg::{process_directory, ProcessingConfig};
/// use std::path::Path;
///
/// let stats = process_directory(Path::new("input"), Path::new("out"), &ProcessingConfig::default())?;
/// assert!(stats.is_success());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn process_directory(
    input_root: &std::path::Path,
    output_root: &std::path::Path,
    config: &ProcessingConfig,
) -> Result<ProcessingStats> {
    BatchProcessor::new(config.clone())?.run(input_root, output_root)
}
