//! Processing configuration shared by every entry point.

use crate::error::{ProcessError, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PADDING: u32 = 50;
/// Largest accepted padding. Keeps `w + 2 * padding` and the canvas allocation sane.
pub const MAX_PADDING: u32 = 4096;
pub const DEFAULT_QUALITY: u8 = 85;
pub const DEFAULT_VARIANT: Variant = Variant::new(400, 400);
pub const DEFAULT_MAX_SOURCE_SIZE: Variant = Variant::new(1200, 1200);
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_ASSET_PREFIX: &str = "brand-images";

/// Scope name used in flat mode when no override is given.
pub const FALLBACK_SCOPE: &str = "unknown";

/// A fixed `width x height` box, used for thumbnails and size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variant {
    pub width: u32,
    pub height: u32,
}

impl Variant {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Variant {
    type Err = ProcessError;

    /// Parses `WIDTHxHEIGHT`, e.g. `400x400`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            ProcessError::InvalidConfig(format!(
                "invalid size '{}', expected WIDTHxHEIGHT (e.g. 400x400)",
                s
            ))
        };

        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Variant::new(width, height))
    }
}

/// Options for a processing run
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    /// Transparent border added on every side, in pixels (default: 50)
    pub padding: u32,
    /// WebP quality 1-100 (default: 85)
    pub quality: u8,
    /// Encode losslessly instead of lossy (default: false)
    pub lossless: bool,
    /// Replaces the default 400x400 variant when set
    pub output_size: Option<Variant>,
    /// Scope name for flat input trees (default: "unknown")
    pub scope_override: Option<String>,
    /// Glob applied to file names during discovery (default: "*")
    pub file_pattern: String,
    /// Write every scope straight into the output root (default: false)
    pub flatten_output: bool,
    /// Size guard applied to downloaded sources before padding
    pub max_source_size: Variant,
    /// Per-request timeout for remote downloads
    pub download_timeout: Duration,
    /// Prefix for asset URLs in the remote manifest
    pub asset_prefix: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
            quality: DEFAULT_QUALITY,
            lossless: false,
            output_size: None,
            scope_override: None,
            file_pattern: "*".to_string(),
            flatten_output: false,
            max_source_size: DEFAULT_MAX_SOURCE_SIZE,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            asset_prefix: DEFAULT_ASSET_PREFIX.to_string(),
        }
    }
}

impl ProcessingConfig {
    /// Thumbnail sizes emitted next to every primary asset.
    pub fn variants(&self) -> Vec<Variant> {
        vec![self.output_size.unwrap_or(DEFAULT_VARIANT)]
    }

    /// Scope name used when the input root has no subfolders.
    pub fn flat_scope_name(&self) -> String {
        match self.scope_override.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_lowercase(),
            _ => FALLBACK_SCOPE.to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.padding > MAX_PADDING {
            return Err(ProcessError::InvalidConfig(format!(
                "padding must be at most {}, got {}",
                MAX_PADDING, self.padding
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ProcessError::InvalidConfig(format!(
                "quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        if let Some(size) = self.output_size {
            if size.width == 0 || size.height == 0 {
                return Err(ProcessError::InvalidConfig(format!(
                    "output size must be non-zero, got {}",
                    size
                )));
            }
        }
        glob::Pattern::new(&self.file_pattern).map_err(|e| {
            ProcessError::InvalidConfig(format!("bad file pattern '{}': {}", self.file_pattern, e))
        })?;
        Ok(())
    }
}
