//! Output naming: `<sku>_<n>.webp` for primaries, `<sku>_<n>_<W>x<H>.webp`
//! for variants, one directory per scope.

use crate::config::Variant;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Extension of every emitted asset, whatever the source format was.
pub const OUTPUT_EXTENSION: &str = "webp";

static ASSET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9-]+)_(\d+)(?:_(\d+)x(\d+))?$").expect("valid asset name regex")
});

pub fn primary_file_name(sku: &str, ordinal: u32) -> String {
    format!("{}_{}.{}", sku, ordinal, OUTPUT_EXTENSION)
}

pub fn variant_file_name(sku: &str, ordinal: u32, variant: Variant) -> String {
    format!("{}_{}_{}.{}", sku, ordinal, variant, OUTPUT_EXTENSION)
}

/// Directory that receives the assets of `scope`.
pub fn scope_output_dir(output_root: &Path, scope: &str, flatten: bool) -> PathBuf {
    if flatten {
        output_root.to_path_buf()
    } else {
        output_root.join(scope)
    }
}

/// A parsed asset file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetName {
    pub sku: String,
    pub ordinal: u32,
    pub variant: Option<Variant>,
}

impl AssetName {
    pub fn is_primary(&self) -> bool {
        self.variant.is_none()
    }
}

/// Parses a stem like `abc123_2` or `abc123_2_400x400`. Case-sensitive: only
/// lowercase SKUs are valid asset names.
pub fn parse_asset_name(stem: &str) -> Option<AssetName> {
    let caps = ASSET_NAME.captures(stem)?;
    let ordinal = caps[2].parse().ok()?;
    let variant = match (caps.get(3), caps.get(4)) {
        (Some(w), Some(h)) => Some(Variant::new(w.as_str().parse().ok()?, h.as_str().parse().ok()?)),
        _ => None,
    };
    Some(AssetName {
        sku: caps[1].to_string(),
        ordinal,
        variant,
    })
}
