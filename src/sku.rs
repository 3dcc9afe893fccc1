//! SKU extraction from raw product photo file names.
//!
//! One rule is applied everywhere, by the processor and the renamer alike:
//!
//! 1. Drop the extension and lowercase the stem.
//! 2. Take the leading alphanumeric run up to the first `_`, `-` or the end
//!    of the stem (`ABC123_front.jpg` -> `abc123`, `abc-123.png` -> `abc`).
//! 3. Otherwise split on `_`, then `-`, then space, and take the segment in
//!    front of the first delimiter present. A stem without any delimiter is
//!    used whole (`sku.v2.jpg` -> `sku.v2`).
//!
//! A stem that starts with a delimiter has an empty leading segment and
//! yields no SKU at all (`_unknown.jpg`).

use crate::error::{ProcessError, Result};
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

static SKU_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z0-9][a-z0-9-]*?)(?:[_-]|$)").expect("valid SKU regex"));

const FALLBACK_DELIMITERS: [char; 3] = ['_', '-', ' '];

/// Lowercase, non-empty product identifier. The grouping key of a scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sku(String);

impl Sku {
    /// Wraps an externally supplied identifier, normalizing it to lowercase.
    /// Returns `None` for blank input.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Sku(trimmed.to_lowercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Sku {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives the SKU from a file name such as `ABC123_front.jpg`.
pub fn extract_sku(file_name: &str) -> Result<Sku> {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
        .to_lowercase();

    let sku = match SKU_PATTERN.captures(&stem) {
        Some(caps) => caps[1].to_string(),
        None => fallback_segment(&stem).to_string(),
    };

    if sku.is_empty() {
        return Err(ProcessError::NoSkuExtracted(file_name.to_string()));
    }
    Ok(Sku(sku))
}

fn fallback_segment(stem: &str) -> &str {
    FALLBACK_DELIMITERS
        .iter()
        .find(|d| stem.contains(**d))
        .and_then(|d| stem.split(*d).next())
        .unwrap_or(stem)
}
