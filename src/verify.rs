//! Read-only audit of an output tree.
//!
//! For every file below `root/<scope>/` checks that it is WebP by content, follows the
//! `<sku>_<n>[_<W>x<H>]` naming, carries an alpha channel and has transparent
//! corners, then looks for gaps in each SKU's ordinals. Nothing is modified.

use crate::error::{ProcessError, Result};
use crate::naming::{parse_asset_name, OUTPUT_EXTENSION};
use crate::transform::SourceImage;
use image::{GenericImageView, ImageFormat};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MAX_LISTED_ISSUES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    NotWebp(PathBuf),
    InvalidName(PathBuf),
    NoAlpha(PathBuf),
    NoPadding(PathBuf),
    Unreadable { path: PathBuf, reason: String },
    MissingOrdinals { scope: String, sku: String, missing: Vec<u32> },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::NotWebp(p) => write!(f, "non-WebP file: {}", p.display()),
            Issue::InvalidName(p) => write!(f, "invalid naming: {}", p.display()),
            Issue::NoAlpha(p) => write!(f, "no alpha channel: {}", p.display()),
            Issue::NoPadding(p) => write!(f, "corners not transparent: {}", p.display()),
            Issue::Unreadable { path, reason } => {
                write!(f, "cannot read image: {} - {}", path.display(), reason)
            }
            Issue::MissingOrdinals { scope, sku, missing } => {
                write!(f, "missing images for {}/{}: {:?}", scope, sku, missing)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScopeSummary {
    pub name: String,
    /// Ordinals present per SKU, primaries and variants combined
    pub skus: BTreeMap<String, BTreeSet<u32>>,
}

#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub total_images: usize,
    pub webp_images: usize,
    pub correct_naming: usize,
    pub has_padding: usize,
    pub scopes: Vec<ScopeSummary>,
    pub issues: Vec<Issue>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn unique_skus(&self) -> usize {
        self.scopes
            .iter()
            .flat_map(|s| s.skus.keys())
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Ordinals in `1..=max` that are absent.
pub fn missing_ordinals(present: &BTreeSet<u32>) -> Vec<u32> {
    let max = present.iter().next_back().copied().unwrap_or(0);
    (1..=max).filter(|n| !present.contains(n)).collect()
}

fn corners_transparent(image: &image::DynamicImage) -> bool {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return false;
    }
    [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)]
        .iter()
        .all(|&(x, y)| image.get_pixel(x, y)[3] == 0)
}

/// Audits every scope directory directly below `root`.
pub fn verify_tree(root: &Path) -> Result<VerificationReport> {
    if !root.is_dir() {
        return Err(ProcessError::InputNotFound(root.to_path_buf()));
    }

    let mut report = VerificationReport::default();
    let scope_dirs = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir());

    for scope_dir in scope_dirs {
        let summary = verify_scope(scope_dir.path(), root, &mut report);
        report.scopes.push(summary);
    }
    Ok(report)
}

fn verify_scope(dir: &Path, root: &Path, report: &mut VerificationReport) -> ScopeSummary {
    let mut summary = ScopeSummary {
        name: dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        ..Default::default()
    };

    let files = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file());

    for entry in files {
        let path = entry.path();
        let shown = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        report.total_images += 1;

        let has_webp_extension = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case(OUTPUT_EXTENSION))
            .unwrap_or(false);
        if !has_webp_extension {
            report.issues.push(Issue::NotWebp(shown));
            continue;
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match parse_asset_name(&stem) {
            Some(name) => {
                report.correct_naming += 1;
                summary.skus.entry(name.sku).or_default().insert(name.ordinal);
            }
            None => report.issues.push(Issue::InvalidName(shown.clone())),
        }

        let source = match SourceImage::read(path) {
            Ok(source) => source,
            Err(e) => {
                report.issues.push(Issue::Unreadable {
                    path: shown,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        // content decides, not the extension
        if source.format != Some(ImageFormat::WebP) {
            report.issues.push(Issue::NotWebp(shown));
            continue;
        }
        report.webp_images += 1;

        match source.decode() {
            Ok(image) => {
                if !image.color().has_alpha() {
                    report.issues.push(Issue::NoAlpha(shown));
                } else if corners_transparent(&image) {
                    report.has_padding += 1;
                } else {
                    report.issues.push(Issue::NoPadding(shown));
                }
            }
            Err(e) => report.issues.push(Issue::Unreadable {
                path: shown,
                reason: e.to_string(),
            }),
        }
    }

    for (sku, ordinals) in &summary.skus {
        let missing = missing_ordinals(ordinals);
        if !missing.is_empty() {
            report.issues.push(Issue::MissingOrdinals {
                scope: summary.name.clone(),
                sku: sku.clone(),
                missing,
            });
        }
    }

    summary
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Product Image Verification Report")?;
        writeln!(f, "{}", "=".repeat(50))?;

        for scope in &self.scopes {
            writeln!(f, "\nBrand: {}", scope.name)?;
            for (sku, ordinals) in &scope.skus {
                let list: Vec<u32> = ordinals.iter().copied().collect();
                writeln!(f, "  SKU: {} - Images: {:?}", sku, list)?;
            }
        }

        writeln!(f, "\n{}", "=".repeat(50))?;
        writeln!(f, "SUMMARY")?;
        writeln!(f, "Total images: {}", self.total_images)?;
        writeln!(f, "WebP format: {}/{}", self.webp_images, self.total_images)?;
        writeln!(f, "Correct naming: {}/{}", self.correct_naming, self.total_images)?;
        writeln!(f, "Has padding: {}/{}", self.has_padding, self.total_images)?;
        let names: Vec<&str> = self.scopes.iter().map(|s| s.name.as_str()).collect();
        writeln!(f, "Brands: {} - {}", names.len(), names.join(", "))?;
        writeln!(f, "Unique SKUs: {}", self.unique_skus())?;

        if self.issues.is_empty() {
            writeln!(f, "\nAll images properly formatted!")?;
        } else {
            writeln!(f, "\nISSUES FOUND:")?;
            for issue in self.issues.iter().take(MAX_LISTED_ISSUES) {
                writeln!(f, "  {}", issue)?;
            }
            if self.issues.len() > MAX_LISTED_ISSUES {
                writeln!(f, "  ... and {} more issues", self.issues.len() - MAX_LISTED_ISSUES)?;
            }
        }
        Ok(())
    }
}
