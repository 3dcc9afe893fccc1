//! In-place renaming of already-exported photos to `<sku>_<n>.<ext>`, and
//! backfilling of missing size variants next to existing primaries.

use crate::config::Variant;
use crate::error::{ProcessError, Result};
use crate::grouping::{group_by_sku, has_extension, list_files};
use crate::naming::{parse_asset_name, variant_file_name, OUTPUT_EXTENSION};
use crate::transform::{encode_webp, to_variant, SourceImage};
use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Extensions the renamer touches.
pub const RENAMABLE_EXTENSIONS: &[&str] = &["webp", "jpg", "jpeg", "png"];

/// Sizes created by `create_size_variants` when none are given.
pub const BACKFILL_VARIANTS: &[Variant] = &[Variant::new(400, 400), Variant::new(150, 150)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// Already carried its target name
    Unchanged(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
    /// The target name belonged to another file; parked under a temporary name
    Collision {
        from: PathBuf,
        target: PathBuf,
        temp: PathBuf,
    },
    /// The move itself failed; the file keeps its old name
    Failed { from: PathBuf, reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct RenameReport {
    pub dir: PathBuf,
    pub outcomes: Vec<RenameOutcome>,
    /// Files whose name yielded no SKU
    pub skipped: Vec<PathBuf>,
}

impl RenameReport {
    pub fn renamed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RenameOutcome::Renamed { .. }))
            .count()
    }

    pub fn collisions(&self) -> Vec<&RenameOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RenameOutcome::Collision { .. }))
            .collect()
    }

    pub fn failures(&self) -> Vec<&RenameOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RenameOutcome::Failed { .. }))
            .collect()
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// First free `<sku>_<n>_temp[k].<ext>` in `dir`.
fn temp_target(dir: &Path, sku: &str, ordinal: u32, ext: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{}_{}_temp.{}", sku, ordinal, ext));
    let mut k = 2;
    while candidate.exists() {
        candidate = dir.join(format!("{}_{}_temp{}.{}", sku, ordinal, k, ext));
        k += 1;
    }
    candidate
}

fn failed(path: &Path, e: std::io::Error) -> RenameOutcome {
    error!(file = %path.display(), error = %e, "rename failed");
    RenameOutcome::Failed {
        from: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Moves `from` to `to`. A case-only rename on a case-insensitive filesystem
/// (`to` already resolves to `from`) goes through an intermediate name.
fn move_file(dir: &Path, from: &Path, to: &Path) -> std::io::Result<()> {
    if to.exists() && same_file(from, to) {
        let mut hop = dir.join(".prodimg-rename");
        let mut k = 2;
        while hop.exists() {
            hop = dir.join(format!(".prodimg-rename{}", k));
            k += 1;
        }
        fs::rename(from, &hop)?;
        return fs::rename(&hop, to);
    }
    fs::rename(from, to)
}

/// Renames the photos of one folder to `<sku>_<n>.<ext>`, numbering each SKU
/// in case-insensitive file name order. A target that already exists as a
/// different file is never overwritten. A file that cannot be moved is
/// reported as `Failed` and the rest of the folder is still renamed.
pub fn rename_scope(dir: &Path) -> Result<RenameReport> {
    if !dir.is_dir() {
        return Err(ProcessError::InputNotFound(dir.to_path_buf()));
    }
    info!(folder = %dir.display(), "renaming");

    let all = Pattern::new("*").map_err(|e| ProcessError::InvalidConfig(e.to_string()))?;
    let grouping = group_by_sku(list_files(dir, RENAMABLE_EXTENSIONS, &all)?);

    let mut report = RenameReport {
        dir: dir.to_path_buf(),
        ..Default::default()
    };
    for path in grouping.skipped {
        warn!(file = %path.display(), "couldn't extract SKU, leaving as is");
        report.skipped.push(path);
    }

    for group in grouping.groups.values() {
        info!(sku = %group.sku, images = group.len(), "renaming SKU");

        for (ordinal, path) in group.ordinals() {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            let new_name = format!("{}_{}.{}", group.sku, ordinal, ext);
            let target = dir.join(&new_name);

            let current = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if current == new_name {
                report.outcomes.push(RenameOutcome::Unchanged(path.to_path_buf()));
                continue;
            }

            let outcome = if target.exists() && !same_file(path, &target) {
                let temp = temp_target(dir, group.sku.as_str(), ordinal, &ext);
                match fs::rename(path, &temp) {
                    Ok(()) => {
                        warn!(
                            from = %path.display(),
                            temp = %temp.display(),
                            "target {} exists, moved to temporary name",
                            new_name
                        );
                        RenameOutcome::Collision {
                            from: path.to_path_buf(),
                            target,
                            temp,
                        }
                    }
                    Err(e) => failed(path, e),
                }
            } else {
                match move_file(dir, path, &target) {
                    Ok(()) => {
                        info!(from = %path.display(), to = %new_name, "renamed");
                        RenameOutcome::Renamed {
                            from: path.to_path_buf(),
                            to: target,
                        }
                    }
                    Err(e) => failed(path, e),
                }
            };
            report.outcomes.push(outcome);
        }
    }

    Ok(report)
}

fn holds_photos(dir: &Path) -> Result<bool> {
    let entries = fs::read_dir(dir).map_err(|e| ProcessError::io(dir, e))?;
    Ok(entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .any(|p| p.is_file() && has_extension(&p, &["webp", "jpg"])))
}

/// Folders the renamer treats as scopes: `root` itself when it directly holds
/// photos, otherwise every non-hidden subdirectory.
pub fn rename_targets(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(ProcessError::InputNotFound(root.to_path_buf()));
    }
    if holds_photos(root)? {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut dirs: Vec<PathBuf> = fs::read_dir(root)
        .map_err(|e| ProcessError::io(root, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir() && !e.file_name().to_string_lossy().starts_with('.'))
        .map(|e| e.path())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Renames every target folder of `root`. A folder that cannot be renamed
/// yields its error in place and the remaining folders are still processed.
pub fn rename_tree(root: &Path) -> Result<Vec<Result<RenameReport>>> {
    Ok(rename_targets(root)?
        .iter()
        .map(|dir| {
            rename_scope(dir).inspect_err(|e| {
                error!(folder = %dir.display(), error = %e, "cannot rename folder");
            })
        })
        .collect())
}

#[derive(Debug, Clone, Default)]
pub struct VariantReport {
    pub created: Vec<PathBuf>,
    /// Variants that already existed and were left alone
    pub existing: usize,
    pub failed: Vec<(PathBuf, String)>,
}

/// Creates every missing `<sku>_<n>_<W>x<H>.webp` next to the primaries
/// (`<sku>_<n>.webp`) of `dir`. Primaries are already padded, so they are
/// only scaled and centered. Existing variants are never overwritten.
pub fn create_size_variants(dir: &Path, variants: &[Variant], quality: u8) -> Result<VariantReport> {
    let all = Pattern::new("*").map_err(|e| ProcessError::InvalidConfig(e.to_string()))?;
    let mut primaries: Vec<_> = list_files(dir, &[OUTPUT_EXTENSION], &all)?
        .into_iter()
        .filter_map(|path| {
            let stem = path.file_stem()?.to_string_lossy().into_owned();
            let name = parse_asset_name(&stem)?;
            name.is_primary().then_some((path, name))
        })
        .collect();
    primaries.sort_by(|a, b| a.0.cmp(&b.0));

    info!(folder = %dir.display(), primaries = primaries.len(), "creating size variants");

    let mut report = VariantReport::default();
    for (path, name) in primaries {
        let missing: Vec<(Variant, PathBuf)> = variants
            .iter()
            .map(|v| (*v, dir.join(variant_file_name(&name.sku, name.ordinal, *v))))
            .filter(|(_, target)| !target.exists())
            .collect();
        report.existing += variants.len() - missing.len();
        if missing.is_empty() {
            continue;
        }

        let primary = match SourceImage::read(&path).and_then(|s| s.decode()) {
            Ok(image) => image.to_rgba8(),
            Err(e) => {
                error!(file = %path.display(), error = %e, "cannot read primary");
                report.failed.push((path, e.to_string()));
                continue;
            }
        };

        for (variant, target) in missing {
            let thumb = to_variant(&primary, variant.width, variant.height);
            let written = encode_webp(&thumb, quality, false).and_then(|bytes| {
                fs::write(&target, bytes).map_err(|e| ProcessError::io(&target, e))
            });
            match written {
                Ok(()) => {
                    info!(file = %target.display(), "created variant");
                    report.created.push(target);
                }
                Err(e) => {
                    error!(file = %target.display(), error = %e, "failed to create variant");
                    report.failed.push((target, e.to_string()));
                }
            }
        }
    }

    Ok(report)
}
