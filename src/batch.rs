//! Batch orchestration: layout detection, per-scope grouping, per-file
//! transform and write, and the run counters.

use crate::config::ProcessingConfig;
use crate::error::{ProcessError, Result};
use crate::grouping::{discover_images, group_by_sku};
use crate::naming::{primary_file_name, scope_output_dir, variant_file_name};
use crate::transform::{encode_webp, to_canonical, to_variant, OutputAsset, SourceImage};
use glob::Pattern;
use image::DynamicImage;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// One independent processing unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Lowercased brand name, used as the output subdirectory
    pub name: String,
    pub input_dir: PathBuf,
}

/// Shape of the input tree, resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// `root/<brand>/<images>`: one scope per non-hidden subdirectory
    Nested { scopes: Vec<Scope> },
    /// `root/<images>`: the whole root is a single scope
    Flat { scope: Scope },
}

impl Layout {
    /// Looks one level into `root`. Any non-hidden subdirectory makes the
    /// layout nested; otherwise the root is one flat scope named `flat_scope`.
    pub fn detect(root: &Path, flat_scope: &str) -> Result<Layout> {
        let entries = fs::read_dir(root).map_err(|e| ProcessError::io(root, e))?;

        let mut scopes = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ProcessError::io(root, e))?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if path.is_dir() && !name.starts_with('.') {
                scopes.push(Scope {
                    name: name.to_lowercase(),
                    input_dir: path,
                });
            }
        }

        if scopes.is_empty() {
            Ok(Layout::Flat {
                scope: Scope {
                    name: flat_scope.to_string(),
                    input_dir: root.to_path_buf(),
                },
            })
        } else {
            scopes.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.input_dir.cmp(&b.input_dir)));
            Ok(Layout::Nested { scopes })
        }
    }

    pub fn scopes(&self) -> &[Scope] {
        match self {
            Layout::Nested { scopes } => scopes,
            Layout::Flat { scope } => std::slice::from_ref(scope),
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, Layout::Nested { .. })
    }
}

/// Counters for one run. `processed` counts source images, not files written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingStats {
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ProcessingStats {
    /// True when no item failed. Zero processed items still counts as success.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for ProcessingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed: {}, failed: {}, skipped: {}",
            self.processed, self.failed, self.skipped
        )
    }
}

/// Result of one successfully processed source file.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub source: PathBuf,
    pub sku: String,
    pub ordinal: u32,
    /// Primary asset first, then one path per variant
    pub outputs: Vec<PathBuf>,
}

impl ProcessedImage {
    pub fn primary(&self) -> Option<&Path> {
        self.outputs.first().map(PathBuf::as_path)
    }
}

/// Pads `image`, derives every configured variant and encodes all of them.
/// The primary asset comes first.
pub fn render_assets(
    image: &DynamicImage,
    sku: &str,
    ordinal: u32,
    config: &ProcessingConfig,
) -> Result<Vec<OutputAsset>> {
    let canonical = to_canonical(image, config.padding);

    let mut assets = Vec::with_capacity(1 + config.variants().len());
    assets.push(OutputAsset {
        relative_path: PathBuf::from(primary_file_name(sku, ordinal)),
        bytes: encode_webp(&canonical, config.quality, config.lossless)?,
        quality: config.quality,
    });

    for variant in config.variants() {
        let thumb = to_variant(&canonical, variant.width, variant.height);
        assets.push(OutputAsset {
            relative_path: PathBuf::from(variant_file_name(sku, ordinal, variant)),
            bytes: encode_webp(&thumb, config.quality, config.lossless)?,
            quality: config.quality,
        });
    }

    Ok(assets)
}

/// Writes `assets` below `dir`, creating it if needed.
pub fn write_assets(dir: &Path, assets: &[OutputAsset]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| ProcessError::io(dir, e))?;
    assets.iter().map(|asset| asset.write_to(dir)).collect()
}

pub struct BatchProcessor {
    config: ProcessingConfig,
    pattern: Pattern,
}

impl BatchProcessor {
    pub fn new(config: ProcessingConfig) -> Result<Self> {
        config.validate()?;
        let pattern = Pattern::new(&config.file_pattern)
            .map_err(|e| ProcessError::InvalidConfig(e.to_string()))?;
        Ok(Self { config, pattern })
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Processes every scope under `input_root` into `output_root`.
    ///
    /// Fails only when the input root is missing or unreadable; per-file
    /// problems end up in the returned counters.
    pub fn run(&self, input_root: &Path, output_root: &Path) -> Result<ProcessingStats> {
        if !input_root.is_dir() {
            return Err(ProcessError::InputNotFound(input_root.to_path_buf()));
        }

        let layout = Layout::detect(input_root, &self.config.flat_scope_name())?;
        match &layout {
            Layout::Nested { scopes } => info!(scopes = scopes.len(), "detected brand folder structure"),
            Layout::Flat { scope } => {
                if self.config.scope_override.is_none() {
                    warn!("flat input without a brand name, using '{}'", scope.name);
                }
                info!(brand = %scope.name, "detected flat file structure");
            }
        }

        let mut stats = ProcessingStats::default();
        for scope in layout.scopes() {
            self.process_scope(scope, output_root, &mut stats);
        }

        info!(
            processed = stats.processed,
            failed = stats.failed,
            skipped = stats.skipped,
            "processing complete"
        );
        Ok(stats)
    }

    /// Groups one scope and processes it group by group, file by file.
    pub fn process_scope(&self, scope: &Scope, output_root: &Path, stats: &mut ProcessingStats) {
        info!(brand = %scope.name, "processing brand");

        let files = match discover_images(&scope.input_dir, &self.pattern) {
            Ok(files) => files,
            Err(e) => {
                error!(brand = %scope.name, error = %e, "cannot list scope");
                return;
            }
        };

        let grouping = group_by_sku(files);
        for path in &grouping.skipped {
            warn!(file = %path.display(), "couldn't extract SKU, skipping");
            stats.skipped += 1;
        }

        let out_dir = scope_output_dir(output_root, &scope.name, self.config.flatten_output);
        for group in grouping.groups.values() {
            info!(sku = %group.sku, images = group.len(), "processing SKU");

            for (ordinal, path) in group.ordinals() {
                match self.process_file(path, group.sku.as_str(), ordinal, &out_dir) {
                    Ok(done) => {
                        let saved: Vec<_> = done.outputs.iter().filter_map(|p| p.file_name()).collect();
                        info!(file = %path.display(), saved = ?saved, "processed");
                        stats.processed += 1;
                    }
                    Err(e) => {
                        error!(file = %path.display(), error = %e, "failed");
                        stats.failed += 1;
                    }
                }
            }
        }
    }

    /// Turns one source file into its primary and variant assets in `out_dir`.
    pub fn process_file(
        &self,
        path: &Path,
        sku: &str,
        ordinal: u32,
        out_dir: &Path,
    ) -> Result<ProcessedImage> {
        let source = SourceImage::read(path)?;
        let image = source.decode()?;
        let assets = render_assets(&image, sku, ordinal, &self.config)?;
        let outputs = write_assets(out_dir, &assets)?;

        Ok(ProcessedImage {
            source: source.path,
            sku: sku.to_string(),
            ordinal,
            outputs,
        })
    }
}
