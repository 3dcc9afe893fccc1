//! Product-record pipeline: download each product image, normalize it like a
//! local photo and describe the results in an upload manifest.

use crate::batch::{render_assets, write_assets};
use crate::config::ProcessingConfig;
use crate::error::{ProcessError, Result};
use crate::sku::Sku;
use crate::transform::{fit_within, SourceImage};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const MANIFEST_FILE_NAME: &str = "faire_image_manifest.json";

/// A product as exported by the inventory system.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductRecord {
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl ProductRecord {
    /// `image_url` first, then `images`, empty entries dropped.
    pub fn image_sources(&self) -> Vec<&str> {
        self.image_url
            .iter()
            .chain(self.images.iter())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageResult {
    pub index: u32,
    pub main_image: PathBuf,
    pub thumbnail: PathBuf,
    pub size: (u32, u32),
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductResult {
    pub sku: String,
    pub name: String,
    pub images: Vec<ImageResult>,
    /// False as soon as one of the product's images failed
    pub success: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RemoteResults {
    pub total_products: usize,
    pub processed_products: usize,
    pub total_images: usize,
    pub processed_images: usize,
    pub failed_images: usize,
    pub products: Vec<ProductResult>,
}

impl RemoteResults {
    pub fn is_success(&self) -> bool {
        self.failed_images == 0
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestSummary {
    pub total_products: usize,
    pub processed_products: usize,
    pub total_images: usize,
    pub failed_images: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestImage {
    pub url: String,
    pub thumbnail_url: String,
    pub index: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestProduct {
    pub sku: String,
    pub name: String,
    pub images: Vec<ManifestImage>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    pub processing_summary: ManifestSummary,
    pub products: Vec<ManifestProduct>,
}

fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Manifest {
    /// Lists products whose every image succeeded, with asset URLs under `prefix/`.
    pub fn from_results(results: &RemoteResults, prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        let products = results
            .products
            .iter()
            .filter(|p| p.success && !p.images.is_empty())
            .map(|p| ManifestProduct {
                sku: p.sku.clone(),
                name: p.name.clone(),
                images: p
                    .images
                    .iter()
                    .map(|img| ManifestImage {
                        url: format!("{}/{}", prefix, file_name_string(&img.main_image)),
                        thumbnail_url: format!("{}/{}", prefix, file_name_string(&img.thumbnail)),
                        index: img.index,
                    })
                    .collect(),
            })
            .collect();

        Manifest {
            processing_summary: ManifestSummary {
                total_products: results.total_products,
                processed_products: results.processed_products,
                total_images: results.processed_images,
                failed_images: results.failed_images,
            },
            products,
        }
    }
}

/// Writes `faire_image_manifest.json` into `output_dir`.
pub fn write_manifest(manifest: &Manifest, output_dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let path = output_dir.join(MANIFEST_FILE_NAME);
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(manifest = %path.display(), "created manifest");
    Ok(path)
}

/// Parses a JSON array of product records.
pub fn load_products(path: &Path) -> anyhow::Result<Vec<ProductRecord>> {
    if !path.is_file() {
        return Err(ProcessError::InputNotFound(path.to_path_buf()).into());
    }
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} must contain a JSON array of products", path.display()))
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Extension of a URL's path component, `.jpg` when it has none.
fn url_extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => format!(".{}", ext.to_lowercase()),
        _ => ".jpg".to_string(),
    }
}

pub struct RemoteProcessor {
    config: ProcessingConfig,
    agent: ureq::Agent,
}

impl RemoteProcessor {
    pub fn new(config: ProcessingConfig) -> Result<Self> {
        config.validate()?;
        let agent = ureq::AgentBuilder::new()
            .timeout(config.download_timeout)
            .build();
        Ok(Self { config, agent })
    }

    /// Downloads `url` into a temporary file inside `dir`. The file is
    /// removed when the handle drops.
    pub fn download(&self, url: &str, sku: &str, index: u32, dir: &Path) -> Result<tempfile::NamedTempFile> {
        info!(url, "downloading");
        let download_err = |reason: String| ProcessError::Download {
            url: url.to_string(),
            reason,
        };

        let response = self.agent.get(url).call().map_err(|e| download_err(e.to_string()))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| download_err(e.to_string()))?;

        let mut file = tempfile::Builder::new()
            .prefix(&format!("temp_{}_{}_", sku, index))
            .suffix(&url_extension(url))
            .tempfile_in(dir)
            .map_err(|e| ProcessError::io(dir, e))?;
        file.write_all(&bytes).map_err(|e| ProcessError::io(file.path(), e))?;
        file.flush().map_err(|e| ProcessError::io(file.path(), e))?;
        Ok(file)
    }

    /// Size guard, padding, thumbnail, write. Returns the written paths.
    pub fn process_image(&self, path: &Path, sku: &str, index: u32, output_dir: &Path) -> Result<ImageResult> {
        info!(file = %path.display(), sku, "processing");
        let source = SourceImage::read(path)?;
        let max = self.config.max_source_size;
        let image = fit_within(source.decode()?, max.width, max.height);

        let assets = render_assets(&image, sku, index, &self.config)?;
        let written = write_assets(output_dir, &assets)?;
        let padding = 2 * self.config.padding;

        Ok(ImageResult {
            index,
            main_image: written[0].clone(),
            thumbnail: written.get(1).cloned().unwrap_or_else(|| written[0].clone()),
            size: (image.width() + padding, image.height() + padding),
        })
    }

    fn process_source(&self, source: &str, sku: &str, index: u32, output_dir: &Path, download: bool) -> Result<ImageResult> {
        if download && is_remote(source) {
            let temp = self.download(source, sku, index, output_dir)?;
            self.process_image(temp.path(), sku, index, output_dir)
        } else {
            self.process_image(Path::new(source), sku, index, output_dir)
        }
    }

    /// Processes every record into `output_dir`. Per-image failures are
    /// counted and mark their product unsuccessful; the batch always runs to
    /// the end.
    pub fn process_products(&self, records: &[ProductRecord], output_dir: &Path, download: bool) -> Result<RemoteResults> {
        fs::create_dir_all(output_dir).map_err(|e| ProcessError::io(output_dir, e))?;
        info!(products = records.len(), "processing products");

        let mut results = RemoteResults {
            total_products: records.len(),
            ..Default::default()
        };

        for record in records {
            let Some(sku) = Sku::new(&record.sku) else {
                warn!(name = %record.name, "no SKU found for product");
                continue;
            };
            info!(name = %record.name, sku = %sku, "processing product");

            let sources = record.image_sources();
            if sources.is_empty() {
                warn!(sku = %sku, "no images found");
                continue;
            }
            results.total_images += sources.len();

            let mut product = ProductResult {
                sku: sku.to_string(),
                name: record.name.clone(),
                images: Vec::new(),
                success: true,
            };

            for (i, source) in sources.iter().enumerate() {
                let index = i as u32 + 1;
                match self.process_source(source, sku.as_str(), index, output_dir, download) {
                    Ok(image) => {
                        results.processed_images += 1;
                        product.images.push(image);
                    }
                    Err(e) => {
                        error!(source, error = %e, "image failed");
                        results.failed_images += 1;
                        product.success = false;
                    }
                }
            }

            if !product.images.is_empty() {
                results.processed_products += 1;
            }
            results.products.push(product);
        }

        Ok(results)
    }
}
