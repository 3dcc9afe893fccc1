//! Pixel work: padding to the canonical form, centered thumbnails, WebP output.

use crate::error::{ProcessError, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, Rgba32FImage, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// A source photo read from disk. Dropped once its assets are written.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub format: Option<ImageFormat>,
}

impl SourceImage {
    /// Reads the file and sniffs its format from content, falling back to
    /// the extension.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| ProcessError::io(path, e))?;
        let format = image::guess_format(&bytes)
            .ok()
            .or_else(|| ImageFormat::from_path(path).ok());
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
            format,
        })
    }

    pub fn decode(&self) -> Result<DynamicImage> {
        decode_bytes(&self.bytes, self.format, &self.path)
    }
}

/// Decodes raster bytes. WebP goes through libwebp so lossy files with an
/// alpha plane decode the same way they were written.
pub fn decode_bytes(bytes: &[u8], format: Option<ImageFormat>, path: &Path) -> Result<DynamicImage> {
    let decode_err = |reason: String| ProcessError::Decode {
        path: path.to_path_buf(),
        reason,
    };

    match format {
        Some(ImageFormat::WebP) => {
            let decoded = webp::Decoder::new(bytes)
                .decode()
                .ok_or_else(|| decode_err("invalid or unsupported WebP data".to_string()))?;
            let (w, h) = (decoded.width(), decoded.height());
            let image = if decoded.is_alpha() {
                image::RgbaImage::from_raw(w, h, decoded.to_vec()).map(DynamicImage::ImageRgba8)
            } else {
                image::RgbImage::from_raw(w, h, decoded.to_vec()).map(DynamicImage::ImageRgb8)
            };
            image.ok_or_else(|| decode_err("WebP buffer does not match its dimensions".to_string()))
        }
        Some(format) => {
            image::load_from_memory_with_format(bytes, format).map_err(|e| decode_err(e.to_string()))
        }
        None => Err(decode_err("unrecognized image format".to_string())),
    }
}

/// Converts to RGBA (missing alpha becomes opaque) and places the image on a
/// transparent canvas `padding` pixels larger on every side. The source is
/// composited through its own alpha, so translucent pixels stay translucent.
/// `padding` is expected within `config::MAX_PADDING`, which
/// `ProcessingConfig::validate` enforces.
pub fn to_canonical(image: &DynamicImage, padding: u32) -> RgbaImage {
    let source = image.to_rgba8();
    let (width, height) = source.dimensions();

    let mut canvas = RgbaImage::from_pixel(width + 2 * padding, height + 2 * padding, TRANSPARENT);
    imageops::overlay(&mut canvas, &source, padding as i64, padding as i64);
    canvas
}

/// Largest size with the same aspect ratio that fits in `max_w x max_h`.
/// Never upscales; dimensions are floored and kept at least 1.
pub fn fit_dimensions(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width <= max_w && height <= max_h {
        return (width, height);
    }

    let (w, h) = (width as u64, height as u64);
    let (mw, mh) = (max_w as u64, max_h as u64);
    // max_w / w <= max_h / h, so width is the binding side
    let (sw, sh) = if mw * h <= mh * w {
        (mw, h * mw / w)
    } else {
        (w * mh / h, mh)
    };
    ((sw as u32).max(1), (sh as u32).max(1))
}

/// Float samples are clamped to `0..=1` during resampling; scaling them down
/// leaves room for Lanczos overshoot so color stays proportional to alpha.
const RESAMPLE_HEADROOM: f32 = 0.5;

/// Lanczos3 resize in premultiplied alpha, so transparent pixels don't bleed
/// their color into the edges of the content.
pub fn resize_rgba(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let premultiplied = Rgba32FImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0.map(|c| c as f32 / 255.0);
        let weight = a * RESAMPLE_HEADROOM;
        Rgba([r * weight, g * weight, b * weight, weight])
    });
    let resized = imageops::resize(&premultiplied, width, height, FilterType::Lanczos3);

    RgbaImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = resized.get_pixel(x, y).0;
        let alpha = ((a / RESAMPLE_HEADROOM).clamp(0.0, 1.0) * 255.0).round() as u8;
        if alpha == 0 {
            return TRANSPARENT;
        }
        let straight = |c: f32| ((c / a).clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([straight(r), straight(g), straight(b), alpha])
    })
}

/// Downscales an image that exceeds `max_w x max_h` (Lanczos3); smaller
/// images come back unchanged.
pub fn fit_within(image: DynamicImage, max_w: u32, max_h: u32) -> DynamicImage {
    let (sw, sh) = fit_dimensions(image.width(), image.height(), max_w, max_h);
    if (sw, sh) == (image.width(), image.height()) {
        image
    } else if image.color().has_alpha() {
        DynamicImage::ImageRgba8(resize_rgba(&image.to_rgba8(), sw, sh))
    } else {
        image.resize_exact(sw, sh, FilterType::Lanczos3)
    }
}

/// Scales `canonical` to fit `target_w x target_h` and centers it on a
/// transparent canvas of exactly that size. Odd remainders put the extra
/// pixel on the bottom/right.
pub fn to_variant(canonical: &RgbaImage, target_w: u32, target_h: u32) -> RgbaImage {
    let (width, height) = canonical.dimensions();
    let (sw, sh) = fit_dimensions(width, height, target_w, target_h);

    let scaled = if (sw, sh) == (width, height) {
        canonical.clone()
    } else {
        resize_rgba(canonical, sw, sh)
    };

    let mut canvas = RgbaImage::from_pixel(target_w, target_h, TRANSPARENT);
    let x = (target_w - sw) / 2;
    let y = (target_h - sh) / 2;
    imageops::overlay(&mut canvas, &scaled, x as i64, y as i64);
    canvas
}

/// Encodes RGBA pixels as WebP. `quality` is 1-100 and ignored in lossless mode.
pub fn encode_webp(image: &RgbaImage, quality: u8, lossless: bool) -> Result<Vec<u8>> {
    let (width, height) = image.dimensions();
    let memory = webp::Encoder::from_rgba(image.as_raw(), width, height)
        .encode_simple(lossless, quality as f32)
        .map_err(|e| ProcessError::Encode(format!("{:?} ({}x{})", e, width, height)))?;
    Ok(memory.to_vec())
}

/// One encoded file ready to be written below a scope directory.
#[derive(Debug, Clone)]
pub struct OutputAsset {
    pub relative_path: PathBuf,
    pub bytes: Vec<u8>,
    pub quality: u8,
}

impl OutputAsset {
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.relative_path);
        fs::write(&path, &self.bytes).map_err(|e| ProcessError::io(&path, e))?;
        Ok(path)
    }
}
