#[cfg(test)]
mod tests {
    use super::super::*;
    use image::{Rgb, RgbImage};

    fn create_solid_rgb(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    fn create_solid_rgba(width: u32, height: u32, color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    fn in_rect(x: u32, y: u32, left: u32, top: u32, w: u32, h: u32) -> bool {
        x >= left && x < left + w && y >= top && y < top + h
    }

    #[test]
    fn test_to_canonical_dimensions() {
        for &(w, h, p) in &[(10, 10, 5), (30, 20, 10), (1, 1, 0), (7, 3, 50)] {
            let canonical = to_canonical(&create_solid_rgb(w, h, [200, 10, 10]), p);
            assert_eq!(canonical.dimensions(), (w + 2 * p, h + 2 * p));
        }
    }

    #[test]
    fn test_to_canonical_border_is_transparent() {
        let padding = 4;
        let canonical = to_canonical(&create_solid_rgb(6, 3, [0, 0, 255]), padding);

        for (x, y, pixel) in canonical.enumerate_pixels() {
            if in_rect(x, y, padding, padding, 6, 3) {
                assert_eq!(pixel[3], 255, "content pixel ({}, {}) should be opaque", x, y);
            } else {
                assert_eq!(pixel[3], 0, "padding pixel ({}, {}) should be transparent", x, y);
            }
        }
    }

    #[test]
    fn test_to_canonical_keeps_source_color() {
        let canonical = to_canonical(&create_solid_rgb(4, 4, [12, 200, 99]), 2);
        let center = canonical.get_pixel(3, 3);
        assert!(center[0].abs_diff(12) <= 1);
        assert!(center[1].abs_diff(200) <= 1);
        assert!(center[2].abs_diff(99) <= 1);
    }

    #[test]
    fn test_to_canonical_preserves_partial_alpha() {
        let canonical = to_canonical(&create_solid_rgba(4, 4, [255, 0, 0, 128]), 3);
        let alpha = canonical.get_pixel(4, 4)[3];
        assert!(alpha > 0 && alpha < 255, "alpha {} should stay partial", alpha);
        assert_eq!(canonical.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_to_canonical_keeps_fully_transparent_source_pixels() {
        let mut source = RgbaImage::from_pixel(4, 4, Rgba([0, 255, 0, 255]));
        source.put_pixel(1, 1, Rgba([255, 255, 255, 0]));
        let canonical = to_canonical(&DynamicImage::ImageRgba8(source), 2);
        assert_eq!(canonical.get_pixel(3, 3)[3], 0);
        assert_eq!(canonical.get_pixel(4, 4)[3], 255);
    }

    #[test]
    fn test_fit_dimensions() {
        // already fits: untouched, never upscaled
        assert_eq!(fit_dimensions(300, 200, 400, 400), (300, 200));
        assert_eq!(fit_dimensions(400, 400, 400, 400), (400, 400));
        // width binds
        assert_eq!(fit_dimensions(800, 400, 400, 400), (400, 200));
        // height binds
        assert_eq!(fit_dimensions(300, 900, 400, 400), (133, 400));
        // floors the free side
        assert_eq!(fit_dimensions(1000, 333, 400, 400), (400, 133));
        // a sliver never collapses to zero
        assert_eq!(fit_dimensions(10000, 1, 400, 400), (400, 1));
        // non-square target
        assert_eq!(fit_dimensions(1200, 1200, 1200, 800), (800, 800));
    }

    #[test]
    fn test_to_variant_exact_size_and_centering() {
        // 160x100 canonical into 400x400: fits, so 160x100 at ((400-160)/2, (400-100)/2)
        let canonical = to_canonical(&create_solid_rgb(140, 80, [9, 9, 9]), 10);
        assert_eq!(canonical.dimensions(), (160, 100));

        let variant = to_variant(&canonical, 400, 400);
        assert_eq!(variant.dimensions(), (400, 400));

        let (ox, oy) = ((400 - 160) / 2, (400 - 100) / 2);
        // opaque content sits inside the padding of the scaled canonical
        assert_eq!(variant.get_pixel(ox + 10, oy + 10)[3], 255);
        assert_eq!(variant.get_pixel(ox + 9, oy + 10)[3], 0);
        assert_eq!(variant.get_pixel(0, 0)[3], 0);
        assert_eq!(variant.get_pixel(399, 399)[3], 0);
    }

    #[test]
    fn test_to_variant_downscales_and_floors_offsets() {
        // 800x401 -> width binds: 400 x floor(401*400/800) = 400 x 200
        let canonical = RgbaImage::from_pixel(800, 401, Rgba([1, 2, 3, 255]));
        let variant = to_variant(&canonical, 400, 401);
        assert_eq!(variant.dimensions(), (400, 401));

        // offset y = (401 - 200) / 2 = 100, extra pixel goes to the bottom
        assert_eq!(variant.get_pixel(200, 99)[3], 0);
        assert!(variant.get_pixel(200, 100)[3] > 0);
        assert!(variant.get_pixel(200, 299)[3] > 0);
        assert_eq!(variant.get_pixel(200, 300)[3], 0);
    }

    #[test]
    fn test_to_variant_odd_remainder_biases_right() {
        // 3x1 into 6x1: offset (6-3)/2 = 1, columns 1..4 covered, two transparent on the right
        let canonical = RgbaImage::from_pixel(3, 1, Rgba([5, 5, 5, 255]));
        let variant = to_variant(&canonical, 6, 1);
        let alphas: Vec<u8> = (0..6).map(|x| variant.get_pixel(x, 0)[3]).collect();
        assert_eq!(alphas, vec![0, 255, 255, 255, 0, 0]);
    }

    #[test]
    fn test_fit_within_size_guard() {
        let big = create_solid_rgb(2400, 600, [0, 0, 0]);
        let guarded = fit_within(big, 1200, 1200);
        assert_eq!((guarded.width(), guarded.height()), (1200, 300));

        let small = create_solid_rgb(640, 480, [0, 0, 0]);
        let untouched = fit_within(small, 1200, 1200);
        assert_eq!((untouched.width(), untouched.height()), (640, 480));
    }

    #[test]
    fn test_encode_decode_preserves_geometry() {
        let canonical = to_canonical(&create_solid_rgb(37, 21, [180, 40, 90]), 10);
        let bytes = encode_webp(&canonical, 100, false).expect("encode");
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::WebP);

        let decoded = decode_bytes(&bytes, Some(ImageFormat::WebP), Path::new("mem.webp")).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (57, 41));
        assert!(decoded.color().has_alpha());

        let rgba = decoded.to_rgba8();
        assert_eq!(rgba.get_pixel(0, 0)[3], 0);
        assert_eq!(rgba.get_pixel(56, 40)[3], 0);
    }

    #[test]
    fn test_encode_lossless_mode() {
        let canonical = to_canonical(&create_solid_rgb(8, 8, [10, 20, 30]), 2);
        let bytes = encode_webp(&canonical, 85, true).expect("encode");
        let decoded = decode_bytes(&bytes, Some(ImageFormat::WebP), Path::new("mem.webp"))
            .expect("decode")
            .to_rgba8();
        assert_eq!(decoded.dimensions(), (12, 12));
        let pixel = decoded.get_pixel(5, 5);
        assert_eq!(pixel[3], 255);
        assert!(pixel[0].abs_diff(10) <= 1 && pixel[1].abs_diff(20) <= 1 && pixel[2].abs_diff(30) <= 1);
    }

    #[test]
    fn test_to_variant_edges_keep_source_color() {
        let canonical = to_canonical(&create_solid_rgb(90, 90, [255, 255, 255]), 5);
        let variant = to_variant(&canonical, 40, 40);

        let mut partial = 0;
        for (x, y, pixel) in variant.enumerate_pixels() {
            if pixel[3] == 0 {
                continue;
            }
            if pixel[3] < 255 {
                partial += 1;
            }
            for c in 0..3 {
                assert!(pixel[c] >= 254, "pixel ({}, {}) darkened to {:?}", x, y, pixel);
            }
        }
        assert!(partial > 0, "expected antialiased edge pixels");
    }

    #[test]
    fn test_fit_within_translucent_source_keeps_color() {
        let mut source = RgbaImage::from_pixel(60, 60, Rgba([0, 0, 0, 0]));
        for y in 10..50 {
            for x in 10..50 {
                source.put_pixel(x, y, Rgba([40, 180, 90, 255]));
            }
        }
        let fitted = fit_within(DynamicImage::ImageRgba8(source), 25, 25).to_rgba8();
        assert_eq!(fitted.dimensions(), (25, 25));

        for pixel in fitted.pixels().filter(|p| p[3] > 0) {
            assert!(pixel[0].abs_diff(40) <= 2, "{:?}", pixel);
            assert!(pixel[1].abs_diff(180) <= 2, "{:?}", pixel);
            assert!(pixel[2].abs_diff(90) <= 2, "{:?}", pixel);
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode_bytes(b"definitely not an image", None, Path::new("bad.jpg"));
        assert!(matches!(result, Err(ProcessError::Decode { .. })));

        let result = decode_bytes(&[0xFF, 0xD8, 0xFF, 0x00], Some(ImageFormat::Jpeg), Path::new("cut.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn test_source_image_read_sniffs_format() {
        let dir = tempfile::TempDir::new().unwrap();
        // PNG content behind a misleading extension
        let path = dir.path().join("photo.jpg");
        RgbImage::from_pixel(5, 4, Rgb([1, 2, 3])).save_with_format(&path, ImageFormat::Png).unwrap();

        let source = SourceImage::read(&path).unwrap();
        assert_eq!(source.format, Some(ImageFormat::Png));
        let image = source.decode().unwrap();
        assert_eq!((image.width(), image.height()), (5, 4));
    }

    #[test]
    fn test_source_image_read_missing_file() {
        let result = SourceImage::read(Path::new("/nonexistent/prodimg/photo.jpg"));
        assert!(matches!(result, Err(ProcessError::Io { .. })));
    }
}
