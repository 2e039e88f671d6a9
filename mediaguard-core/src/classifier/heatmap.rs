//! Explanation overlays.
//!
//! A saliency map (one weight per pixel) is min-max normalized, mapped
//! through a JET colormap and blended over the analyzed image at
//! [`OVERLAY_SIZE`]×[`OVERLAY_SIZE`], then PNG-encoded.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{ImageBuffer, ImageFormat, Luma, Rgb, RgbImage};

use crate::error::{MediaGuardError, Result};

/// Side length of the rendered overlay.
pub const OVERLAY_SIZE: u32 = 380;

/// Weight of the source image in the blend.
const IMAGE_WEIGHT: f32 = 0.6;
/// Weight of the heatmap in the blend.
const HEATMAP_WEIGHT: f32 = 0.4;

/// Per-pixel saliency weights.
pub type SaliencyMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// JET colormap: 0.0 is dark blue, 0.5 green, 1.0 dark red.
pub fn jet(value: f32) -> Rgb<u8> {
    let v = value.clamp(0.0, 1.0);
    let channel = |offset: f32| {
        let c = (1.5 - (4.0 * v - offset).abs()).clamp(0.0, 1.0);
        (c * 255.0).round() as u8
    };
    Rgb([channel(3.0), channel(2.0), channel(1.0)])
}

/// Rescale a saliency map into `[0, 1]` in place.
pub fn normalize(map: &mut SaliencyMap) {
    let (min, max) = map
        .pixels()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.0[0]), hi.max(p.0[0]))
        });
    if !min.is_finite() || !max.is_finite() {
        return;
    }

    let range = max - min + 1e-8;
    for p in map.pixels_mut() {
        p.0[0] = (p.0[0] - min) / range;
    }
}

/// Luminance gradient magnitude, normalized to `[0, 1]`.
///
/// Edges and texture transitions are where splicing and blending artifacts
/// tend to show, so this serves as a cheap stand-in saliency.
pub fn gradient_saliency(image: &RgbImage) -> SaliencyMap {
    let gray = imageops::grayscale(image);
    let (w, h) = gray.dimensions();
    let at = |x: u32, y: u32| gray.get_pixel(x.min(w - 1), y.min(h - 1)).0[0] as f32;

    let mut map = SaliencyMap::from_fn(w, h, |x, y| {
        let dx = at(x + 1, y) - at(x.saturating_sub(1), y);
        let dy = at(x, y + 1) - at(x, y.saturating_sub(1));
        Luma([(dx * dx + dy * dy).sqrt()])
    });
    normalize(&mut map);
    map
}

/// Blend a saliency map over `image` and encode the result as PNG.
pub fn render_overlay(image: &RgbImage, saliency: &SaliencyMap) -> Result<Vec<u8>> {
    if image.width() == 0 || image.height() == 0 {
        return Err(MediaGuardError::Oracle("cannot render overlay for an empty image".into()));
    }

    let base = imageops::resize(image, OVERLAY_SIZE, OVERLAY_SIZE, FilterType::Triangle);
    let mut weights = imageops::resize(saliency, OVERLAY_SIZE, OVERLAY_SIZE, FilterType::Triangle);
    normalize(&mut weights);

    let overlay = RgbImage::from_fn(OVERLAY_SIZE, OVERLAY_SIZE, |x, y| {
        let src = base.get_pixel(x, y).0;
        let heat = jet(weights.get_pixel(x, y).0[0]).0;
        let mut out = [0u8; 3];
        for c in 0..3 {
            let v = IMAGE_WEIGHT * src[c] as f32 + HEATMAP_WEIGHT * heat[c] as f32;
            out[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        Rgb(out)
    });

    let mut buffer = Cursor::new(Vec::new());
    overlay
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| MediaGuardError::Oracle(format!("failed to encode overlay: {e}")))?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jet_endpoints() {
        assert_eq!(jet(0.0), Rgb([0, 0, 128]));
        assert_eq!(jet(0.5), Rgb([128, 255, 128]));
        assert_eq!(jet(1.0), Rgb([128, 0, 0]));
        assert_eq!(jet(-3.0), jet(0.0));
    }

    #[test]
    fn test_normalize_range() {
        let mut map = SaliencyMap::from_fn(3, 1, |x, _| Luma([x as f32 * 5.0 + 2.0]));
        normalize(&mut map);
        assert!(map.get_pixel(0, 0).0[0].abs() < 1e-6);
        assert!((map.get_pixel(2, 0).0[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_flat_image_has_zero_saliency() {
        let flat = RgbImage::from_pixel(10, 10, Rgb([90, 90, 90]));
        let map = gradient_saliency(&flat);
        assert!(map.pixels().all(|p| p.0[0].abs() < 1e-6));
    }

    #[test]
    fn test_edge_is_salient() {
        let split = RgbImage::from_fn(20, 20, |x, _| if x < 10 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) });
        let map = gradient_saliency(&split);
        assert!(map.get_pixel(10, 5).0[0] > 0.9);
        assert!(map.get_pixel(2, 5).0[0] < 0.1);
    }

    #[test]
    fn test_overlay_is_png_of_fixed_size() {
        let img = RgbImage::from_fn(64, 48, |x, y| Rgb([x as u8, y as u8, 128]));
        let png = render_overlay(&img, &gradient_saliency(&img)).unwrap();

        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!(decoded.width(), OVERLAY_SIZE);
        assert_eq!(decoded.height(), OVERLAY_SIZE);
    }
}
