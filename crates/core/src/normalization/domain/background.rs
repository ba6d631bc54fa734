//! Background flattening: push everything that is not the subject to white.

use image::{Rgb, RgbImage};

use crate::shared::bounding_box::BoundingBox;

use super::normalizer_config::{NormalizeError, NormalizerConfig};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Whitens the background of `image`.
///
/// With a face box, everything outside the padded box is whitened. Without
/// one, or when the box misses the image, only near-white low-saturation
/// pixels are snapped to pure white.
pub fn flatten_background(
    image: &RgbImage,
    face: Option<&BoundingBox>,
    config: &NormalizerConfig,
) -> Result<RgbImage, NormalizeError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(NormalizeError::EmptyImage);
    }
    if let Some(bbox) = face {
        match whiten_outside(
            image,
            bbox,
            config.background_padding,
            config.background_top_factor,
        ) {
            Ok(flattened) => return Ok(flattened),
            Err(e) => {
                log::warn!("Face box unusable for background ({e}), using brightness threshold")
            }
        }
    }
    Ok(whiten_near_white(
        image,
        config.background_luma_threshold,
        config.background_delta_threshold,
    ))
}

/// Keeps the face box grown by `padding * max(w, h)` (more above, for
/// hair) and whitens the rest.
pub fn whiten_outside(
    image: &RgbImage,
    bbox: &BoundingBox,
    padding: f64,
    top_factor: f64,
) -> Result<RgbImage, NormalizeError> {
    let pad = padding * bbox.width.max(bbox.height);
    let keep = bbox
        .expand(pad, top_factor)
        .clamp_to(image.width(), image.height());
    if keep.is_degenerate() {
        return Err(NormalizeError::FaceOutsideImage);
    }

    let mut out = image.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        if !keep.contains(x as f64 + 0.5, y as f64 + 0.5) {
            *px = WHITE;
        }
    }
    Ok(out)
}

/// Snaps pixels whose channel mean exceeds `luma_threshold` and whose
/// channels differ by less than `delta_threshold` to pure white.
pub fn whiten_near_white(image: &RgbImage, luma_threshold: f64, delta_threshold: u8) -> RgbImage {
    let mut out = image.clone();
    for px in out.pixels_mut() {
        let [r, g, b] = px.0;
        let mean = (r as f64 + g as f64 + b as f64) / 3.0;
        let delta = r.abs_diff(g).max(g.abs_diff(b)).max(r.abs_diff(b));
        if mean > luma_threshold && delta < delta_threshold {
            *px = WHITE;
        }
    }
    out
}
