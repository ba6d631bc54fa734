//! Geometric placement onto the profile-sized white canvas.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::shared::bounding_box::BoundingBox;

use super::normalizer_config::NormalizeError;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const FILTER: FilterType = FilterType::Triangle;

#[derive(Debug)]
pub struct Placement {
    pub image: RgbImage,
    /// Face height on the canvas in pixels.
    pub head_height: u32,
}

/// Scales `image` so the face is `head_fraction` of the canvas height and
/// moves the face center to `(0.5 W, center_y * H)`.
///
/// Only the source region that lands on the canvas is resized; the rest
/// of the canvas stays white.
pub fn place_face(
    image: &RgbImage,
    face: &BoundingBox,
    canvas: (u32, u32),
    head_fraction: f64,
    center_y: f64,
) -> Result<Placement, NormalizeError> {
    let (cw, ch) = check_canvas(image, canvas)?;
    if face.is_degenerate() {
        return Err(NormalizeError::FaceOutsideImage);
    }

    let scale = head_fraction * ch / face.height;
    let (fx, fy) = face.center();
    let (tx, ty) = (0.5 * cw, center_y * ch);

    // Canvas rectangle mapped back into source pixels, clipped to the image.
    let src = BoundingBox::from_corners(
        fx - tx / scale,
        fy - ty / scale,
        fx + (cw - tx) / scale,
        fy + (ch - ty) / scale,
    )
    .clamp_to(image.width(), image.height());

    let x0 = src.x.floor() as u32;
    let y0 = src.y.floor() as u32;
    let x1 = (src.right().ceil() as u32).min(image.width());
    let y1 = (src.bottom().ceil() as u32).min(image.height());
    if x1 <= x0 || y1 <= y0 {
        return Err(NormalizeError::FaceOutsideImage);
    }

    let crop = imageops::crop_imm(image, x0, y0, x1 - x0, y1 - y0).to_image();
    let rw = ((crop.width() as f64 * scale).round() as u32).max(1);
    let rh = ((crop.height() as f64 * scale).round() as u32).max(1);
    let resized = imageops::resize(&crop, rw, rh, FILTER);

    let ox = ((x0 as f64 - fx) * scale + tx).round() as i64;
    let oy = ((y0 as f64 - fy) * scale + ty).round() as i64;

    let mut out = RgbImage::from_pixel(canvas.0, canvas.1, WHITE);
    imageops::overlay(&mut out, &resized, ox, oy);

    Ok(Placement {
        image: out,
        head_height: (face.height * scale).round() as u32,
    })
}

/// Uniformly scales `image` to fit inside the canvas, centered on white.
pub fn fit_to_canvas(image: &RgbImage, canvas: (u32, u32)) -> Result<RgbImage, NormalizeError> {
    let (cw, ch) = check_canvas(image, canvas)?;
    let (iw, ih) = (image.width() as f64, image.height() as f64);
    let scale = (cw / iw).min(ch / ih);

    let rw = ((iw * scale).round() as u32).clamp(1, canvas.0);
    let rh = ((ih * scale).round() as u32).clamp(1, canvas.1);
    let resized = imageops::resize(image, rw, rh, FILTER);

    let mut out = RgbImage::from_pixel(canvas.0, canvas.1, WHITE);
    let ox = (canvas.0 - rw) / 2;
    let oy = (canvas.1 - rh) / 2;
    imageops::overlay(&mut out, &resized, ox as i64, oy as i64);
    Ok(out)
}

fn check_canvas(image: &RgbImage, (w, h): (u32, u32)) -> Result<(f64, f64), NormalizeError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(NormalizeError::EmptyImage);
    }
    if w == 0 || h == 0 {
        return Err(NormalizeError::InvalidCanvas {
            width: w,
            height: h,
        });
    }
    Ok((w as f64, h as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DARK: Rgb<u8> = Rgb([20, 20, 20]);

    /// White image with a dark rectangle standing in for the face.
    fn synthetic(w: u32, h: u32, face: (u32, u32, u32, u32)) -> RgbImage {
        let (fx, fy, fw, fh) = face;
        RgbImage::from_fn(w, h, |x, y| {
            if x >= fx && x < fx + fw && y >= fy && y < fy + fh {
                DARK
            } else {
                WHITE
            }
        })
    }

    /// Bounding rows/cols of dark pixels: (x_min, y_min, x_max, y_max).
    fn dark_extent(img: &RgbImage) -> (u32, u32, u32, u32) {
        let mut ext = (u32::MAX, u32::MAX, 0, 0);
        for (x, y, px) in img.enumerate_pixels() {
            if px.0[0] < 128 {
                ext.0 = ext.0.min(x);
                ext.1 = ext.1.min(y);
                ext.2 = ext.2.max(x);
                ext.3 = ext.3.max(y);
            }
        }
        ext
    }

    fn assert_near(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 3.0,
            "expected {expected} +/- 3, got {actual}"
        );
    }

    #[test]
    fn test_face_fills_seventy_percent_of_height() {
        let img = synthetic(800, 600, (300, 150, 200, 260));
        let face = BoundingBox::new(300.0, 150.0, 200.0, 260.0);
        let placed = place_face(&img, &face, (600, 600), 0.70, 0.40).unwrap();

        assert_eq!(placed.image.dimensions(), (600, 600));
        assert_eq!(placed.head_height, 420);

        let (x0, y0, x1, y1) = dark_extent(&placed.image);
        assert_near((y1 - y0 + 1) as f64, 420.0);
        assert_near((y0 + y1 + 1) as f64 / 2.0, 240.0);
        assert_near((x0 + x1 + 1) as f64 / 2.0, 300.0);
    }

    #[test]
    fn test_tall_canvas_placement() {
        let img = synthetic(640, 480, (260, 120, 120, 160));
        let face = BoundingBox::new(260.0, 120.0, 120.0, 160.0);
        let placed = place_face(&img, &face, (827, 1181), 0.70, 0.40).unwrap();

        let (_, y0, _, y1) = dark_extent(&placed.image);
        assert_near((y1 - y0 + 1) as f64, 0.70 * 1181.0);
        assert_near((y0 + y1 + 1) as f64 / 2.0, 0.40 * 1181.0);
    }

    #[test]
    fn test_face_near_edge_leaves_white_fill() {
        // Face in the top-left corner: the canvas above and left of the
        // source image stays white.
        let img = synthetic(400, 400, (0, 0, 100, 100));
        let face = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let placed = place_face(&img, &face, (600, 600), 0.70, 0.40).unwrap();
        assert_eq!(placed.image.get_pixel(0, 0), &WHITE);
        assert!(placed.image.get_pixel(300, 240).0[0] < 128);
    }

    #[test]
    fn test_face_outside_image_is_an_error() {
        let img = synthetic(100, 100, (0, 0, 0, 0));
        let face = BoundingBox::new(5000.0, 5000.0, 10.0, 10.0);
        assert!(place_face(&img, &face, (600, 600), 0.70, 0.40).is_err());
    }

    #[test]
    fn test_fit_wide_image_is_letterboxed() {
        let img = RgbImage::from_pixel(800, 400, Rgb([100, 100, 100]));
        let out = fit_to_canvas(&img, (600, 600)).unwrap();

        assert_eq!(out.dimensions(), (600, 600));
        assert_eq!(out.get_pixel(300, 10), &WHITE);
        assert_eq!(out.get_pixel(300, 590), &WHITE);
        assert!(out.get_pixel(300, 300).0[0].abs_diff(100) <= 1);
        assert!(out.get_pixel(0, 300).0[0].abs_diff(100) <= 1);
    }

    #[test]
    fn test_fit_rejects_zero_canvas() {
        let img = RgbImage::from_pixel(10, 10, WHITE);
        assert!(matches!(
            fit_to_canvas(&img, (0, 10)),
            Err(NormalizeError::InvalidCanvas { .. })
        ));
    }
}
