use crate::shared::constants::BRIGHTNESS_GRID;
use crate::shared::frame::FrameSample;

/// Mean Rec.601 luma (0-255) of a frame, sampled on a grid of at most
/// [`BRIGHTNESS_GRID`] points per axis.
///
/// Returns `None` for an empty frame.
pub fn measure_brightness(frame: &FrameSample) -> Option<f64> {
    if frame.is_empty() {
        return None;
    }
    let w = frame.width() as usize;
    let h = frame.height() as usize;
    let channels = frame.channels() as usize;
    let data = frame.data();

    let cols = w.min(BRIGHTNESS_GRID as usize);
    let rows = h.min(BRIGHTNESS_GRID as usize);

    let mut sum = 0.0;
    for gy in 0..rows {
        let y = ((gy as f64 + 0.5) * h as f64 / rows as f64) as usize;
        for gx in 0..cols {
            let x = ((gx as f64 + 0.5) * w as f64 / cols as f64) as usize;
            let i = (y.min(h - 1) * w + x.min(w - 1)) * channels;
            sum += luma(&data[i..i + channels]);
        }
    }
    Some(sum / (rows * cols) as f64)
}

fn luma(px: &[u8]) -> f64 {
    match px {
        [r, g, b, ..] => 0.299 * *r as f64 + 0.587 * *g as f64 + 0.114 * *b as f64,
        [v, ..] => *v as f64,
        [] => 0.0,
    }
}
