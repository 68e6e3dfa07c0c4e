//! Shared pixel statistics for the frame-based analyzers.

use ndarray::{s, Array2};

use crate::shared::frame::Frame;

/// Longest side of the luma plane the analyzers work on.
const MAX_PLANE_SIDE: usize = 128;

/// Rec.601 luma in `[0, 1]`, subsampled so neither side exceeds
/// `MAX_PLANE_SIDE`. Single-channel frames are read as-is.
pub fn luma_plane(frame: &Frame) -> Array2<f32> {
    let src = frame.as_ndarray();
    let (h, w, c) = src.dim();
    if h == 0 || w == 0 || c == 0 {
        return Array2::zeros((0, 0));
    }
    let step = (h.max(w)).div_ceil(MAX_PLANE_SIDE).max(1);
    let sub = src.slice(s![..;step, ..;step, ..]);
    let (sh, sw, _) = sub.dim();

    Array2::from_shape_fn((sh, sw), |(y, x)| {
        if c >= 3 {
            let r = sub[[y, x, 0]] as f32;
            let g = sub[[y, x, 1]] as f32;
            let b = sub[[y, x, 2]] as f32;
            (0.299 * r + 0.587 * g + 0.114 * b) / 255.0
        } else {
            sub[[y, x, 0]] as f32 / 255.0
        }
    })
}

pub fn mean_luma(plane: &Array2<f32>) -> f64 {
    if plane.is_empty() {
        return 0.0;
    }
    plane.iter().map(|&v| v as f64).sum::<f64>() / plane.len() as f64
}

/// Variance of the 4-neighbour Laplacian, a standard sharpness measure.
pub fn laplacian_variance(plane: &Array2<f32>) -> f64 {
    let (h, w) = plane.dim();
    if h < 3 || w < 3 {
        return 0.0;
    }
    let mut values = Vec::with_capacity((h - 2) * (w - 2));
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let lap = plane[[y - 1, x]] + plane[[y + 1, x]] + plane[[y, x - 1]]
                + plane[[y, x + 1]]
                - 4.0 * plane[[y, x]];
            values.push(lap as f64);
        }
    }
    variance(&values)
}

/// Central half of the plane in both dimensions.
pub fn center_region(plane: &Array2<f32>) -> Array2<f32> {
    let (h, w) = plane.dim();
    plane
        .slice(s![h / 4..h - h / 4, w / 4..w - w / 4])
        .to_owned()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Index of the element that deviates most from the mean.
pub fn most_deviant(values: &[f64]) -> Option<usize> {
    let m = mean(values);
    values
        .iter()
        .enumerate()
        .max_by(|a, b| {
            (a.1 - m)
                .abs()
                .partial_cmp(&(b.1 - m).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
}
