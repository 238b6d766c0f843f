//! NaN-aware Gaussian smoothing of rate maps.
//!
//! Convolution skips NaN inputs and renormalizes by the kernel weight that
//! contributed. Positions outside the map count as a fill value of zero.
//! Circular axes are handled by tiling the map three times along that axis
//! and keeping the middle copy.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use ndarray::{concatenate, s, Array2, Axis};

/// Normalized, odd-sized 2-D Gaussian kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKernel {
    weights: Array2<f64>,
}

impl GaussianKernel {
    /// Kernel of standard deviation `sigma` bins.
    ///
    /// The side length is `8 * sigma` rounded up to the next odd integer.
    /// A zero, negative, or NaN `sigma` yields the identity kernel.
    #[must_use]
    pub fn new(sigma: f64) -> Self {
        if sigma.is_nan() || sigma <= 0.0 {
            return Self {
                weights: Array2::ones((1, 1)),
            };
        }
        let mut size = (8.0 * sigma).ceil() as usize;
        if size % 2 == 0 {
            size += 1;
        }
        let half = (size / 2) as f64;
        let two_var = 2.0 * sigma * sigma;
        let mut weights = Array2::from_shape_fn((size, size), |(i, j)| {
            let dy = i as f64 - half;
            let dx = j as f64 - half;
            (-(dx * dx + dy * dy) / two_var).exp()
        });
        let total = weights.sum();
        weights.mapv_inplace(|w| w / total);
        Self { weights }
    }

    /// Side length of the kernel.
    #[must_use]
    pub fn size(&self) -> usize {
        self.weights.nrows()
    }

    /// Kernel weights, summing to one.
    #[must_use]
    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }
}

/// Smooths a map with zero fill outside its edges.
///
/// With `preserve_nan`, positions that were NaN in `map` stay NaN.
#[must_use]
pub fn smooth(map: &Array2<f64>, kernel: &GaussianKernel, preserve_nan: bool) -> Array2<f64> {
    let (rows, cols) = map.dim();
    let half = (kernel.size() / 2) as isize;
    let weights = kernel.weights();

    Array2::from_shape_fn((rows, cols), |(r, c)| {
        if preserve_nan && map[[r, c]].is_nan() {
            return f64::NAN;
        }
        let mut acc = 0.0;
        let mut norm = 0.0;
        for ((ki, kj), &w) in weights.indexed_iter() {
            let rr = r as isize + ki as isize - half;
            let cc = c as isize + kj as isize - half;
            let inside = rr >= 0 && cc >= 0 && (rr as usize) < rows && (cc as usize) < cols;
            if !inside {
                norm += w;
                continue;
            }
            let value = map[[rr as usize, cc as usize]];
            if value.is_finite() {
                acc += w * value;
                norm += w;
            }
        }
        if norm > 0.0 {
            acc / norm
        } else {
            f64::NAN
        }
    })
}

/// Smooths a map whose `axis` wraps around.
///
/// The map is tiled three times along `axis`, smoothed, and the middle tile
/// is returned, so the first and last bins see each other as neighbours.
#[must_use]
pub fn smooth_circular(
    map: &Array2<f64>,
    kernel: &GaussianKernel,
    axis: Axis,
    preserve_nan: bool,
) -> Array2<f64> {
    let len = map.len_of(axis);
    if len == 0 {
        return map.clone();
    }
    let tiled = match concatenate(axis, &[map.view(), map.view(), map.view()]) {
        Ok(tiled) => tiled,
        Err(_) => return smooth(map, kernel, preserve_nan),
    };
    let smoothed = smooth(&tiled, kernel, preserve_nan);
    match axis.index() {
        0 => smoothed.slice(s![len..2 * len, ..]).to_owned(),
        _ => smoothed.slice(s![.., len..2 * len]).to_owned(),
    }
}
