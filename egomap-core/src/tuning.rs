//! Binned tuning maps, head-direction curves, and trajectory data.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use ndarray::{concatenate, Array2, Axis};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Uniform binning of one dimension.
///
/// Bin `i` covers `[start + i * size, start + (i + 1) * size)`. Circular axes
/// wrap indices modulo `count`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinAxis {
    /// Axis label (e.g. `"bearing"`, `"distance"`).
    pub label: String,
    /// Unit of the axis values.
    pub unit: String,
    /// Left edge of the first bin.
    pub start: f64,
    /// Bin width.
    pub size: f64,
    /// Number of bins.
    pub count: usize,
    /// Whether the last bin is adjacent to the first.
    pub circular: bool,
}

impl BinAxis {
    /// Linear axis with `count` bins of width `size` from `start`.
    #[must_use]
    pub fn linear(label: &str, unit: &str, start: f64, size: f64, count: usize) -> Self {
        Self {
            label: label.to_string(),
            unit: unit.to_string(),
            start,
            size,
            count,
            circular: false,
        }
    }

    /// Circular angular axis over `[0, 360)` with bins of `size` degrees.
    #[must_use]
    pub fn angular(label: &str, size: f64) -> Self {
        Self {
            label: label.to_string(),
            unit: "deg".to_string(),
            start: 0.0,
            size,
            count: (360.0 / size).ceil() as usize,
            circular: true,
        }
    }

    /// Linear axis just wide enough to hold `[min, max]`.
    ///
    /// The bin count is `ceil((max - min) / size)`, at least one; `max` falls
    /// into the last bin.
    #[must_use]
    pub fn spanning(label: &str, unit: &str, min: f64, max: f64, size: f64) -> Self {
        let count = ((max - min) / size).ceil().max(1.0) as usize;
        Self::linear(label, unit, min, size, count)
    }

    /// Bin index of `value`, or `None` when it falls outside the axis.
    #[inline]
    #[must_use]
    pub fn digitize(&self, value: f64) -> Option<usize> {
        if !value.is_finite() || self.count == 0 {
            return None;
        }
        let position = ((value - self.start) / self.size).floor();
        if self.circular {
            let count = self.count as f64;
            return Some(position.rem_euclid(count) as usize % self.count);
        }
        if position < 0.0 {
            return None;
        }
        let index = position as usize;
        if index < self.count {
            Some(index)
        } else if index == self.count && value <= self.end() {
            // Closed right edge so the maximum of a spanning axis is kept.
            Some(self.count - 1)
        } else {
            None
        }
    }

    /// Right edge of the last bin.
    #[must_use]
    pub fn end(&self) -> f64 {
        self.start + self.size * self.count as f64
    }

    /// The `count + 1` bin edges.
    #[must_use]
    pub fn edges(&self) -> Vec<f64> {
        (0..=self.count)
            .map(|i| self.start + self.size * i as f64)
            .collect()
    }

    /// Bin centers.
    #[must_use]
    pub fn centers(&self) -> Vec<f64> {
        (0..self.count)
            .map(|i| self.start + self.size * (i as f64 + 0.5))
            .collect()
    }
}

/// Occupancy-normalized 2-D rate map.
///
/// `rate` has shape `(rows.count, cols.count)`. Entries with zero occupancy
/// are NaN before smoothing; smoothing may fill them from neighbours.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TuningMap {
    pub rows: BinAxis,
    pub cols: BinAxis,
    /// Smoothed rate (events per second).
    pub rate: Array2<f64>,
    /// Time spent per bin in seconds.
    pub occupancy: Array2<f64>,
}

impl TuningMap {
    /// Map shape as `(rows, cols)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.rate.dim()
    }

    /// Rate matrix with the first row repeated at the end.
    ///
    /// Used for circular row axes so a polar rendering closes at 360 degrees.
    #[must_use]
    pub fn closed_rate(&self) -> Array2<f64> {
        if self.rate.nrows() == 0 {
            return self.rate.clone();
        }
        let first = self.rate.slice(ndarray::s![0..1, ..]);
        concatenate(Axis(0), &[self.rate.view(), first])
            .unwrap_or_else(|_| self.rate.clone())
    }

    /// Largest finite rate, if any.
    #[must_use]
    pub fn peak_rate(&self) -> Option<f64> {
        self.rate
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }
}

/// Head-direction tuning curve.
///
/// `rate` and `angles_deg` both carry `bins.count + 1` samples: the first bin
/// is repeated at the end so a polar line plot closes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TuningCurve {
    pub bins: BinAxis,
    pub angles_deg: Vec<f64>,
    pub rate: Vec<f64>,
    pub occupancy: Vec<f64>,
}

/// Head path with the poses at which events occurred.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trajectory {
    pub path_x: Vec<f64>,
    pub path_y: Vec<f64>,
    pub spike_x: Vec<f64>,
    pub spike_y: Vec<f64>,
    pub spike_heading: Vec<f64>,
}
