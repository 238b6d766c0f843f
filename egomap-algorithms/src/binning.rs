//! Occupancy and event accumulation over 2-D bins.
#![allow(clippy::cast_precision_loss)]

use egomap_core::BinAxis;
use ndarray::Array2;

/// Accumulates occupancy time and event counts on a `rows x cols` grid.
///
/// Samples are fed frame by frame. Within one frame every bin is counted at
/// most once, no matter how many samples land in it.
#[derive(Debug, Clone)]
pub struct RateAccumulator {
    rows: BinAxis,
    cols: BinAxis,
    frame_duration: f64,
    occupancy: Array2<f64>,
    spikes: Array2<f64>,
    stamp: Array2<usize>,
    frame: usize,
    dropped: usize,
}

impl RateAccumulator {
    /// Creates an empty accumulator; each visited frame adds `frame_duration`
    /// seconds of occupancy.
    #[must_use]
    pub fn new(rows: BinAxis, cols: BinAxis, frame_duration: f64) -> Self {
        let shape = (rows.count, cols.count);
        Self {
            rows,
            cols,
            frame_duration,
            occupancy: Array2::zeros(shape),
            spikes: Array2::zeros(shape),
            stamp: Array2::from_elem(shape, usize::MAX),
            frame: 0,
            dropped: 0,
        }
    }

    /// Starts the next frame.
    ///
    /// Samples added before the first call belong to frame 0.
    pub fn begin_frame(&mut self) {
        self.frame += 1;
    }

    /// Adds one sample of the current frame with the frame's event weight.
    ///
    /// Returns `false` if the sample lies outside the grid.
    pub fn add(&mut self, row_value: f64, col_value: f64, weight: f64) -> bool {
        let (Some(row), Some(col)) = (self.rows.digitize(row_value), self.cols.digitize(col_value))
        else {
            self.dropped += 1;
            return false;
        };
        let stamp = &mut self.stamp[[row, col]];
        if *stamp != self.frame {
            *stamp = self.frame;
            self.occupancy[[row, col]] += self.frame_duration;
            self.spikes[[row, col]] += weight;
        }
        true
    }

    /// Number of samples that fell outside the grid.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Total events counted.
    #[must_use]
    pub fn total_spikes(&self) -> f64 {
        self.spikes.sum()
    }

    /// Unsmoothed rate (NaN where occupancy is zero) and occupancy.
    #[must_use]
    pub fn finish(self) -> (BinAxis, BinAxis, Array2<f64>, Array2<f64>) {
        let rate = ndarray::Zip::from(&self.spikes)
            .and(&self.occupancy)
            .map_collect(|&spikes, &occupancy| {
                if occupancy > 0.0 {
                    spikes / occupancy
                } else {
                    f64::NAN
                }
            });
        (self.rows, self.cols, rate, self.occupancy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> RateAccumulator {
        RateAccumulator::new(
            BinAxis::angular("bearing", 90.0),
            BinAxis::linear("distance", "cm", 0.0, 1.0, 2),
            0.5,
        )
    }

    #[test]
    fn test_bin_counted_once_per_frame() {
        let mut acc = grid();
        acc.begin_frame();
        assert!(acc.add(10.0, 0.2, 1.0));
        assert!(acc.add(20.0, 0.7, 1.0));
        acc.begin_frame();
        assert!(acc.add(10.0, 0.2, 0.0));

        let (_, _, rate, occupancy) = acc.finish();
        assert_relative_eq!(occupancy[[0, 0]], 1.0);
        assert_relative_eq!(rate[[0, 0]], 1.0);
        assert!(rate[[1, 0]].is_nan());
        assert_relative_eq!(occupancy[[1, 1]], 0.0);
    }

    #[test]
    fn test_samples_before_first_frame_counted() {
        let mut acc = grid();
        assert!(acc.add(10.0, 0.2, 1.0));
        assert!(acc.add(10.0, 0.3, 1.0));
        acc.begin_frame();
        assert!(acc.add(10.0, 0.2, 0.0));

        let (_, _, rate, occupancy) = acc.finish();
        assert_relative_eq!(occupancy[[0, 0]], 1.0);
        assert_relative_eq!(rate[[0, 0]], 1.0);
    }

    #[test]
    fn test_out_of_grid_dropped() {
        let mut acc = grid();
        acc.begin_frame();
        assert!(!acc.add(10.0, 5.0, 1.0));
        assert!(!acc.add(f64::NAN, 0.5, 1.0));
        assert_eq!(acc.dropped(), 2);
        assert_relative_eq!(acc.total_spikes(), 0.0);
    }
}
