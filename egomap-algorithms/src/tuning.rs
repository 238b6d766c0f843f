//! Tuning-map estimators.
//!
//! Every estimator divides frame-aligned events by the time spent in each
//! bin. Bins never visited are NaN before smoothing.
#![allow(clippy::missing_errors_doc)]

use crate::binning::RateAccumulator;
use crate::egocentric::EgocentricMeasurements;
use crate::smoothing::{smooth, smooth_circular, GaussianKernel};
use egomap_core::{
    BinAxis, EbcConfig, Error, HdCurveConfig, HeadPoses, HeatmapConfig, Result, SessionConfig,
    SpikeTrain, Trajectory, TuningCurve, TuningMap,
};
use log::{debug, warn};
use ndarray::Axis;

fn check_frames(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            what: what.to_string(),
            expected,
            actual,
        })
    }
}

/// Egocentric boundary-cell rate map, bearing (rows) by distance (cols).
///
/// Reference points farther than half the longest arena wall are ignored.
/// The bearing axis is smoothed circularly.
pub fn ebc_ratemap(
    measurements: &EgocentricMeasurements,
    spikes: &SpikeTrain,
    session: &SessionConfig,
    config: &EbcConfig,
) -> Result<TuningMap> {
    check_frames("spike train", measurements.frames(), spikes.len())?;
    if measurements.frames() == 0 {
        return Err(Error::EmptyInput("no frames for ebc map".into()));
    }
    let cutoff = session.arena.ebc_cutoff();
    let distance_bins = BinAxis::spanning("distance", "cm", 0.0, cutoff, config.distance_bin);
    let bearing_bins = BinAxis::angular("bearing", config.bearing_bin_deg);

    let mut acc = RateAccumulator::new(bearing_bins, distance_bins, session.frame_duration());
    let mut beyond_cutoff = 0usize;
    for (frame, (bearings, distances)) in measurements
        .bearings
        .rows()
        .into_iter()
        .zip(measurements.distances.rows())
        .enumerate()
    {
        acc.begin_frame();
        let weight = spikes.weight(frame);
        for (&bearing, &distance) in bearings.iter().zip(distances.iter()) {
            if distance > cutoff {
                beyond_cutoff += 1;
                continue;
            }
            acc.add(bearing, distance, weight);
        }
    }
    debug!(
        "ebc map: {} samples beyond {cutoff} cutoff, {} events",
        beyond_cutoff,
        acc.total_spikes()
    );

    let (rows, cols, raw, occupancy) = acc.finish();
    let kernel = GaussianKernel::new(config.sigma);
    let rate = smooth_circular(&raw, &kernel, Axis(0), config.preserve_nan);
    Ok(TuningMap {
        rows,
        cols,
        rate,
        occupancy,
    })
}

/// Positional rate map, head x (rows) by head y (cols).
///
/// Bins span the observed head extents.
pub fn heatmap(
    poses: &HeadPoses,
    spikes: &SpikeTrain,
    session: &SessionConfig,
    config: &HeatmapConfig,
) -> Result<TuningMap> {
    check_frames("spike train", poses.len(), spikes.len())?;
    let (x_min, x_max) = poses
        .x_range()
        .ok_or_else(|| Error::EmptyInput("no head positions for heatmap".into()))?;
    let (y_min, y_max) = poses
        .y_range()
        .ok_or_else(|| Error::EmptyInput("no head positions for heatmap".into()))?;

    let mut acc = RateAccumulator::new(
        BinAxis::spanning("x", "cm", x_min, x_max, config.bin_size),
        BinAxis::spanning("y", "cm", y_min, y_max, config.bin_size),
        session.frame_duration(),
    );
    for (frame, (&x, &y)) in poses.x.iter().zip(&poses.y).enumerate() {
        acc.begin_frame();
        acc.add(x, y, spikes.weight(frame));
    }
    if acc.dropped() > 0 {
        warn!("heatmap: {} non-finite positions ignored", acc.dropped());
    }

    let (rows, cols, raw, occupancy) = acc.finish();
    let rate = smooth(&raw, &GaussianKernel::new(config.sigma), config.preserve_nan);
    Ok(TuningMap {
        rows,
        cols,
        rate,
        occupancy,
    })
}

/// Head-direction tuning curve, closed by repeating the first bin.
pub fn hd_curve(
    poses: &HeadPoses,
    spikes: &SpikeTrain,
    session: &SessionConfig,
    config: &HdCurveConfig,
) -> Result<TuningCurve> {
    check_frames("spike train", poses.len(), spikes.len())?;
    if poses.is_empty() {
        return Err(Error::EmptyInput("no headings for head-direction curve".into()));
    }
    let bins = BinAxis::angular("heading", config.bin_deg);
    let frame_duration = session.frame_duration();

    let mut occupancy = vec![0.0; bins.count];
    let mut counts = vec![0.0; bins.count];
    for (frame, &heading) in poses.heading.iter().enumerate() {
        if let Some(bin) = bins.digitize(heading) {
            occupancy[bin] += frame_duration;
            counts[bin] += spikes.weight(frame);
        }
    }

    let mut rate: Vec<f64> = counts
        .iter()
        .zip(&occupancy)
        .map(|(&c, &o)| if o > 0.0 { c / o } else { f64::NAN })
        .collect();
    let mut angles_deg = bins.edges();
    angles_deg.truncate(bins.count);
    if let Some(&first) = rate.first() {
        rate.push(first);
        angles_deg.push(0.0);
    }

    Ok(TuningCurve {
        bins,
        angles_deg,
        rate,
        occupancy,
    })
}

/// Head path and the poses of frames carrying an event.
pub fn trajectory(poses: &HeadPoses, spikes: &SpikeTrain) -> Result<Trajectory> {
    check_frames("spike train", poses.len(), spikes.len())?;
    let mut out = Trajectory {
        path_x: poses.x.clone(),
        path_y: poses.y.clone(),
        ..Trajectory::default()
    };
    for frame in spikes.indices() {
        out.spike_x.push(poses.x[frame]);
        out.spike_y.push(poses.y[frame]);
        out.spike_heading.push(poses.heading[frame]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::egocentric::measure;
    use approx::assert_relative_eq;
    use egomap_core::{ArenaExtents, ReferenceGeometry};
    use ndarray::Array2;

    fn circle_walk(frames: usize) -> HeadPoses {
        let mut x = Vec::with_capacity(frames);
        let mut y = Vec::with_capacity(frames);
        let mut heading = Vec::with_capacity(frames);
        for i in 0..frames {
            let t = i as f64 * 0.1;
            x.push(30.0 + 20.0 * t.cos());
            y.push(30.0 + 20.0 * t.sin());
            heading.push((i as f64 * 7.0) % 360.0);
        }
        HeadPoses::new(x, y, heading).unwrap()
    }

    fn session() -> SessionConfig {
        SessionConfig::new(30, ArenaExtents::new(60.0, 60.0))
    }

    #[test]
    fn test_ebc_shape_and_zero_events() {
        let poses = circle_walk(200);
        let m = measure(&poses, &ReferenceGeometry::boundary()).unwrap();
        let spikes = SpikeTrain::zeros(200);
        let map = ebc_ratemap(&m, &spikes, &session(), &EbcConfig::default()).unwrap();

        assert_eq!(map.shape(), (120, 12));
        assert_eq!(map.closed_rate().nrows(), 121);
        assert!(map
            .rate
            .iter()
            .filter(|v| v.is_finite())
            .all(|&v| v.abs() < 1e-12));
        assert!(map.occupancy.iter().any(|&o| o > 0.0));
    }

    #[test]
    fn test_ebc_occupancy_bounded_by_session_length() {
        let poses = circle_walk(90);
        let m = measure(&poses, &ReferenceGeometry::boundary()).unwrap();
        let map =
            ebc_ratemap(&m, &SpikeTrain::zeros(90), &session(), &EbcConfig::default()).unwrap();
        let session_seconds = 90.0 / 30.0;
        assert!(map.occupancy.iter().all(|&o| o <= session_seconds + 1e-9));
    }

    #[test]
    fn test_ebc_length_mismatch() {
        let poses = circle_walk(10);
        let m = measure(&poses, &ReferenceGeometry::boundary()).unwrap();
        let err = ebc_ratemap(&m, &SpikeTrain::zeros(9), &session(), &EbcConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));
    }

    #[test]
    fn test_ebc_ignores_points_beyond_cutoff() {
        // Cutoff 35.5 sits inside the last distance bin [35, 37.5).
        let session = SessionConfig::new(30, ArenaExtents::new(60.0, 71.0));
        let m = EgocentricMeasurements {
            bearings: ndarray::array![[10.0, 100.0], [10.0, 100.0]],
            distances: ndarray::array![[36.0, 35.0], [36.5, 35.0]],
        };
        let config = EbcConfig {
            sigma: 0.0,
            ..EbcConfig::default()
        };
        let map = ebc_ratemap(&m, &SpikeTrain::from_values(&[1, 0]), &session, &config).unwrap();

        assert_eq!(map.shape(), (120, 15));
        assert_relative_eq!(map.occupancy[[3, 14]], 0.0);
        assert!(map.rate[[3, 14]].is_nan());
        assert_relative_eq!(map.occupancy[[33, 14]], 2.0 / 30.0);
        assert_relative_eq!(map.rate[[33, 14]], 15.0);
    }

    #[test]
    fn test_ebc_smoothing_wraps_bearing() {
        // One reference point sweeping every bearing bin at distance 10.
        let frames = 120;
        let m = EgocentricMeasurements {
            bearings: Array2::from_shape_fn((frames, 1), |(i, _)| i as f64 * 3.0 + 1.0),
            distances: Array2::from_elem((frames, 1), 10.0),
        };
        let mut spikes = SpikeTrain::zeros(frames);
        spikes.mark(0);
        let map = ebc_ratemap(&m, &spikes, &session(), &EbcConfig::default()).unwrap();

        assert!(map.rate[[119, 4]] > 0.0);
        assert_relative_eq!(map.rate[[119, 4]], map.rate[[1, 4]], epsilon = 1e-9);
        assert!(map.rate[[119, 4]] > map.rate[[115, 4]]);
        assert_relative_eq!(map.rate[[60, 4]], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_heatmap_rate_without_smoothing() {
        let poses = HeadPoses::new(
            vec![0.0, 0.5, 4.0, 5.9],
            vec![0.0, 0.5, 4.0, 5.9],
            vec![0.0; 4],
        )
        .unwrap();
        let spikes = SpikeTrain::from_values(&[1, 0, 0, 1]);
        let config = HeatmapConfig {
            sigma: 0.0,
            ..HeatmapConfig::default()
        };
        let session = SessionConfig::new(1, ArenaExtents::new(6.0, 6.0));
        let map = heatmap(&poses, &spikes, &session, &config).unwrap();

        assert_eq!(map.shape(), (2, 2));
        assert_relative_eq!(map.occupancy[[0, 0]], 2.0);
        assert_relative_eq!(map.rate[[0, 0]], 0.5);
        assert_relative_eq!(map.rate[[1, 1]], 0.5);
        assert!(map.rate[[0, 1]].is_nan());
    }

    #[test]
    fn test_hd_curve_closes() {
        let headings = vec![5.0, 5.0, 100.0, 355.0];
        let poses = HeadPoses::new(vec![0.0; 4], vec![0.0; 4], headings).unwrap();
        let spikes = SpikeTrain::from_values(&[1, 0, 1, 0]);
        let session = SessionConfig::new(2, ArenaExtents::new(1.0, 1.0));
        let curve = hd_curve(&poses, &spikes, &session, &HdCurveConfig::default()).unwrap();

        assert_eq!(curve.rate.len(), 31);
        assert_eq!(curve.angles_deg.len(), 31);
        assert_relative_eq!(curve.angles_deg[29], 348.0);
        assert_relative_eq!(curve.angles_deg[30], 0.0);
        assert_relative_eq!(curve.rate[0], 1.0);
        assert_relative_eq!(curve.rate[30], 1.0);
        assert_relative_eq!(curve.rate[8], 2.0);
        assert_relative_eq!(curve.rate[29], 0.0);
        assert!(curve.rate[1].is_nan());
    }

    #[test]
    fn test_trajectory_spike_poses() {
        let poses =
            HeadPoses::new(vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![10.0, 20.0, 30.0])
                .unwrap();
        let t = trajectory(&poses, &SpikeTrain::from_values(&[0, 1, 1])).unwrap();
        assert_eq!(t.path_x, vec![1.0, 2.0, 3.0]);
        assert_eq!(t.spike_x, vec![2.0, 3.0]);
        assert_eq!(t.spike_y, vec![5.0, 6.0]);
        assert_eq!(t.spike_heading, vec![20.0, 30.0]);
    }
}
