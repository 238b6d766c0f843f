//! Head position and heading from left/right ear markers.
//!
//! Each raw coordinate column goes through three passes before the ears are
//! combined:
//!
//! 1. Samples whose marker likelihood is below the threshold are dropped.
//! 2. Samples with `|z| > outlier_z` are dropped. The z-score is taken over
//!    the column with dropped samples zeroed, so long dropouts widen the
//!    distribution. This is a coarse pass that can clip real excursions.
//! 3. Gaps are filled by linear interpolation between the surrounding valid
//!    samples; leading and trailing gaps copy the nearest valid sample.
#![allow(
    clippy::cast_precision_loss,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]

use egomap_core::{
    ArenaExtents, Axis, Error, HeadPoses, Marker, ReconstructionConfig, Result, TrackingData,
};
use log::debug;

const COORDINATES: [(Marker, Axis); 4] = [
    (Marker::LeftEar, Axis::X),
    (Marker::LeftEar, Axis::Y),
    (Marker::RightEar, Axis::X),
    (Marker::RightEar, Axis::Y),
];

/// Reconstructs head position and heading for every frame.
pub fn reconstruct_head_poses(
    tracking: &TrackingData,
    config: &ReconstructionConfig,
) -> Result<HeadPoses> {
    tracking.validate()?;
    if tracking.is_empty() {
        return Err(Error::EmptyInput("tracking data has no frames".into()));
    }

    let mut cleaned: Vec<Vec<f64>> = Vec::with_capacity(COORDINATES.len());
    for (marker, axis) in COORDINATES {
        let column = clean_coordinate(
            tracking.coordinate(marker, axis),
            tracking.likelihood(marker),
            config,
        )
        .ok_or(Error::MissingCoordinate { marker, axis })?;
        cleaned.push(column);
    }

    let (lx, ly, rx, ry) = (&cleaned[0], &cleaned[1], &cleaned[2], &cleaned[3]);
    let x = lx.iter().zip(rx).map(|(l, r)| (l + r) / 2.0).collect();
    let y = ly.iter().zip(ry).map(|(l, r)| (l + r) / 2.0).collect();
    let heading = (0..tracking.len())
        .map(|i| heading_from_ears(lx[i], ly[i], rx[i], ry[i]))
        .collect();

    HeadPoses::new(x, y, heading)
}

/// Runs the likelihood, outlier, and gap-filling passes on one column.
///
/// Returns `None` if no valid sample survives.
fn clean_coordinate(
    values: &[f64],
    likelihood: &[f64],
    config: &ReconstructionConfig,
) -> Option<Vec<f64>> {
    let mut valid: Vec<bool> = values
        .iter()
        .zip(likelihood)
        .map(|(v, &p)| v.is_finite() && p >= config.likelihood_threshold)
        .collect();

    let zeroed: Vec<f64> = values
        .iter()
        .zip(&valid)
        .map(|(&v, &ok)| if ok { v } else { 0.0 })
        .collect();
    let outliers = mark_outliers(&zeroed, config.outlier_z, &mut valid);

    let dropped = valid.iter().filter(|ok| !**ok).count();
    debug!(
        "coordinate cleaning: {} of {} samples missing ({} outliers)",
        dropped,
        values.len(),
        outliers
    );

    fill_gaps(&zeroed, &valid)
}

/// Marks samples with `|z| > cutoff` as invalid and returns how many were hit.
///
/// Uses the population standard deviation; a constant column has no outliers.
fn mark_outliers(values: &[f64], cutoff: f64, valid: &mut [bool]) -> usize {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    if std == 0.0 || !std.is_finite() {
        return 0;
    }

    let mut count = 0;
    for (value, ok) in values.iter().zip(valid.iter_mut()) {
        if *ok && ((value - mean) / std).abs() > cutoff {
            *ok = false;
            count += 1;
        }
    }
    count
}

/// Fills invalid samples from their valid neighbours.
///
/// Interior gaps are linearly interpolated; a leading gap takes the first
/// valid value and a trailing gap the last one. Returns `None` when nothing
/// is valid.
#[must_use]
pub fn fill_gaps(values: &[f64], valid: &[bool]) -> Option<Vec<f64>> {
    let first = valid.iter().position(|&ok| ok)?;
    let mut out = values.to_vec();
    out[..first].fill(values[first]);

    let mut prev = first;
    for i in first + 1..values.len() {
        if !valid[i] {
            continue;
        }
        let gap = i - prev;
        if gap > 1 {
            let (a, b) = (values[prev], values[i]);
            for k in 1..gap {
                out[prev + k] = a + (b - a) * k as f64 / gap as f64;
            }
        }
        prev = i;
    }
    let last = values[prev];
    out[prev + 1..].fill(last);
    Some(out)
}

/// Heading in `[0, 360)` from the ear positions.
///
/// The ear-to-ear angle is mirrored (`-(angle - 360)`) and wrapped.
#[inline]
#[must_use]
pub fn heading_from_ears(left_x: f64, left_y: f64, right_x: f64, right_y: f64) -> f64 {
    let angle = (right_y - left_y).atan2(right_x - left_x).to_degrees();
    wrap_degrees(-(angle - 360.0))
}

/// Wraps an angle into `[0, 360)`.
#[inline]
#[must_use]
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Shifts head positions to start at 0 and stretches them onto the arena.
///
/// Tracker coordinates are in camera pixels; after scaling, the observed
/// extents span exactly `[0, x_length]` and `[0, y_length]`.
pub fn scale_to_arena(poses: &HeadPoses, arena: &ArenaExtents) -> Result<HeadPoses> {
    arena.validate()?;
    let (x_min, x_max) = poses
        .x_range()
        .ok_or_else(|| Error::EmptyInput("no head positions to scale".into()))?;
    let (y_min, y_max) = poses
        .y_range()
        .ok_or_else(|| Error::EmptyInput("no head positions to scale".into()))?;

    let x = rescale(&poses.x, x_min, x_max, arena.x_length, "head x")?;
    let y = rescale(&poses.y, y_min, y_max, arena.y_length, "head y")?;
    HeadPoses::new(x, y, poses.heading.clone())
}

fn rescale(values: &[f64], min: f64, max: f64, length: f64, what: &str) -> Result<Vec<f64>> {
    let span = max - min;
    if span <= 0.0 || !span.is_finite() {
        return Err(Error::DegenerateAxis(format!(
            "{what} has zero span and cannot be scaled to the arena"
        )));
    }
    let factor = length / span;
    Ok(values.iter().map(|v| (v - min) * factor).collect())
}
