//! Egocentric bearing and distance to reference geometry.
//!
//! For every frame and every sampled reference point the animal-relative
//! bearing (degrees, `[0, 360)`) and Euclidean distance are computed. Rows
//! are frames, columns are reference points.
#![allow(clippy::cast_precision_loss, clippy::missing_errors_doc)]

use crate::reconstruction::wrap_degrees;
use egomap_core::{Error, HeadPoses, Point, ReferenceGeometry, Result};
use log::debug;
use ndarray::{concatenate, Array2, Axis};
use rayon::prelude::*;

/// Per-frame egocentric samples, shape `(frames, points)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EgocentricMeasurements {
    pub bearings: Array2<f64>,
    pub distances: Array2<f64>,
}

impl EgocentricMeasurements {
    /// Number of frames.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.bearings.nrows()
    }

    /// Number of reference points per frame.
    #[must_use]
    pub fn points(&self) -> usize {
        self.bearings.ncols()
    }

    /// Joins reference point columns of several measurement sets.
    ///
    /// # Errors
    /// Returns [`Error::LengthMismatch`] if the sets cover different frame
    /// counts, or [`Error::EmptyInput`] if `parts` is empty.
    pub fn concat(parts: &[&EgocentricMeasurements]) -> Result<Self> {
        let first = parts
            .first()
            .ok_or_else(|| Error::EmptyInput("no measurement sets to combine".into()))?;
        for part in parts {
            if part.frames() != first.frames() {
                return Err(Error::LengthMismatch {
                    what: "egocentric measurement frames".into(),
                    expected: first.frames(),
                    actual: part.frames(),
                });
            }
        }
        let bearings: Vec<_> = parts.iter().map(|p| p.bearings.view()).collect();
        let distances: Vec<_> = parts.iter().map(|p| p.distances.view()).collect();
        Ok(Self {
            bearings: concatenate(Axis(1), &bearings).map_err(shape_error)?,
            distances: concatenate(Axis(1), &distances).map_err(shape_error)?,
        })
    }
}

fn shape_error(err: ndarray::ShapeError) -> Error {
    Error::LengthMismatch {
        what: format!("egocentric measurement shape ({err})"),
        expected: 0,
        actual: 0,
    }
}

/// `n + 1` evenly spaced values from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, n: usize) -> impl Iterator<Item = f64> {
    (0..=n).map(move |i| start + (end - start) * i as f64 / n as f64)
}

/// Samples the reference points of a geometry.
///
/// The boundary rectangle is inferred from the observed head extents: the
/// wall coordinates span `padding` beyond them, and each wall sits a further
/// `padding` outward. Walls are emitted top, right, bottom, left.
pub fn reference_points(geometry: &ReferenceGeometry, poses: &HeadPoses) -> Result<Vec<Point>> {
    match *geometry {
        ReferenceGeometry::Boundary {
            points_per_side,
            padding,
        } => {
            if points_per_side == 0 {
                return Err(Error::ConfigError(
                    "boundary needs at least one subdivision per wall".into(),
                ));
            }
            let (x_min, x_max) = poses
                .x_range()
                .ok_or_else(|| Error::EmptyInput("no head positions for boundary".into()))?;
            let (y_min, y_max) = poses
                .y_range()
                .ok_or_else(|| Error::EmptyInput("no head positions for boundary".into()))?;

            let xs: Vec<f64> = linspace(x_min - padding, x_max + padding, points_per_side).collect();
            let ys: Vec<f64> = linspace(y_min - padding, y_max + padding, points_per_side).collect();
            let top = y_max + 2.0 * padding;
            let right = x_max + 2.0 * padding;
            let bottom = y_min - 2.0 * padding;
            let left = x_min - 2.0 * padding;

            let mut points = Vec::with_capacity(geometry.point_count());
            points.extend(xs.iter().map(|&x| Point::new(x, top)));
            points.extend(ys.iter().map(|&y| Point::new(right, y)));
            points.extend(xs.iter().map(|&x| Point::new(x, bottom)));
            points.extend(ys.iter().map(|&y| Point::new(left, y)));
            Ok(points)
        }
        ReferenceGeometry::Barrier { barrier, points } => {
            if points == 0 {
                return Err(Error::ConfigError(
                    "barrier needs at least one subdivision".into(),
                ));
            }
            Ok(linspace(0.0, 1.0, points)
                .map(|t| barrier.start.lerp(barrier.end, t))
                .collect())
        }
    }
}

/// Egocentric bearing of a point seen from `origin` facing `heading`.
#[inline]
#[must_use]
pub fn egocentric_bearing(origin: Point, heading: f64, target: Point) -> f64 {
    let allocentric = wrap_degrees((target.y - origin.y).atan2(target.x - origin.x).to_degrees());
    wrap_degrees(allocentric - heading)
}

/// Measures bearing and distance from every frame to one geometry.
pub fn measure(poses: &HeadPoses, geometry: &ReferenceGeometry) -> Result<EgocentricMeasurements> {
    if poses.is_empty() {
        return Err(Error::EmptyInput("no head poses to measure from".into()));
    }
    let points = reference_points(geometry, poses)?;
    let n_points = points.len();
    let n_frames = poses.len();

    let mut bearings = vec![0.0; n_frames * n_points];
    let mut distances = vec![0.0; n_frames * n_points];

    bearings
        .par_chunks_mut(n_points)
        .zip(distances.par_chunks_mut(n_points))
        .enumerate()
        .for_each(|(frame, (bearing_row, distance_row))| {
            let origin = Point::new(poses.x[frame], poses.y[frame]);
            let heading = poses.heading[frame];
            for ((point, bearing), distance) in
                points.iter().zip(bearing_row).zip(distance_row)
            {
                *bearing = egocentric_bearing(origin, heading, *point);
                *distance = (point.x - origin.x).hypot(point.y - origin.y);
            }
        });

    debug!(
        "egocentric measurement: {} frames x {} reference points",
        n_frames, n_points
    );

    Ok(EgocentricMeasurements {
        bearings: Array2::from_shape_vec((n_frames, n_points), bearings).map_err(shape_error)?,
        distances: Array2::from_shape_vec((n_frames, n_points), distances).map_err(shape_error)?,
    })
}

/// Measures several geometries and joins their reference points per frame.
pub fn measure_all(
    poses: &HeadPoses,
    geometries: &[ReferenceGeometry],
) -> Result<EgocentricMeasurements> {
    let parts = geometries
        .iter()
        .map(|geometry| measure(poses, geometry))
        .collect::<Result<Vec<_>>>()?;
    EgocentricMeasurements::concat(&parts.iter().collect::<Vec<_>>())
}
