//! Arena extents and reference geometries for egocentric measurement.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point in arena coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation toward `other` at fraction `t`.
    #[inline]
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Physical arena size in length units (typically cm).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArenaExtents {
    pub x_length: f64,
    pub y_length: f64,
}

impl ArenaExtents {
    /// Creates arena extents.
    #[must_use]
    pub fn new(x_length: f64, y_length: f64) -> Self {
        Self { x_length, y_length }
    }

    /// Length of the longer wall.
    #[must_use]
    pub fn max_wall_length(&self) -> f64 {
        self.x_length.max(self.y_length)
    }

    /// Distance beyond which egocentric samples are discarded.
    #[must_use]
    pub fn ebc_cutoff(&self) -> f64 {
        self.max_wall_length() / 2.0
    }

    /// Returns true if the point lies inside the closed arena rectangle.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        (0.0..=self.x_length).contains(&point.x) && (0.0..=self.y_length).contains(&point.y)
    }

    /// Checks that both lengths are finite and positive.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] otherwise.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("x", self.x_length), ("y", self.y_length)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::ConfigError(format!(
                    "arena {name} length must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// An inserted linear barrier defined by its two endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Barrier {
    pub start: Point,
    pub end: Point,
}

impl Barrier {
    /// Creates a barrier between two endpoints.
    #[must_use]
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Checks that both endpoints lie within the arena.
    ///
    /// # Errors
    /// Returns [`Error::BarrierOutOfBounds`] for the first endpoint outside.
    pub fn validate_within(&self, arena: &ArenaExtents) -> Result<()> {
        for point in [self.start, self.end] {
            if !arena.contains(point) {
                return Err(Error::BarrierOutOfBounds {
                    point,
                    arena_x: arena.x_length,
                    arena_y: arena.y_length,
                });
            }
        }
        Ok(())
    }
}

/// Geometry whose sampled points are measured from the animal's viewpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReferenceGeometry {
    /// Rectangle inferred from the observed head positions.
    Boundary {
        /// Subdivisions per wall; each wall carries `points_per_side + 1` points.
        points_per_side: usize,
        /// Distance the rectangle extends beyond the observed extents.
        padding: f64,
    },
    /// Inserted barrier; carries `points + 1` points between its endpoints.
    Barrier { barrier: Barrier, points: usize },
}

impl ReferenceGeometry {
    /// Arena boundary with the default 30 subdivisions and 1 unit padding.
    #[must_use]
    pub fn boundary() -> Self {
        ReferenceGeometry::Boundary {
            points_per_side: 30,
            padding: 1.0,
        }
    }

    /// Barrier with the default 10 subdivisions.
    #[must_use]
    pub fn barrier(barrier: Barrier) -> Self {
        ReferenceGeometry::Barrier {
            barrier,
            points: 10,
        }
    }

    /// Number of reference points this geometry yields.
    #[must_use]
    pub fn point_count(&self) -> usize {
        match self {
            ReferenceGeometry::Boundary {
                points_per_side, ..
            } => 4 * (points_per_side + 1),
            ReferenceGeometry::Barrier { points, .. } => points + 1,
        }
    }
}
