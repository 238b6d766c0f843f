//! Raw ear-marker tracking data.
//!
//! Tracking is stored in Structure of Arrays (`SoA`) layout: one column per
//! marker coordinate, one row per video frame. The frame index is implicit.

use crate::error::{Error, Result};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tracked body-part marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Marker {
    LeftEar,
    RightEar,
}

impl Marker {
    /// Label used for the marker in tracking file headers.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Marker::LeftEar => "Left Ear",
            Marker::RightEar => "Right Ear",
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Spatial axis of a marker coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

/// Per-frame left/right ear positions with detection likelihoods.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackingData {
    pub left_x: Vec<f64>,
    pub left_y: Vec<f64>,
    pub left_likelihood: Vec<f64>,
    pub right_x: Vec<f64>,
    pub right_y: Vec<f64>,
    pub right_likelihood: Vec<f64>,
}

impl TrackingData {
    /// Creates an empty sequence with room for `capacity` frames.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            left_x: Vec::with_capacity(capacity),
            left_y: Vec::with_capacity(capacity),
            left_likelihood: Vec::with_capacity(capacity),
            right_x: Vec::with_capacity(capacity),
            right_y: Vec::with_capacity(capacity),
            right_likelihood: Vec::with_capacity(capacity),
        }
    }

    /// Appends one frame.
    #[allow(clippy::too_many_arguments)]
    pub fn push(
        &mut self,
        left_x: f64,
        left_y: f64,
        left_likelihood: f64,
        right_x: f64,
        right_y: f64,
        right_likelihood: f64,
    ) {
        self.left_x.push(left_x);
        self.left_y.push(left_y);
        self.left_likelihood.push(left_likelihood);
        self.right_x.push(right_x);
        self.right_y.push(right_y);
        self.right_likelihood.push(right_likelihood);
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.left_x.len()
    }

    /// Returns true if there are no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left_x.is_empty()
    }

    /// Coordinate column for a marker and axis.
    #[must_use]
    pub fn coordinate(&self, marker: Marker, axis: Axis) -> &[f64] {
        match (marker, axis) {
            (Marker::LeftEar, Axis::X) => &self.left_x,
            (Marker::LeftEar, Axis::Y) => &self.left_y,
            (Marker::RightEar, Axis::X) => &self.right_x,
            (Marker::RightEar, Axis::Y) => &self.right_y,
        }
    }

    /// Likelihood column for a marker.
    #[must_use]
    pub fn likelihood(&self, marker: Marker) -> &[f64] {
        match marker {
            Marker::LeftEar => &self.left_likelihood,
            Marker::RightEar => &self.right_likelihood,
        }
    }

    /// Checks that every column has the same number of frames.
    ///
    /// # Errors
    /// Returns [`Error::LengthMismatch`] naming the first offending column.
    pub fn validate(&self) -> Result<()> {
        let expected = self.len();
        let columns: [(&str, usize); 5] = [
            ("left ear y", self.left_y.len()),
            ("left ear likelihood", self.left_likelihood.len()),
            ("right ear x", self.right_x.len()),
            ("right ear y", self.right_y.len()),
            ("right ear likelihood", self.right_likelihood.len()),
        ];
        for (what, actual) in columns {
            if actual != expected {
                return Err(Error::LengthMismatch {
                    what: what.to_string(),
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_push_and_columns() {
        let mut data = TrackingData::with_capacity(2);
        assert!(data.is_empty());

        data.push(1.0, 2.0, 0.9, 3.0, 4.0, 0.8);
        data.push(1.5, 2.5, 0.95, 3.5, 4.5, 0.05);

        assert_eq!(data.len(), 2);
        assert_eq!(data.coordinate(Marker::LeftEar, Axis::Y), &[2.0, 2.5]);
        assert_eq!(data.coordinate(Marker::RightEar, Axis::X), &[3.0, 3.5]);
        assert_eq!(data.likelihood(Marker::RightEar), &[0.8, 0.05]);
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_tracking_validate_mismatch() {
        let mut data = TrackingData::default();
        data.push(1.0, 2.0, 0.9, 3.0, 4.0, 0.8);
        data.right_y.pop();

        let err = data.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                expected: 1,
                actual: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_marker_display() {
        assert_eq!(Marker::LeftEar.to_string(), "Left Ear");
        assert_eq!(format!("{} {}", Marker::RightEar, Axis::Y), "Right Ear y");
    }
}
