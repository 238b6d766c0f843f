//! Reconstructed head pose sequences.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Head position and heading per frame.
///
/// `heading` is in degrees, wrapped into `[0, 360)`, with 0 meaning the
/// animal faces East in arena coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeadPoses {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub heading: Vec<f64>,
}

impl HeadPoses {
    /// Builds a pose sequence from parallel columns.
    ///
    /// # Errors
    /// Returns [`Error::LengthMismatch`] if the columns differ in length.
    pub fn new(x: Vec<f64>, y: Vec<f64>, heading: Vec<f64>) -> Result<Self> {
        for (what, len) in [("head y", y.len()), ("heading", heading.len())] {
            if len != x.len() {
                return Err(Error::LengthMismatch {
                    what: what.to_string(),
                    expected: x.len(),
                    actual: len,
                });
            }
        }
        Ok(Self { x, y, heading })
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Returns true if there are no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Minimum and maximum head x.
    #[must_use]
    pub fn x_range(&self) -> Option<(f64, f64)> {
        min_max(&self.x)
    }

    /// Minimum and maximum head y.
    #[must_use]
    pub fn y_range(&self) -> Option<(f64, f64)> {
        min_max(&self.y)
    }
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().copied().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_poses_ranges() {
        let poses = HeadPoses::new(
            vec![3.0, -1.0, 7.5],
            vec![0.0, 2.0, 1.0],
            vec![0.0, 90.0, 180.0],
        )
        .unwrap();

        assert_eq!(poses.len(), 3);
        assert_eq!(poses.x_range(), Some((-1.0, 7.5)));
        assert_eq!(poses.y_range(), Some((0.0, 2.0)));
    }

    #[test]
    fn test_head_poses_empty_range() {
        let poses = HeadPoses::default();
        assert!(poses.is_empty());
        assert_eq!(poses.x_range(), None);
    }

    #[test]
    fn test_head_poses_length_mismatch() {
        let err = HeadPoses::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0]).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { actual: 1, .. }));
    }
}
