//! Error types for egomap-core.

use crate::geometry::Point;
use crate::tracking::{Axis, Marker};
use thiserror::Error;

/// Result type alias for egomap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for egomap operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Input sequence has no samples.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// A marker coordinate has no valid sample left after filtering.
    #[error("no valid samples for {marker} {axis} after likelihood and outlier filtering")]
    MissingCoordinate { marker: Marker, axis: Axis },

    /// Parallel columns disagree in length.
    #[error("length mismatch for {what}: expected {expected}, found {actual}")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// A dimension has zero span and cannot be scaled or binned.
    #[error("degenerate axis: {0}")]
    DegenerateAxis(String),

    /// Event timestamp is not a finite number.
    #[error("invalid event timestamp: {0}")]
    InvalidTimestamp(f64),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Barrier endpoint lies outside the arena.
    #[error("barrier endpoint ({}, {}) lies outside the {arena_x} x {arena_y} arena", point.x, point.y)]
    BarrierOutOfBounds {
        point: Point,
        arena_x: f64,
        arena_y: f64,
    },

    /// Plot kind name not recognized.
    #[error("unknown plot kind: {0}")]
    UnknownPlotKind(String),
}
