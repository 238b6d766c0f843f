//! egomap-core: Core types and configuration for tuning-map computation.
//!
//! This crate provides the data model shared by the egomap pipeline:
//! raw ear-marker tracking, reconstructed head poses, reference geometry,
//! spike trains, and the binned tuning maps produced from them.
//!

pub mod config;
pub mod error;
pub mod geometry;
pub mod pose;
pub mod spike;
pub mod tracking;
pub mod tuning;

pub use config::{
    EbcConfig, GeometryConfig, HdCurveConfig, HeatmapConfig, PipelineConfig,
    ReconstructionConfig, SessionConfig,
};
pub use error::{Error, Result};
pub use geometry::{ArenaExtents, Barrier, Point, ReferenceGeometry};
pub use pose::HeadPoses;
pub use spike::{EventTable, SpikeTrain};
pub use tracking::{Axis, Marker, TrackingData};
pub use tuning::{BinAxis, Trajectory, TuningCurve, TuningMap};
