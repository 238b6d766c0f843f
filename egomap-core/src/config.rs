//! Pipeline configuration.
//!
//! Every stage has its own configuration struct with defaults matching the
//! values used for published EBC, heatmap, and head-direction figures.
//! [`PipelineConfig`] bundles them for a full session run.

use crate::error::{Error, Result};
use crate::geometry::ArenaExtents;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Session-level acquisition parameters shared by every stage.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Video frame rate in Hz.
    pub framerate_hz: u32,
    /// Physical arena size.
    pub arena: ArenaExtents,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            framerate_hz: 30,
            arena: ArenaExtents::new(60.0, 60.0),
        }
    }
}

impl SessionConfig {
    /// Creates a session configuration.
    #[must_use]
    pub fn new(framerate_hz: u32, arena: ArenaExtents) -> Self {
        Self {
            framerate_hz,
            arena,
        }
    }

    /// Duration of one frame in seconds.
    #[must_use]
    pub fn frame_duration(&self) -> f64 {
        1.0 / f64::from(self.framerate_hz)
    }

    /// Checks the frame rate and arena extents.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] for a zero frame rate or a
    /// non-positive arena length.
    pub fn validate(&self) -> Result<()> {
        if self.framerate_hz == 0 {
            return Err(Error::ConfigError("framerate must be positive".into()));
        }
        self.arena.validate()
    }
}

/// Position reconstruction parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReconstructionConfig {
    /// Marker samples with likelihood below this are treated as missing.
    pub likelihood_threshold: f64,
    /// Samples with `|z|` above this are treated as missing.
    pub outlier_z: f64,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            likelihood_threshold: 0.1,
            outlier_z: 2.0,
        }
    }
}

impl ReconstructionConfig {
    /// Sets the likelihood threshold.
    #[must_use]
    pub fn with_likelihood_threshold(mut self, threshold: f64) -> Self {
        self.likelihood_threshold = threshold;
        self
    }

    /// Sets the outlier z-score cutoff.
    #[must_use]
    pub fn with_outlier_z(mut self, z: f64) -> Self {
        self.outlier_z = z;
        self
    }

    /// # Errors
    /// Returns [`Error::ConfigError`] for a non-finite threshold or a
    /// non-positive z cutoff.
    pub fn validate(&self) -> Result<()> {
        if !self.likelihood_threshold.is_finite() {
            return Err(Error::ConfigError(
                "likelihood threshold must be finite".into(),
            ));
        }
        if self.outlier_z.is_nan() || self.outlier_z <= 0.0 {
            return Err(Error::ConfigError(format!(
                "outlier z cutoff must be positive, got {}",
                self.outlier_z
            )));
        }
        Ok(())
    }
}

/// Reference point sampling for egocentric measurements.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeometryConfig {
    /// Subdivisions per arena wall.
    pub boundary_points_per_side: usize,
    /// How far walls sit beyond the observed head extents.
    pub boundary_padding: f64,
    /// Subdivisions along an inserted barrier.
    pub barrier_points: usize,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            boundary_points_per_side: 30,
            boundary_padding: 1.0,
            barrier_points: 10,
        }
    }
}

/// Egocentric boundary-cell rate map parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EbcConfig {
    /// Bearing bin width in degrees.
    pub bearing_bin_deg: f64,
    /// Distance bin width in arena units.
    pub distance_bin: f64,
    /// Gaussian smoothing sigma in bins.
    pub sigma: f64,
    /// Keep NaN at zero-occupancy bins after smoothing.
    pub preserve_nan: bool,
}

impl Default for EbcConfig {
    fn default() -> Self {
        Self {
            bearing_bin_deg: 3.0,
            distance_bin: 2.5,
            sigma: 2.0,
            preserve_nan: false,
        }
    }
}

/// Positional rate map parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HeatmapConfig {
    /// Square bin width in arena units.
    pub bin_size: f64,
    /// Gaussian smoothing sigma in bins.
    pub sigma: f64,
    /// Keep NaN at unvisited bins after smoothing.
    pub preserve_nan: bool,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            bin_size: 3.0,
            sigma: 1.0,
            preserve_nan: false,
        }
    }
}

/// Head-direction tuning curve parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HdCurveConfig {
    /// Heading bin width in degrees.
    pub bin_deg: f64,
}

impl Default for HdCurveConfig {
    fn default() -> Self {
        Self { bin_deg: 12.0 }
    }
}

/// Full configuration for a session run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    pub session: SessionConfig,
    pub reconstruction: ReconstructionConfig,
    pub geometry: GeometryConfig,
    pub ebc: EbcConfig,
    pub heatmap: HeatmapConfig,
    pub hd_curve: HdCurveConfig,
    /// Rescale head positions from tracker pixels onto the arena extents.
    pub scale_to_arena: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            reconstruction: ReconstructionConfig::default(),
            geometry: GeometryConfig::default(),
            ebc: EbcConfig::default(),
            heatmap: HeatmapConfig::default(),
            hd_curve: HdCurveConfig::default(),
            scale_to_arena: true,
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration for the given session parameters.
    #[must_use]
    pub fn new(session: SessionConfig) -> Self {
        Self {
            session,
            ..Self::default()
        }
    }

    /// Validates every stage.
    ///
    /// # Errors
    /// Returns the first [`Error::ConfigError`] found.
    pub fn validate(&self) -> Result<()> {
        self.session.validate()?;
        self.reconstruction.validate()?;

        let widths = [
            ("ebc bearing bin", self.ebc.bearing_bin_deg),
            ("ebc distance bin", self.ebc.distance_bin),
            ("heatmap bin", self.heatmap.bin_size),
            ("head-direction bin", self.hd_curve.bin_deg),
        ];
        for (name, value) in widths {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::ConfigError(format!(
                    "{name} width must be positive, got {value}"
                )));
            }
        }
        for (name, value) in [("ebc", self.ebc.sigma), ("heatmap", self.heatmap.sigma)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::ConfigError(format!(
                    "{name} smoothing sigma must be non-negative, got {value}"
                )));
            }
        }
        if self.geometry.boundary_points_per_side == 0 || self.geometry.barrier_points == 0 {
            return Err(Error::ConfigError(
                "reference geometry needs at least one subdivision".into(),
            ));
        }
        Ok(())
    }
}
