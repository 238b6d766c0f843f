//! Plot-kind dispatch over a prepared session.

use crate::egocentric::{measure, EgocentricMeasurements};
use crate::tuning::{ebc_ratemap, hd_curve, heatmap, trajectory};
use egomap_core::{
    Barrier, Error, GeometryConfig, HeadPoses, PipelineConfig, ReferenceGeometry, Result,
    SpikeTrain, Trajectory, TuningCurve, TuningMap,
};
use log::{debug, warn};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kinds of tuning output that can be computed per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlotKind {
    /// Head path with event positions.
    Trajectory,
    /// Egocentric rate map against the arena walls.
    EbcBoundary,
    /// Egocentric rate map against an inserted barrier.
    EbcBarrier,
    /// Egocentric rate map against walls and barrier together.
    EbcBoundaryBarrier,
    /// Positional rate map.
    Heatmap,
    /// Head-direction tuning curve.
    HdCurve,
}

impl PlotKind {
    /// Every kind, in output order.
    pub const ALL: [PlotKind; 6] = [
        PlotKind::Trajectory,
        PlotKind::EbcBoundary,
        PlotKind::EbcBarrier,
        PlotKind::EbcBoundaryBarrier,
        PlotKind::Heatmap,
        PlotKind::HdCurve,
    ];

    /// Canonical snake-case name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PlotKind::Trajectory => "trajectory",
            PlotKind::EbcBoundary => "ebc_boundary",
            PlotKind::EbcBarrier => "ebc_barrier",
            PlotKind::EbcBoundaryBarrier => "ebc_boundary_barrier",
            PlotKind::Heatmap => "heatmap",
            PlotKind::HdCurve => "hd_curve",
        }
    }

    /// Whether the output is drawn on polar axes.
    #[must_use]
    pub fn is_polar(self) -> bool {
        matches!(
            self,
            PlotKind::EbcBoundary
                | PlotKind::EbcBarrier
                | PlotKind::EbcBoundaryBarrier
                | PlotKind::HdCurve
        )
    }

    /// Whether the kind needs a barrier.
    #[must_use]
    pub fn requires_barrier(self) -> bool {
        matches!(self, PlotKind::EbcBarrier | PlotKind::EbcBoundaryBarrier)
    }

    /// Whether the kind needs boundary measurements.
    #[must_use]
    pub fn requires_boundary(self) -> bool {
        matches!(self, PlotKind::EbcBoundary | PlotKind::EbcBoundaryBarrier)
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlotKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        match key.as_str() {
            "trajectory" | "spike_plot" | "spike" => Ok(PlotKind::Trajectory),
            "ebc_boundary" => Ok(PlotKind::EbcBoundary),
            "ebc_barrier" => Ok(PlotKind::EbcBarrier),
            "ebc_boundary_barrier" => Ok(PlotKind::EbcBoundaryBarrier),
            "heatmap" => Ok(PlotKind::Heatmap),
            "hd_curve" => Ok(PlotKind::HdCurve),
            _ => Err(Error::UnknownPlotKind(s.to_string())),
        }
    }
}

/// Result of one plot kind for one cell.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PlotOutput {
    Trajectory(Trajectory),
    RateMap(TuningMap),
    Curve(TuningCurve),
}

fn boundary_geometry(config: &GeometryConfig) -> ReferenceGeometry {
    ReferenceGeometry::Boundary {
        points_per_side: config.boundary_points_per_side,
        padding: config.boundary_padding,
    }
}

fn barrier_geometry(barrier: Barrier, config: &GeometryConfig) -> ReferenceGeometry {
    ReferenceGeometry::Barrier {
        barrier,
        points: config.barrier_points,
    }
}

/// Poses and egocentric measurements shared by every cell of a session.
///
/// Measurements for the kinds passed to [`PreparedSession::new`] are cached;
/// other kinds are measured on demand.
#[derive(Debug, Clone)]
pub struct PreparedSession {
    pub poses: HeadPoses,
    pub barrier: Option<Barrier>,
    pub config: PipelineConfig,
    boundary: Option<EgocentricMeasurements>,
    inserted: Option<EgocentricMeasurements>,
    combined: Option<EgocentricMeasurements>,
}

impl PreparedSession {
    /// Measures the geometry needed by `kinds`.
    ///
    /// # Errors
    /// Propagates measurement errors.
    pub fn new(
        poses: HeadPoses,
        barrier: Option<Barrier>,
        config: PipelineConfig,
        kinds: &[PlotKind],
    ) -> Result<Self> {
        let mut prepared = Self {
            poses,
            barrier,
            config,
            boundary: None,
            inserted: None,
            combined: None,
        };
        if kinds.iter().any(|k| k.requires_boundary()) {
            prepared.boundary = Some(prepared.measure_boundary()?);
        }
        if let Some(barrier) = prepared.barrier {
            if kinds.iter().any(|k| k.requires_barrier()) {
                prepared.inserted = Some(prepared.measure_barrier(barrier)?);
            }
            if let (true, Some(walls), Some(inserted)) = (
                kinds.contains(&PlotKind::EbcBoundaryBarrier),
                &prepared.boundary,
                &prepared.inserted,
            ) {
                prepared.combined = Some(EgocentricMeasurements::concat(&[walls, inserted])?);
            }
        }
        debug!(
            "prepared session: {} frames, boundary {}, barrier {}",
            prepared.poses.len(),
            prepared.boundary.is_some(),
            prepared.inserted.is_some()
        );
        Ok(prepared)
    }

    /// Number of frames.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.poses.len()
    }

    fn measure_boundary(&self) -> Result<EgocentricMeasurements> {
        measure(&self.poses, &boundary_geometry(&self.config.geometry))
    }

    fn measure_barrier(&self, barrier: Barrier) -> Result<EgocentricMeasurements> {
        measure(&self.poses, &barrier_geometry(barrier, &self.config.geometry))
    }

    /// Egocentric measurements for an EBC kind, or `None` if the kind needs a
    /// barrier and the session has none.
    fn ebc_measurements(&self, kind: PlotKind) -> Result<Option<Cow<'_, EgocentricMeasurements>>> {
        let cached = match kind {
            PlotKind::EbcBoundary => &self.boundary,
            PlotKind::EbcBarrier => &self.inserted,
            _ => &self.combined,
        };
        if let Some(m) = cached {
            return Ok(Some(Cow::Borrowed(m)));
        }
        if kind == PlotKind::EbcBoundary {
            return Ok(Some(Cow::Owned(self.measure_boundary()?)));
        }
        let Some(barrier) = self.barrier else {
            return Ok(None);
        };
        let inserted = self.measure_barrier(barrier)?;
        if kind == PlotKind::EbcBarrier {
            return Ok(Some(Cow::Owned(inserted)));
        }
        let walls = self.measure_boundary()?;
        Ok(Some(Cow::Owned(EgocentricMeasurements::concat(&[
            &walls, &inserted,
        ])?)))
    }

    /// Computes one kind for one spike train.
    ///
    /// Returns `Ok(None)` for barrier kinds when the session has no barrier.
    ///
    /// # Errors
    /// Propagates estimator errors, including length mismatches between the
    /// spike train and the session.
    pub fn compute_plot(&self, kind: PlotKind, spikes: &SpikeTrain) -> Result<Option<PlotOutput>> {
        let config = &self.config;
        let output = match kind {
            PlotKind::Trajectory => PlotOutput::Trajectory(trajectory(&self.poses, spikes)?),
            PlotKind::EbcBoundary | PlotKind::EbcBarrier | PlotKind::EbcBoundaryBarrier => {
                let Some(m) = self.ebc_measurements(kind)? else {
                    warn!("skipping {kind}: no barrier set for this session");
                    return Ok(None);
                };
                PlotOutput::RateMap(ebc_ratemap(&m, spikes, &config.session, &config.ebc)?)
            }
            PlotKind::Heatmap => PlotOutput::RateMap(heatmap(
                &self.poses,
                spikes,
                &config.session,
                &config.heatmap,
            )?),
            PlotKind::HdCurve => PlotOutput::Curve(hd_curve(
                &self.poses,
                spikes,
                &config.session,
                &config.hd_curve,
            )?),
        };
        Ok(Some(output))
    }
}
