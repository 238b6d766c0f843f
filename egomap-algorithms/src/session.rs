//! Session batch processing and longitudinal cell bookkeeping.
//!
//! A session pairs one tracking recording with one event table. Sessions
//! recorded on the same day form a [`DayGroup`]; cells are matched across
//! days by the number in their label (`" C07"` is cell 7).

use crate::alignment::align_events;
use crate::plot::{PlotKind, PlotOutput, PreparedSession};
use crate::reconstruction::{reconstruct_head_poses, scale_to_arena};
use egomap_core::{Barrier, Error, EventTable, PipelineConfig, Result, TrackingData};
use log::{debug, info};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One recording: tracking, events, and an optional inserted barrier.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub tracking: TrackingData,
    pub events: EventTable,
    pub barrier: Option<Barrier>,
}

impl Session {
    /// Creates a session without a barrier.
    #[must_use]
    pub fn new(id: impl Into<String>, tracking: TrackingData, events: EventTable) -> Self {
        Self {
            id: id.into(),
            tracking,
            events,
            barrier: None,
        }
    }

    /// Sets the inserted barrier.
    #[must_use]
    pub fn with_barrier(mut self, barrier: Barrier) -> Self {
        self.barrier = Some(barrier);
        self
    }
}

/// Ordered sessions with unique ids, fixed once built.
#[derive(Debug, Clone, Default)]
pub struct SessionSet {
    sessions: Vec<Session>,
}

impl SessionSet {
    /// # Errors
    /// Returns [`Error::ConfigError`] if two sessions share an id.
    pub fn new(sessions: Vec<Session>) -> Result<Self> {
        let mut seen = HashSet::new();
        for session in &sessions {
            if !seen.insert(session.id.as_str()) {
                return Err(Error::ConfigError(format!(
                    "duplicate session id '{}'",
                    session.id
                )));
            }
        }
        Ok(Self { sessions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Session> {
        self.sessions.iter()
    }

    /// Looks up a session by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }
}

impl<'a> IntoIterator for &'a SessionSet {
    type Item = &'a Session;
    type IntoIter = std::slice::Iter<'a, Session>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Sessions recorded on one day.
#[derive(Debug, Clone)]
pub struct DayGroup {
    pub label: String,
    pub sessions: SessionSet,
}

impl DayGroup {
    #[must_use]
    pub fn new(label: impl Into<String>, sessions: SessionSet) -> Self {
        Self {
            label: label.into(),
            sessions,
        }
    }

    /// Cell labels seen in any session of the day, sorted.
    #[must_use]
    pub fn cell_names(&self) -> Vec<String> {
        self.sessions
            .iter()
            .flat_map(|s| s.events.cell.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Outputs of every requested kind for one cell.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellMaps {
    pub cell: String,
    pub spike_count: usize,
    pub outputs: Vec<(PlotKind, PlotOutput)>,
}

impl CellMaps {
    /// Output for one kind, if it was computed.
    #[must_use]
    pub fn get(&self, kind: PlotKind) -> Option<&PlotOutput> {
        self.outputs
            .iter()
            .find_map(|(k, output)| (*k == kind).then_some(output))
    }
}

/// Outputs for every cell of one session, sorted by cell label.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionMaps {
    pub session_id: String,
    pub frames: usize,
    pub cells: Vec<CellMaps>,
}

/// Reconstructs poses and measures geometry for a session.
///
/// # Errors
/// Returns configuration errors (including a barrier outside the arena) and
/// data-quality errors from reconstruction.
pub fn prepare_session(
    session: &Session,
    config: &PipelineConfig,
    kinds: &[PlotKind],
) -> Result<PreparedSession> {
    config.validate()?;
    if let Some(barrier) = &session.barrier {
        barrier.validate_within(&config.session.arena)?;
    }
    let mut poses = reconstruct_head_poses(&session.tracking, &config.reconstruction)?;
    if config.scale_to_arena {
        poses = scale_to_arena(&poses, &config.session.arena)?;
    }
    PreparedSession::new(poses, session.barrier, config.clone(), kinds)
}

fn process_cell(
    prepared: &PreparedSession,
    events: &EventTable,
    cell: &str,
    kinds: &[PlotKind],
) -> Result<CellMaps> {
    let spikes = align_events(
        prepared.frames(),
        prepared.config.session.framerate_hz,
        &events.timestamps_for(cell),
    )?;
    let mut outputs = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        if let Some(output) = prepared.compute_plot(kind, &spikes)? {
            outputs.push((kind, output));
        }
    }
    Ok(CellMaps {
        cell: cell.to_string(),
        spike_count: spikes.spike_count(),
        outputs,
    })
}

/// Computes every requested kind for every cell in the session's events.
///
/// Cells are processed in parallel; the result is ordered by cell label.
///
/// # Errors
/// See [`prepare_session`]; estimator errors for any cell abort the run.
pub fn process_session(
    session: &Session,
    config: &PipelineConfig,
    kinds: &[PlotKind],
) -> Result<SessionMaps> {
    let prepared = prepare_session(session, config, kinds)?;
    let cells = session.events.cell_names();
    debug!(
        "session {}: {} frames, {} cells",
        session.id,
        prepared.frames(),
        cells.len()
    );

    let cells = cells
        .par_iter()
        .map(|cell| process_cell(&prepared, &session.events, cell, kinds))
        .collect::<Result<Vec<_>>>()?;

    info!(
        "session {}: computed {} kinds for {} cells",
        session.id,
        kinds.len(),
        cells.len()
    );
    Ok(SessionMaps {
        session_id: session.id.clone(),
        frames: prepared.frames(),
        cells,
    })
}

/// Which cells a longitudinal run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellFilter {
    /// Every cell seen on any day.
    #[default]
    Any,
    /// Only cells present on every day.
    EveryDay,
}

/// Processes every session of every day.
///
/// With [`CellFilter::EveryDay`], cells absent from any day are dropped from
/// every session's output.
///
/// # Errors
/// The first session error aborts the run.
pub fn process_longitudinal(
    days: &[DayGroup],
    config: &PipelineConfig,
    kinds: &[PlotKind],
    filter: CellFilter,
) -> Result<Vec<(String, Vec<SessionMaps>)>> {
    let keep: Option<BTreeSet<u32>> = match filter {
        CellFilter::Any => None,
        CellFilter::EveryDay => Some(
            cells_present_every_day(days)
                .iter()
                .filter_map(|name| cell_number(name))
                .collect(),
        ),
    };
    days.iter()
        .map(|day| {
            let maps = day
                .sessions
                .iter()
                .map(|session| {
                    let mut maps = process_session(session, config, kinds)?;
                    if let Some(keep) = &keep {
                        maps.cells
                            .retain(|c| cell_number(&c.cell).is_some_and(|n| keep.contains(&n)));
                    }
                    Ok(maps)
                })
                .collect::<Result<Vec<_>>>()?;
            Ok((day.label.clone(), maps))
        })
        .collect()
}

/// Number following `C` in a cell label, e.g. `" C07 "` is 7.
#[must_use]
pub fn cell_number(name: &str) -> Option<u32> {
    let trimmed = name.trim();
    trimmed.match_indices('C').find_map(|(at, _)| {
        let digits: String = trimmed[at + 1..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    })
}

/// Largest cell number recorded on any day, or 0 when no label carries one.
#[must_use]
pub fn max_cell_number(days: &[DayGroup]) -> u32 {
    days.iter()
        .flat_map(|day| day.sessions.iter())
        .flat_map(|session| session.events.cell.iter())
        .filter_map(|name| cell_number(name))
        .max()
        .unwrap_or(0)
}

/// Labels `" C0"` through `" C{max}"`, zero-padded to the width of `max`.
#[must_use]
pub fn padded_cell_names(max: u32) -> Vec<String> {
    let width = max.to_string().len();
    (0..=max).map(|i| format!(" C{i:0width$}")).collect()
}

/// Padded labels of cells with events on every day.
///
/// Labels are normalized through [`cell_number`], so `" C7"` on one day and
/// `" C07"` on another refer to the same cell.
#[must_use]
pub fn cells_present_every_day(days: &[DayGroup]) -> Vec<String> {
    if days.is_empty() {
        return Vec::new();
    }
    let max = max_cell_number(days);
    let per_day: Vec<BTreeSet<u32>> = days
        .iter()
        .map(|day| {
            day.cell_names()
                .iter()
                .filter_map(|name| cell_number(name))
                .collect()
        })
        .collect();
    padded_cell_names(max)
        .into_iter()
        .zip(0..)
        .filter(|(_, number)| per_day.iter().all(|cells| cells.contains(number)))
        .map(|(name, _)| name)
        .collect()
}
