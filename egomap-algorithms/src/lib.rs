//! egomap-algorithms: Pipeline stages for spatial and egocentric tuning.
//!
//! This crate turns raw tracking and neural events into tuning outputs:
//! - **Reconstruction** - ear markers to head position and heading
//! - **Egocentric** - bearing/distance to arena walls and barriers
//! - **Alignment** - event timestamps to frame-aligned spike trains
//! - **Tuning** - occupancy-normalized, Gaussian-smoothed rate maps
//!

pub mod alignment;
mod binning;
pub mod egocentric;
mod plot;
pub mod reconstruction;
mod session;
pub mod smoothing;
mod tuning;

pub use alignment::{align_events, frame_timestamps, nearest_frame};
pub use binning::RateAccumulator;
pub use egocentric::{measure, measure_all, reference_points, EgocentricMeasurements};
pub use plot::{PlotKind, PlotOutput, PreparedSession};
pub use reconstruction::{fill_gaps, reconstruct_head_poses, scale_to_arena};
pub use session::{
    cell_number, cells_present_every_day, max_cell_number, padded_cell_names, prepare_session,
    process_longitudinal, process_session, CellFilter, CellMaps, DayGroup, Session, SessionMaps,
    SessionSet,
};
pub use smoothing::{smooth, smooth_circular, GaussianKernel};
pub use tuning::{ebc_ratemap, hd_curve, heatmap, trajectory};
