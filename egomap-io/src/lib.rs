//! egomap-io: Memory-mapped input and tuning-map output for egomap.
//!
//! Tracking (DeepLabCut) and neural event CSV files are read through
//! memmap2. Computed maps are written as CSV with a JSON summary, or as
//! HDF5/NeXus with the `hdf5` feature.
//!

mod error;
#[cfg(feature = "hdf5")]
pub mod hdf5;
mod reader;
mod writer;

pub use error::{Error, Result};
#[cfg(feature = "hdf5")]
pub use hdf5::{read_rate_hdf5, write_session_hdf5, StoredRate};
pub use reader::{
    parse_events, parse_tracking, read_events, read_tracking, MappedFileReader, CELL_COLUMN,
    TIME_COLUMN,
};
pub use writer::{
    file_stem, write_output_csv, write_summary_json, CellSummary, MapWriter, SessionSummary,
};
