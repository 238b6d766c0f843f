//! Memory-mapped tracking and event readers.
//!
//! Both inputs are comma-separated text. Tracking files follow the
//! DeepLabCut layout: three header rows (`scorer`, `bodyparts`, `coords`),
//! then one row per frame whose first column is the frame index. Event files
//! have a single header row naming their columns.
#![allow(clippy::doc_markdown)]

use crate::{Error, Result};
use egomap_core::{Axis, EventTable, Marker, TrackingData};
use log::{debug, warn};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Event file column holding timestamps in seconds.
pub const TIME_COLUMN: &str = "Time (s)";
/// Event file column holding cell labels; the leading space is significant.
pub const CELL_COLUMN: &str = " Cell Name";

const MARKERS: [Marker; 2] = [Marker::LeftEar, Marker::RightEar];

/// A memory-mapped file reader.
///
/// Uses memmap2 to access file contents without loading the entire file
/// into memory.
pub struct MappedFileReader {
    mmap: Option<Mmap>,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // Zero-length files cannot be mapped on every platform.
        let mmap = if file.metadata()?.len() == 0 {
            None
        } else {
            // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
            // This is the standard safety contract for memory mapping.
            #[allow(unsafe_code)]
            let mmap = unsafe { Mmap::map(&file)? };
            Some(mmap)
        };
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Path the reader was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File contents as UTF-8 text.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if the file is not valid UTF-8.
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(self.as_bytes()).map_err(|e| {
            Error::InvalidFormat(format!("{} is not UTF-8: {e}", self.path.display()))
        })
    }
}

/// Splits one CSV record, honouring double-quoted fields.
///
/// Whitespace inside fields is preserved.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Non-blank lines with their 1-based line numbers, line endings stripped.
fn records(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty())
}

fn parse_number(field: &str, line: usize, column: &str) -> Result<f64> {
    field.trim().parse::<f64>().map_err(|_| {
        Error::InvalidFormat(format!(
            "line {line}: cannot parse '{field}' in column {column} as a number"
        ))
    })
}

/// Column indices of one marker's `x`, `y`, `likelihood`.
#[derive(Debug, Clone, Copy)]
struct MarkerColumns {
    x: usize,
    y: usize,
    likelihood: usize,
}

fn locate_marker(bodyparts: &[String], coords: &[String], marker: Marker) -> Result<MarkerColumns> {
    let find = |coord: &str| {
        bodyparts
            .iter()
            .zip(coords)
            .position(|(part, c)| part.trim() == marker.label() && c.trim() == coord)
            .ok_or_else(|| Error::MissingColumn(format!("{} {coord}", marker.label())))
    };
    Ok(MarkerColumns {
        x: find(&Axis::X.to_string())?,
        y: find(&Axis::Y.to_string())?,
        likelihood: find("likelihood")?,
    })
}

/// Parses DeepLabCut tracking text.
///
/// An empty field marks that marker as undetected for the frame: its
/// likelihood is read as 0 so reconstruction treats the sample as missing.
///
/// # Errors
/// Returns [`Error::EmptyFile`] without header or data rows,
/// [`Error::MissingColumn`] when an ear marker column is absent, and
/// [`Error::InvalidFormat`] for short rows or unparsable numbers.
pub fn parse_tracking(text: &str) -> Result<TrackingData> {
    let mut rows = records(text);
    let mut header = Vec::with_capacity(3);
    for _ in 0..3 {
        let (_, line) = rows
            .next()
            .ok_or_else(|| Error::EmptyFile("tracking header is incomplete".into()))?;
        header.push(split_record(line));
    }
    let (bodyparts, coords) = (&header[1], &header[2]);
    let columns = [
        locate_marker(bodyparts, coords, MARKERS[0])?,
        locate_marker(bodyparts, coords, MARKERS[1])?,
    ];
    let width = columns
        .iter()
        .flat_map(|c| [c.x, c.y, c.likelihood])
        .max()
        .unwrap_or(0)
        + 1;

    let mut tracking = TrackingData::default();
    let mut undetected = 0usize;
    for (line_no, line) in rows {
        let fields = split_record(line);
        if fields.len() < width {
            return Err(Error::InvalidFormat(format!(
                "line {line_no}: expected at least {width} fields, found {}",
                fields.len()
            )));
        }
        let mut values = [0.0; 6];
        for (slot, (marker, cols)) in MARKERS.iter().zip(&columns).enumerate() {
            let (x, y, likelihood) = (&fields[cols.x], &fields[cols.y], &fields[cols.likelihood]);
            if [x, y, likelihood].iter().any(|f| f.trim().is_empty()) {
                undetected += 1;
                values[slot * 3] = f64::NAN;
                values[slot * 3 + 1] = f64::NAN;
                values[slot * 3 + 2] = 0.0;
                continue;
            }
            let label = marker.label();
            values[slot * 3] = parse_number(x, line_no, &format!("{label} x"))?;
            values[slot * 3 + 1] = parse_number(y, line_no, &format!("{label} y"))?;
            values[slot * 3 + 2] = parse_number(likelihood, line_no, &format!("{label} likelihood"))?;
        }
        tracking.push(values[0], values[1], values[2], values[3], values[4], values[5]);
    }

    if tracking.is_empty() {
        return Err(Error::EmptyFile("tracking file has no frames".into()));
    }
    if undetected > 0 {
        warn!("{undetected} marker samples had empty fields and were marked undetected");
    }
    Ok(tracking)
}

/// Reads a DeepLabCut tracking CSV through a memory map.
///
/// # Errors
/// See [`parse_tracking`]; I/O errors are returned as [`Error::Io`].
pub fn read_tracking<P: AsRef<Path>>(path: P) -> Result<TrackingData> {
    let reader = MappedFileReader::open(path)?;
    if reader.is_empty() {
        return Err(Error::EmptyFile(reader.path().display().to_string()));
    }
    let tracking = parse_tracking(reader.as_str()?)?;
    debug!(
        "read {} tracking frames from {}",
        tracking.len(),
        reader.path().display()
    );
    Ok(tracking)
}

fn find_column(header: &[String], name: &str) -> Result<usize> {
    header
        .iter()
        .position(|h| h == name)
        .or_else(|| header.iter().position(|h| h.trim() == name.trim()))
        .ok_or_else(|| Error::MissingColumn(format!("'{name}'")))
}

/// Parses event text with `Time (s)` and ` Cell Name` columns.
///
/// Column names are matched exactly first, then ignoring surrounding
/// whitespace. Cell labels are kept verbatim.
///
/// # Errors
/// Returns [`Error::EmptyFile`] without a header, [`Error::MissingColumn`]
/// when either column is absent, and [`Error::InvalidFormat`] for short rows
/// or unparsable times.
pub fn parse_events(text: &str) -> Result<EventTable> {
    let mut rows = records(text);
    let (_, header) = rows
        .next()
        .ok_or_else(|| Error::EmptyFile("event file has no header".into()))?;
    let header = split_record(header);
    let time_col = find_column(&header, TIME_COLUMN)?;
    let cell_col = find_column(&header, CELL_COLUMN)?;

    let mut table = EventTable::new();
    for (line_no, line) in rows {
        let fields = split_record(line);
        let (Some(time), Some(cell)) = (fields.get(time_col), fields.get(cell_col)) else {
            return Err(Error::InvalidFormat(format!(
                "line {line_no}: expected at least {} fields, found {}",
                time_col.max(cell_col) + 1,
                fields.len()
            )));
        };
        table.push(parse_number(time, line_no, TIME_COLUMN)?, cell.as_str());
    }
    Ok(table)
}

/// Reads a neural event CSV through a memory map.
///
/// # Errors
/// See [`parse_events`]; I/O errors are returned as [`Error::Io`].
pub fn read_events<P: AsRef<Path>>(path: P) -> Result<EventTable> {
    let reader = MappedFileReader::open(path)?;
    if reader.is_empty() {
        return Err(Error::EmptyFile(reader.path().display().to_string()));
    }
    let table = parse_events(reader.as_str()?)?;
    debug!(
        "read {} events for {} cells from {}",
        table.len(),
        table.cell_names().len(),
        reader.path().display()
    );
    Ok(table)
}
