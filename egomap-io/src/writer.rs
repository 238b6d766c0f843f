//! Writers for computed tuning outputs.

use crate::Result;
use egomap_algorithms::{CellMaps, PlotKind, PlotOutput, SessionMaps};
use egomap_core::{Trajectory, TuningCurve, TuningMap};
use log::debug;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Per-cell entry of a session summary.
#[derive(Debug, Clone, Serialize)]
pub struct CellSummary {
    pub cell: String,
    pub spike_count: usize,
    pub kinds: Vec<String>,
    /// Largest finite rate per kind, `null` when no bin is defined.
    pub peak_rates: Vec<(String, Option<f64>)>,
}

/// JSON summary of one processed session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub frames: usize,
    pub cells: Vec<CellSummary>,
}

fn peak(values: impl Iterator<Item = f64>) -> Option<f64> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
}

impl SessionSummary {
    /// Summarizes computed outputs.
    #[must_use]
    pub fn from_maps(maps: &SessionMaps) -> Self {
        let cells = maps
            .cells
            .iter()
            .map(|cell| CellSummary {
                cell: cell.cell.clone(),
                spike_count: cell.spike_count,
                kinds: cell.outputs.iter().map(|(k, _)| k.to_string()).collect(),
                peak_rates: cell
                    .outputs
                    .iter()
                    .filter_map(|(kind, output)| {
                        let rate = match output {
                            PlotOutput::RateMap(map) => map.peak_rate(),
                            PlotOutput::Curve(curve) => peak(curve.rate.iter().copied()),
                            PlotOutput::Trajectory(_) => return None,
                        };
                        Some((kind.to_string(), rate))
                    })
                    .collect(),
            })
            .collect();
        Self {
            session_id: maps.session_id.clone(),
            frames: maps.frames,
            cells,
        }
    }
}

/// File-name safe form of a session id or cell name.
///
/// Leading and trailing whitespace is dropped and every character outside
/// `[A-Za-z0-9_-]` becomes `_`.
#[must_use]
pub fn file_stem(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Writes tuning outputs as CSV files plus a JSON summary.
///
/// Files land in one output directory and are named
/// `{session}_{cell}_{kind}.csv`.
pub struct MapWriter {
    dir: PathBuf,
}

impl MapWriter {
    /// Creates the writer, creating `dir` if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes every output of every cell, then the summary.
    ///
    /// Returns the paths written.
    ///
    /// # Errors
    /// Returns an error if any file cannot be written.
    pub fn write_session(&self, maps: &SessionMaps) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for cell in &maps.cells {
            written.extend(self.write_cell(&maps.session_id, cell)?);
        }
        let summary_path = self
            .dir
            .join(format!("{}_summary.json", file_stem(&maps.session_id)));
        write_summary_json(&summary_path, &SessionSummary::from_maps(maps))?;
        written.push(summary_path);
        debug!(
            "wrote {} files for session {} to {}",
            written.len(),
            maps.session_id,
            self.dir.display()
        );
        Ok(written)
    }

    /// Writes every output of one cell.
    ///
    /// # Errors
    /// Returns an error if any file cannot be written.
    pub fn write_cell(&self, session_id: &str, cell: &CellMaps) -> Result<Vec<PathBuf>> {
        cell.outputs
            .iter()
            .map(|(kind, output)| {
                let path = self.dir.join(format!(
                    "{}_{}_{kind}.csv",
                    file_stem(session_id),
                    file_stem(&cell.cell)
                ));
                write_output_csv(&path, *kind, output)?;
                Ok(path)
            })
            .collect()
    }
}

/// Writes one output in the CSV layout of its kind.
///
/// Polar rate maps are written closed, with the first row repeated.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_output_csv<P: AsRef<Path>>(path: P, kind: PlotKind, output: &PlotOutput) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    match output {
        PlotOutput::RateMap(map) => write_map(&mut writer, map, kind.is_polar())?,
        PlotOutput::Curve(curve) => write_curve(&mut writer, curve)?,
        PlotOutput::Trajectory(trajectory) => write_trajectory(&mut writer, trajectory)?,
    }
    writer.flush()?;
    Ok(())
}

/// Rate map layout: header of column bin edges, then one row per row bin
/// starting with its left edge.
fn write_map<W: Write>(writer: &mut W, map: &TuningMap, closed: bool) -> Result<()> {
    let rate = if closed {
        map.closed_rate()
    } else {
        map.rate.clone()
    };
    write!(writer, "{}\\{}", map.rows.label, map.cols.label)?;
    for edge in &map.cols.edges()[..map.cols.count] {
        write!(writer, ",{edge}")?;
    }
    writeln!(writer)?;

    let row_edges = map.rows.edges();
    for (edge, row) in row_edges.iter().zip(rate.rows()) {
        write!(writer, "{edge}")?;
        for value in row {
            write!(writer, ",{value}")?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn write_curve<W: Write>(writer: &mut W, curve: &TuningCurve) -> Result<()> {
    writeln!(writer, "angle_deg,rate,occupancy_s")?;
    for (i, (angle, rate)) in curve.angles_deg.iter().zip(&curve.rate).enumerate() {
        let occupancy = curve.occupancy[i % curve.occupancy.len().max(1)];
        writeln!(writer, "{angle},{rate},{occupancy}")?;
    }
    Ok(())
}

fn write_trajectory<W: Write>(writer: &mut W, trajectory: &Trajectory) -> Result<()> {
    writeln!(writer, "kind,x,y,heading")?;
    for (x, y) in trajectory.path_x.iter().zip(&trajectory.path_y) {
        writeln!(writer, "path,{x},{y},")?;
    }
    for ((x, y), heading) in trajectory
        .spike_x
        .iter()
        .zip(&trajectory.spike_y)
        .zip(&trajectory.spike_heading)
    {
        writeln!(writer, "spike,{x},{y},{heading}")?;
    }
    Ok(())
}

/// Writes a session summary as pretty-printed JSON.
///
/// # Errors
/// Returns an error if the file cannot be written or serialization fails.
pub fn write_summary_json<P: AsRef<Path>>(path: P, summary: &SessionSummary) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use egomap_core::BinAxis;
    use ndarray::array;
    use tempfile::{tempdir, NamedTempFile};

    fn polar_map() -> TuningMap {
        TuningMap {
            rows: BinAxis::angular("bearing", 120.0),
            cols: BinAxis::linear("distance", "cm", 0.0, 2.5, 2),
            rate: array![[1.0, 2.0], [f64::NAN, 4.0], [5.0, 6.0]],
            occupancy: array![[1.0, 1.0], [0.0, 1.0], [1.0, 1.0]],
        }
    }

    #[test]
    fn test_write_map_closed() {
        let file = NamedTempFile::new().unwrap();
        write_output_csv(
            file.path(),
            PlotKind::EbcBoundary,
            &PlotOutput::RateMap(polar_map()),
        )
        .unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "bearing\\distance,0,2.5");
        assert_eq!(lines[1], "0,1,2");
        assert_eq!(lines[2], "120,NaN,4");
        assert_eq!(lines[4], "360,1,2");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_write_map_open_for_heatmap() {
        let file = NamedTempFile::new().unwrap();
        write_output_csv(file.path(), PlotKind::Heatmap, &PlotOutput::RateMap(polar_map()))
            .unwrap();
        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn test_write_curve_and_trajectory() {
        let curve = TuningCurve {
            bins: BinAxis::angular("heading", 180.0),
            angles_deg: vec![0.0, 180.0, 0.0],
            rate: vec![1.5, 0.5, 1.5],
            occupancy: vec![2.0, 4.0],
        };
        let file = NamedTempFile::new().unwrap();
        write_output_csv(file.path(), PlotKind::HdCurve, &PlotOutput::Curve(curve)).unwrap();
        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.starts_with("angle_deg,rate,occupancy_s\n0,1.5,2\n180,0.5,4\n0,1.5,2"));

        let trajectory = Trajectory {
            path_x: vec![1.0, 2.0],
            path_y: vec![3.0, 4.0],
            spike_x: vec![2.0],
            spike_y: vec![4.0],
            spike_heading: vec![90.0],
        };
        let file = NamedTempFile::new().unwrap();
        write_output_csv(
            file.path(),
            PlotKind::Trajectory,
            &PlotOutput::Trajectory(trajectory),
        )
        .unwrap();
        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.contains("path,1,3,\n"));
        assert!(content.contains("spike,2,4,90\n"));
    }

    #[test]
    fn test_file_stem_sanitizes() {
        assert_eq!(file_stem(" C01"), "C01");
        assert_eq!(file_stem("day 1/run:2"), "day_1_run_2");
        assert_eq!(file_stem("../up"), "___up");
    }

    #[test]
    fn test_write_session_files() {
        let dir = tempdir().unwrap();
        let writer = MapWriter::create(dir.path().join("out")).unwrap();
        let maps = SessionMaps {
            session_id: "day1 run".to_string(),
            frames: 3,
            cells: vec![CellMaps {
                cell: " C01".to_string(),
                spike_count: 2,
                outputs: vec![(PlotKind::EbcBoundary, PlotOutput::RateMap(polar_map()))],
            }],
        };

        let written = writer.write_session(&maps).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("day1_run_C01_ebc_boundary.csv"));
        assert!(written.iter().all(|p| p.exists()));

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&written[1]).unwrap()).unwrap();
        assert_eq!(summary["session_id"], "day1 run");
        assert_eq!(summary["cells"][0]["spike_count"], 2);
        assert_eq!(summary["cells"][0]["peak_rates"][0][1], 6.0);
    }
}
