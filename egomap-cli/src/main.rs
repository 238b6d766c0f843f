//! egomap CLI
//!
//! Computes egocentric boundary, positional, and head-direction tuning maps
//! from DeepLabCut tracking and neural event CSV files.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand, ValueEnum};
use egomap_algorithms::{
    cell_number, cells_present_every_day, max_cell_number, process_longitudinal, process_session,
    reconstruct_head_poses, CellFilter, DayGroup, PlotKind, Session, SessionMaps, SessionSet,
};
use egomap_core::{ArenaExtents, Barrier, PipelineConfig, Point};
use egomap_io::{read_events, read_tracking, MapWriter};
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    EgomapIo(#[from] egomap_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] egomap_core::Error),

    #[error("Invalid configuration file: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),
}

/// Tuning output selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    /// Head path with event positions
    Trajectory,
    /// Egocentric rate map against the arena walls
    EbcBoundary,
    /// Egocentric rate map against the inserted barrier
    EbcBarrier,
    /// Egocentric rate map against walls and barrier
    EbcBoundaryBarrier,
    /// Positional rate map
    Heatmap,
    /// Head-direction tuning curve
    HdCurve,
}

impl From<Kind> for PlotKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Trajectory => PlotKind::Trajectory,
            Kind::EbcBoundary => PlotKind::EbcBoundary,
            Kind::EbcBarrier => PlotKind::EbcBarrier,
            Kind::EbcBoundaryBarrier => PlotKind::EbcBoundaryBarrier,
            Kind::Heatmap => PlotKind::Heatmap,
            Kind::HdCurve => PlotKind::HdCurve,
        }
    }
}

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One CSV per cell and kind, plus a JSON summary
    Csv,
    /// One HDF5/NeXus file per session (requires the `hdf5` feature)
    Hdf5,
}

/// Session parameters shared by the computing subcommands.
#[derive(clap::Args, Debug)]
struct SessionArgs {
    /// Pipeline configuration as JSON; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Video frame rate in Hz
    #[arg(long)]
    framerate: Option<u32>,

    /// Arena length along x
    #[arg(long)]
    arena_x: Option<f64>,

    /// Arena length along y
    #[arg(long)]
    arena_y: Option<f64>,

    /// Output kinds (default: all)
    #[arg(short, long = "kind", value_enum)]
    kinds: Vec<Kind>,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "csv")]
    format: Format,
}

/// Egocentric and spatial tuning maps from head tracking and neural events.
#[derive(Parser)]
#[command(name = "egomap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute tuning maps for one session
    Compute {
        /// DeepLabCut tracking CSV
        #[arg(long)]
        tracking: PathBuf,

        /// Neural event CSV
        #[arg(long)]
        events: PathBuf,

        /// Session id used in output names (default: tracking file stem)
        #[arg(long)]
        session_id: Option<String>,

        /// Inserted barrier as x1,y1,x2,y2 in arena units
        #[arg(long, value_parser = parse_barrier)]
        barrier: Option<Barrier>,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Compute tuning maps for sessions grouped by day
    Longitudinal {
        /// Session as DAY=TRACKING,EVENTS (repeatable)
        #[arg(long = "session", required = true, value_parser = parse_day_session)]
        sessions: Vec<DaySession>,

        /// Only keep cells that have events on every day
        #[arg(long)]
        every_day: bool,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Show information about a tracking file
    Info {
        /// DeepLabCut tracking CSV
        tracking: PathBuf,

        /// Optional neural event CSV
        #[arg(long)]
        events: Option<PathBuf>,

        /// Likelihood threshold used for the quality summary
        #[arg(long, default_value = "0.1")]
        threshold: f64,
    },

    /// List cells in event files, one file per day
    Cells {
        /// Neural event CSV files
        #[arg(required = true)]
        events: Vec<PathBuf>,
    },
}

/// One `--session` argument of the longitudinal command.
#[derive(Debug, Clone)]
struct DaySession {
    day: String,
    tracking: PathBuf,
    events: PathBuf,
}

fn parse_barrier(value: &str) -> std::result::Result<Barrier, String> {
    let coords = value
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid barrier coordinate: {e}"))?;
    match coords.as_slice() {
        [x1, y1, x2, y2] => Ok(Barrier::new(Point::new(*x1, *y1), Point::new(*x2, *y2))),
        _ => Err(format!("expected x1,y1,x2,y2, got {} values", coords.len())),
    }
}

fn parse_day_session(value: &str) -> std::result::Result<DaySession, String> {
    let (day, files) = value
        .split_once('=')
        .ok_or_else(|| "expected DAY=TRACKING,EVENTS".to_string())?;
    let (tracking, events) = files
        .split_once(',')
        .ok_or_else(|| "expected TRACKING,EVENTS after '='".to_string())?;
    Ok(DaySession {
        day: day.to_string(),
        tracking: PathBuf::from(tracking),
        events: PathBuf::from(events),
    })
}

fn load_config(args: &SessionArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => PipelineConfig::default(),
    };
    if let Some(framerate) = args.framerate {
        config.session.framerate_hz = framerate;
    }
    if args.arena_x.is_some() || args.arena_y.is_some() {
        config.session.arena = ArenaExtents::new(
            args.arena_x.unwrap_or(config.session.arena.x_length),
            args.arena_y.unwrap_or(config.session.arena.y_length),
        );
    }
    config.validate()?;
    Ok(config)
}

fn selected_kinds(args: &SessionArgs) -> Vec<PlotKind> {
    if args.kinds.is_empty() {
        PlotKind::ALL.to_vec()
    } else {
        args.kinds.iter().map(|&k| PlotKind::from(k)).collect()
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map_or_else(|| "session".to_string(), ToString::to_string)
}

/// HDF5 file of one session inside `output`, named like the CSV outputs.
#[cfg_attr(not(feature = "hdf5"), allow(dead_code))]
fn hdf5_path(output: &Path, session_id: &str) -> PathBuf {
    output.join(format!("{}.h5", egomap_io::file_stem(session_id)))
}

fn write_maps(maps: &SessionMaps, output: &Path, format: Format) -> Result<usize> {
    match format {
        Format::Csv => {
            let writer = MapWriter::create(output)?;
            Ok(writer.write_session(maps)?.len())
        }
        #[cfg(feature = "hdf5")]
        Format::Hdf5 => {
            std::fs::create_dir_all(output)?;
            let path = hdf5_path(output, &maps.session_id);
            egomap_io::write_session_hdf5(&path, maps)?;
            Ok(1)
        }
        #[cfg(not(feature = "hdf5"))]
        Format::Hdf5 => Err(CliError::Argument(
            "HDF5 output requires building with the `hdf5` feature".to_string(),
        )),
    }
}

fn print_session(maps: &SessionMaps) {
    println!("Session: {} ({} frames)", maps.session_id, maps.frames);
    for cell in &maps.cells {
        let kinds: Vec<String> = cell.outputs.iter().map(|(k, _)| k.to_string()).collect();
        println!(
            "  {:<8} {:>6} spikes  {}",
            cell.cell.trim(),
            cell.spike_count,
            kinds.join(", ")
        );
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compute {
            tracking,
            events,
            session_id,
            barrier,
            session: args,
        } => {
            let config = load_config(&args)?;
            let kinds = selected_kinds(&args);
            let start = Instant::now();

            let id = session_id.unwrap_or_else(|| file_stem(&tracking));
            let mut session = Session::new(id, read_tracking(&tracking)?, read_events(&events)?);
            if let Some(barrier) = barrier {
                session = session.with_barrier(barrier);
            }
            info!(
                "session {}: {} frames, {} events",
                session.id,
                session.tracking.len(),
                session.events.len()
            );

            let maps = process_session(&session, &config, &kinds)?;
            let files = write_maps(&maps, &args.output, args.format)?;

            print_session(&maps);
            println!(
                "Wrote {} files to {} in {:.2}s",
                files,
                args.output.display(),
                start.elapsed().as_secs_f64()
            );
        }

        Commands::Longitudinal {
            sessions,
            every_day,
            session: args,
        } => {
            let config = load_config(&args)?;
            let kinds = selected_kinds(&args);
            let start = Instant::now();

            let mut labels: Vec<String> = Vec::new();
            for entry in &sessions {
                if !labels.contains(&entry.day) {
                    labels.push(entry.day.clone());
                }
            }
            let mut days = Vec::with_capacity(labels.len());
            for label in labels {
                let mut day_sessions = Vec::new();
                for entry in sessions.iter().filter(|s| s.day == label) {
                    let id = format!("{}_{}", label, file_stem(&entry.tracking));
                    day_sessions.push(Session::new(
                        id,
                        read_tracking(&entry.tracking)?,
                        read_events(&entry.events)?,
                    ));
                }
                days.push(DayGroup::new(label, SessionSet::new(day_sessions)?));
            }

            let filter = if every_day {
                CellFilter::EveryDay
            } else {
                CellFilter::Any
            };
            let results = process_longitudinal(&days, &config, &kinds, filter)?;

            let mut files = 0;
            for (label, day_maps) in &results {
                println!("Day: {}", label);
                for maps in day_maps {
                    files += write_maps(maps, &args.output, args.format)?;
                    print_session(maps);
                }
            }
            println!(
                "Wrote {} files to {} in {:.2}s",
                files,
                args.output.display(),
                start.elapsed().as_secs_f64()
            );
        }

        Commands::Info {
            tracking,
            events,
            threshold,
        } => {
            let data = read_tracking(&tracking)?;
            println!("File: {}", tracking.display());
            println!("Frames: {}", data.len());

            for marker in [egomap_core::Marker::LeftEar, egomap_core::Marker::RightEar] {
                let likelihood = data.likelihood(marker);
                let low = likelihood.iter().filter(|&&l| l.is_nan() || l < threshold).count();
                println!(
                    "{}: {} of {} samples below likelihood {} ({:.1}%)",
                    marker,
                    low,
                    likelihood.len(),
                    threshold,
                    100.0 * low as f64 / likelihood.len().max(1) as f64
                );
            }

            let poses = reconstruct_head_poses(&data, &PipelineConfig::default().reconstruction)?;
            if let (Some((x_min, x_max)), Some((y_min, y_max))) = (poses.x_range(), poses.y_range())
            {
                println!("Head X range: {:.2} - {:.2}", x_min, x_max);
                println!("Head Y range: {:.2} - {:.2}", y_min, y_max);
            }

            if let Some(events) = events {
                let table = read_events(&events)?;
                let cells = table.cell_names();
                println!("Events: {} across {} cells", table.len(), cells.len());
                if let (Some(first), Some(last)) = (
                    table.time_s.iter().copied().reduce(f64::min),
                    table.time_s.iter().copied().reduce(f64::max),
                ) {
                    println!("Event time range: {:.3} - {:.3} s", first, last);
                }
            }
        }

        Commands::Cells { events } => {
            let mut days = Vec::with_capacity(events.len());
            for path in &events {
                let table = read_events(path)?;
                let cells = table.cell_names();
                let numbered = cells.iter().filter(|c| cell_number(c).is_some()).count();
                println!(
                    "{}: {} cells ({} numbered)",
                    path.display(),
                    cells.len(),
                    numbered
                );
                let label = file_stem(path);
                let set = SessionSet::new(vec![Session::new(
                    label.clone(),
                    egomap_core::TrackingData::default(),
                    table,
                )])?;
                days.push(DayGroup::new(label, set));
            }

            println!("Max cell number: {}", max_cell_number(&days));
            let shared = cells_present_every_day(&days);
            println!("Cells present in every file: {}", shared.len());
            for name in shared {
                println!("  {}", name.trim());
            }
        }
    }

    Ok(())
}
