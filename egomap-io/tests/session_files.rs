#![allow(clippy::cast_precision_loss)]
use egomap_algorithms::{process_session, PlotKind, Session};
use egomap_core::{ArenaExtents, PipelineConfig, SessionConfig};
use egomap_io::{read_events, read_tracking, MapWriter};
use std::fmt::Write as _;
use std::fs;
use tempfile::tempdir;

fn dlc_csv(frames: usize) -> String {
    let mut text = String::from(
        "scorer,net,net,net,net,net,net\n\
         bodyparts,Left Ear,Left Ear,Left Ear,Right Ear,Right Ear,Right Ear\n\
         coords,x,y,likelihood,x,y,likelihood\n",
    );
    for i in 0..frames {
        let t = i as f64 * 0.05;
        let (hx, hy) = (320.0 + 140.0 * t.cos(), 240.0 + 110.0 * t.sin());
        // One low-confidence frame the reconstruction has to bridge.
        let likelihood = if i == 17 { 0.02 } else { 0.95 };
        writeln!(
            text,
            "{i},{},{},{likelihood},{},{},0.97",
            hx - 4.0,
            hy,
            hx + 4.0,
            hy
        )
        .unwrap();
    }
    text
}

fn events_csv() -> String {
    let mut text = String::from("Time (s), Cell Name, Value\n");
    for i in 0..20 {
        writeln!(text, "{}, C01,1", f64::from(i) * 0.4).unwrap();
        writeln!(text, "{}, C03,1", f64::from(i) * 0.25 + 0.1).unwrap();
    }
    text
}

#[test]
fn test_files_to_maps() {
    let dir = tempdir().unwrap();
    let tracking_path = dir.path().join("day_1_tracking.csv");
    let events_path = dir.path().join("day_1_events.csv");
    fs::write(&tracking_path, dlc_csv(240)).unwrap();
    fs::write(&events_path, events_csv()).unwrap();

    let tracking = read_tracking(&tracking_path).unwrap();
    let events = read_events(&events_path).unwrap();
    assert_eq!(tracking.len(), 240);
    assert_eq!(events.cell_names(), vec![" C01", " C03"]);

    let config = PipelineConfig::new(SessionConfig::new(30, ArenaExtents::new(60.0, 60.0)));
    let session = Session::new("day_1", tracking, events);
    let maps = process_session(&session, &config, &PlotKind::ALL).unwrap();
    assert_eq!(maps.cells.len(), 2);

    let writer = MapWriter::create(dir.path().join("maps")).unwrap();
    let written = writer.write_session(&maps).unwrap();
    // Four kinds per cell without a barrier, plus the summary.
    assert_eq!(written.len(), 2 * 4 + 1);

    let ebc = fs::read_to_string(writer.dir().join("day_1_C01_ebc_boundary.csv")).unwrap();
    // Header plus 120 bearing rows and the closing row.
    assert_eq!(ebc.lines().count(), 1 + 121);
    assert!(ebc.starts_with("bearing\\distance,0,2.5,5"));
}
