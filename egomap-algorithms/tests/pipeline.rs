#![allow(clippy::cast_precision_loss, clippy::float_cmp)]
use egomap_algorithms::{
    align_events, fill_gaps, heatmap, hd_curve, measure_all, process_longitudinal,
    process_session, reconstruct_head_poses, CellFilter, DayGroup, PlotKind, PlotOutput, Session,
    SessionSet,
};
use egomap_core::{
    ArenaExtents, Barrier, Error, EventTable, HdCurveConfig, HeatmapConfig, PipelineConfig, Point,
    ReconstructionConfig, ReferenceGeometry, SessionConfig, SpikeTrain, TrackingData,
};

/// Animal circling the arena centre with ears one unit either side of the head.
fn circling_tracking(frames: usize) -> TrackingData {
    let mut tracking = TrackingData::with_capacity(frames);
    for i in 0..frames {
        let t = i as f64 * 0.05;
        let (hx, hy) = (300.0 + 150.0 * t.cos(), 250.0 + 120.0 * t.sin());
        let (dx, dy) = (-t.sin(), t.cos());
        tracking.push(hx - dy, hy + dx, 0.99, hx + dy, hy - dx, 0.98);
    }
    tracking
}

fn events(frames: usize, framerate: f64) -> EventTable {
    let mut table = EventTable::new();
    for i in (0..frames).step_by(7) {
        table.push(i as f64 / framerate, " C02");
    }
    for i in (3..frames).step_by(11) {
        table.push(i as f64 / framerate, " C00");
    }
    table
}

fn config(arena: ArenaExtents) -> PipelineConfig {
    PipelineConfig::new(SessionConfig::new(30, arena))
}

fn nan_eq(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}

#[test]
fn test_event_rounds_to_nearest_frame() {
    let train = align_events(4, 1, &[2.4]).unwrap();
    assert_eq!(train.as_slice(), &[0, 0, 1, 0]);
}

#[test]
fn test_gap_of_three_interpolated() {
    let values = [10.0, 0.0, 0.0, 0.0, 50.0];
    let valid = [true, false, false, false, true];
    assert_eq!(
        fill_gaps(&values, &valid).unwrap(),
        vec![10.0, 20.0, 30.0, 40.0, 50.0]
    );
}

#[test]
fn test_headings_in_range() {
    let poses =
        reconstruct_head_poses(&circling_tracking(400), &ReconstructionConfig::default()).unwrap();
    assert_eq!(poses.len(), 400);
    assert!(poses.heading.iter().all(|h| (0.0..360.0).contains(h)));
}

#[test]
fn test_no_barrier_computes_boundary_only() {
    let session = Session::new("day1-a", circling_tracking(300), events(300, 30.0));
    let maps = process_session(
        &session,
        &config(ArenaExtents::new(60.0, 71.0)),
        &PlotKind::ALL,
    )
    .unwrap();

    assert_eq!(maps.frames, 300);
    let names: Vec<&str> = maps.cells.iter().map(|c| c.cell.as_str()).collect();
    assert_eq!(names, vec![" C00", " C02"]);

    for cell in &maps.cells {
        assert!(cell.spike_count > 0);
        assert!(cell.get(PlotKind::EbcBarrier).is_none());
        assert!(cell.get(PlotKind::EbcBoundaryBarrier).is_none());
        match cell.get(PlotKind::EbcBoundary) {
            Some(PlotOutput::RateMap(map)) => {
                // cutoff = 71 / 2 = 35.5 -> ceil(35.5 / 2.5) = 15 distance bins
                assert_eq!(map.shape(), (120, 15));
            }
            other => panic!("expected boundary rate map, got {other:?}"),
        }
        assert!(cell.get(PlotKind::Heatmap).is_some());
        assert!(cell.get(PlotKind::HdCurve).is_some());
        assert!(cell.get(PlotKind::Trajectory).is_some());
    }
}

#[test]
fn test_barrier_kinds_with_barrier() {
    let barrier = Barrier::new(Point::new(20.0, 30.0), Point::new(40.0, 30.0));
    let session =
        Session::new("day1-b", circling_tracking(300), events(300, 30.0)).with_barrier(barrier);
    let maps = process_session(
        &session,
        &config(ArenaExtents::new(60.0, 60.0)),
        &[PlotKind::EbcBarrier, PlotKind::EbcBoundaryBarrier],
    )
    .unwrap();

    for cell in &maps.cells {
        assert_eq!(cell.outputs.len(), 2);
    }
}

#[test]
fn test_barrier_outside_arena_rejected() {
    let barrier = Barrier::new(Point::new(20.0, 30.0), Point::new(80.0, 30.0));
    let session =
        Session::new("bad", circling_tracking(50), events(50, 30.0)).with_barrier(barrier);
    let err = process_session(
        &session,
        &config(ArenaExtents::new(60.0, 60.0)),
        &[PlotKind::EbcBarrier],
    )
    .unwrap_err();
    assert!(matches!(err, Error::BarrierOutOfBounds { .. }));
}

#[test]
fn test_rerun_is_identical() {
    let session = Session::new("repeat", circling_tracking(250), events(250, 30.0));
    let cfg = config(ArenaExtents::new(60.0, 60.0));
    let first = process_session(&session, &cfg, &PlotKind::ALL).unwrap();
    let second = process_session(&session, &cfg, &PlotKind::ALL).unwrap();

    assert_eq!(first.cells.len(), second.cells.len());
    for (a, b) in first.cells.iter().zip(&second.cells) {
        assert_eq!(a.cell, b.cell);
        for ((kind_a, out_a), (kind_b, out_b)) in a.outputs.iter().zip(&b.outputs) {
            assert_eq!(kind_a, kind_b);
            match (out_a, out_b) {
                (PlotOutput::RateMap(x), PlotOutput::RateMap(y)) => {
                    assert!(x.rate.iter().zip(y.rate.iter()).all(|(p, q)| nan_eq(*p, *q)));
                }
                (PlotOutput::Curve(x), PlotOutput::Curve(y)) => {
                    assert!(x.rate.iter().zip(&y.rate).all(|(p, q)| nan_eq(*p, *q)));
                }
                (PlotOutput::Trajectory(x), PlotOutput::Trajectory(y)) => assert_eq!(x, y),
                _ => panic!("output variants differ for {kind_a}"),
            }
        }
    }
}

#[test]
fn test_zero_events_give_zero_rates() {
    let poses =
        reconstruct_head_poses(&circling_tracking(200), &ReconstructionConfig::default()).unwrap();
    let spikes = SpikeTrain::zeros(200);
    let session = SessionConfig::default();

    let map = heatmap(&poses, &spikes, &session, &HeatmapConfig::default()).unwrap();
    assert!(map.rate.iter().filter(|v| v.is_finite()).all(|&v| v == 0.0));

    let curve = hd_curve(&poses, &spikes, &session, &HdCurveConfig::default()).unwrap();
    assert!(curve.rate.iter().filter(|v| v.is_finite()).all(|&v| v == 0.0));
}

#[test]
fn test_measurement_ranges_with_barrier() {
    let poses =
        reconstruct_head_poses(&circling_tracking(120), &ReconstructionConfig::default()).unwrap();
    let barrier = Barrier::new(Point::new(250.0, 250.0), Point::new(350.0, 250.0));
    let m = measure_all(
        &poses,
        &[
            ReferenceGeometry::boundary(),
            ReferenceGeometry::barrier(barrier),
        ],
    )
    .unwrap();
    assert_eq!(m.points(), 124 + 11);
    assert!(m.distances.iter().all(|&d| d >= 0.0));
    assert!(m.bearings.iter().all(|&b| (0.0..360.0).contains(&b)));
}

#[test]
fn test_longitudinal_every_day_filter() {
    let mut day2_events = EventTable::new();
    day2_events.push(0.5, " C2");
    day2_events.push(1.5, " C05");

    let day1 = DayGroup::new(
        "day_1",
        SessionSet::new(vec![Session::new(
            "d1",
            circling_tracking(120),
            events(120, 30.0),
        )])
        .unwrap(),
    );
    let day2 = DayGroup::new(
        "day_2",
        SessionSet::new(vec![Session::new("d2", circling_tracking(120), day2_events)]).unwrap(),
    );
    let days = [day1, day2];
    let cfg = config(ArenaExtents::new(60.0, 60.0));

    let all = process_longitudinal(&days, &cfg, &[PlotKind::Heatmap], CellFilter::Any).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].0, "day_1");
    assert_eq!(all[0].1[0].cells.len(), 2);
    assert_eq!(all[1].1[0].cells.len(), 2);

    let kept =
        process_longitudinal(&days, &cfg, &[PlotKind::Heatmap], CellFilter::EveryDay).unwrap();
    let day1_cells: Vec<&str> = kept[0].1[0].cells.iter().map(|c| c.cell.as_str()).collect();
    let day2_cells: Vec<&str> = kept[1].1[0].cells.iter().map(|c| c.cell.as_str()).collect();
    assert_eq!(day1_cells, vec![" C02"]);
    assert_eq!(day2_cells, vec![" C2"]);
}
