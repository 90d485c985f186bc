use approx::assert_relative_eq;
use chess_overlay::calib::ManualCalibrationIds;
use chess_overlay::{
    CalibrationSource, CalibrationStatus, DetectedMarker, DetectorError, MarkerId, OverlaySession,
    SessionConfig, Square, TickOutcome,
};
use nalgebra::Point2;

/// Axis-aligned marker outline centred on `(x, y)`.
fn marker(id: MarkerId, x: f32, y: f32) -> DetectedMarker {
    let h = 5.0;
    DetectedMarker::new(
        id,
        [
            Point2::new(x - h, y - h),
            Point2::new(x + h, y - h),
            Point2::new(x + h, y + h),
            Point2::new(x - h, y + h),
        ],
    )
}

/// Corner markers on a 500 px square. After the 0.8 inset the playing
/// surface spans 50..450 on both axes, so square `(row, col)` is centred on
/// `(75 + 50 col, 75 + 50 row)`.
fn corners() -> Vec<DetectedMarker> {
    vec![
        marker(0, 0.0, 500.0),
        marker(1, 500.0, 500.0),
        marker(2, 0.0, 0.0),
        marker(3, 500.0, 0.0),
    ]
}

fn piece_on(id: MarkerId, square: Square) -> DetectedMarker {
    marker(id, 75.0 + 50.0 * square.col as f32, 75.0 + 50.0 * square.row as f32)
}

fn sq(name: &str) -> Square {
    let b = name.as_bytes();
    let col = b[0] - b'a';
    let rank = b[1] - b'0';
    Square::new(8 - rank, col).expect("square")
}

fn with_pieces(pieces: &[DetectedMarker]) -> Vec<DetectedMarker> {
    let mut frame = corners();
    frame.extend_from_slice(pieces);
    frame
}

fn running(config: SessionConfig) -> OverlaySession {
    let mut session = OverlaySession::new(config).expect("session");
    session.start();
    session
}

#[test]
fn first_tick_calibrates_and_places_pieces() {
    let mut session = running(SessionConfig::default());
    let report = session.tick(&with_pieces(&[piece_on(12, sq("e2"))]), 0);

    assert_eq!(report.outcome, TickOutcome::Updated);
    let change = report.status_change.expect("status change");
    assert_eq!(change.from, CalibrationStatus::default());
    assert_eq!(
        change.to,
        CalibrationStatus::Calibrated {
            source: CalibrationSource::Corners { visible: 4 }
        }
    );
    let occupancy = report.occupancy.expect("occupancy");
    assert_eq!(occupancy.get(sq("e2")), Some(12));
    assert_eq!(occupancy.pieces().count(), 1);
    assert_eq!(report.unmapped, 0);
}

#[test]
fn corner_markers_are_never_pieces_and_off_board_markers_are_counted() {
    let mut session = running(SessionConfig::default());
    let report = session.tick(&with_pieces(&[marker(20, 700.0, 250.0)]), 0);
    assert_eq!(report.unmapped, 1);
    let occupancy = report.occupancy.expect("occupancy");
    assert!(occupancy.is_empty());
}

#[test]
fn tracker_runs_at_most_once_per_interval() {
    let mut session = running(SessionConfig::default());
    let frame = with_pieces(&[piece_on(12, sq("c3"))]);
    let mut updated = Vec::new();
    for t in (0..=400).step_by(50) {
        let report = session.tick(&frame, t);
        if report.updated() {
            updated.push(t);
        } else {
            assert_eq!(report.outcome, TickOutcome::Throttled, "tick at {t}");
        }
    }
    assert_eq!(updated, vec![0, 200, 400]);
    // initial 4, then +1 per update
    assert_eq!(session.tracker().cell(sq("c3")).confidence, 6);
}

#[test]
fn only_markers_seen_since_the_last_update_count() {
    let mut session = running(SessionConfig::default());
    session.tick(&with_pieces(&[piece_on(12, sq("d4"))]), 0);
    assert_eq!(session.stable().get(sq("d4")), Some(12));

    // Seen between updates: still counts at the next update.
    session.tick(&with_pieces(&[piece_on(12, sq("d4"))]), 100);
    session.tick(&corners(), 200);
    assert_eq!(session.tracker().cell(sq("d4")).confidence, 5);

    // Gone from the camera. The registry remembers it, the tracker does not.
    session.tick(&corners(), 400);
    session.tick(&corners(), 600);
    assert_eq!(session.tracker().cell(sq("d4")).confidence, 3);
    assert_eq!(session.stable().get(sq("d4")), Some(12));
    session.tick(&corners(), 800);
    assert_eq!(session.stable().get(sq("d4")), None);
    assert!(session.registry().get(12).is_some());
}

#[test]
fn freshest_marker_wins_a_shared_square() {
    let mut session = running(SessionConfig {
        min_update_interval_ms: 0,
        ..SessionConfig::default()
    });
    // Same timestamp: the higher id is applied last.
    let report = session.tick(
        &with_pieces(&[piece_on(13, sq("f6")), piece_on(12, sq("f6"))]),
        0,
    );
    let occupancy = report.occupancy.expect("occupancy");
    assert_eq!(occupancy.get(sq("f6")), Some(13));
    assert_eq!(session.tracker().last_stats().square_collisions, 1);
}

#[test]
fn a_piece_moved_between_squares_settles_on_the_new_one() {
    let mut session = running(SessionConfig {
        min_update_interval_ms: 0,
        ..SessionConfig::default()
    });
    for t in 0..6 {
        session.tick(&with_pieces(&[piece_on(30, sq("g1"))]), t);
    }
    assert_eq!(session.stable().get(sq("g1")), Some(30));

    let mut t = 6;
    while session.stable().find(30) != Some(sq("f3")) || session.stable().pieces().count() > 1 {
        session.tick(&with_pieces(&[piece_on(30, sq("f3"))]), t);
        t += 1;
        assert!(t < 30, "piece never settled");
    }
    assert_eq!(session.stable().get(sq("g1")), None);
}

#[test]
fn calibration_survives_brief_loss_of_corners() {
    let mut session = running(SessionConfig::default());
    let piece = [piece_on(12, sq("a1"))];
    session.tick(&with_pieces(&piece), 0);

    // Corners stay in the registry for 3 s after their last sighting.
    for t in [1000, 2000, 2999] {
        let report = session.tick(&piece, t);
        assert!(report.status_change.is_none(), "tick at {t}");
        assert!(session.frame().is_some());
    }

    let report = session.tick(&piece, 3000);
    assert_eq!(report.outcome, TickOutcome::Uncalibrated);
    match report.status_change.map(|c| c.to) {
        Some(CalibrationStatus::Uncalibrated {
            reason: Some(reason),
        }) => assert!(reason.contains("corner"), "{reason}"),
        other => panic!("unexpected transition {other:?}"),
    }
    assert!(session.frame().is_none());

    let report = session.tick(&with_pieces(&piece), 3100);
    assert!(report.status.has_frame());
}

#[test]
fn two_visible_corners_give_a_partial_frame() {
    let mut session = running(SessionConfig::default());
    let frame = [marker(0, 0.0, 500.0), marker(3, 500.0, 0.0), piece_on(7, sq("h8"))];
    let report = session.tick(&frame, 0);
    assert_eq!(report.status, CalibrationStatus::Partial { visible: 2 });
    assert_eq!(report.occupancy.expect("occupancy").get(sq("h8")), Some(7));
}

/// King 60 and queen 59 double as calibration markers.
fn king_queen_config() -> SessionConfig {
    SessionConfig {
        calibration: chess_overlay::calib::CalibrationParams {
            manual: Some(ManualCalibrationIds {
                origin: 60,
                reference: 59,
            }),
            ..Default::default()
        },
        ..SessionConfig::default()
    }
}

#[test]
fn king_and_queen_calibrate_when_corners_are_missing() {
    let mut session = running(king_queen_config());
    let report = session.tick(&[piece_on(60, sq("e1")), piece_on(59, sq("d1"))], 0);
    assert_eq!(
        report.status,
        CalibrationStatus::Calibrated {
            source: CalibrationSource::Manual
        }
    );
    // Calibration pieces are still pieces.
    let occupancy = report.occupancy.expect("occupancy");
    assert_eq!(occupancy.get(sq("e1")), Some(60));
    assert_eq!(occupancy.get(sq("d1")), Some(59));
}

#[test]
fn king_and_queen_frame_is_dropped_and_rebuilt() {
    let manual = CalibrationStatus::Calibrated {
        source: CalibrationSource::Manual,
    };
    let mut session = running(king_queen_config());
    session.tick(&[marker(60, 275.0, 425.0), marker(59, 225.0, 425.0)], 0);
    assert_eq!(session.status(), &manual);
    assert_relative_eq!(
        session.frame().expect("frame").a1,
        Point2::new(75.0, 425.0),
        epsilon = 1e-3
    );

    // Both markers expire from the registry.
    let report = session.tick(&[], 5000);
    assert!(session.registry().is_empty());
    assert_eq!(report.outcome, TickOutcome::Uncalibrated);
    assert!(matches!(
        report.status_change.map(|c| c.to),
        Some(CalibrationStatus::Uncalibrated { reason: Some(_) })
    ));
    assert!(session.frame().is_none());

    // The pair reappears 50 px to the right.
    let report = session.tick(&[marker(60, 325.0, 425.0), marker(59, 275.0, 425.0)], 6000);
    assert_eq!(report.status, manual);
    assert_relative_eq!(
        session.frame().expect("frame").a1,
        Point2::new(125.0, 425.0),
        epsilon = 1e-3
    );
}

#[test]
fn corners_take_over_from_king_and_queen() {
    let mut session = running(king_queen_config());
    let pair = [piece_on(60, sq("e1")), piece_on(59, sq("d1"))];
    session.tick(&pair, 0);
    assert_eq!(
        session.status(),
        &CalibrationStatus::Calibrated {
            source: CalibrationSource::Manual
        }
    );

    let report = session.tick(&with_pieces(&pair), 100);
    assert_eq!(
        report.status_change.map(|c| c.to),
        Some(CalibrationStatus::Calibrated {
            source: CalibrationSource::Corners { visible: 4 }
        })
    );
    assert_relative_eq!(
        session.frame().expect("frame").a1,
        Point2::new(50.0, 450.0),
        epsilon = 1e-3
    );
}

#[test]
fn stop_clears_state_and_halts_ticks() {
    let mut session = running(SessionConfig::default());
    session.tick(&with_pieces(&[piece_on(12, sq("e4"))]), 0);
    assert!(!session.stable().is_empty());

    session.stop();
    assert!(!session.is_running());
    assert!(session.registry().is_empty());
    assert!(session.frame().is_none());
    assert!(session.stable().is_empty());
    assert_eq!(session.status(), &CalibrationStatus::default());

    let report = session.tick(&with_pieces(&[piece_on(12, sq("e4"))]), 100);
    assert_eq!(report.outcome, TickOutcome::Stopped);
    assert!(session.registry().is_empty());

    session.start();
    let report = session.tick(&with_pieces(&[piece_on(12, sq("e4"))]), 200);
    assert_eq!(report.outcome, TickOutcome::Updated);
}

#[test]
fn detector_failure_skips_the_frame_only() {
    let mut session = running(SessionConfig::default());
    let mut calls = 0;
    let mut detector = || {
        calls += 1;
        if calls == 2 {
            Err(DetectorError::new("frame grab timed out"))
        } else {
            Ok(with_pieces(&[piece_on(12, sq("b7"))]))
        }
    };

    assert!(session.tick_with(&mut detector, 0).updated());
    let failed = session.tick_with(&mut detector, 200);
    assert_eq!(failed.outcome, TickOutcome::DetectorFailed);
    assert_eq!(failed.detector_error.as_deref(), Some("frame grab timed out"));
    assert!(session.is_running());
    assert_eq!(session.tracker().cell(sq("b7")).confidence, 4);

    let next = session.tick_with(&mut detector, 400);
    assert!(next.updated());
    assert_eq!(session.tracker().cell(sq("b7")).confidence, 5);
}

#[test]
fn summaries_flag_markers_not_seen_recently() {
    let mut session = running(SessionConfig::default());
    session.tick(&with_pieces(&[piece_on(12, sq("e2"))]), 0);
    session.tick(&corners(), 1500);
    let list = session.summaries(1500);
    let ids: Vec<_> = list.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 12]);
    let piece = list.iter().find(|s| s.id == 12).expect("piece listed");
    assert!(!piece.active);
    assert_eq!((piece.x, piece.y), (275, 375));
    assert!(list.iter().filter(|s| s.id < 4).all(|s| s.active));
}
