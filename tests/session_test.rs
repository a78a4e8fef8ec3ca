//! Tests for the multi-source run: frame counting, resets, restart and quit


use face_landmark_vid::{
    camera::{CameraIntrinsics, CameraResolver},
    engines::Eye,
    input::UserCommand,
    pipeline::FramePipeline,
    session::{Session, SessionState},
    sinks::OutputMultiplexer,
    source::{SourceQueue, SourceSpec},
    visualisation::NoopRenderer,
    Error,
};
use std::path::PathBuf;
use test_helpers::*;

fn file(name: &str) -> SourceSpec {
    SourceSpec::File(PathBuf::from(name))
}

#[test]
fn test_two_files_restart_frame_counter() {
    let log = EventLog::new();
    let opener = FakeOpener::new(&log)
        .with_source(&file("a.avi"), 5, 64, 48)
        .with_source(&file("b.avi"), 3, 64, 48);
    let mut session = recording_session(
        &log,
        vec!["a.avi".into(), "b.avi".into()],
        opener,
        recording_engines(&log, true, false, None),
        ScriptedInput::default(),
    );

    let report = session.run().unwrap();

    assert_eq!(log.frames_of("display"), vec![0, 1, 2, 3, 4, 0, 1, 2]);
    assert_eq!(report.sources.len(), 2);
    assert_eq!(report.sources[0].frames, 5);
    assert_eq!(report.sources[1].frames, 3);
    assert!(!report.quit);
    assert_eq!(session.state(), SessionState::Done);

    // The second source starts from a fresh tracker
    let second_open = log
        .events()
        .iter()
        .position(|e| *e == Event::Opened(file("b.avi")))
        .unwrap();
    let events = log.events();
    let before_second = &events[..second_open];
    assert!(before_second.contains(&Event::DetectorReset));
    assert!(before_second.contains(&Event::AnalyserReset));
    assert!(before_second.contains(&Event::SinkFinished("display".to_string())));
    match events[second_open..].iter().find(|e| matches!(e, Event::Detect { .. })) {
        Some(Event::Detect { frames_since_reset, .. }) => assert_eq!(*frames_since_reset, 0),
        other => panic!("expected a detection, got {other:?}"),
    }
}

#[test]
fn test_detector_reset_after_last_source() {
    let log = EventLog::new();
    let opener = FakeOpener::new(&log).with_source(&file("only.avi"), 2, 32, 32);
    let mut session = recording_session(
        &log,
        vec!["only.avi".into()],
        opener,
        recording_engines(&log, false, false, None),
        ScriptedInput::default(),
    );

    session.run().unwrap();

    let events = log.events();
    let last_frame = events
        .iter()
        .rposition(|e| matches!(e, Event::SinkFrame { .. }))
        .unwrap();
    assert!(events[last_frame..].contains(&Event::DetectorReset));
    assert!(events[last_frame..].contains(&Event::AnalyserReset));
}

#[test]
fn test_restart_keeps_frame_counter() {
    let log = EventLog::new();
    let opener = FakeOpener::new(&log).with_source(&file("clip.avi"), 12, 64, 48);
    let mut session = recording_session(
        &log,
        vec!["clip.avi".into()],
        opener,
        recording_engines(&log, true, false, None),
        ScriptedInput::default().at(7, UserCommand::Restart),
    );

    let report = session.run().unwrap();

    assert_eq!(log.frames_of("display"), (0..12).collect::<Vec<u64>>());
    assert_eq!(report.sources[0].restarts, 1);

    // Frame 8 is the first frame seen by the reset tracker
    let detections: Vec<u64> = log
        .events()
        .iter()
        .filter_map(|e| match e {
            Event::Detect { frames_since_reset, .. } => Some(*frames_since_reset),
            _ => None,
        })
        .collect();
    assert_eq!(detections[7], 7);
    assert_eq!(detections[8], 0);
    assert_eq!(detections[11], 3);

    // Restart resets only the tracker, the analyser keeps its state
    let events = log.events();
    let reset = events.iter().position(|e| *e == Event::DetectorReset).unwrap();
    let end = events.iter().position(|e| *e == Event::AnalyserReset).unwrap();
    assert!(reset < end);
    assert_eq!(log.count(|e| *e == Event::AnalyserReset), 1);
}

#[test]
fn test_restart_then_fresh_source_look_alike() {
    // A frame right after restart sees the same tracker state as the first
    // frame of a new source
    let log = EventLog::new();
    let opener = FakeOpener::new(&log)
        .with_source(&file("a.avi"), 3, 64, 48)
        .with_source(&file("b.avi"), 1, 64, 48);
    let mut session = recording_session(
        &log,
        vec!["a.avi".into(), "b.avi".into()],
        opener,
        recording_engines(&log, true, false, None),
        ScriptedInput::default().at(0, UserCommand::Restart),
    );

    session.run().unwrap();

    let detections: Vec<u64> = log
        .events()
        .iter()
        .filter_map(|e| match e {
            Event::Detect { frames_since_reset, .. } => Some(*frames_since_reset),
            _ => None,
        })
        .collect();
    assert_eq!(detections, vec![0, 0, 1, 0]);
}

#[test]
fn test_quit_stops_immediately() {
    let log = EventLog::new();
    let opener = FakeOpener::new(&log)
        .with_source(&file("a.avi"), 10, 64, 48)
        .with_source(&file("b.avi"), 10, 64, 48);
    let mut session = recording_session(
        &log,
        vec!["a.avi".into(), "b.avi".into()],
        opener,
        recording_engines(&log, true, false, None),
        ScriptedInput::default().at(2, UserCommand::Quit),
    );

    let report = session.run().unwrap();

    assert!(report.quit);
    assert_eq!(log.frames_of("display"), vec![0, 1, 2]);
    assert!(!log.events().contains(&Event::Opened(file("b.avi"))));
    assert!(log.events().contains(&Event::SinkFinished("display".to_string())));
    assert_eq!(session.state(), SessionState::Done);
}

#[test]
fn test_no_sources_and_no_device_is_fatal() {
    let log = EventLog::new();
    let mut session = recording_session(
        &log,
        Vec::new(),
        FakeOpener::new(&log),
        recording_engines(&log, true, false, None),
        ScriptedInput::default(),
    );

    let err = session.run().unwrap_err();
    assert!(matches!(err, Error::SourceOpen(_)));
    assert!(err.is_fatal());
    assert!(log.frames_of("display").is_empty());
}

#[test]
fn test_empty_list_captures_from_device() {
    let log = EventLog::new();
    let opener = FakeOpener::new(&log).with_source(&SourceSpec::Device(0), 4, 640, 480);
    let mut session = recording_session(
        &log,
        Vec::new(),
        opener,
        recording_engines(&log, false, false, None),
        ScriptedInput::default(),
    );

    let report = session.run().unwrap();
    assert_eq!(report.sources[0].source, SourceSpec::Device(0));
    assert_eq!(report.total_frames(), 4);
}

#[test]
fn test_failing_second_source_aborts_run() {
    let log = EventLog::new();
    let opener = FakeOpener::new(&log).with_source(&file("a.avi"), 2, 64, 48);
    let mut session = recording_session(
        &log,
        vec!["a.avi".into(), "missing.avi".into()],
        opener,
        recording_engines(&log, true, false, None),
        ScriptedInput::default(),
    );

    assert!(matches!(session.run(), Err(Error::SourceOpen(_))));
    assert_eq!(log.frames_of("display"), vec![0, 1]);
}

#[test]
fn test_source_without_frames_is_skipped() {
    let log = EventLog::new();
    let opener = FakeOpener::new(&log)
        .with_source(&file("empty.avi"), 0, 64, 48)
        .with_source(&file("b.avi"), 2, 64, 48);
    let mut session = recording_session(
        &log,
        vec!["empty.avi".into(), "b.avi".into()],
        opener,
        recording_engines(&log, true, false, None),
        ScriptedInput::default(),
    );

    let report = session.run().unwrap();
    assert!(report.sources[0].skipped);
    assert_eq!(report.sources[0].frames, 0);
    assert!(!report.sources[1].skipped);
    assert_eq!(log.frames_of("display"), vec![0, 1]);
}

#[test]
fn test_intrinsics_inferred_per_source() {
    let log = EventLog::new();
    let opener = FakeOpener::new(&log)
        .with_source(&file("vga.avi"), 1, 640, 480)
        .with_source(&file("hd.avi"), 1, 1280, 720);
    let mut session = recording_session(
        &log,
        vec!["vga.avi".into(), "hd.avi".into()],
        opener,
        recording_engines(&log, false, false, None),
        ScriptedInput::default(),
    );

    session.run().unwrap();

    let intrinsics: Vec<CameraIntrinsics> = log
        .events()
        .iter()
        .filter_map(|e| match e {
            Event::Detect { intrinsics, .. } => Some(*intrinsics),
            _ => None,
        })
        .collect();
    assert_eq!(intrinsics[0], CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0));
    assert_eq!(intrinsics[1], CameraIntrinsics::new(875.0, 875.0, 640.0, 360.0));
}

#[test]
fn test_user_intrinsics_are_kept() {
    let log = EventLog::new();
    let opener = FakeOpener::new(&log).with_source(&file("a.avi"), 1, 640, 480);
    let mut session = Session::new(
        SourceQueue::new(vec!["a.avi".into()], 0),
        Box::new(opener),
        FramePipeline::new(recording_engines(&log, false, false, None), true),
        OutputMultiplexer::new(Box::new(NoopRenderer)),
        Box::new(ScriptedInput::default()),
        CameraResolver::new(CameraIntrinsics::new(600.0, 610.0, 0.0, 0.0)),
    );

    session.run().unwrap();

    match log.events().iter().find(|e| matches!(e, Event::Detect { .. })) {
        Some(Event::Detect { intrinsics, .. }) => {
            assert_eq!(*intrinsics, CameraIntrinsics::new(600.0, 610.0, 320.0, 240.0));
        }
        other => panic!("expected a detection, got {other:?}"),
    }
}

#[test]
fn test_timestamps_advance_at_frame_rate() {
    let log = EventLog::new();
    let opener = FakeOpener::new(&log).with_source(&file("a.avi"), 3, 16, 16);
    let mut session = recording_session(
        &log,
        vec!["a.avi".into()],
        opener,
        recording_engines(&log, false, false, None),
        ScriptedInput::default(),
    )
    .with_frame_rate(10.0);

    session.run().unwrap();

    let timestamps: Vec<f64> = log
        .events()
        .iter()
        .filter_map(|e| match e {
            Event::AnalyserFrame { timestamp, .. } => Some(*timestamp),
            _ => None,
        })
        .collect();
    assert_eq!(timestamps.len(), 3);
    for (i, t) in timestamps.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let expected = i as f64 * 0.1;
        assert!((t - expected).abs() < 1e-9, "frame {i}: {t}");
    }
}

#[test]
fn test_analyser_runs_on_untracked_frames() {
    let log = EventLog::new();
    let opener = FakeOpener::new(&log).with_source(&file("a.avi"), 4, 16, 16);
    let mut session = recording_session(
        &log,
        vec!["a.avi".into()],
        opener,
        recording_engines(&log, false, true, Some(FakeGaze::new(&log, false))),
        ScriptedInput::default(),
    );

    session.run().unwrap();

    assert_eq!(
        log.count(|e| matches!(e, Event::AnalyserFrame { success: false, .. })),
        4
    );
    // Gaze is never attempted without a successful detection
    assert_eq!(log.count(|e| matches!(e, Event::Gaze(_))), 0);
}

#[test]
fn test_gaze_estimated_for_both_eyes() {
    let log = EventLog::new();
    let opener = FakeOpener::new(&log).with_source(&file("a.avi"), 2, 16, 16);
    let mut session = recording_session(
        &log,
        vec!["a.avi".into()],
        opener,
        recording_engines(&log, true, true, Some(FakeGaze::new(&log, false))),
        ScriptedInput::default(),
    );

    session.run().unwrap();

    assert_eq!(log.count(|e| *e == Event::Gaze(Eye::Left)), 2);
    assert_eq!(log.count(|e| *e == Event::Gaze(Eye::Right)), 2);
    assert_eq!(
        log.count(|e| matches!(e, Event::SinkFrame { gaze_available: true, .. })),
        2
    );
}

#[test]
fn test_gaze_skipped_without_eye_model() {
    let log = EventLog::new();
    let opener = FakeOpener::new(&log).with_source(&file("a.avi"), 2, 16, 16);
    let mut session = recording_session(
        &log,
        vec!["a.avi".into()],
        opener,
        recording_engines(&log, true, false, Some(FakeGaze::new(&log, false))),
        ScriptedInput::default(),
    );

    session.run().unwrap();

    assert_eq!(log.count(|e| matches!(e, Event::Gaze(_))), 0);
    assert_eq!(
        log.count(|e| matches!(e, Event::SinkFrame { gaze_available: false, .. })),
        2
    );
}

#[test]
fn test_gaze_disabled() {
    let log = EventLog::new();
    let opener = FakeOpener::new(&log).with_source(&file("a.avi"), 2, 16, 16);
    let outputs = OutputMultiplexer::new(Box::new(NoopRenderer))
        .with_factory(Box::new(RecordingSinkFactory::new("display", &log)));
    let mut session = Session::new(
        SourceQueue::new(vec!["a.avi".into()], 0),
        Box::new(opener),
        FramePipeline::new(
            recording_engines(&log, true, true, Some(FakeGaze::new(&log, false))),
            false,
        ),
        outputs,
        Box::new(ScriptedInput::default()),
        CameraResolver::new(CameraIntrinsics::default()),
    );

    session.run().unwrap();

    assert_eq!(log.count(|e| matches!(e, Event::Gaze(_))), 0);
    assert_eq!(log.frames_of("display"), vec![0, 1]);
}

#[test]
fn test_failed_gaze_is_unavailable() {
    let log = EventLog::new();
    let opener = FakeOpener::new(&log).with_source(&file("a.avi"), 1, 16, 16);
    let mut session = recording_session(
        &log,
        vec!["a.avi".into()],
        opener,
        recording_engines(&log, true, true, Some(FakeGaze::new(&log, true))),
        ScriptedInput::default(),
    );

    session.run().unwrap();

    assert_eq!(
        log.count(|e| matches!(e, Event::SinkFrame { gaze_available: false, .. })),
        1
    );
}
