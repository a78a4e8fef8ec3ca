//! Tests for output fan-out: video writer failure isolation, OSC telemetry and overlays


use face_landmark_vid::{
    camera::{CameraIntrinsics, CameraResolver},
    constants::OUTPUT_VIDEO_FPS,
    input::NoInput,
    pipeline::FramePipeline,
    session::Session,
    sinks::{
        network::NetworkFactory,
        video_writer::{EncoderBackend, FourCc, VideoEncoder, VideoWriterFactory},
        OutputMultiplexer,
    },
    source::{SourceQueue, SourceSpec},
    visualisation::{NoopRenderer, Overlay, OverlayRenderer},
    Result,
};
use image::RgbImage;
use rosc::{OscPacket, OscType};
use std::cell::RefCell;
use std::net::UdpSocket;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use test_helpers::*;

#[derive(Debug, Default)]
struct EncoderRecord {
    created: Vec<(PathBuf, String, f64, u32, u32)>,
    frames: usize,
    released: usize,
}

struct FakeEncoder(Rc<RefCell<EncoderRecord>>);

impl VideoEncoder for FakeEncoder {
    fn write(&mut self, _frame: &RgbImage) -> Result<()> {
        self.0.borrow_mut().frames += 1;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.0.borrow_mut().released += 1;
        Ok(())
    }
}

struct FakeEncoderBackend(Rc<RefCell<EncoderRecord>>);

impl EncoderBackend for FakeEncoderBackend {
    fn create(
        &mut self,
        path: &Path,
        codec: FourCc,
        fps: f64,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn VideoEncoder>> {
        self.0
            .borrow_mut()
            .created
            .push((path.to_path_buf(), codec.to_string(), fps, width, height));
        Ok(Box::new(FakeEncoder(Rc::clone(&self.0))))
    }
}

fn session_with_outputs(
    log: &EventLog,
    files: Vec<PathBuf>,
    opener: FakeOpener,
    outputs: OutputMultiplexer,
    output_videos: Vec<PathBuf>,
) -> Session {
    Session::new(
        SourceQueue::new(files, 0),
        Box::new(opener),
        FramePipeline::new(recording_engines(log, true, false, None), true),
        outputs,
        Box::new(NoInput),
        CameraResolver::new(CameraIntrinsics::default()),
    )
    .with_output_videos(output_videos)
}

#[test]
fn test_invalid_codec_keeps_other_outputs() {
    let log = EventLog::new();
    let record = Rc::new(RefCell::new(EncoderRecord::default()));
    let outputs = OutputMultiplexer::new(Box::new(NoopRenderer))
        .with_factory(Box::new(RecordingSinkFactory::new("display", &log)))
        .with_factory(Box::new(VideoWriterFactory::new(
            "H264X",
            Box::new(FakeEncoderBackend(Rc::clone(&record))),
        )))
        .with_factory(Box::new(RecordingSinkFactory::new("network", &log)));
    let opener = FakeOpener::new(&log).with_source(&SourceSpec::File("a.avi".into()), 6, 64, 48);

    let mut session = session_with_outputs(
        &log,
        vec!["a.avi".into()],
        opener,
        outputs,
        vec!["out.avi".into()],
    );
    let report = session.run().unwrap();

    assert_eq!(report.total_frames(), 6);
    assert_eq!(log.frames_of("display"), (0..6).collect::<Vec<u64>>());
    assert_eq!(log.frames_of("network"), (0..6).collect::<Vec<u64>>());
    assert!(record.borrow().created.is_empty());
    assert_eq!(record.borrow().frames, 0);
}

#[test]
fn test_video_writer_uses_first_frame_size() {
    let log = EventLog::new();
    let record = Rc::new(RefCell::new(EncoderRecord::default()));
    let outputs = OutputMultiplexer::new(Box::new(NoopRenderer)).with_factory(Box::new(VideoWriterFactory::new(
        "MJPG",
        Box::new(FakeEncoderBackend(Rc::clone(&record))),
    )));
    let opener = FakeOpener::new(&log)
        .with_source(&SourceSpec::File("a.avi".into()), 4, 320, 240)
        .with_source(&SourceSpec::File("b.avi".into()), 2, 320, 240);

    // Only the first source has an output file
    let mut session = session_with_outputs(
        &log,
        vec!["a.avi".into(), "b.avi".into()],
        opener,
        outputs,
        vec!["a_out.avi".into()],
    );
    session.run().unwrap();

    let record = record.borrow();
    assert_eq!(
        record.created,
        vec![(PathBuf::from("a_out.avi"), "MJPG".to_string(), OUTPUT_VIDEO_FPS, 320, 240)]
    );
    assert_eq!(record.frames, 4);
    assert_eq!(record.released, 1);
}

#[test]
fn test_failing_sink_does_not_block_others() {
    let log = EventLog::new();
    let outputs = OutputMultiplexer::new(Box::new(NoopRenderer))
        .with_factory(Box::new(RecordingSinkFactory::failing("display", &log)))
        .with_factory(Box::new(RecordingSinkFactory::new("network", &log)));
    let opener = FakeOpener::new(&log).with_source(&SourceSpec::File("a.avi".into()), 3, 64, 48);

    let mut session = session_with_outputs(&log, vec!["a.avi".into()], opener, outputs, Vec::new());
    session.run().unwrap();

    assert!(log.frames_of("display").is_empty());
    assert_eq!(log.frames_of("network"), vec![0, 1, 2]);
}

#[test]
fn test_osc_telemetry_over_loopback() {
    let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
    receiver.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let target = receiver.local_addr().unwrap().to_string();

    let log = EventLog::new();
    let outputs = OutputMultiplexer::new(Box::new(NoopRenderer)).with_factory(Box::new(NetworkFactory::new(target)));
    let opener = FakeOpener::new(&log).with_source(&SourceSpec::File("a.avi".into()), 2, 640, 480);

    let mut session = session_with_outputs(&log, vec!["a.avi".into()], opener, outputs, Vec::new());
    session.run().unwrap();

    let mut buf = [0u8; rosc::decoder::MTU];
    let mut messages = Vec::new();
    for _ in 0..4 {
        let size = receiver.recv(&mut buf).unwrap();
        let (_, packet) = rosc::decoder::decode_udp(&buf[..size]).unwrap();
        match packet {
            OscPacket::Message(message) => messages.push(message),
            OscPacket::Bundle(_) => panic!("unexpected bundle"),
        }
    }

    assert_eq!(messages[0].addr, "/face/tracking");
    assert_eq!(messages[0].args[0], OscType::Long(0));
    assert_eq!(messages[0].args[1], OscType::Bool(true));
    assert_eq!(messages[0].args[12], OscType::Float(320.0));
    assert_eq!(messages[0].args[13], OscType::Float(240.0));

    // One action unit message per reading: frame, name, intensity, presence
    assert_eq!(messages[1].addr, "/face/action_units");
    assert_eq!(messages[1].args.len(), 4);
    assert_eq!(messages[1].args[0], OscType::Long(0));
    assert_eq!(messages[1].args[1], OscType::String("AU12".to_string()));
    assert_eq!(messages[1].args[3], OscType::Bool(true));

    assert_eq!(messages[2].addr, "/face/tracking");
    assert_eq!(messages[2].args[0], OscType::Long(1));
}

struct RecordingRenderer(Rc<RefCell<Vec<Overlay>>>);

impl OverlayRenderer for RecordingRenderer {
    fn render(&mut self, _frame: &mut RgbImage, overlay: &Overlay) -> Result<()> {
        self.0.borrow_mut().push(overlay.clone());
        Ok(())
    }
}

#[test]
fn test_overlay_drawn_for_confident_tracking() {
    let log = EventLog::new();
    let overlays = Rc::new(RefCell::new(Vec::new()));
    let outputs = OutputMultiplexer::new(Box::new(RecordingRenderer(Rc::clone(&overlays))))
        .with_factory(Box::new(RecordingSinkFactory::new("display", &log)));
    let opener = FakeOpener::new(&log).with_source(&SourceSpec::File("a.avi".into()), 2, 1280, 720);

    let mut session = session_with_outputs(&log, vec!["a.avi".into()], opener, outputs, Vec::new());
    session.run().unwrap();

    let overlays = overlays.borrow();
    assert_eq!(overlays.len(), 2);
    assert_eq!(overlays[0].fps_label, "FPS:-1");
    let tracking = overlays[0].tracking.as_ref().unwrap();
    // Certainty -0.5 maps to intensity 0.5 / 1.2
    assert_eq!(tracking.color, [106, 0, 149]);
    assert_eq!(tracking.thickness, 4);
    assert_eq!(tracking.landmarks.len(), 2);
    assert!(tracking.gaze.is_none());
}

#[test]
fn test_no_rendering_without_sinks() {
    let log = EventLog::new();
    let overlays = Rc::new(RefCell::new(Vec::new()));
    let outputs = OutputMultiplexer::new(Box::new(RecordingRenderer(Rc::clone(&overlays))));
    let opener = FakeOpener::new(&log).with_source(&SourceSpec::File("a.avi".into()), 3, 64, 48);

    let mut session = session_with_outputs(&log, vec!["a.avi".into()], opener, outputs, Vec::new());
    let report = session.run().unwrap();

    assert_eq!(report.total_frames(), 3);
    assert!(overlays.borrow().is_empty());
}
