//! The multi-source run.
//!
//! A session walks the source queue. Each source is opened, its first frame
//! fixes the camera intrinsics and output sizes, and frames are processed
//! until the stream ends or the user intervenes:
//!
//! - restart resets tracking and keeps counting frames on the same source,
//! - quit stops at once without advancing,
//! - end of stream resets tracking and moves to the next source with the
//!   frame counter back at 0.
//!
//! Failing to open a source is fatal for the whole run.

use crate::camera::CameraResolver;
use crate::constants::DEFAULT_FRAME_RATE;
use crate::depth::{DepthDirectory, DepthSource};
use crate::frame::{CapturedImage, FrameClock, FrameContext};
use crate::input::{InputPoller, UserCommand};
use crate::pipeline::FramePipeline;
use crate::sinks::{OutputMultiplexer, SourceContext};
use crate::source::{FrameSource, SourceOpener, SourceQueue, SourceSpec};
use crate::Result;
use log::{debug, info, warn};
use std::path::PathBuf;

/// Where the session currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Processing frames
    Running,
    /// Tracking is being reset on user request
    Restarting,
    /// No more frames will be processed
    Done,
}

/// Summary of one processed source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReport {
    pub source: SourceSpec,
    /// Frames run through the pipeline
    pub frames: u64,
    /// User restarts while on this source
    pub restarts: u32,
    /// The source delivered no frame at all
    pub skipped: bool,
}

/// Summary of a whole run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    pub sources: Vec<SourceReport>,
    /// The run was ended by the user
    pub quit: bool,
}

impl SessionReport {
    /// Frames processed over all sources
    #[must_use]
    pub fn total_frames(&self) -> u64 {
        self.sources.iter().map(|s| s.frames).sum()
    }
}

/// Owns everything a run needs
pub struct Session {
    queue: SourceQueue,
    opener: Box<dyn SourceOpener>,
    pipeline: FramePipeline,
    outputs: OutputMultiplexer,
    input: Box<dyn InputPoller>,
    camera: CameraResolver,
    depth_sources: Vec<Box<dyn DepthSource>>,
    output_videos: Vec<PathBuf>,
    frame_rate: f64,
    state: SessionState,
}

impl Session {
    #[must_use]
    pub fn new(
        queue: SourceQueue,
        opener: Box<dyn SourceOpener>,
        pipeline: FramePipeline,
        outputs: OutputMultiplexer,
        input: Box<dyn InputPoller>,
        camera: CameraResolver,
    ) -> Self {
        Self {
            queue,
            opener,
            pipeline,
            outputs,
            input,
            camera,
            depth_sources: Vec::new(),
            output_videos: Vec::new(),
            frame_rate: DEFAULT_FRAME_RATE,
            state: SessionState::Running,
        }
    }

    /// Depth directories, matched to sources by position
    #[must_use]
    pub fn with_depth_dirs(self, depth_dirs: Vec<PathBuf>) -> Self {
        self.with_depth_sources(
            depth_dirs
                .into_iter()
                .map(|dir| Box::new(DepthDirectory::new(dir)) as Box<dyn DepthSource>)
                .collect(),
        )
    }

    /// Depth providers, matched to sources by position. Sources past the end
    /// of the list never load depth.
    #[must_use]
    pub fn with_depth_sources(mut self, depth_sources: Vec<Box<dyn DepthSource>>) -> Self {
        self.depth_sources = depth_sources;
        self
    }

    /// Output video files, matched to sources by position
    #[must_use]
    pub fn with_output_videos(mut self, output_videos: Vec<PathBuf>) -> Self {
        self.output_videos = output_videos;
        self
    }

    /// Frame rate recorded sources are stamped with
    #[must_use]
    pub fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Process every source in turn
    ///
    /// # Errors
    ///
    /// Returns `SourceOpen` if a source cannot be opened
    pub fn run(&mut self) -> Result<SessionReport> {
        let mut report = SessionReport::default();

        loop {
            let Some((index, source)) = self.queue.advance().map(|(i, s)| (i, s.clone())) else {
                break;
            };

            info!("Attempting to capture from {}", source);
            let mut capture = match self.opener.open(&source) {
                Ok(capture) => capture,
                Err(e) => {
                    self.state = SessionState::Done;
                    return Err(e);
                }
            };
            info!("Device or file opened");

            let source_report = self.run_source(index, &source, capture.as_mut());
            let quit = self.state == SessionState::Done;
            report.sources.push(source_report);

            if quit {
                info!("Quit requested, stopping");
                self.outputs.end_source();
                report.quit = true;
                return Ok(report);
            }

            self.end_source();
            self.queue.complete_current();
        }

        self.state = SessionState::Done;
        info!(
            "Processed {} frames from {} sources",
            report.total_frames(),
            report.sources.len()
        );
        Ok(report)
    }

    fn run_source(&mut self, index: usize, source: &SourceSpec, capture: &mut dyn FrameSource) -> SourceReport {
        let mut report = SourceReport {
            source: source.clone(),
            frames: 0,
            restarts: 0,
            skipped: false,
        };

        let Some(first) = read_frame(capture) else {
            warn!("No frames could be read from {}, skipping it", source);
            report.skipped = true;
            return report;
        };

        let intrinsics = self.camera.resolve(first.width(), first.height());
        let depth = self.depth_sources.get(index).map(|source| &**source);
        let context = SourceContext {
            index,
            source,
            frame_width: first.width(),
            frame_height: first.height(),
            output_video: self.output_videos.get(index).map(PathBuf::as_path),
        };
        self.outputs.begin_source(&context);

        let mut clock = if source.is_live() {
            FrameClock::live()
        } else {
            FrameClock::fixed(self.frame_rate)
        };

        info!("Starting tracking");
        let mut next = Some(first);
        while let Some(image) = next.take() {
            let frame = FrameContext::prepare(
                image,
                clock.index(),
                clock.timestamp(),
                depth,
            );
            self.pipeline.process(&frame, &intrinsics, &mut self.outputs);
            report.frames += 1;
            drop(frame);

            next = read_frame(capture);

            match self.input.poll() {
                Ok(Some(UserCommand::Restart)) => {
                    self.state = SessionState::Restarting;
                    info!("Restarting tracking at frame {}", clock.index());
                    self.pipeline.reset_tracking();
                    report.restarts += 1;
                    self.state = SessionState::Running;
                }
                Ok(Some(UserCommand::Quit)) => {
                    self.state = SessionState::Done;
                    return report;
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to poll user input: {}", e),
            }

            clock.advance();
        }

        debug!("End of stream after {} frames from {}", report.frames, source);
        report
    }

    fn end_source(&mut self) {
        self.pipeline.end_source();
        self.outputs.end_source();
        self.camera.reset();
    }
}

/// Read errors end the source the same way end of stream does
fn read_frame(capture: &mut dyn FrameSource) -> Option<CapturedImage> {
    match capture.next_frame() {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Failed to read frame, ending source: {}", e);
            None
        }
    }
}
