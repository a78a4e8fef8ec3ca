//! Output multiplexing: display, video file and network telemetry.
//!
//! Sinks are opened per source through [`SinkFactory`] handles. A factory
//! that declines or fails leaves its sink absent for that source; a sink
//! that fails on a frame is logged and never stops the others.

/// On-screen display of annotated frames
pub mod display;

/// OSC telemetry over UDP
pub mod network;

/// Encoded video file output
pub mod video_writer;

use crate::camera::CameraIntrinsics;
use crate::depth::DepthImage;
use crate::engines::{ActionUnitReading, GazeResult, TrackingState};
use crate::frame::FrameContext;
use crate::source::SourceSpec;
use crate::visualisation::{FpsTracker, Overlay, OverlayRenderer};
use crate::Result;
use image::RgbImage;
use log::{debug, info, warn};
use std::path::Path;

/// Analysis results of one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameResult {
    /// Tracker state after the frame
    pub tracking: TrackingState,
    /// Gaze outcome
    pub gaze: GazeResult,
    /// Action units after the frame
    pub action_units: Vec<ActionUnitReading>,
}

/// What every sink receives for a frame
#[derive(Debug)]
pub struct FrameOutput<'a> {
    pub frame_index: u64,
    pub timestamp: f64,
    /// Frame with the overlay drawn
    pub image: &'a RgbImage,
    pub depth: Option<&'a DepthImage>,
    pub tracking: &'a TrackingState,
    pub gaze: &'a GazeResult,
    pub intrinsics: &'a CameraIntrinsics,
    pub action_units: &'a [ActionUnitReading],
}

/// Destination for processed frames
pub trait OutputSink {
    /// Sink identifier for logs
    fn name(&self) -> &str;

    /// Handle one frame
    ///
    /// # Errors
    ///
    /// Returns an error if the frame could not be delivered
    fn consume(&mut self, output: &FrameOutput<'_>) -> Result<()>;

    /// Flush and close at the end of a source
    ///
    /// # Errors
    ///
    /// Returns an error if closing fails
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Source details sinks are configured from
#[derive(Debug, Clone, Copy)]
pub struct SourceContext<'a> {
    /// Position in the source list
    pub index: usize,
    pub source: &'a SourceSpec,
    /// Size of the first frame
    pub frame_width: u32,
    pub frame_height: u32,
    /// Output video requested for this source
    pub output_video: Option<&'a Path>,
}

/// Opens one kind of sink for each source
pub trait SinkFactory {
    /// Factory identifier for logs
    fn name(&self) -> &str;

    /// Open the sink for a source, `Ok(None)` when not wanted for it
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot be constructed
    fn open(&mut self, context: &SourceContext<'_>) -> Result<Option<Box<dyn OutputSink>>>;
}

/// Fans processed frames out to every sink open for the current source
pub struct OutputMultiplexer {
    renderer: Box<dyn OverlayRenderer>,
    factories: Vec<Box<dyn SinkFactory>>,
    sinks: Vec<Box<dyn OutputSink>>,
    fps: FpsTracker,
}

impl OutputMultiplexer {
    /// Create a multiplexer drawing overlays with the given renderer
    #[must_use]
    pub fn new(renderer: Box<dyn OverlayRenderer>) -> Self {
        Self {
            renderer,
            factories: Vec::new(),
            sinks: Vec::new(),
            fps: FpsTracker::new(),
        }
    }

    /// Register a sink factory
    #[must_use]
    pub fn with_factory(mut self, factory: Box<dyn SinkFactory>) -> Self {
        self.factories.push(factory);
        self
    }

    /// Register a sink factory in place
    pub fn add_factory(&mut self, factory: Box<dyn SinkFactory>) {
        self.factories.push(factory);
    }

    /// Names of the sinks open for the current source
    #[must_use]
    pub fn active_sinks(&self) -> Vec<&str> {
        self.sinks.iter().map(|sink| sink.name()).collect()
    }

    /// Current frame rate estimate
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps.fps()
    }

    /// Open every sink for a new source
    pub fn begin_source(&mut self, context: &SourceContext<'_>) {
        self.close_sinks();

        for factory in &mut self.factories {
            match factory.open(context) {
                Ok(Some(sink)) => {
                    info!("Opened {} output for source {}", sink.name(), context.index);
                    self.sinks.push(sink);
                }
                Ok(None) => debug!("No {} output for source {}", factory.name(), context.index),
                Err(e) => warn!(
                    "Could not open {} output for source {}, continuing without it: {}",
                    factory.name(),
                    context.index,
                    e
                ),
            }
        }
    }

    /// Deliver a processed frame to every open sink
    pub fn dispatch(&mut self, frame: &FrameContext, intrinsics: &CameraIntrinsics, result: &FrameResult) {
        let fps = self.fps.update(frame.index);
        if self.sinks.is_empty() {
            return;
        }

        let mut annotated = frame.image.to_rgb();
        let overlay = Overlay::build(&result.tracking, &result.gaze, intrinsics, annotated.width(), fps);
        if let Err(e) = self.renderer.render(&mut annotated, &overlay) {
            warn!("Failed to draw overlay on frame {}: {}", frame.index, e);
        }

        let output = FrameOutput {
            frame_index: frame.index,
            timestamp: frame.timestamp,
            image: &annotated,
            depth: frame.depth.as_ref(),
            tracking: &result.tracking,
            gaze: &result.gaze,
            intrinsics,
            action_units: &result.action_units,
        };

        for sink in &mut self.sinks {
            if let Err(e) = sink.consume(&output) {
                warn!("{} output failed on frame {}: {}", sink.name(), frame.index, e);
            }
        }
    }

    /// Close every sink of the finished source
    pub fn end_source(&mut self) {
        self.close_sinks();
    }

    fn close_sinks(&mut self) {
        for mut sink in self.sinks.drain(..) {
            if let Err(e) = sink.finish() {
                warn!("Failed to close {} output: {}", sink.name(), e);
            }
        }
    }
}

impl Drop for OutputMultiplexer {
    fn drop(&mut self) {
        self.close_sinks();
    }
}
