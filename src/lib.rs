//! Frame loop for facial landmark tracking over live and recorded video.
//!
//! This library drives externally supplied analysis engines over a sequence
//! of video sources:
//! - a landmark tracker that keeps temporal state within a source
//! - an optional per-eye gaze estimator
//! - an action-unit analyser fed every frame
//!
//! Each frame goes through the same steps:
//! 1. Grayscale conversion and optional depth map loading
//! 2. Landmark detection with the source's camera intrinsics
//! 3. Gaze estimation when tracking succeeded and an eye model exists
//! 4. Action-unit analysis
//! 5. Fan-out to display, video file and OSC telemetry
//!
//! Video capture, display and encoding use `OpenCV` behind the `opencv`
//! feature. Without it, directories of still frames can still be processed
//! headless.
//!
//! # Examples
//!
//! ## Camera intrinsics
//!
//! ```
//! use face_landmark_vid::camera::{CameraIntrinsics, CameraResolver};
//!
//! let mut resolver = CameraResolver::new(CameraIntrinsics::default());
//! let intrinsics = resolver.resolve(640, 480);
//! assert_eq!((intrinsics.cx, intrinsics.cy), (320.0, 240.0));
//! assert_eq!(intrinsics.fx, 500.0);
//! ```
//!
//! ## Processing an image sequence
//!
//! ```no_run
//! use face_landmark_vid::{
//!     camera::{CameraIntrinsics, CameraResolver},
//!     engines::{stub::{StubAnalyser, StubDetector}, Engines},
//!     input::NoInput,
//!     pipeline::FramePipeline,
//!     session::Session,
//!     sinks::OutputMultiplexer,
//!     source::{SequenceOpener, SourceQueue},
//!     visualisation::NoopRenderer,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engines = Engines {
//!     detector: Box::new(StubDetector::new()),
//!     gaze: None,
//!     analyser: Box::new(StubAnalyser::with_units(vec!["AU12".to_string()])),
//! };
//!
//! let mut session = Session::new(
//!     SourceQueue::new(vec!["frames/".into()], 0),
//!     Box::new(SequenceOpener),
//!     FramePipeline::new(engines, true),
//!     OutputMultiplexer::new(Box::new(NoopRenderer)),
//!     Box::new(NoInput),
//!     CameraResolver::new(CameraIntrinsics::default()),
//! );
//!
//! let report = session.run()?;
//! println!("Processed {} frames", report.total_frames());
//! # Ok(())
//! # }
//! ```

/// Application wiring from configuration
pub mod app;

/// Platform backends
pub mod backend;

/// Camera intrinsics and their inference
pub mod camera;

/// Configuration management
pub mod config;

/// Constants used throughout the frame loop
pub mod constants;

/// Depth map loading
pub mod depth;

/// Analysis engine boundaries
pub mod engines;

/// Error types and result aliases
pub mod error;

/// Per-frame data
pub mod frame;

/// User commands
pub mod input;

/// Per-frame processing
pub mod pipeline;

/// Model resource discovery
pub mod resources;

/// Multi-source run state machine
pub mod session;

/// Output sinks and their multiplexer
pub mod sinks;

/// Input sources
pub mod source;

/// Utility functions
pub mod utils;

/// Overlay model and frame rate estimation
pub mod visualisation;

pub use error::{Error, Result};
