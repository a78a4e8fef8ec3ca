//! Main application module wiring configuration to a session.

use crate::{
    camera::{CameraIntrinsics, CameraResolver},
    config::Config,
    engines::{
        stub::{StubAnalyser, StubDetector},
        Engines,
    },
    error::Result,
    input::{CombinedInput, CtrlCInput, InputPoller},
    pipeline::FramePipeline,
    resources::{ModelResources, SearchPaths},
    session::{Session, SessionReport},
    sinks::{
        network::NetworkFactory,
        video_writer::{EncoderBackend, VideoWriterFactory},
        OutputMultiplexer,
    },
    source::{SourceOpener, SourceQueue},
    visualisation::OverlayRenderer,
};
use log::{info, warn};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Video files or image sequence directories, in processing order
    pub files: Vec<PathBuf>,
    /// Depth directories, matched to files by position
    pub depth_dirs: Vec<PathBuf>,
    /// Output videos, matched to files by position
    pub output_videos: Vec<PathBuf>,
    /// Capture device used when no files are given
    pub device: i32,
    /// Frame rate recorded sources are stamped with
    pub frame_rate: f64,
    /// Four character codec of output videos
    pub codec: String,
    /// Run without the tracking window
    pub quiet: bool,
    /// OSC telemetry destination
    pub osc_target: Option<String>,
    /// User supplied intrinsics, zero means inferred
    pub camera: CameraIntrinsics,
    /// Estimate gaze when possible
    pub track_gaze: bool,
    /// Dynamic rather than static action unit predictors
    pub au_dynamic: bool,
    /// Last directory searched for model files
    pub resource_root: Option<PathBuf>,
}

impl From<Config> for AppConfig {
    fn from(config: Config) -> Self {
        Self {
            files: config.input.files,
            depth_dirs: config.input.depth_dirs,
            output_videos: config.output.videos,
            device: config.input.device,
            frame_rate: config.input.frame_rate,
            codec: config.output.codec,
            quiet: config.output.quiet,
            osc_target: config.output.osc_target,
            camera: config.camera,
            track_gaze: config.tracking.track_gaze,
            au_dynamic: config.tracking.au_dynamic,
            resource_root: config.resources.root,
        }
    }
}

/// Main application struct
pub struct FaceLandmarkApp {
    session: Session,
}

impl FaceLandmarkApp {
    /// Create the application: discover resources, load engines, prepare outputs
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if a model resource is missing
    pub fn new(config: AppConfig) -> Result<Self> {
        info!("Initializing face landmark video application");

        let search = SearchPaths::for_current_exe(config.resource_root.clone());
        let resources = ModelResources::discover(&search, config.au_dynamic)?;

        let engines = Engines {
            detector: Box::new(StubDetector::new()),
            gaze: None,
            analyser: Box::new(StubAnalyser::from_resources(&resources)?),
        };
        info!("Using {} landmark tracker", engines.detector.name());
        let pipeline = FramePipeline::new(engines, config.track_gaze);

        let display = !config.quiet && cfg!(feature = "opencv");
        if !config.quiet && !display {
            warn!("Display requires the opencv feature, running headless");
        }

        let mut outputs = OutputMultiplexer::new(renderer());
        #[cfg(feature = "opencv")]
        if display {
            use crate::backend::opencv::HighGuiDisplay;
            use crate::sinks::display::{DisplayFactory, DisplaySurface};
            outputs.add_factory(Box::new(DisplayFactory::new(|| {
                Ok(Box::new(HighGuiDisplay::open()?) as Box<dyn DisplaySurface>)
            })));
        }
        if !config.output_videos.is_empty() {
            outputs.add_factory(Box::new(VideoWriterFactory::new(config.codec.clone(), encoder_backend())));
        }
        if let Some(target) = &config.osc_target {
            info!("Sending OSC telemetry to {}", target);
            outputs.add_factory(Box::new(NetworkFactory::new(target.clone())));
        }

        let session = Session::new(
            SourceQueue::new(config.files.clone(), config.device),
            source_opener(),
            pipeline,
            outputs,
            user_input(display),
            CameraResolver::new(config.camera),
        )
        .with_depth_dirs(config.depth_dirs)
        .with_output_videos(config.output_videos)
        .with_frame_rate(config.frame_rate);

        Ok(Self { session })
    }

    /// Process every configured source
    ///
    /// # Errors
    ///
    /// Returns `SourceOpen` if a source cannot be opened
    pub fn run(&mut self) -> Result<SessionReport> {
        info!("Starting main application loop");
        let report = self.session.run()?;
        for source in &report.sources {
            info!(
                "{}: {} frames, {} restarts{}",
                source.source,
                source.frames,
                source.restarts,
                if source.skipped { " (skipped)" } else { "" }
            );
        }
        info!("Application shutting down");
        Ok(report)
    }
}

#[cfg(feature = "opencv")]
fn source_opener() -> Box<dyn SourceOpener> {
    Box::new(crate::backend::opencv::OpenCvSourceOpener)
}

#[cfg(not(feature = "opencv"))]
fn source_opener() -> Box<dyn SourceOpener> {
    Box::new(crate::source::SequenceOpener)
}

#[cfg(feature = "opencv")]
fn encoder_backend() -> Box<dyn EncoderBackend> {
    Box::new(crate::backend::opencv::OpenCvEncoderBackend)
}

#[cfg(not(feature = "opencv"))]
fn encoder_backend() -> Box<dyn EncoderBackend> {
    Box::new(crate::sinks::video_writer::UnavailableEncoderBackend)
}

#[cfg(feature = "opencv")]
fn renderer() -> Box<dyn OverlayRenderer> {
    Box::new(crate::backend::opencv::OpenCvRenderer)
}

#[cfg(not(feature = "opencv"))]
fn renderer() -> Box<dyn OverlayRenderer> {
    Box::new(crate::visualisation::NoopRenderer)
}

fn user_input(display: bool) -> Box<dyn InputPoller> {
    let mut input = CombinedInput::new();
    match CtrlCInput::install() {
        Ok(ctrlc) => input = input.with(Box::new(ctrlc)),
        Err(e) => warn!("Ctrl-C will not stop the run cleanly: {}", e),
    }
    #[cfg(feature = "opencv")]
    if display {
        input = input.with(Box::new(crate::backend::opencv::HighGuiInput));
    }
    #[cfg(not(feature = "opencv"))]
    let _ = display;
    Box::new(input)
}
