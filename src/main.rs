//! Facial landmark tracking over live and recorded video.

use anyhow::{Context, Result};
use clap::Parser;
use face_landmark_vid::app::{AppConfig, FaceLandmarkApp};
use face_landmark_vid::config::Config;
use face_landmark_vid::constants::{BUILD_HOST, BUILD_TARGET, DEFAULT_OSC_TARGET};
use log::{debug, info};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Video file or image sequence directory to process (repeatable, in order)
    #[arg(short = 'f', long = "file")]
    files: Vec<PathBuf>,

    /// Depth image directory for the file at the same position (repeatable)
    #[arg(long = "fd")]
    depth_dirs: Vec<PathBuf>,

    /// Output video for the file at the same position (repeatable)
    #[arg(short = 'o', long = "of")]
    outputs: Vec<PathBuf>,

    /// Four character codec of the output videos
    #[arg(long = "oc")]
    codec: Option<String>,

    /// Camera index to capture from when no files are given
    #[arg(long)]
    device: Option<i32>,

    /// Horizontal focal length in pixels
    #[arg(long)]
    fx: Option<f64>,

    /// Vertical focal length in pixels
    #[arg(long)]
    fy: Option<f64>,

    /// Optical centre x in pixels
    #[arg(long)]
    cx: Option<f64>,

    /// Optical centre y in pixels
    #[arg(long)]
    cy: Option<f64>,

    /// Do not show the tracking window
    #[arg(short, long)]
    quiet: bool,

    /// Send OSC telemetry to host:port (127.0.0.1:7000 when no value is given)
    #[arg(long, value_name = "HOST:PORT", num_args = 0..=1, default_missing_value = DEFAULT_OSC_TARGET)]
    osc: Option<String>,

    /// Disable gaze estimation
    #[arg(long)]
    no_gaze: bool,

    /// Use static instead of dynamic action unit predictors
    #[arg(long)]
    static_au: bool,

    /// Last directory searched for model files
    #[arg(long)]
    root: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,
}

impl Args {
    /// Command line values take precedence over the configuration file
    fn apply(self, config: &mut Config) {
        if !self.files.is_empty() {
            config.input.files = self.files;
        }
        if !self.depth_dirs.is_empty() {
            config.input.depth_dirs = self.depth_dirs;
        }
        if !self.outputs.is_empty() {
            config.output.videos = self.outputs;
        }
        if let Some(codec) = self.codec {
            config.output.codec = codec;
        }
        if let Some(device) = self.device {
            config.input.device = device;
        }
        if let Some(fx) = self.fx {
            config.camera.fx = fx;
        }
        if let Some(fy) = self.fy {
            config.camera.fy = fy;
        }
        if let Some(cx) = self.cx {
            config.camera.cx = cx;
        }
        if let Some(cy) = self.cy {
            config.camera.cy = cy;
        }
        if self.quiet {
            config.output.quiet = true;
        }
        if self.osc.is_some() {
            config.output.osc_target = self.osc;
        }
        if self.no_gaze {
            config.tracking.track_gaze = false;
        }
        if self.static_au {
            config.tracking.au_dynamic = false;
        }
        if self.root.is_some() {
            config.resources.root = self.root;
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let mut args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Face Landmark Video ({})", BUILD_TARGET);
    debug!("Built on {}", BUILD_HOST);

    // Load configuration if provided
    let mut config = match args.config.take() {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::from_file(&path).with_context(|| format!("Failed to load config file {}", path.display()))?
        }
        None => Config::default(),
    };
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    // Create and run application
    let mut app = FaceLandmarkApp::new(AppConfig::from(config))?;
    let report = app.run()?;
    if report.quit {
        info!("Stopped by user");
    }

    Ok(())
}
