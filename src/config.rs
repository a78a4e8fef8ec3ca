//! Configuration management for the face landmark video loop

use crate::camera::CameraIntrinsics;
use crate::constants::{DEFAULT_DEVICE, DEFAULT_FRAME_RATE, DEFAULT_OUTPUT_CODEC};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::ToSocketAddrs;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input sources
    pub input: InputConfig,

    /// Output sinks
    pub output: OutputConfig,

    /// Camera intrinsics, zero means infer from the first frame
    pub camera: CameraIntrinsics,

    /// Engine options
    pub tracking: TrackingConfig,

    /// Model resource lookup
    pub resources: ResourceConfig,
}

/// Input source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Video files or image sequence directories, processed in order
    pub files: Vec<PathBuf>,

    /// Depth directories, one per file position
    pub depth_dirs: Vec<PathBuf>,

    /// Capture device used when no files are given
    pub device: i32,

    /// Frame rate used to timestamp recorded sources
    pub frame_rate: f64,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output video files, one per file position
    pub videos: Vec<PathBuf>,

    /// Four character codec of the output videos
    pub codec: String,

    /// Do not open the tracking window
    pub quiet: bool,

    /// OSC telemetry destination, `host:port`
    pub osc_target: Option<String>,
}

/// Engine options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Estimate gaze when the tracker provides an eye model
    pub track_gaze: bool,

    /// Use the dynamic action unit predictors instead of the static ones
    pub au_dynamic: bool,
}

/// Model resource configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Last directory searched for model files
    pub root: Option<PathBuf>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            depth_dirs: Vec::new(),
            device: DEFAULT_DEVICE,
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            videos: Vec::new(),
            codec: DEFAULT_OUTPUT_CODEC.to_string(),
            quiet: false,
            osc_target: None,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            track_gaze: true,
            au_dynamic: true,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::IoError(e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| Error::IoError(e.to_string()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.input.frame_rate.is_finite() && self.input.frame_rate > 0.0) {
            return Err(Error::ConfigError("Frame rate must be greater than 0".to_string()));
        }
        if self.input.device < 0 {
            return Err(Error::ConfigError("Device index must not be negative".to_string()));
        }

        // Parallel lists may be shorter than the file list, never longer
        if self.input.depth_dirs.len() > self.input.files.len().max(1) {
            return Err(Error::ConfigError(format!(
                "{} depth directories given for {} sources",
                self.input.depth_dirs.len(),
                self.input.files.len().max(1)
            )));
        }
        if self.output.videos.len() > self.input.files.len().max(1) {
            return Err(Error::ConfigError(format!(
                "{} output videos given for {} sources",
                self.output.videos.len(),
                self.input.files.len().max(1)
            )));
        }

        let camera = &self.camera;
        if [camera.fx, camera.fy, camera.cx, camera.cy]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(Error::ConfigError(
                "Camera parameters must be finite and not negative".to_string(),
            ));
        }

        if let Some(target) = &self.output.osc_target {
            if target.to_socket_addrs().map_or(true, |mut addrs| addrs.next().is_none()) {
                return Err(Error::ConfigError(format!("Invalid OSC target: {}", target)));
            }
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Face Landmark Video Configuration

# Input sources; leave files empty to capture from the device
input:
  files:
    - "videos/subject01.avi"
    - "videos/subject02.avi"
  depth_dirs:
    - "depth/subject01"
  device: 0
  frame_rate: 30.0

# Outputs
output:
  videos:
    - "out/subject01_tracked.avi"
  codec: "DIVX"
  quiet: false
  osc_target: "127.0.0.1:7000"

# Camera intrinsics, 0 means inferred from the frame size
camera:
  fx: 0.0
  fy: 0.0
  cx: 0.0
  cy: 0.0

# Engines
tracking:
  track_gaze: true
  au_dynamic: true

# Model resources
resources:
  root: null
"#;
