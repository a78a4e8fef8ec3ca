//! Boundaries of the analysis engines driven by the frame loop.
//!
//! The landmark tracker, gaze estimator and action-unit analyser are supplied
//! from outside the loop. Only the calls the loop makes, and the read-only
//! tracking projection it consumes, are defined here.

/// Baseline engines used when no tracking model is linked
pub mod stub;

use crate::camera::CameraIntrinsics;
use crate::depth::DepthImage;
use crate::frame::CapturedImage;
use crate::Result;
use image::GrayImage;
use nalgebra::{Point2, Vector3};

/// Read-only projection of the tracker's state after a frame
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingState {
    /// Whether the last detection succeeded
    pub success: bool,
    /// Detection certainty, lower is more certain (roughly [-1, 1])
    pub certainty: f64,
    /// Whether the tracker carries an eye model usable for gaze
    pub eye_model: bool,
    /// Tracked landmarks in image coordinates, empty when unavailable
    pub landmarks: Vec<Point2<f32>>,
}

impl Default for TrackingState {
    fn default() -> Self {
        Self {
            success: false,
            certainty: 1.0,
            eye_model: false,
            landmarks: Vec::new(),
        }
    }
}

/// Which eye a gaze estimate refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

/// Gaze outcome of one frame
#[derive(Debug, Clone, PartialEq)]
pub enum GazeResult {
    /// Gaze disabled, detection failed, no eye model or estimation failed
    Unavailable,
    /// Unit direction per eye in camera coordinates
    Estimated {
        left: Vector3<f32>,
        right: Vector3<f32>,
    },
}

impl GazeResult {
    /// Direction reported downstream when no gaze is available
    #[must_use]
    pub fn forward() -> Vector3<f32> {
        Vector3::new(0.0, 0.0, -1.0)
    }

    /// Whether an estimate was computed
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Estimated { .. })
    }

    /// Per-eye directions, falling back to straight ahead
    #[must_use]
    pub fn directions(&self) -> (Vector3<f32>, Vector3<f32>) {
        match self {
            Self::Unavailable => (Self::forward(), Self::forward()),
            Self::Estimated { left, right } => (*left, *right),
        }
    }
}

/// Output of the action-unit analyser after a frame
#[derive(Debug, Clone, PartialEq)]
pub struct ActionUnitReading {
    /// Action unit name, e.g. `AU12`
    pub name: String,
    /// Regressed intensity
    pub intensity: f64,
    /// Whether the unit is classified as present
    pub present: bool,
}

/// Stateful facial landmark tracker
pub trait LandmarkDetector {
    /// Backend identifier
    fn name(&self) -> &str;

    /// Track landmarks in the next frame of the current source.
    ///
    /// Returns whether detection succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails internally
    fn detect(
        &mut self,
        grayscale: &GrayImage,
        depth: Option<&DepthImage>,
        intrinsics: &CameraIntrinsics,
    ) -> Result<bool>;

    /// Current tracking state
    fn state(&self) -> &TrackingState;

    /// Discard all temporal state
    fn reset(&mut self);
}

/// Per-eye gaze estimator working from the tracker's eye model
pub trait GazeEstimator {
    /// Estimate the gaze direction of one eye
    ///
    /// # Errors
    ///
    /// Returns an error if the eye model cannot be fitted
    fn estimate(
        &mut self,
        state: &TrackingState,
        intrinsics: &CameraIntrinsics,
        eye: Eye,
    ) -> Result<Vector3<f32>>;
}

/// Action-unit analyser accumulating evidence across a source's frames
pub trait ActionUnitAnalyser {
    /// Feed the next frame
    ///
    /// # Errors
    ///
    /// Returns an error if the analyser fails internally
    fn add_frame(&mut self, image: &CapturedImage, state: &TrackingState, timestamp: f64) -> Result<()>;

    /// Current action-unit estimates
    fn readings(&self) -> Vec<ActionUnitReading>;

    /// Drop the state accumulated for the current source
    fn reset(&mut self);
}

/// The engine set driven by the pipeline
pub struct Engines {
    pub detector: Box<dyn LandmarkDetector>,
    pub gaze: Option<Box<dyn GazeEstimator>>,
    pub analyser: Box<dyn ActionUnitAnalyser>,
}
