use crate::camera::CameraIntrinsics;
use crate::constants::{AU_SIM_SCALE_PER_PIXEL, AU_SIM_SIZE};
use crate::depth::DepthImage;
use crate::engines::{ActionUnitAnalyser, ActionUnitReading, LandmarkDetector, TrackingState};
use crate::frame::CapturedImage;
use crate::resources::ModelResources;
use crate::{Error, Result};
use image::GrayImage;
use log::{debug, info};

/// Tracker stand-in that never finds a face.
///
/// Keeps the loop, its sinks and telemetry running when no tracking model is
/// linked into the binary.
#[derive(Debug, Default)]
pub struct StubDetector {
    state: TrackingState,
    frames_since_reset: u64,
}

impl StubDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames seen since the last reset
    pub fn frames_since_reset(&self) -> u64 {
        self.frames_since_reset
    }
}

impl LandmarkDetector for StubDetector {
    fn name(&self) -> &str {
        "stub"
    }

    fn detect(
        &mut self,
        grayscale: &GrayImage,
        _depth: Option<&DepthImage>,
        _intrinsics: &CameraIntrinsics,
    ) -> Result<bool> {
        if grayscale.width() == 0 || grayscale.height() == 0 {
            return Err(Error::InvalidInput("Empty frame passed to detector".to_string()));
        }
        self.frames_since_reset += 1;
        Ok(self.state.success)
    }

    fn state(&self) -> &TrackingState {
        &self.state
    }

    fn reset(&mut self) {
        self.state = TrackingState::default();
        self.frames_since_reset = 0;
    }
}

/// Action-unit analyser stand-in built from the discovered predictor list.
///
/// Reports every listed unit as absent with zero intensity and counts the
/// frames it was fed.
#[derive(Debug)]
pub struct StubAnalyser {
    units: Vec<String>,
    sim_size: u32,
    sim_scale: f64,
    frames: u64,
    last_timestamp: Option<f64>,
}

impl StubAnalyser {
    /// Build from the predictor list; each non-comment line names one unit
    ///
    /// # Errors
    ///
    /// Returns an error if the predictor list or triangulation is unreadable
    pub fn from_resources(resources: &ModelResources) -> Result<Self> {
        let listing = std::fs::read_to_string(&resources.au_predictors)?;
        std::fs::metadata(&resources.triangulation)?;

        let units: Vec<String> = listing
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_whitespace().next())
            .map(unit_name)
            .collect();

        info!(
            "Action unit analyser loaded {} predictors from {}",
            units.len(),
            resources.au_predictors.display()
        );

        Ok(Self::with_units(units))
    }

    /// Build from an explicit unit list
    pub fn with_units(units: Vec<String>) -> Self {
        Self {
            units,
            sim_size: AU_SIM_SIZE,
            sim_scale: f64::from(AU_SIM_SIZE) * AU_SIM_SCALE_PER_PIXEL,
            frames: 0,
            last_timestamp: None,
        }
    }

    /// Units this analyser reports
    pub fn units(&self) -> &[String] {
        &self.units
    }

    /// Frames fed since the last reset
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Timestamp of the last frame fed
    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }

    /// Size and scale of the normalised face
    pub fn similarity(&self) -> (u32, f64) {
        (self.sim_size, self.sim_scale)
    }
}

/// Predictor entries look like `AU12_dyn_intensity.dat`; keep the `AU12` part
fn unit_name(entry: &str) -> String {
    let file = entry.rsplit(['/', '\\']).next().unwrap_or(entry);
    file.split(['_', '.']).next().unwrap_or(file).to_string()
}

impl ActionUnitAnalyser for StubAnalyser {
    fn add_frame(&mut self, _image: &CapturedImage, state: &TrackingState, timestamp: f64) -> Result<()> {
        self.frames += 1;
        self.last_timestamp = Some(timestamp);
        debug!(
            "AU analyser frame {} at {:.3}s (tracking success: {})",
            self.frames, timestamp, state.success
        );
        Ok(())
    }

    fn readings(&self) -> Vec<ActionUnitReading> {
        self.units
            .iter()
            .map(|name| ActionUnitReading {
                name: name.clone(),
                intensity: 0.0,
                present: false,
            })
            .collect()
    }

    fn reset(&mut self) {
        self.frames = 0;
        self.last_timestamp = None;
    }
}
