//! Per-frame processing: tracking, gaze, action units and output.

use crate::camera::CameraIntrinsics;
use crate::engines::{Engines, Eye, GazeResult};
use crate::frame::FrameContext;
use crate::sinks::{FrameResult, OutputMultiplexer};
use log::{debug, warn};

/// Drives the engines over the frames of the current source
pub struct FramePipeline {
    engines: Engines,
    track_gaze: bool,
}

impl FramePipeline {
    #[must_use]
    pub fn new(engines: Engines, track_gaze: bool) -> Self {
        Self { engines, track_gaze }
    }

    /// Whether gaze estimation was requested
    #[must_use]
    pub fn track_gaze(&self) -> bool {
        self.track_gaze
    }

    /// Run one frame through the engines and hand the result to the outputs
    pub fn process(
        &mut self,
        frame: &FrameContext,
        intrinsics: &CameraIntrinsics,
        outputs: &mut OutputMultiplexer,
    ) -> FrameResult {
        let detected = match self
            .engines
            .detector
            .detect(&frame.grayscale, frame.depth.as_ref(), intrinsics)
        {
            Ok(success) => success,
            Err(e) => {
                warn!("Landmark detection failed on frame {}: {}", frame.index, e);
                false
            }
        };

        let tracking = self.engines.detector.state().clone();
        let gaze = self.estimate_gaze(detected, frame.index, intrinsics);

        // Runs on every frame, tracked or not, so the analyser sees the whole sequence
        if let Err(e) = self
            .engines
            .analyser
            .add_frame(&frame.image, &tracking, frame.timestamp)
        {
            warn!("Action unit analysis failed on frame {}: {}", frame.index, e);
        }

        let result = FrameResult {
            tracking,
            gaze,
            action_units: self.engines.analyser.readings(),
        };

        outputs.dispatch(frame, intrinsics, &result);
        result
    }

    fn estimate_gaze(&mut self, detected: bool, frame_index: u64, intrinsics: &CameraIntrinsics) -> GazeResult {
        if !self.track_gaze || !detected {
            return GazeResult::Unavailable;
        }
        let state = self.engines.detector.state();
        if !state.eye_model {
            return GazeResult::Unavailable;
        }
        let Some(estimator) = self.engines.gaze.as_mut() else {
            return GazeResult::Unavailable;
        };

        let left = estimator.estimate(state, intrinsics, Eye::Left);
        let right = estimator.estimate(state, intrinsics, Eye::Right);
        match (left, right) {
            (Ok(left), Ok(right)) => GazeResult::Estimated { left, right },
            (Err(e), _) | (_, Err(e)) => {
                debug!("Gaze estimation failed on frame {}: {}", frame_index, e);
                GazeResult::Unavailable
            }
        }
    }

    /// Drop the tracker's temporal state on user request
    pub fn reset_tracking(&mut self) {
        self.engines.detector.reset();
    }

    /// Reset everything accumulated for the finished source
    pub fn end_source(&mut self) {
        self.engines.detector.reset();
        self.engines.analyser.reset();
    }

    /// Name of the tracking backend
    #[must_use]
    pub fn detector_name(&self) -> &str {
        self.engines.detector.name()
    }
}
