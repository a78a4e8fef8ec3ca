//! What gets drawn on a frame, independent of how it is drawn.
//!
//! Tracking overlays are shown only while detection certainty is below
//! [`VISUALISATION_BOUNDARY`]. The certainty is clamped to [-1, 1] and mapped
//! onto a [0, 1] intensity that blends the face box from blue (certain) to
//! red (uncertain). A frame rate label is always present.

use crate::camera::CameraIntrinsics;
use crate::constants::{FPS_UNKNOWN, FPS_WINDOW_FRAMES, REFERENCE_FRAME_WIDTH, VISUALISATION_BOUNDARY};
use crate::engines::{GazeResult, TrackingState};
use crate::utils::safe_cast::{f64_to_i32_clamp, unit_to_u8};
use crate::Result;
use image::RgbImage;
use nalgebra::{Point2, Vector3};
use std::time::Instant;

/// Whether tracking results are reliable enough to draw
#[must_use]
pub fn should_draw_tracking(certainty: f64) -> bool {
    certainty < VISUALISATION_BOUNDARY
}

/// Display intensity of a certainty value, always within [0, 1]
#[must_use]
pub fn display_intensity(certainty: f64) -> f64 {
    if certainty.is_nan() {
        return 1.0;
    }
    let clamped = certainty.clamp(-1.0, 1.0);
    ((clamped + 1.0) / (VISUALISATION_BOUNDARY + 1.0)).clamp(0.0, 1.0)
}

/// Face box line thickness for a frame width
#[must_use]
pub fn box_thickness(frame_width: u32) -> i32 {
    f64_to_i32_clamp((2.0 * f64::from(frame_width) / REFERENCE_FRAME_WIDTH).ceil(), 1, i32::MAX)
}

/// Rolling frame rate estimate, refreshed every [`FPS_WINDOW_FRAMES`] frames
#[derive(Debug, Clone)]
pub struct FpsTracker {
    fps: f64,
    last_tick: Option<Instant>,
}

impl Default for FpsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fps: FPS_UNKNOWN,
            last_tick: None,
        }
    }

    /// Update for a frame index using the current time
    pub fn update(&mut self, frame_index: u64) -> f64 {
        self.update_at(frame_index, Instant::now())
    }

    /// Update for a frame index at a given instant
    pub fn update_at(&mut self, frame_index: u64, now: Instant) -> f64 {
        if frame_index % FPS_WINDOW_FRAMES == 0 {
            if let Some(last) = self.last_tick {
                let elapsed = now.saturating_duration_since(last).as_secs_f64();
                if elapsed > 0.0 {
                    #[allow(clippy::cast_precision_loss)]
                    let frames = FPS_WINDOW_FRAMES as f64;
                    self.fps = frames / elapsed;
                }
            }
            self.last_tick = Some(now);
        }
        self.fps
    }

    /// Latest estimate, `-1` before the first window completes
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }
}

/// Label drawn in the frame corner
#[must_use]
pub fn fps_label(fps: f64) -> String {
    format!("FPS:{}", f64_to_i32_clamp(fps, i32::MIN, i32::MAX))
}

/// Tracking part of the overlay
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingOverlay {
    /// Landmarks to mark
    pub landmarks: Vec<Point2<f32>>,
    /// Box colour as RGB
    pub color: [u8; 3],
    /// Box line thickness
    pub thickness: i32,
    /// Per-eye gaze directions when estimated
    pub gaze: Option<(Vector3<f32>, Vector3<f32>)>,
    /// Intrinsics used to project the overlay
    pub intrinsics: CameraIntrinsics,
}

/// Everything drawn onto one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    /// Present only when certainty is below the boundary
    pub tracking: Option<TrackingOverlay>,
    /// Frame rate label
    pub fps_label: String,
}

impl Overlay {
    /// Build the overlay for a processed frame
    #[must_use]
    pub fn build(
        tracking: &TrackingState,
        gaze: &GazeResult,
        intrinsics: &CameraIntrinsics,
        frame_width: u32,
        fps: f64,
    ) -> Self {
        let tracking = should_draw_tracking(tracking.certainty).then(|| {
            let intensity = display_intensity(tracking.certainty);
            TrackingOverlay {
                landmarks: tracking.landmarks.clone(),
                color: [unit_to_u8(intensity), 0, unit_to_u8(1.0 - intensity)],
                thickness: box_thickness(frame_width),
                gaze: match gaze {
                    GazeResult::Estimated { left, right } => Some((*left, *right)),
                    GazeResult::Unavailable => None,
                },
                intrinsics: *intrinsics,
            }
        });

        Self {
            tracking,
            fps_label: fps_label(fps),
        }
    }
}

/// Drawing primitive applied to outgoing frames
pub trait OverlayRenderer {
    /// Draw the overlay onto the frame in place
    ///
    /// # Errors
    ///
    /// Returns an error if drawing fails
    fn render(&mut self, frame: &mut RgbImage, overlay: &Overlay) -> Result<()>;
}

/// Renderer that leaves frames untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

impl OverlayRenderer for NoopRenderer {
    fn render(&mut self, _frame: &mut RgbImage, _overlay: &Overlay) -> Result<()> {
        Ok(())
    }
}
