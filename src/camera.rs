//! Camera intrinsics and their inference from frame resolution.
//!
//! User supplied values take precedence. Any value left at zero is treated as
//! unset and approximated from the first captured frame of a source:
//! the optical centre falls back to the image centre and the focal length to
//! a 500 px lens scaled from a 640x480 reference frame.

use crate::constants::{REFERENCE_FOCAL_LENGTH, REFERENCE_FRAME_HEIGHT, REFERENCE_FRAME_WIDTH};
use log::info;
use serde::{Deserialize, Serialize};

/// Pinhole camera parameters in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraIntrinsics {
    /// Horizontal focal length
    pub fx: f64,
    /// Vertical focal length
    pub fy: f64,
    /// Optical centre, x
    pub cx: f64,
    /// Optical centre, y
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Create intrinsics from explicit values (zero marks a value as unset)
    #[must_use]
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Whether both optical centre coordinates were supplied
    #[must_use]
    pub fn has_optical_center(&self) -> bool {
        self.cx != 0.0 && self.cy != 0.0
    }

    /// Whether both focal lengths were supplied
    #[must_use]
    pub fn has_focal_length(&self) -> bool {
        self.fx != 0.0 && self.fy != 0.0
    }

    /// Fill in unset values from a frame of the given size
    #[must_use]
    pub fn completed_for(&self, width: u32, height: u32) -> Self {
        let width = f64::from(width);
        let height = f64::from(height);
        let mut resolved = *self;

        if !self.has_optical_center() {
            resolved.cx = width / 2.0;
            resolved.cy = height / 2.0;
        }

        if !self.has_focal_length() {
            let fx = REFERENCE_FOCAL_LENGTH * (width / REFERENCE_FRAME_WIDTH);
            let fy = REFERENCE_FOCAL_LENGTH * (height / REFERENCE_FRAME_HEIGHT);
            let focal = (fx + fy) / 2.0;
            resolved.fx = focal;
            resolved.fy = focal;
        }

        resolved
    }
}

/// Resolves intrinsics once per source and keeps them frozen afterwards
#[derive(Debug, Clone)]
pub struct CameraResolver {
    user: CameraIntrinsics,
    resolved: Option<CameraIntrinsics>,
}

impl CameraResolver {
    /// Create a resolver around the user supplied (possibly partial) values
    #[must_use]
    pub fn new(user: CameraIntrinsics) -> Self {
        Self { user, resolved: None }
    }

    /// Resolve against the first frame of the current source.
    ///
    /// Later calls within the same source return the frozen values no matter
    /// what size is passed.
    pub fn resolve(&mut self, width: u32, height: u32) -> CameraIntrinsics {
        if let Some(resolved) = self.resolved {
            return resolved;
        }

        let resolved = self.user.completed_for(width, height);
        if !self.user.has_optical_center() || !self.user.has_focal_length() {
            info!(
                "Inferred camera intrinsics from {}x{} frame: fx={:.1} fy={:.1} cx={:.1} cy={:.1}",
                width, height, resolved.fx, resolved.fy, resolved.cx, resolved.cy
            );
        }
        self.resolved = Some(resolved);
        resolved
    }

    /// Intrinsics of the current source, if a frame has been seen
    #[must_use]
    pub fn resolved(&self) -> Option<CameraIntrinsics> {
        self.resolved
    }

    /// Forget the current source's values
    pub fn reset(&mut self) {
        self.resolved = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_center_uses_image_center() {
        let resolved = CameraIntrinsics::new(600.0, 600.0, 0.0, 0.0).completed_for(640, 480);
        assert_eq!(resolved.cx, 320.0);
        assert_eq!(resolved.cy, 240.0);
        assert_eq!(resolved.fx, 600.0);
        assert_eq!(resolved.fy, 600.0);
    }

    #[test]
    fn test_unset_focal_length_is_averaged_and_symmetric() {
        let resolved = CameraIntrinsics::default().completed_for(1280, 720);
        // 500 * 1280/640 = 1000, 500 * 720/480 = 750
        assert_eq!(resolved.fx, 875.0);
        assert_eq!(resolved.fy, 875.0);
        assert_eq!(resolved.cx, 640.0);
        assert_eq!(resolved.cy, 360.0);
    }

    #[test]
    fn test_partial_center_counts_as_unset() {
        let resolved = CameraIntrinsics::new(500.0, 500.0, 100.0, 0.0).completed_for(640, 480);
        assert_eq!(resolved.cx, 320.0);
        assert_eq!(resolved.cy, 240.0);
    }

    #[test]
    fn test_user_values_kept() {
        let user = CameraIntrinsics::new(700.0, 710.0, 300.0, 200.0);
        assert_eq!(user.completed_for(1920, 1080), user);
    }

    #[test]
    fn test_resolver_freezes_first_frame() {
        let mut resolver = CameraResolver::new(CameraIntrinsics::default());
        assert!(resolver.resolved().is_none());

        let first = resolver.resolve(640, 480);
        let later = resolver.resolve(1920, 1080);
        assert_eq!(first, later);
        assert_eq!(first.fx, 500.0);

        resolver.reset();
        let next_source = resolver.resolve(1920, 1080);
        assert_eq!(next_source.cx, 960.0);
    }
}
