//! Depth frames stored as 16-bit PNG files next to a recording.
//!
//! Frame `n` (0-based) of a source is read from `depth{n+1:05}.png` inside
//! the source's depth directory and converted to floating point.

use crate::Result;
use image::{ImageBuffer, Luma};
use std::path::{Path, PathBuf};

/// Floating point depth map
pub type DepthImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Provider of per-frame depth maps
pub trait DepthSource {
    /// Load the depth map matching a frame index
    ///
    /// # Errors
    ///
    /// Returns an error if the depth frame is missing or unreadable
    fn load(&self, frame_index: u64) -> Result<DepthImage>;
}

/// Directory of numbered depth PNGs
#[derive(Debug, Clone)]
pub struct DepthDirectory {
    root: PathBuf,
}

impl DepthDirectory {
    /// Wrap a depth directory
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Directory the frames are read from
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the depth map of a frame
    #[must_use]
    pub fn path_for(&self, frame_index: u64) -> PathBuf {
        self.root.join(format!("depth{:05}.png", frame_index + 1))
    }
}

impl DepthSource for DepthDirectory {
    fn load(&self, frame_index: u64) -> Result<DepthImage> {
        let raw = image::open(self.path_for(frame_index))?.into_luma16();
        Ok(depth_to_f32(&raw))
    }
}

/// Convert a 16-bit depth map to floating point
#[must_use]
pub fn depth_to_f32(raw: &ImageBuffer<Luma<u16>, Vec<u16>>) -> DepthImage {
    DepthImage::from_fn(raw.width(), raw.height(), |x, y| {
        Luma([f32::from(raw.get_pixel(x, y)[0])])
    })
}

/// Scale a depth map into the range the display expects
#[must_use]
pub fn scale_for_display(depth: &DepthImage, scale: f32) -> DepthImage {
    DepthImage::from_fn(depth.width(), depth.height(), |x, y| {
        Luma([depth.get_pixel(x, y)[0] / scale])
    })
}
