//! Per-frame data: captured images, their grayscale derivative and the
//! transient context handed through one pipeline iteration.

use crate::depth::{DepthImage, DepthSource};
use image::{DynamicImage, GrayImage, RgbImage};
use log::warn;
use std::time::Instant;

/// Image as delivered by a frame source
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedImage {
    /// Three channel colour frame
    Color(RgbImage),
    /// Single channel frame
    Gray(GrayImage),
}

impl CapturedImage {
    /// Frame width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        match self {
            Self::Color(image) => image.width(),
            Self::Gray(image) => image.width(),
        }
    }

    /// Frame height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        match self {
            Self::Color(image) => image.height(),
            Self::Gray(image) => image.height(),
        }
    }

    /// Number of channels
    #[must_use]
    pub fn channels(&self) -> u8 {
        match self {
            Self::Color(_) => 3,
            Self::Gray(_) => 1,
        }
    }

    /// Grayscale representation; single channel frames are copied as is
    #[must_use]
    pub fn to_grayscale(&self) -> GrayImage {
        match self {
            Self::Color(image) => image::imageops::grayscale(image),
            Self::Gray(image) => image.clone(),
        }
    }

    /// Colour representation used for annotation and video output
    #[must_use]
    pub fn to_rgb(&self) -> RgbImage {
        match self {
            Self::Color(image) => image.clone(),
            Self::Gray(image) => DynamicImage::ImageLuma8(image.clone()).into_rgb8(),
        }
    }
}

impl From<DynamicImage> for CapturedImage {
    fn from(image: DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(gray) => Self::Gray(gray),
            other => Self::Color(other.into_rgb8()),
        }
    }
}

/// Everything known about the frame currently being processed.
///
/// Lives for exactly one loop iteration.
#[derive(Debug)]
pub struct FrameContext {
    /// Frame index within the current source, starting at 0
    pub index: u64,
    /// Seconds since the start of the source
    pub timestamp: f64,
    /// Captured image
    pub image: CapturedImage,
    /// Grayscale derivative passed to the detector
    pub grayscale: GrayImage,
    /// Depth map, absent when not configured or not found
    pub depth: Option<DepthImage>,
}

impl FrameContext {
    /// Build the context for a captured frame.
    ///
    /// The depth map is only requested when a depth source is configured; a
    /// failed load is logged and leaves the depth absent.
    #[must_use]
    pub fn prepare(
        image: CapturedImage,
        index: u64,
        timestamp: f64,
        depth_source: Option<&dyn DepthSource>,
    ) -> Self {
        let grayscale = image.to_grayscale();

        let depth = depth_source.and_then(|source| match source.load(index) {
            Ok(depth) => Some(depth),
            Err(e) => {
                warn!("Can't find depth image for frame {}: {}", index, e);
                None
            }
        });

        Self {
            index,
            timestamp,
            image,
            grayscale,
            depth,
        }
    }
}

/// How frame timestamps advance
#[derive(Debug, Clone, Copy)]
pub enum TimestampMode {
    /// Constant interval per frame, in seconds
    FixedInterval(f64),
    /// Wall-clock time since the source was opened
    WallClock(Instant),
}

/// Frame counter and timestamp of the current source
#[derive(Debug, Clone)]
pub struct FrameClock {
    index: u64,
    timestamp: f64,
    mode: TimestampMode,
}

impl FrameClock {
    /// Clock for a recorded source advancing by `1 / frame_rate` per frame
    #[must_use]
    pub fn fixed(frame_rate: f64) -> Self {
        Self {
            index: 0,
            timestamp: 0.0,
            mode: TimestampMode::FixedInterval(1.0 / frame_rate),
        }
    }

    /// Clock for a live source stamped from wall-clock time
    #[must_use]
    pub fn live() -> Self {
        Self {
            index: 0,
            timestamp: 0.0,
            mode: TimestampMode::WallClock(Instant::now()),
        }
    }

    /// Index of the current frame
    #[must_use]
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Timestamp of the current frame
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Move on to the next frame
    pub fn advance(&mut self) {
        self.index += 1;
        self.timestamp = match self.mode {
            TimestampMode::FixedInterval(interval) => self.timestamp + interval,
            TimestampMode::WallClock(start) => start.elapsed().as_secs_f64().max(self.timestamp),
        };
    }
}
