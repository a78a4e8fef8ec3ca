use crate::constants::{
    CAPTURE_FPS_HINT, CAPTURE_HEIGHT_HINT, CAPTURE_WIDTH_HINT, DEPTH_WINDOW, INPUT_POLL_MS, TRACKING_WINDOW,
};
use crate::depth::DepthImage;
use crate::frame::CapturedImage;
use crate::input::{command_for_key, InputPoller, UserCommand};
use crate::sinks::display::DisplaySurface;
use crate::sinks::video_writer::{EncoderBackend, FourCc, VideoEncoder};
use crate::source::image_sequence::ImageSequenceSource;
use crate::source::{FrameSource, SourceOpener, SourceSpec};
use crate::utils::image_conversion::{copy_mat_into, depth_to_mat, mat_to_captured, rgb_to_mat};
use crate::utils::safe_cast::dim_to_i32;
use crate::utils::{eye_centres, gaze_ray_end, landmark_bounds, to_pixel};
use crate::visualisation::{Overlay, OverlayRenderer};
use crate::{Error, Result};
use ::opencv::{
    core::{Mat, Point, Rect, Scalar, Size},
    highgui::{self, WINDOW_AUTOSIZE},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter, CAP_PROP_FPS, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};
use image::RgbImage;
use log::{debug, info};
use std::path::Path;

/// Frames from a video file or capture device
pub struct VideoCaptureSource {
    capture: VideoCapture,
}

impl FrameSource for VideoCaptureSource {
    fn next_frame(&mut self) -> Result<Option<CapturedImage>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        Ok(Some(mat_to_captured(&frame)?))
    }
}

/// Opens devices and video files through OpenCV, directories as image sequences
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCvSourceOpener;

impl OpenCvSourceOpener {
    fn open_device(index: i32) -> Result<VideoCapture> {
        let mut capture = VideoCapture::new(index, videoio::CAP_ANY)
            .map_err(|e| Error::SourceOpen(format!("device {index}: {e}")))?;

        // Hints only, the device keeps its own mode when it cannot comply
        for (prop, value) in [
            (CAP_PROP_FRAME_WIDTH, CAPTURE_WIDTH_HINT),
            (CAP_PROP_FRAME_HEIGHT, CAPTURE_HEIGHT_HINT),
            (CAP_PROP_FPS, CAPTURE_FPS_HINT),
        ] {
            if !capture.set(prop, value).unwrap_or(false) {
                debug!("Device {} ignored capture property {} = {}", index, prop, value);
            }
        }
        Ok(capture)
    }

    fn open_file(path: &Path) -> Result<VideoCapture> {
        let name = path
            .to_str()
            .ok_or_else(|| Error::SourceOpen(format!("{}: path is not valid UTF-8", path.display())))?;
        VideoCapture::from_file(name, videoio::CAP_ANY).map_err(|e| Error::SourceOpen(format!("{name}: {e}")))
    }
}

impl SourceOpener for OpenCvSourceOpener {
    fn open(&mut self, source: &SourceSpec) -> Result<Box<dyn FrameSource>> {
        let capture = match source {
            SourceSpec::File(path) if path.is_dir() => return Ok(Box::new(ImageSequenceSource::open(path)?)),
            SourceSpec::File(path) => Self::open_file(path)?,
            SourceSpec::Device(index) => Self::open_device(*index)?,
        };

        if !capture.is_opened().unwrap_or(false) {
            return Err(Error::SourceOpen(format!("{source}: failed to open video source")));
        }
        Ok(Box::new(VideoCaptureSource { capture }))
    }
}

/// HighGUI windows for the tracking result and the depth map
pub struct HighGuiDisplay;

impl HighGuiDisplay {
    /// Create the tracking window
    ///
    /// # Errors
    ///
    /// Returns an error if no window can be created
    pub fn open() -> Result<Self> {
        highgui::named_window(TRACKING_WINDOW, WINDOW_AUTOSIZE).map_err(|e| window_error(TRACKING_WINDOW, &e))?;
        Ok(Self)
    }
}

fn window_error(window: &str, e: &::opencv::Error) -> Error {
    Error::Display(format!("window '{window}': {e}"))
}

impl DisplaySurface for HighGuiDisplay {
    fn show_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let mat = rgb_to_mat(frame, true)?;
        highgui::imshow(TRACKING_WINDOW, &mat).map_err(|e| window_error(TRACKING_WINDOW, &e))
    }

    fn show_depth(&mut self, depth: &DepthImage) -> Result<()> {
        let mat = depth_to_mat(depth)?;
        highgui::imshow(DEPTH_WINDOW, &mat).map_err(|e| window_error(DEPTH_WINDOW, &e))
    }
}

/// Key presses in the HighGUI windows
#[derive(Debug, Default, Clone, Copy)]
pub struct HighGuiInput;

impl InputPoller for HighGuiInput {
    fn poll(&mut self) -> Result<Option<UserCommand>> {
        let key = highgui::wait_key(INPUT_POLL_MS)?;
        if key < 0 {
            return Ok(None);
        }
        Ok(command_for_key(key & 0xFF))
    }
}

/// VideoWriter backed encoder
pub struct OpenCvEncoder {
    writer: VideoWriter,
}

impl VideoEncoder for OpenCvEncoder {
    fn write(&mut self, frame: &RgbImage) -> Result<()> {
        self.writer.write(&rgb_to_mat(frame, true)?)?;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.writer.release()?;
        Ok(())
    }
}

/// Creates VideoWriter encoders
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCvEncoderBackend;

impl EncoderBackend for OpenCvEncoderBackend {
    fn create(
        &mut self,
        path: &Path,
        codec: FourCc,
        fps: f64,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn VideoEncoder>> {
        let name = path
            .to_str()
            .ok_or_else(|| Error::VideoWriter(format!("{}: path is not valid UTF-8", path.display())))?;
        let size = Size::new(dim_to_i32(width)?, dim_to_i32(height)?);
        let writer = VideoWriter::new(name, codec.code(), fps, size, true)?;
        if !writer.is_opened()? {
            return Err(Error::VideoWriter(format!("{name}: encoder refused codec {codec}")));
        }
        info!("Writing {}x{} video at {} fps to {}", width, height, fps, name);
        Ok(Box::new(OpenCvEncoder { writer }))
    }
}

/// Draws overlays with imgproc primitives
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCvRenderer;

fn rgb_scalar(color: [u8; 3]) -> Scalar {
    Scalar::new(f64::from(color[0]), f64::from(color[1]), f64::from(color[2]), 0.0)
}

impl OverlayRenderer for OpenCvRenderer {
    fn render(&mut self, frame: &mut RgbImage, overlay: &Overlay) -> Result<()> {
        // Drawn in RGB order, colours are given as RGB
        let mut canvas = rgb_to_mat(frame, false)?;

        if let Some(tracking) = &overlay.tracking {
            let color = rgb_scalar(tracking.color);

            for landmark in &tracking.landmarks {
                let (x, y) = to_pixel(*landmark);
                imgproc::circle(&mut canvas, Point::new(x, y), tracking.thickness, color, -1, LINE_8, 0)?;
            }

            if let Some((min, max)) = landmark_bounds(&tracking.landmarks) {
                let (x0, y0) = to_pixel(min);
                let (x1, y1) = to_pixel(max);
                imgproc::rectangle(
                    &mut canvas,
                    Rect::new(x0, y0, x1 - x0, y1 - y0),
                    color,
                    tracking.thickness,
                    LINE_8,
                    0,
                )?;
            }

            if let (Some((left, right)), Some((left_eye, right_eye))) =
                (tracking.gaze, eye_centres(&tracking.landmarks))
            {
                let gaze_color = Scalar::new(110.0, 220.0, 0.0, 0.0);
                for (origin, direction) in [(left_eye, left), (right_eye, right)] {
                    let (x0, y0) = to_pixel(origin);
                    let (x1, y1) = to_pixel(gaze_ray_end(origin, &direction, tracking.intrinsics.fx));
                    imgproc::arrowed_line(
                        &mut canvas,
                        Point::new(x0, y0),
                        Point::new(x1, y1),
                        gaze_color,
                        tracking.thickness,
                        LINE_8,
                        0,
                        0.2,
                    )?;
                }
            }
        }

        imgproc::put_text(
            &mut canvas,
            &overlay.fps_label,
            Point::new(10, 20),
            FONT_HERSHEY_SIMPLEX,
            0.5,
            Scalar::new(255.0, 0.0, 0.0, 0.0),
            1,
            LINE_8,
            false,
        )?;

        copy_mat_into(&canvas, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraIntrinsics;
    use crate::engines::{GazeResult, TrackingState};
    use nalgebra::Point2;

    #[test]
    fn test_window_failures_are_display_errors() {
        let e = ::opencv::Error::new(::opencv::core::StsError, "no display");
        let err = window_error(TRACKING_WINDOW, &e);
        assert!(matches!(err, Error::Display(ref msg) if msg.contains("tracking_result") && msg.contains("no display")));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_renderer_draws_fps_label() {
        let mut frame = RgbImage::new(64, 48);
        let overlay = Overlay::build(&TrackingState::default(), &GazeResult::Unavailable, &CameraIntrinsics::default(), 64, 30.0);
        OpenCvRenderer.render(&mut frame, &overlay).unwrap();
        assert!(frame.pixels().any(|p| p.0[0] > 0));
    }

    #[test]
    fn test_renderer_draws_tracking() {
        let mut frame = RgbImage::new(64, 48);
        let tracking = TrackingState {
            success: true,
            certainty: -1.0,
            eye_model: false,
            landmarks: vec![Point2::new(20.0, 20.0), Point2::new(40.0, 30.0)],
        };
        let overlay = Overlay::build(&tracking, &GazeResult::Unavailable, &CameraIntrinsics::default(), 64, -1.0);
        OpenCvRenderer.render(&mut frame, &overlay).unwrap();
        // Certain detections are drawn in blue
        assert!(frame.get_pixel(20, 20).0[2] > 0);
    }

    #[test]
    fn test_missing_video_file_fails_to_open() {
        let mut opener = OpenCvSourceOpener;
        let result = opener.open(&SourceSpec::File("/nonexistent/clip.avi".into()));
        assert!(matches!(result, Err(Error::SourceOpen(_))));
    }
}
