use crate::constants::DEPTH_DISPLAY_SCALE;
use crate::depth::{scale_for_display, DepthImage};
use crate::sinks::{FrameOutput, OutputSink, SinkFactory, SourceContext};
use crate::{Error, Result};
use image::RgbImage;

/// Window system the annotated frames are shown on
pub trait DisplaySurface {
    /// Show a tracking frame
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be shown
    fn show_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Show a depth map already scaled to [0, 1]
    ///
    /// # Errors
    ///
    /// Returns an error if the depth map cannot be shown
    fn show_depth(&mut self, depth: &DepthImage) -> Result<()>;
}

/// Sink showing every frame, plus the depth map when one was loaded
pub struct DisplaySink {
    surface: Box<dyn DisplaySurface>,
}

impl DisplaySink {
    #[must_use]
    pub fn new(surface: Box<dyn DisplaySurface>) -> Self {
        Self { surface }
    }
}

impl OutputSink for DisplaySink {
    fn name(&self) -> &str {
        "display"
    }

    fn consume(&mut self, output: &FrameOutput<'_>) -> Result<()> {
        if output.image.width() == 0 || output.image.height() == 0 {
            return Err(Error::Display(format!("frame {} is empty", output.frame_index)));
        }
        self.surface.show_frame(output.image)?;
        if let Some(depth) = output.depth {
            self.surface.show_depth(&scale_for_display(depth, DEPTH_DISPLAY_SCALE))?;
        }
        Ok(())
    }
}

/// Opens a display sink per source from a surface constructor
pub struct DisplayFactory {
    open_surface: Box<dyn FnMut() -> Result<Box<dyn DisplaySurface>>>,
}

impl DisplayFactory {
    pub fn new<F>(open_surface: F) -> Self
    where
        F: FnMut() -> Result<Box<dyn DisplaySurface>> + 'static,
    {
        Self {
            open_surface: Box::new(open_surface),
        }
    }
}

impl SinkFactory for DisplayFactory {
    fn name(&self) -> &str {
        "display"
    }

    fn open(&mut self, _context: &SourceContext<'_>) -> Result<Option<Box<dyn OutputSink>>> {
        let surface = (self.open_surface)()?;
        Ok(Some(Box::new(DisplaySink::new(surface))))
    }
}
