//! Per-source video file output.
//!
//! The writer is built from the first frame's size at [`OUTPUT_VIDEO_FPS`]
//! using a four character codec code. Construction failures only disable
//! file output for that source.

use crate::constants::OUTPUT_VIDEO_FPS;
use crate::sinks::{FrameOutput, OutputSink, SinkFactory, SourceContext};
use crate::{Error, Result};
use image::RgbImage;
use log::warn;
use std::fmt;
use std::path::Path;

/// Four character codec code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourCc([u8; 4]);

impl FourCc {
    /// Parse a codec string of exactly four printable ASCII characters
    ///
    /// # Errors
    ///
    /// Returns `VideoWriter` if the string is not a valid code
    pub fn parse(codec: &str) -> Result<Self> {
        let bytes = codec.as_bytes();
        let valid = bytes.len() == 4 && bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ');
        if !valid {
            return Err(Error::VideoWriter(format!(
                "codec '{codec}' is not a four character code"
            )));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Packed little-endian code as used by video container APIs
    #[must_use]
    pub fn code(&self) -> i32 {
        i32::from_le_bytes(self.0)
    }

    /// The four characters
    #[must_use]
    pub fn chars(&self) -> [char; 4] {
        self.0.map(char::from)
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.chars() {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// An open video file
pub trait VideoEncoder {
    /// Append a frame
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails
    fn write(&mut self, frame: &RgbImage) -> Result<()>;

    /// Finalise the file
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be closed
    fn release(&mut self) -> Result<()>;
}

/// Creates encoders for output files
pub trait EncoderBackend {
    /// Create an encoder
    ///
    /// # Errors
    ///
    /// Returns an error if the codec is unsupported or the file cannot be created
    fn create(
        &mut self,
        path: &Path,
        codec: FourCc,
        fps: f64,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn VideoEncoder>>;
}

/// Backend used when the binary was built without a video library
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableEncoderBackend;

impl EncoderBackend for UnavailableEncoderBackend {
    fn create(
        &mut self,
        path: &Path,
        _codec: FourCc,
        _fps: f64,
        _width: u32,
        _height: u32,
    ) -> Result<Box<dyn VideoEncoder>> {
        Err(Error::VideoWriter(format!(
            "cannot write {}: video output requires the opencv feature",
            path.display()
        )))
    }
}

/// Sink appending annotated frames to a video file
pub struct VideoWriterSink {
    encoder: Box<dyn VideoEncoder>,
    frames_written: u64,
}

impl VideoWriterSink {
    #[must_use]
    pub fn new(encoder: Box<dyn VideoEncoder>) -> Self {
        Self {
            encoder,
            frames_written: 0,
        }
    }

    /// Frames appended so far
    #[must_use]
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl OutputSink for VideoWriterSink {
    fn name(&self) -> &str {
        "video writer"
    }

    fn consume(&mut self, output: &FrameOutput<'_>) -> Result<()> {
        self.encoder.write(output.image)?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.encoder.release()
    }
}

/// Opens a writer for every source that has an output file
pub struct VideoWriterFactory {
    codec: String,
    backend: Box<dyn EncoderBackend>,
}

impl VideoWriterFactory {
    pub fn new<S: Into<String>>(codec: S, backend: Box<dyn EncoderBackend>) -> Self {
        Self {
            codec: codec.into(),
            backend,
        }
    }
}

impl SinkFactory for VideoWriterFactory {
    fn name(&self) -> &str {
        "video writer"
    }

    fn open(&mut self, context: &SourceContext<'_>) -> Result<Option<Box<dyn OutputSink>>> {
        let Some(path) = context.output_video else {
            return Ok(None);
        };

        let encoder = FourCc::parse(&self.codec)
            .and_then(|codec| {
                self.backend.create(
                    path,
                    codec,
                    OUTPUT_VIDEO_FPS,
                    context.frame_width,
                    context.frame_height,
                )
            })
            .map_err(|e| {
                warn!(
                    "Could not open VideoWriter, OUTPUT FILE WILL NOT BE WRITTEN. Currently using codec {}, try using another one",
                    self.codec
                );
                e
            })?;

        Ok(Some(Box::new(VideoWriterSink::new(encoder))))
    }
}
