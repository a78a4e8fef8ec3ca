//! Error types for the face landmark video loop.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding failed
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// OSC packet could not be encoded
    #[error("OSC error: {0}")]
    Osc(String),

    /// A video file or capture device could not be opened
    #[error("Failed to open video source: {0}")]
    SourceOpen(String),

    /// A required model resource was not found in any search location
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// The output video writer could not be created or written
    #[error("Video writer error: {0}")]
    VideoWriter(String),

    /// The display surface failed
    #[error("Display error: {0}")]
    Display(String),

    /// A detection, gaze or action-unit engine reported a failure
    #[error("Engine error: {0}")]
    Engine(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic I/O error with description
    #[error("I/O error: {0}")]
    IoError(String),
}

impl Error {
    /// Whether this error must terminate the run.
    ///
    /// Only resource discovery and source opening are fatal; everything else
    /// is absorbed by the frame loop and logged.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SourceOpen(_) | Self::ResourceNotFound(_) | Self::ConfigError(_)
        )
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
