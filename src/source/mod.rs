//! Input sources and the queue they are processed in.
//!
//! A run processes an ordered list of files. When no file is given the
//! default capture device becomes the only source. Directories are read as
//! image sequences; video files and devices need a video backend.

/// Directory of still frames
pub mod image_sequence;

use crate::constants::DEFAULT_DEVICE;
use crate::frame::CapturedImage;
use crate::{Error, Result};
use image_sequence::ImageSequenceSource;
use std::fmt;
use std::path::PathBuf;

/// One input of the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// Live capture device index
    Device(i32),
    /// Video file or image sequence directory
    File(PathBuf),
}

impl SourceSpec {
    /// Whether frames come from a live device
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Device(_))
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(index) => write!(f, "device {index}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Progress through the configured sources
#[derive(Debug, Clone)]
pub struct SourceQueue {
    sources: Vec<SourceSpec>,
    current: Option<usize>,
    done: bool,
}

impl SourceQueue {
    /// Queue the given files, or the device alone when there are none
    #[must_use]
    pub fn new(files: Vec<PathBuf>, device: i32) -> Self {
        let sources = if files.is_empty() {
            vec![SourceSpec::Device(device)]
        } else {
            files.into_iter().map(SourceSpec::File).collect()
        };
        Self {
            sources,
            current: None,
            done: false,
        }
    }

    /// Queue only the default device
    #[must_use]
    pub fn live() -> Self {
        Self::new(Vec::new(), DEFAULT_DEVICE)
    }

    /// Whether another source remains
    #[must_use]
    pub fn has_next(&self) -> bool {
        !self.done && self.current.map_or(0, |i| i + 1) < self.sources.len()
    }

    /// Move to the next source
    pub fn advance(&mut self) -> Option<(usize, &SourceSpec)> {
        if !self.has_next() {
            return None;
        }
        let index = self.current.map_or(0, |i| i + 1);
        self.current = Some(index);
        self.sources.get(index).map(|source| (index, source))
    }

    /// Record that the current source has been fully processed
    pub fn complete_current(&mut self) {
        if let Some(index) = self.current {
            if index + 1 >= self.sources.len() {
                self.done = true;
            }
        }
    }

    /// Index of the source being processed
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Whether every source has been processed
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Whether the queue is the single live device
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.sources.len() == 1 && self.sources[0].is_live()
    }

    /// Number of queued sources
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Never true, the device fills in for an empty list
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Stream of frames from one source
pub trait FrameSource {
    /// Next frame, `None` at end of stream
    ///
    /// # Errors
    ///
    /// Returns an error if reading the frame failed
    fn next_frame(&mut self) -> Result<Option<CapturedImage>>;
}

/// Opens sources for the session
pub trait SourceOpener {
    /// Open a source
    ///
    /// # Errors
    ///
    /// Returns `SourceOpen` if the source cannot be opened
    fn open(&mut self, source: &SourceSpec) -> Result<Box<dyn FrameSource>>;
}

/// Opener available without a video backend: image sequences only
#[derive(Debug, Default, Clone, Copy)]
pub struct SequenceOpener;

impl SourceOpener for SequenceOpener {
    fn open(&mut self, source: &SourceSpec) -> Result<Box<dyn FrameSource>> {
        match source {
            SourceSpec::File(path) if path.is_dir() => Ok(Box::new(ImageSequenceSource::open(path)?)),
            other => Err(Error::SourceOpen(format!(
                "{other}: video files and capture devices require the opencv feature"
            ))),
        }
    }
}
