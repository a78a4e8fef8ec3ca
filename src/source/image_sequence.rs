use crate::frame::CapturedImage;
use crate::source::FrameSource;
use crate::{Error, Result};
use log::info;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Frames read in file name order from a directory
#[derive(Debug)]
pub struct ImageSequenceSource {
    pending: VecDeque<PathBuf>,
}

impl ImageSequenceSource {
    /// List the frames of a directory
    ///
    /// # Errors
    ///
    /// Returns `SourceOpen` if the directory cannot be read
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| Error::SourceOpen(format!("{}: {}", dir.display(), e)))?;

        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_frame_file(path))
            .collect();
        frames.sort();

        info!("Image sequence {} holds {} frames", dir.display(), frames.len());

        Ok(Self {
            pending: frames.into(),
        })
    }

    /// Frames not yet read
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<CapturedImage>> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        Ok(Some(CapturedImage::from(image::open(&path)?)))
    }
}
