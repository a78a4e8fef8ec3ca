//! Discovery of on-disk model resources.
//!
//! Each resource is looked up relative to the working directory, then the
//! executable's directory, then the configured resource root. The first
//! existing candidate wins; a resource found nowhere is fatal.

use crate::constants::{AU_PREDICTORS_DYNAMIC, AU_PREDICTORS_STATIC, DEFAULT_RESOURCE_ROOT, TRIANGULATION_FILE};
use crate::{Error, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Ordered locations searched for resources
#[derive(Debug, Clone)]
pub struct SearchPaths {
    /// Directory of the running executable
    pub executable_dir: Option<PathBuf>,
    /// Configured resource root
    pub config_root: PathBuf,
}

impl SearchPaths {
    /// Search paths for the current process
    #[must_use]
    pub fn for_current_exe(config_root: Option<PathBuf>) -> Self {
        let executable_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));

        Self {
            executable_dir,
            config_root: config_root.unwrap_or_else(|| PathBuf::from(DEFAULT_RESOURCE_ROOT)),
        }
    }

    /// Candidate locations of a relative resource path, in search order
    #[must_use]
    pub fn candidates(&self, relative: &Path) -> Vec<PathBuf> {
        let mut candidates = vec![relative.to_path_buf()];
        if let Some(dir) = &self.executable_dir {
            candidates.push(dir.join(relative));
        }
        candidates.push(self.config_root.join(relative));
        candidates
    }

    /// Locate a resource
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if no candidate exists
    pub fn locate<P: AsRef<Path>>(&self, relative: P) -> Result<PathBuf> {
        let relative = relative.as_ref();
        for candidate in self.candidates(relative) {
            debug!("Looking for {} at {}", relative.display(), candidate.display());
            if candidate.exists() {
                return Ok(candidate);
            }
        }
        Err(Error::ResourceNotFound(relative.display().to_string()))
    }
}

/// Model files the action-unit analyser is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResources {
    /// Face triangulation used for masking
    pub triangulation: PathBuf,
    /// List of action-unit predictors
    pub au_predictors: PathBuf,
}

impl ModelResources {
    /// Find the triangulation and the dynamic or static AU predictor list
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` naming the first missing resource
    pub fn discover(search: &SearchPaths, dynamic: bool) -> Result<Self> {
        let triangulation = search.locate(TRIANGULATION_FILE).map_err(|_| {
            Error::ResourceNotFound(format!("Can't find triangulation files ({TRIANGULATION_FILE})"))
        })?;

        let au_file = if dynamic {
            AU_PREDICTORS_DYNAMIC
        } else {
            AU_PREDICTORS_STATIC
        };
        let au_predictors = search
            .locate(au_file)
            .map_err(|_| Error::ResourceNotFound(format!("Can't find AU prediction files ({au_file})")))?;

        info!(
            "Using triangulation {} and AU predictors {}",
            triangulation.display(),
            au_predictors.display()
        );

        Ok(Self {
            triangulation,
            au_predictors,
        })
    }
}
