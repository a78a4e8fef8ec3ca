//! User commands read between frames.

use crate::{Error, Result};
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Command issued by the user while a source is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    /// Reset tracking and keep going on the same source
    Restart,
    /// Stop immediately
    Quit,
}

/// Map a key code from the window system to a command
#[must_use]
pub fn command_for_key(key: i32) -> Option<UserCommand> {
    match u8::try_from(key).ok().map(char::from) {
        Some('r') => Some(UserCommand::Restart),
        Some('q') => Some(UserCommand::Quit),
        _ => None,
    }
}

/// Polled once per frame
pub trait InputPoller {
    /// Pending command, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the input device cannot be read
    fn poll(&mut self) -> Result<Option<UserCommand>>;
}

/// No interactive input
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

impl InputPoller for NoInput {
    fn poll(&mut self) -> Result<Option<UserCommand>> {
        Ok(None)
    }
}

/// Turns Ctrl-C into a quit command
#[derive(Debug, Clone)]
pub struct CtrlCInput {
    interrupted: Arc<AtomicBool>,
}

impl CtrlCInput {
    /// Install the process-wide Ctrl-C handler
    ///
    /// # Errors
    ///
    /// Returns an error if a handler is already installed
    pub fn install() -> Result<Self> {
        let interrupted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&interrupted);
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })
        .map_err(|e| Error::InvalidInput(format!("Failed to set Ctrl-C handler: {e}")))?;
        Ok(Self { interrupted })
    }

    /// Poller over an existing flag
    #[must_use]
    pub fn from_flag(interrupted: Arc<AtomicBool>) -> Self {
        Self { interrupted }
    }
}

impl InputPoller for CtrlCInput {
    fn poll(&mut self) -> Result<Option<UserCommand>> {
        if self.interrupted.swap(false, Ordering::SeqCst) {
            info!("Interrupt received");
            return Ok(Some(UserCommand::Quit));
        }
        Ok(None)
    }
}

/// Polls several inputs, first command wins
#[derive(Default)]
pub struct CombinedInput {
    pollers: Vec<Box<dyn InputPoller>>,
}

impl CombinedInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, poller: Box<dyn InputPoller>) -> Self {
        self.pollers.push(poller);
        self
    }
}

impl InputPoller for CombinedInput {
    fn poll(&mut self) -> Result<Option<UserCommand>> {
        for poller in &mut self.pollers {
            if let Some(command) = poller.poll()? {
                return Ok(Some(command));
            }
        }
        Ok(None)
    }
}
