//! Platform backends for capture, display, key input, encoding and drawing.

/// OpenCV video capture, HighGUI windows and VideoWriter
#[cfg(feature = "opencv")]
pub mod opencv;
