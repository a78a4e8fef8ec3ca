//! Constants used throughout the frame loop

/// Frame width the focal length approximation is scaled against
pub const REFERENCE_FRAME_WIDTH: f64 = 640.0;

/// Frame height the focal length approximation is scaled against
pub const REFERENCE_FRAME_HEIGHT: f64 = 480.0;

/// Focal length assumed for a frame of the reference size
pub const REFERENCE_FOCAL_LENGTH: f64 = 500.0;

/// Overlays are drawn only when detection certainty is below this value
pub const VISUALISATION_BOUNDARY: f64 = 0.2;

/// Number of frames between frame rate re-estimates
pub const FPS_WINDOW_FRAMES: u64 = 10;

/// Frame rate reported before the first estimate is available
pub const FPS_UNKNOWN: f64 = -1.0;

/// Default frames per second assumption for timestamps
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Frame rate of written output videos
pub const OUTPUT_VIDEO_FPS: f64 = 30.0;

/// Default output codec (four character code)
pub const DEFAULT_OUTPUT_CODEC: &str = "DIVX";

/// Capture device opened when no input files are given
pub const DEFAULT_DEVICE: i32 = 0;

/// Requested capture resolution and rate for live devices
pub const CAPTURE_WIDTH_HINT: f64 = 1920.0;
pub const CAPTURE_HEIGHT_HINT: f64 = 1080.0;
pub const CAPTURE_FPS_HINT: f64 = 60.0;

/// Depth values are divided by this before display
pub const DEPTH_DISPLAY_SCALE: f32 = 2000.0;

/// Upper bound on the per-frame key poll, in milliseconds
pub const INPUT_POLL_MS: i32 = 1;

/// Triangulation used for face masking
pub const TRIANGULATION_FILE: &str = "model/tris_68_full.txt";

/// Action unit predictor lists
pub const AU_PREDICTORS_DYNAMIC: &str = "AU_predictors/AU_all_best.txt";
pub const AU_PREDICTORS_STATIC: &str = "AU_predictors/AU_all_static.txt";

/// Fallback resource root when none is configured
pub const DEFAULT_RESOURCE_ROOT: &str = "~";

/// Side of the similarity-normalised face used by the analyser
pub const AU_SIM_SIZE: u32 = 112;

/// Similarity scale per pixel of the normalised face
pub const AU_SIM_SCALE_PER_PIXEL: f64 = 0.7 / 112.0;

/// Default OSC telemetry destination
pub const DEFAULT_OSC_TARGET: &str = "127.0.0.1:7000";

/// OSC address patterns
pub const OSC_TRACKING_ADDR: &str = "/face/tracking";
pub const OSC_ACTION_UNITS_ADDR: &str = "/face/action_units";

/// Gaze ray length as a fraction of the focal length
pub const GAZE_RAY_SCALE: f64 = 0.1;

/// Window names
pub const TRACKING_WINDOW: &str = "tracking_result";
pub const DEPTH_WINDOW: &str = "depth";

/// Target triple and host the binary was built for and on
pub const BUILD_TARGET: &str = env!("BUILD_TARGET");
pub const BUILD_HOST: &str = env!("BUILD_HOST");
