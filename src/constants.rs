//! Calibration constants used throughout the library

/// Number of facial landmarks for a full face
pub const NUM_FACIAL_LANDMARKS: usize = 68;

/// Bilateral filter window diameter applied to eye images
pub const BILATERAL_DIAMETER: u32 = 15;

/// Bilateral filter color sigma
pub const BILATERAL_SIGMA_COLOR: f32 = 75.0;

/// Bilateral filter spatial sigma
pub const BILATERAL_SIGMA_SPACE: f32 = 75.0;

/// Erosion passes applied before binarization
pub const ERODE_ITERATIONS: usize = 3;

/// Contours with area below this are treated as noise
pub const MIN_CONTOUR_AREA: f64 = 5.0;

/// Default capacity of the per-eye pupil smoothing history
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// Denominator bias in the gaze-ratio formula, tuned against the eye cropper
pub const RATIO_CORNER_BIAS: f64 = 10.0;

/// Horizontal ratio at or below this classifies gaze as right
pub const GAZE_RIGHT_THRESHOLD: f64 = 0.35;

/// Horizontal ratio at or above this classifies gaze as left
pub const GAZE_LEFT_THRESHOLD: f64 = 0.65;

/// Mean blink ratio above this classifies the eyes as closed
pub const BLINK_RATIO_THRESHOLD: f64 = 3.8;

/// Length of the projected pose axes in model units (millimeters)
pub const AXIS_LENGTH_MM: f64 = 100.0;

/// Euler decomposition switches to the gimbal-lock branch below this
pub const EULER_SINGULARITY_EPSILON: f64 = 1e-6;

/// Default saccade velocity threshold, position units per second
pub const DEFAULT_VELOCITY_THRESHOLD: f64 = 0.5;

/// Default minimum saccade duration in seconds
pub const DEFAULT_MIN_SACCADE_DURATION: f64 = 0.02;

/// Default moving-average smoothing width in samples
pub const DEFAULT_SMOOTHING_WIDTH: usize = 5;

/// Default minimum fixation duration in seconds
pub const DEFAULT_MIN_FIXATION_DURATION: f64 = 0.08;

/// Default maximum stimulus-to-saccade latency in seconds
pub const DEFAULT_MAX_LATENCY: f64 = 1.0;
