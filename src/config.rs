//! Configuration management for gaze tracking and session analysis

use crate::constants::{
    BLINK_RATIO_THRESHOLD, DEFAULT_HISTORY_CAPACITY, DEFAULT_MAX_LATENCY,
    DEFAULT_MIN_FIXATION_DURATION, DEFAULT_MIN_SACCADE_DURATION, DEFAULT_SMOOTHING_WIDTH,
    DEFAULT_VELOCITY_THRESHOLD, GAZE_LEFT_THRESHOLD, GAZE_RIGHT_THRESHOLD, RATIO_CORNER_BIAS,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Per-frame tracker configuration
    pub tracker: TrackerConfig,

    /// Offline segmentation configuration
    pub segmentation: SegmentationConfig,

    /// Stimulus onset times in seconds
    pub stimuli: Vec<f64>,

    /// Closed (start, end) intervals for intrusive-saccade counting
    pub intrusion_intervals: Vec<(f64, f64)>,
}

/// Per-frame gaze tracker parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Capacity of the pupil-smoothing history kept per eye
    pub history_capacity: usize,

    /// Blink classification threshold on the averaged eye-aspect ratio
    pub blink_threshold: f64,

    /// Horizontal ratio at or below which the gaze is classified as right
    pub gaze_right_threshold: f64,

    /// Horizontal ratio at or above which the gaze is classified as left
    pub gaze_left_threshold: f64,

    /// Empirical correction subtracted from the doubled eye-region center
    /// when normalizing pupil position
    pub ratio_bias: f64,
}

/// Offline saccade/fixation segmentation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Velocity threshold for saccade detection, position units per second
    pub velocity_threshold: f64,

    /// Minimum saccade duration in seconds
    pub min_saccade_duration: f64,

    /// Width of the centered moving-average smoothing window, in samples
    pub smoothing_width: usize,

    /// Minimum fixation duration in seconds
    pub min_fixation_duration: f64,

    /// Maximum accepted stimulus-to-saccade latency in seconds
    pub max_latency: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            segmentation: SegmentationConfig::default(),
            stimuli: Vec::new(),
            intrusion_intervals: Vec::new(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            blink_threshold: BLINK_RATIO_THRESHOLD,
            gaze_right_threshold: GAZE_RIGHT_THRESHOLD,
            gaze_left_threshold: GAZE_LEFT_THRESHOLD,
            ratio_bias: RATIO_CORNER_BIAS,
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            velocity_threshold: DEFAULT_VELOCITY_THRESHOLD,
            min_saccade_duration: DEFAULT_MIN_SACCADE_DURATION,
            smoothing_width: DEFAULT_SMOOTHING_WIDTH,
            min_fixation_duration: DEFAULT_MIN_FIXATION_DURATION,
            max_latency: DEFAULT_MAX_LATENCY,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.tracker.history_capacity == 0 {
            return Err(Error::ConfigError(
                "History capacity must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.tracker.gaze_right_threshold) {
            return Err(Error::ConfigError(
                "Right gaze threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.tracker.gaze_left_threshold) {
            return Err(Error::ConfigError(
                "Left gaze threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.tracker.gaze_right_threshold >= self.tracker.gaze_left_threshold {
            return Err(Error::ConfigError(
                "Right gaze threshold must be below the left gaze threshold".to_string(),
            ));
        }
        if self.tracker.blink_threshold <= 0.0 {
            return Err(Error::ConfigError(
                "Blink threshold must be greater than 0".to_string(),
            ));
        }

        if self.segmentation.velocity_threshold <= 0.0 {
            return Err(Error::ConfigError(
                "Velocity threshold must be greater than 0".to_string(),
            ));
        }
        if self.segmentation.min_saccade_duration < 0.0 {
            return Err(Error::ConfigError(
                "Minimum saccade duration must not be negative".to_string(),
            ));
        }
        if self.segmentation.smoothing_width == 0 {
            return Err(Error::ConfigError(
                "Smoothing width must be greater than 0".to_string(),
            ));
        }
        if self.segmentation.min_fixation_duration < 0.0 {
            return Err(Error::ConfigError(
                "Minimum fixation duration must not be negative".to_string(),
            ));
        }
        if self.segmentation.max_latency < 0.0 {
            return Err(Error::ConfigError(
                "Maximum latency must not be negative".to_string(),
            ));
        }

        for &(start, end) in &self.intrusion_intervals {
            if start > end {
                return Err(Error::ConfigError(format!(
                    "Intrusion interval ({}, {}) has start after end",
                    start, end
                )));
            }
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Gaze tracking analysis configuration

# Per-frame tracker parameters
tracker:
  history_capacity: 5
  blink_threshold: 3.8
  gaze_right_threshold: 0.35
  gaze_left_threshold: 0.65
  ratio_bias: 10.0

# Offline segmentation parameters
segmentation:
  velocity_threshold: 0.5
  min_saccade_duration: 0.02
  smoothing_width: 5
  min_fixation_duration: 0.08
  max_latency: 1.0

# Stimulus onset times in seconds
stimuli: []

# Closed [start, end] intervals for intrusive-saccade counting
intrusion_intervals: []
"#;
