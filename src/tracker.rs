//! Per-frame gaze aggregation.
//!
//! `GazeTracker` orchestrates the landmark and eye collaborators and the
//! head pose estimator once per frame, keeps a short smoothing history of
//! pupil positions per eye, and derives gaze direction and blink state
//! from the current frame.

use image::GrayImage;
use log::{debug, info};

use crate::config::TrackerConfig;
use crate::landmarks::LandmarkSet;
use crate::pose_estimation::{PoseEstimate, PoseEstimator};
use crate::pupil_detection::PupilPosition;
use crate::smoothing::PositionHistory;

/// Eye side selector passed to the eye collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeSide {
    Left,
    Right,
}

/// Per-frame analysis of one eye, supplied by an [`EyeSource`]
#[derive(Debug, Clone)]
pub struct Eye {
    /// Pupil position inside the cropped eye region, when detected
    pub pupil: Option<PupilPosition>,
    /// Top-left corner of the eye region within the frame, in pixels
    pub origin: (i32, i32),
    /// Center of the eye region, in region coordinates
    pub center: (f64, f64),
    /// Eye-aspect blinking ratio
    pub blinking: f64,
}

/// Supplies facial landmarks for the primary face in a frame
pub trait LandmarkSource: Send + Sync {
    /// Detect the primary face and return its landmarks, or `None` when
    /// no face is found
    fn detect(&mut self, frame: &GrayImage) -> Option<LandmarkSet>;
}

/// Crops and analyzes one eye region, including its own threshold
/// calibration
pub trait EyeSource: Send + Sync {
    /// Analyze one eye, or `None` when the landmarks do not cover it
    fn analyze(
        &mut self,
        frame: &GrayImage,
        landmarks: &LandmarkSet,
        side: EyeSide,
    ) -> Option<Eye>;
}

/// Tracks the user's gaze across frames.
///
/// Call [`refresh`](GazeTracker::refresh) once per frame, then read the
/// derived accessors. Every accessor returns `None` until both pupils
/// have been located in the current frame.
pub struct GazeTracker {
    landmark_source: Box<dyn LandmarkSource>,
    eye_source: Box<dyn EyeSource>,
    pose_estimator: PoseEstimator,
    config: TrackerConfig,
    eye_left: Option<Eye>,
    eye_right: Option<Eye>,
    head_pose: Option<PoseEstimate>,
    left_pupil_history: PositionHistory,
    right_pupil_history: PositionHistory,
}

impl GazeTracker {
    /// Create a tracker with the default configuration
    #[must_use]
    pub fn new(landmark_source: Box<dyn LandmarkSource>, eye_source: Box<dyn EyeSource>) -> Self {
        Self::with_config(landmark_source, eye_source, TrackerConfig::default())
    }

    /// Create a tracker with an explicit configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config.history_capacity` is 0; validate the
    /// configuration first.
    #[must_use]
    pub fn with_config(
        landmark_source: Box<dyn LandmarkSource>,
        eye_source: Box<dyn EyeSource>,
        config: TrackerConfig,
    ) -> Self {
        info!(
            "Initializing gaze tracker with history capacity {}",
            config.history_capacity
        );
        let capacity = config.history_capacity;
        Self {
            landmark_source,
            eye_source,
            pose_estimator: PoseEstimator::new(),
            config,
            eye_left: None,
            eye_right: None,
            head_pose: None,
            left_pupil_history: PositionHistory::new(capacity),
            right_pupil_history: PositionHistory::new(capacity),
        }
    }

    /// Analyze one frame, updating the per-frame eye and pose state.
    ///
    /// When no face is found the current eyes and pose are cleared, but
    /// the pupil smoothing histories keep their accumulated samples.
    pub fn refresh(&mut self, frame: &GrayImage) {
        match self.landmark_source.detect(frame) {
            Some(landmarks) => {
                self.eye_left = self.eye_source.analyze(frame, &landmarks, EyeSide::Left);
                self.eye_right = self.eye_source.analyze(frame, &landmarks, EyeSide::Right);

                if let Some(pupil) = self.eye_left.as_ref().and_then(|eye| eye.pupil) {
                    self.left_pupil_history.push((pupil.x, pupil.y));
                }
                if let Some(pupil) = self.eye_right.as_ref().and_then(|eye| eye.pupil) {
                    self.right_pupil_history.push((pupil.x, pupil.y));
                }

                self.head_pose =
                    self.pose_estimator
                        .estimate(&landmarks, frame.width(), frame.height());
            }
            None => {
                debug!("No face found in frame");
                self.eye_left = None;
                self.eye_right = None;
                self.head_pose = None;
            }
        }
    }

    /// True when both eyes are present and both pupils carry coordinates
    #[must_use]
    pub fn pupils_located(&self) -> bool {
        let left = self.eye_left.as_ref().map_or(false, |eye| eye.pupil.is_some());
        let right = self
            .eye_right
            .as_ref()
            .map_or(false, |eye| eye.pupil.is_some());
        left && right
    }

    /// Smoothed left pupil position in frame coordinates
    #[must_use]
    pub fn pupil_left_coords(&self) -> Option<(i32, i32)> {
        if !self.pupils_located() {
            return None;
        }
        let eye = self.eye_left.as_ref()?;
        let (avg_x, avg_y) = self.left_pupil_history.mean()?;
        Some((eye.origin.0 + avg_x, eye.origin.1 + avg_y))
    }

    /// Smoothed right pupil position in frame coordinates
    #[must_use]
    pub fn pupil_right_coords(&self) -> Option<(i32, i32)> {
        if !self.pupils_located() {
            return None;
        }
        let eye = self.eye_right.as_ref()?;
        let (avg_x, avg_y) = self.right_pupil_history.mean()?;
        Some((eye.origin.0 + avg_x, eye.origin.1 + avg_y))
    }

    /// Horizontal gaze direction between 0.0 and 1.0. The extreme right
    /// is 0.0, the center is 0.5 and the extreme left is 1.0.
    #[must_use]
    pub fn horizontal_ratio(&self) -> Option<f64> {
        if !self.pupils_located() {
            return None;
        }
        let left = self.eye_left.as_ref()?;
        let right = self.eye_right.as_ref()?;
        let left_pupil = left.pupil?;
        let right_pupil = right.pupil?;
        let left_ratio =
            f64::from(left_pupil.x) / (left.center.0 * 2.0 - self.config.ratio_bias);
        let right_ratio =
            f64::from(right_pupil.x) / (right.center.0 * 2.0 - self.config.ratio_bias);
        Some((left_ratio + right_ratio) / 2.0)
    }

    /// Vertical gaze direction between 0.0 and 1.0. The extreme top is
    /// 0.0, the center is 0.5 and the extreme bottom is 1.0.
    #[must_use]
    pub fn vertical_ratio(&self) -> Option<f64> {
        if !self.pupils_located() {
            return None;
        }
        let left = self.eye_left.as_ref()?;
        let right = self.eye_right.as_ref()?;
        let left_pupil = left.pupil?;
        let right_pupil = right.pupil?;
        let left_ratio =
            f64::from(left_pupil.y) / (left.center.1 * 2.0 - self.config.ratio_bias);
        let right_ratio =
            f64::from(right_pupil.y) / (right.center.1 * 2.0 - self.config.ratio_bias);
        Some((left_ratio + right_ratio) / 2.0)
    }

    /// True when the user is looking to the right
    #[must_use]
    pub fn is_right(&self) -> Option<bool> {
        self.horizontal_ratio()
            .map(|ratio| ratio <= self.config.gaze_right_threshold)
    }

    /// True when the user is looking to the left
    #[must_use]
    pub fn is_left(&self) -> Option<bool> {
        self.horizontal_ratio()
            .map(|ratio| ratio >= self.config.gaze_left_threshold)
    }

    /// True when the user is looking at the center, meaning neither of
    /// the extreme classifications holds
    #[must_use]
    pub fn is_center(&self) -> Option<bool> {
        if !self.pupils_located() {
            return None;
        }
        Some(self.is_right() != Some(true) && self.is_left() != Some(true))
    }

    /// True when the averaged blinking ratio of both eyes exceeds the
    /// blink threshold
    #[must_use]
    pub fn is_blinking(&self) -> Option<bool> {
        if !self.pupils_located() {
            return None;
        }
        let left = self.eye_left.as_ref()?;
        let right = self.eye_right.as_ref()?;
        let ratio = (left.blinking + right.blinking) / 2.0;
        Some(ratio > self.config.blink_threshold)
    }

    /// Head pose solved for the current frame, when available
    #[must_use]
    pub fn head_pose(&self) -> Option<&PoseEstimate> {
        self.head_pose.as_ref()
    }
}
