//! Gaze tracking library for webcam-based eye tracking and session analysis.
//!
//! This library provides the computational core of a gaze tracking
//! pipeline:
//! - Pupil localization inside cropped eye images using adaptive iris
//!   isolation and contour scoring
//! - Head pose estimation from 68 facial landmarks (DLT initialization
//!   refined with Levenberg-Marquardt)
//! - Per-frame gaze aggregation with pupil smoothing, gaze direction
//!   classification, and blink detection
//! - Offline saccade and fixation segmentation of recorded sessions,
//!   including stimulus latency and intrusive saccade statistics
//!
//! Face detection, landmark localization, and eye cropping are supplied
//! by the caller through the [`tracker::LandmarkSource`] and
//! [`tracker::EyeSource`] traits, so the heavy vision models stay
//! outside this crate.
//!
//! # Examples
//!
//! ## Locating a Pupil
//!
//! ```no_run
//! use gaze_tracking::pupil_detection::PupilDetector;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let eye = image::open("eye.png")?.to_luma8();
//! let detector = PupilDetector::new(60);
//!
//! if let Some(pupil) = detector.detect(&eye) {
//!     println!("Pupil at ({}, {})", pupil.x, pupil.y);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Estimating Head Pose
//!
//! ```no_run
//! use gaze_tracking::landmarks::LandmarkSet;
//! use gaze_tracking::pose_estimation::PoseEstimator;
//!
//! # fn landmarks_from_detector() -> LandmarkSet { unimplemented!() }
//! let landmarks = landmarks_from_detector();
//! let estimator = PoseEstimator::new();
//!
//! if let Some(pose) = estimator.estimate(&landmarks, 640, 480) {
//!     println!(
//!         "Pitch: {:.2}°, Yaw: {:.2}°, Roll: {:.2}°",
//!         pose.angles.pitch, pose.angles.yaw, pose.angles.roll
//!     );
//! }
//! ```
//!
//! ## Per-Frame Tracking
//!
//! ```no_run
//! use gaze_tracking::tracker::GazeTracker;
//!
//! # fn build_tracker() -> GazeTracker { unimplemented!() }
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Wire a landmark source and an eye source into the tracker
//! let mut tracker = build_tracker();
//!
//! let frame = image::open("frame.png")?.to_luma8();
//! tracker.refresh(&frame);
//!
//! if tracker.is_blinking() == Some(true) {
//!     println!("Blinking");
//! } else if let Some((x, y)) = tracker.pupil_left_coords() {
//!     println!("Left pupil at ({}, {})", x, y);
//! }
//!
//! if let Some(pose) = tracker.head_pose() {
//!     println!("Yaw: {:.2}°", pose.angles.yaw);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Analyzing a Recorded Session
//!
//! ```no_run
//! use gaze_tracking::config::SegmentationConfig;
//! use gaze_tracking::session::{analyze_session, SessionData};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = SessionData::from_csv_file("session.csv")?;
//! let config = SegmentationConfig::default();
//!
//! let report = analyze_session(&session, &config, &[1.0], &[(2.0, 3.0)]);
//! println!(
//!     "{} saccades, {} fixations",
//!     report.saccades.len(),
//!     report.fixations.len()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! The segmentation functions also work directly on raw signal slices:
//!
//! ```
//! use gaze_tracking::saccades::{detect_fixations, detect_saccades};
//!
//! let times: Vec<f64> = (0..100).map(|i| f64::from(i) * 0.01).collect();
//! let positions = vec![0.0; 100];
//!
//! let saccades = detect_saccades(&times, &positions, 0.5, 0.02, 5);
//! let fixations = detect_fixations(&times, &positions, &saccades, 0.1);
//!
//! assert!(saccades.is_empty());
//! assert_eq!(fixations.len(), 1);
//! ```

/// Pupil localization within cropped eye images
pub mod pupil_detection;

/// Head pose estimation from facial landmarks
pub mod pose_estimation;

/// Facial landmark container and pose landmark selection
pub mod landmarks;

/// Bounded history for pupil coordinate smoothing
pub mod smoothing;

/// Per-frame gaze aggregation and collaborator traits
pub mod tracker;

/// Saccade and fixation segmentation of gaze signals
pub mod saccades;

/// Recorded session loading and whole-session analysis
pub mod session;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
