//! Facial landmark currency type shared by the pose estimator and collaborators.

/// Index of the nose tip in the 68-point landmark convention
pub const NOSE_TIP: usize = 30;

/// Index of the chin
pub const CHIN: usize = 8;

/// Index of the left eye outer corner
pub const LEFT_EYE_OUTER_CORNER: usize = 36;

/// Index of the right eye outer corner
pub const RIGHT_EYE_OUTER_CORNER: usize = 45;

/// Index of the left mouth corner
pub const LEFT_MOUTH_CORNER: usize = 48;

/// Index of the right mouth corner
pub const RIGHT_MOUTH_CORNER: usize = 54;

/// Landmark indices consumed by the head pose solve, in model-point order
pub const POSE_LANDMARK_INDICES: [usize; 6] = [
    NOSE_TIP,
    CHIN,
    LEFT_EYE_OUTER_CORNER,
    RIGHT_EYE_OUTER_CORNER,
    LEFT_MOUTH_CORNER,
    RIGHT_MOUTH_CORNER,
];

/// Ordered 2D facial landmarks for one detected face.
///
/// Supplied by an external landmark detector following the 68-point
/// convention; only positional access is provided, so shorter sets from
/// other detectors still work as long as the required indices exist.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<(f64, f64)>,
}

impl LandmarkSet {
    /// Create a landmark set from ordered (x, y) points
    #[must_use]
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Landmark position at `index`, or `None` when out of range
    #[must_use]
    pub fn point(&self, index: usize) -> Option<(f64, f64)> {
        self.points.get(index).copied()
    }

    /// Number of landmarks in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the set contains no landmarks
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
