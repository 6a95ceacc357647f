//! Head pose estimation from facial landmarks.
//!
//! Solves the six-point perspective-n-point problem between a generic 3D
//! face model and the detected 2D landmarks, then derives yaw, pitch and
//! roll from the solved rotation.

use nalgebra::{
    DMatrix, Matrix3, Matrix6, Rotation3, SMatrix, SVector, UnitQuaternion, Vector2, Vector3,
    Vector6,
};

use crate::constants::{AXIS_LENGTH_MM, EULER_SINGULARITY_EPSILON};
use crate::landmarks::{LandmarkSet, POSE_LANDMARK_INDICES};

const LM_MAX_ITERATIONS: usize = 100;
const LM_INITIAL_LAMBDA: f64 = 1e-3;
const LM_LAMBDA_SCALE: f64 = 10.0;
const LM_MIN_LAMBDA: f64 = 1e-12;
const LM_MAX_LAMBDA: f64 = 1e12;
const LM_COST_TOLERANCE: f64 = 1e-12;
const LM_DIAGONAL_FLOOR: f64 = 1e-12;
const JACOBIAN_STEP: f64 = 1e-6;

/// Pinhole camera intrinsics derived from the frame dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraModel {
    pub focal_length: f64,
    pub center: (f64, f64),
}

impl CameraModel {
    /// Intrinsics for a frame: focal length equal to the frame width,
    /// principal point at the frame center, zero lens distortion
    #[must_use]
    pub fn from_frame_size(width: u32, height: u32) -> Self {
        Self {
            focal_length: f64::from(width),
            center: (f64::from(width) / 2.0, f64::from(height) / 2.0),
        }
    }

    fn project(&self, point: &Vector3<f64>) -> Vector2<f64> {
        Vector2::new(
            self.focal_length * point.x / point.z + self.center.0,
            self.focal_length * point.y / point.z + self.center.1,
        )
    }
}

/// Euler angles in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerAngles {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

/// Solved head pose for one frame
#[derive(Debug, Clone)]
pub struct PoseEstimate {
    /// Axis-angle rotation of the face model in camera coordinates
    pub rotation_vector: Vector3<f64>,
    /// Translation of the face model in camera coordinates, millimeters
    pub translation_vector: Vector3<f64>,
    /// Derived orientation in degrees
    pub angles: EulerAngles,
    /// Projected model origin (nose tip) in pixels
    pub nose_point: (i32, i32),
    /// Projected endpoints of the X, Y and Z model axes in pixels
    pub axis_points: [(i32, i32); 3],
}

/// Estimates head pose (yaw, pitch, roll) from 68-point facial landmarks
/// using a generic 3D face model
#[derive(Debug, Clone)]
pub struct PoseEstimator {
    model_points: [Vector3<f64>; 6],
}

impl Default for PoseEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseEstimator {
    /// Create an estimator with the built-in six-point face model
    #[must_use]
    pub fn new() -> Self {
        // Generic face model in millimeters, centered at the nose tip
        let model_points = [
            Vector3::new(0.0, 0.0, 0.0),          // Nose tip
            Vector3::new(0.0, -330.0, -65.0),     // Chin
            Vector3::new(-225.0, 170.0, -135.0),  // Left eye outer corner
            Vector3::new(225.0, 170.0, -135.0),   // Right eye outer corner
            Vector3::new(-150.0, -150.0, -125.0), // Left mouth corner
            Vector3::new(150.0, -150.0, -125.0),  // Right mouth corner
        ];
        Self { model_points }
    }

    /// Estimate the pose for one frame.
    ///
    /// Returns `None` when a required landmark is missing or the solve
    /// fails on degenerate geometry.
    #[must_use]
    pub fn estimate(
        &self,
        landmarks: &LandmarkSet,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<PoseEstimate> {
        let mut image_points = [Vector2::zeros(); 6];
        for (slot, &index) in image_points.iter_mut().zip(POSE_LANDMARK_INDICES.iter()) {
            let (x, y) = landmarks.point(index)?;
            *slot = Vector2::new(x, y);
        }

        let camera = CameraModel::from_frame_size(frame_width, frame_height);
        let (rotation_vector, translation_vector) =
            solve_pnp(&self.model_points, &image_points, &camera)?;

        let rotation = Rotation3::from_scaled_axis(rotation_vector);
        let nose_point =
            project_to_pixel(&camera, &rotation, &translation_vector, &Vector3::zeros());
        let axis_points = [
            project_to_pixel(
                &camera,
                &rotation,
                &translation_vector,
                &Vector3::new(AXIS_LENGTH_MM, 0.0, 0.0),
            ),
            project_to_pixel(
                &camera,
                &rotation,
                &translation_vector,
                &Vector3::new(0.0, AXIS_LENGTH_MM, 0.0),
            ),
            project_to_pixel(
                &camera,
                &rotation,
                &translation_vector,
                &Vector3::new(0.0, 0.0, AXIS_LENGTH_MM),
            ),
        ];

        let angles = rotation_matrix_to_euler(rotation.matrix());

        Some(PoseEstimate {
            rotation_vector,
            translation_vector,
            angles,
            nose_point,
            axis_points,
        })
    }
}

fn project_to_pixel(
    camera: &CameraModel,
    rotation: &Rotation3<f64>,
    translation: &Vector3<f64>,
    model_point: &Vector3<f64>,
) -> (i32, i32) {
    let projected = camera.project(&(rotation * model_point + translation));
    (projected.x as i32, projected.y as i32)
}

/// Convert a rotation matrix to Euler angles in degrees.
///
/// Decomposes R = Rz(roll) * Ry(yaw) * Rx(pitch). When `sy` collapses the
/// decomposition is singular (gimbal lock) and roll is fixed at zero.
#[must_use]
pub fn rotation_matrix_to_euler(r: &Matrix3<f64>) -> EulerAngles {
    let sy = (r[(0, 0)] * r[(0, 0)] + r[(1, 0)] * r[(1, 0)]).sqrt();
    let (pitch, yaw, roll) = if sy >= EULER_SINGULARITY_EPSILON {
        (
            r[(2, 1)].atan2(r[(2, 2)]),
            (-r[(2, 0)]).atan2(sy),
            r[(1, 0)].atan2(r[(0, 0)]),
        )
    } else {
        ((-r[(1, 2)]).atan2(r[(1, 1)]), (-r[(2, 0)]).atan2(sy), 0.0)
    };
    EulerAngles {
        yaw: yaw.to_degrees(),
        pitch: pitch.to_degrees(),
        roll: roll.to_degrees(),
    }
}

/// Solve the perspective-n-point problem for the six model points.
///
/// A direct linear transform over normalized camera coordinates seeds a
/// Levenberg-Marquardt refinement of the pixel reprojection error. Returns
/// the axis-angle rotation and the translation, or `None` when the
/// geometry is degenerate.
fn solve_pnp(
    model: &[Vector3<f64>; 6],
    image: &[Vector2<f64>; 6],
    camera: &CameraModel,
) -> Option<(Vector3<f64>, Vector3<f64>)> {
    let initial = dlt_initialization(model, image, camera)?;
    refine_pose(model, image, camera, initial)
}

fn dlt_initialization(
    model: &[Vector3<f64>; 6],
    image: &[Vector2<f64>; 6],
    camera: &CameraModel,
) -> Option<(Vector3<f64>, Vector3<f64>)> {
    // In normalized camera coordinates the projection matrix is [R|t] up
    // to scale; its null-space estimate seeds the refinement.
    let mut design = DMatrix::<f64>::zeros(12, 12);
    for (i, (point, observed)) in model.iter().zip(image.iter()).enumerate() {
        let xn = (observed.x - camera.center.0) / camera.focal_length;
        let yn = (observed.y - camera.center.1) / camera.focal_length;
        let row = 2 * i;
        design[(row, 0)] = point.x;
        design[(row, 1)] = point.y;
        design[(row, 2)] = point.z;
        design[(row, 3)] = 1.0;
        design[(row, 8)] = -xn * point.x;
        design[(row, 9)] = -xn * point.y;
        design[(row, 10)] = -xn * point.z;
        design[(row, 11)] = -xn;
        design[(row + 1, 4)] = point.x;
        design[(row + 1, 5)] = point.y;
        design[(row + 1, 6)] = point.z;
        design[(row + 1, 7)] = 1.0;
        design[(row + 1, 8)] = -yn * point.x;
        design[(row + 1, 9)] = -yn * point.y;
        design[(row + 1, 10)] = -yn * point.z;
        design[(row + 1, 11)] = -yn;
    }

    let svd = design.svd(true, true);
    let v_t = svd.v_t?;
    let p = v_t.row(v_t.nrows() - 1);

    let mut m = Matrix3::new(p[0], p[1], p[2], p[4], p[5], p[6], p[8], p[9], p[10]);
    let mut t = Vector3::new(p[3], p[7], p[11]);

    // The third row of a scaled rotation carries the scale as its norm
    let scale = m.row(2).norm();
    if !scale.is_finite() || scale < 1e-12 {
        return None;
    }
    m /= scale;
    t /= scale;

    // The model must sit in front of the camera
    let centroid = model.iter().fold(Vector3::zeros(), |acc, v| acc + v) / 6.0;
    if (m * centroid + t).z < 0.0 {
        m = -m;
        t = -t;
    }

    // Nearest proper rotation to the estimated block
    let svd3 = m.svd(true, true);
    let mut u = svd3.u?;
    let v3_t = svd3.v_t?;
    if (u * v3_t).determinant() < 0.0 {
        u.column_mut(2).neg_mut();
    }
    let rotation = u * v3_t;

    let rvec = axis_angle_from_rotation(rotation);
    if !rvec.iter().all(|v| v.is_finite()) || !t.iter().all(|v| v.is_finite()) {
        return None;
    }
    Some((rvec, t))
}

/// Axis-angle form of a rotation matrix, via the quaternion branches.
/// Stays finite at a half-turn, where the trace sits at -1 and an
/// arccosine of it can leave its domain on rounded input; a frontal
/// face solves to exactly that half-turn.
fn axis_angle_from_rotation(rotation: Matrix3<f64>) -> Vector3<f64> {
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rotation)).scaled_axis()
}

fn refine_pose(
    model: &[Vector3<f64>; 6],
    image: &[Vector2<f64>; 6],
    camera: &CameraModel,
    initial: (Vector3<f64>, Vector3<f64>),
) -> Option<(Vector3<f64>, Vector3<f64>)> {
    let (rvec, tvec) = initial;
    let mut params = Vector6::new(rvec.x, rvec.y, rvec.z, tvec.x, tvec.y, tvec.z);
    let mut cost = reprojection_residuals(model, image, camera, &params).norm_squared();
    if !cost.is_finite() {
        return None;
    }

    let mut lambda = LM_INITIAL_LAMBDA;
    'outer: for _ in 0..LM_MAX_ITERATIONS {
        let residuals = reprojection_residuals(model, image, camera, &params);
        let jacobian = numeric_jacobian(model, image, camera, &params);
        let hessian: Matrix6<f64> = jacobian.transpose() * jacobian;
        let gradient: Vector6<f64> = jacobian.transpose() * residuals;

        let mut accepted = false;
        while lambda <= LM_MAX_LAMBDA {
            let mut damped = hessian;
            for i in 0..6 {
                damped[(i, i)] += lambda * hessian[(i, i)].max(LM_DIAGONAL_FLOOR);
            }
            let step = match damped.lu().solve(&gradient) {
                Some(step) => step,
                None => {
                    lambda *= LM_LAMBDA_SCALE;
                    continue;
                }
            };

            let candidate = params - step;
            let candidate_cost =
                reprojection_residuals(model, image, camera, &candidate).norm_squared();
            if candidate_cost.is_finite() && candidate_cost < cost {
                let improvement = cost - candidate_cost;
                params = candidate;
                cost = candidate_cost;
                lambda = (lambda / LM_LAMBDA_SCALE).max(LM_MIN_LAMBDA);
                accepted = true;
                if improvement <= LM_COST_TOLERANCE * (1.0 + cost) {
                    break 'outer;
                }
                break;
            }
            lambda *= LM_LAMBDA_SCALE;
        }
        if !accepted {
            break;
        }
    }

    if !cost.is_finite() {
        return None;
    }
    let rvec = params.fixed_rows::<3>(0).into_owned();
    let tvec = params.fixed_rows::<3>(3).into_owned();
    Some((rvec, tvec))
}

fn reprojection_residuals(
    model: &[Vector3<f64>; 6],
    image: &[Vector2<f64>; 6],
    camera: &CameraModel,
    params: &Vector6<f64>,
) -> SVector<f64, 12> {
    let rotation = Rotation3::from_scaled_axis(params.fixed_rows::<3>(0).into_owned());
    let translation = params.fixed_rows::<3>(3).into_owned();
    let mut residuals = SVector::<f64, 12>::zeros();
    for (i, (point, observed)) in model.iter().zip(image.iter()).enumerate() {
        let projected = camera.project(&(rotation * point + translation));
        residuals[2 * i] = projected.x - observed.x;
        residuals[2 * i + 1] = projected.y - observed.y;
    }
    residuals
}

fn numeric_jacobian(
    model: &[Vector3<f64>; 6],
    image: &[Vector2<f64>; 6],
    camera: &CameraModel,
    params: &Vector6<f64>,
) -> SMatrix<f64, 12, 6> {
    let mut jacobian = SMatrix::<f64, 12, 6>::zeros();
    for col in 0..6 {
        let h = JACOBIAN_STEP * params[col].abs().max(1.0);
        let mut forward = *params;
        let mut backward = *params;
        forward[col] += h;
        backward[col] -= h;
        let column = (reprojection_residuals(model, image, camera, &forward)
            - reprojection_residuals(model, image, camera, &backward))
            / (2.0 * h);
        jacobian.set_column(col, &column);
    }
    jacobian
}
