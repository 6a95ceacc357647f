//! Pupil localization within a cropped eye image.
//!
//! Isolates the dark iris region through smoothing, erosion and
//! binarization, then picks the most circle-like contour and reports its
//! centroid.

use image::GrayImage;
use imageproc::contours::{find_contours, Contour};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::filter::bilateral_filter;
use imageproc::morphology::{grayscale_erode, Mask};
use imageproc::point::Point;

use crate::constants::{
    BILATERAL_DIAMETER, BILATERAL_SIGMA_COLOR, BILATERAL_SIGMA_SPACE, ERODE_ITERATIONS,
    MIN_CONTOUR_AREA,
};

/// Estimated iris centroid in eye-image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PupilPosition {
    pub x: i32,
    pub y: i32,
}

/// Detects the iris of an eye and estimates the position of the pupil
#[derive(Debug, Clone)]
pub struct PupilDetector {
    threshold: u8,
}

impl PupilDetector {
    /// Create a detector binarizing eye images at `threshold`
    #[must_use]
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    /// Binarization threshold in use
    #[must_use]
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Perform operations on the eye image to isolate the iris.
    ///
    /// Bilateral smoothing keeps the iris boundary sharp while suppressing
    /// sensor noise, erosion shrinks specular highlights, and binarization
    /// maps everything brighter than the threshold to white.
    #[must_use]
    pub fn isolate_iris(&self, eye_image: &GrayImage) -> GrayImage {
        let smoothed = bilateral_filter(
            eye_image,
            BILATERAL_DIAMETER,
            BILATERAL_SIGMA_COLOR,
            BILATERAL_SIGMA_SPACE,
        );
        let mask = Mask::square(1);
        let mut eroded = smoothed;
        for _ in 0..ERODE_ITERATIONS {
            eroded = grayscale_erode(&eroded, &mask);
        }
        threshold(&eroded, self.threshold, ThresholdType::Binary)
    }

    /// Estimate the pupil centroid, `None` when no usable contour exists
    #[must_use]
    pub fn detect(&self, eye_image: &GrayImage) -> Option<PupilPosition> {
        let iris_image = self.isolate_iris(eye_image);
        let contours = find_contours::<i32>(&iris_image);
        let best = select_iris_contour(&contours)?;
        centroid(&best.points)
    }
}

/// Pick the contour whose circularity is closest to a perfect circle.
///
/// Contours below the noise area or with zero perimeter are skipped; on a
/// tied score the earlier contour wins. When no contour qualifies, fall
/// back to the second-largest contour by area (or the only one).
fn select_iris_contour(contours: &[Contour<i32>]) -> Option<&Contour<i32>> {
    if contours.is_empty() {
        return None;
    }

    let mut best: Option<&Contour<i32>> = None;
    let mut min_error = f64::INFINITY;
    for contour in contours {
        let area = contour_area(&contour.points);
        if area < MIN_CONTOUR_AREA {
            continue;
        }
        let perimeter = contour_perimeter(&contour.points);
        if perimeter == 0.0 {
            continue;
        }
        let circularity = (4.0 * std::f64::consts::PI * area) / (perimeter * perimeter);
        let error = (1.0 - circularity).abs();
        if error < min_error {
            min_error = error;
            best = Some(contour);
        }
    }

    best.or_else(|| {
        let mut by_area: Vec<(f64, &Contour<i32>)> = contours
            .iter()
            .map(|c| (contour_area(&c.points), c))
            .collect();
        by_area.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        let index = if by_area.len() > 1 {
            by_area.len() - 2
        } else {
            0
        };
        Some(by_area[index].1)
    })
}

/// Absolute polygon area of a closed contour (shoelace formula)
fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut doubled = 0.0;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        doubled += f64::from(p.x) * f64::from(q.y) - f64::from(q.x) * f64::from(p.y);
    }
    (doubled / 2.0).abs()
}

/// Closed polyline length of a contour
fn contour_perimeter(points: &[Point<i32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut length = 0.0;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        length += f64::from(q.x - p.x).hypot(f64::from(q.y - p.y));
    }
    length
}

/// Centroid from first-order polygon moments, `None` on a degenerate contour
fn centroid(points: &[Point<i32>]) -> Option<PupilPosition> {
    if points.len() < 3 {
        return None;
    }
    let mut m00 = 0.0;
    let mut m10 = 0.0;
    let mut m01 = 0.0;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        let (xi, yi) = (f64::from(p.x), f64::from(p.y));
        let (xj, yj) = (f64::from(q.x), f64::from(q.y));
        let cross = xi * yj - xj * yi;
        m00 += cross;
        m10 += (xi + xj) * cross;
        m01 += (yi + yj) * cross;
    }
    m00 /= 2.0;
    m10 /= 6.0;
    m01 /= 6.0;
    if m00 == 0.0 {
        return None;
    }
    Some(PupilPosition {
        x: (m10 / m00) as i32,
        y: (m01 / m00) as i32,
    })
}
