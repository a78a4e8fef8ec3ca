//! Utility functions for landmark geometry and overlay placement.

pub mod safe_cast;
#[cfg(feature = "opencv")]
pub mod image_conversion;

use crate::constants::GAZE_RAY_SCALE;
use nalgebra::{Point2, Vector3};
use safe_cast::f64_to_i32_clamp;

/// Landmark indices outlining the left eye in the 68 point layout
const LEFT_EYE: std::ops::Range<usize> = 36..42;

/// Landmark indices outlining the right eye in the 68 point layout
const RIGHT_EYE: std::ops::Range<usize> = 42..48;

/// Axis-aligned bounds of the finite landmarks as (top-left, bottom-right)
#[must_use]
pub fn landmark_bounds(landmarks: &[Point2<f32>]) -> Option<(Point2<f32>, Point2<f32>)> {
    landmarks
        .iter()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .fold(None, |bounds, p| match bounds {
            None => Some((*p, *p)),
            Some((min, max)) => Some((
                Point2::new(min.x.min(p.x), min.y.min(p.y)),
                Point2::new(max.x.max(p.x), max.y.max(p.y)),
            )),
        })
}

fn centroid(points: &[Point2<f32>]) -> Point2<f32> {
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f32;
    let (x, y) = points.iter().fold((0.0, 0.0), |(x, y), p| (x + p.x, y + p.y));
    Point2::new(x / n, y / n)
}

/// Centres of the left and right eye contours, when all 68 points are present
#[must_use]
pub fn eye_centres(landmarks: &[Point2<f32>]) -> Option<(Point2<f32>, Point2<f32>)> {
    let left = landmarks.get(LEFT_EYE)?;
    let right = landmarks.get(RIGHT_EYE)?;
    Some((centroid(left), centroid(right)))
}

/// End point of a gaze ray drawn from `origin`, scaled with the focal length
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn gaze_ray_end(origin: Point2<f32>, direction: &Vector3<f32>, focal_length: f64) -> Point2<f32> {
    let length = (focal_length * GAZE_RAY_SCALE) as f32;
    Point2::new(origin.x + direction.x * length, origin.y + direction.y * length)
}

/// Round a point to pixel coordinates
#[must_use]
pub fn to_pixel(point: Point2<f32>) -> (i32, i32) {
    (
        f64_to_i32_clamp(f64::from(point.x).round(), i32::MIN, i32::MAX),
        f64_to_i32_clamp(f64::from(point.y).round(), i32::MIN, i32::MAX),
    )
}
