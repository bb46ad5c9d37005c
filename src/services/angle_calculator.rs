/// Joint angle calculation
///
/// The angle at a joint is measured between the two rays running from the
/// vertex to its neighbouring landmarks, reported in degrees within [0, 180].

use crate::models::Point2;

/// Rays shorter than this are treated as degenerate
const MIN_RAY_LENGTH: f64 = 1e-9;

/// Calculate the included angle at `vertex` in degrees
///
/// # Arguments
/// * `a` - First neighbour (e.g., hip)
/// * `vertex` - Joint point (e.g., knee)
/// * `c` - Second neighbour (e.g., ankle)
///
/// Always returns a finite value in [0, 180]. Coincident points yield a
/// meaningless but bounded angle; use [`joint_angle`] when that matters.
pub fn compute_angle(a: Point2, vertex: Point2, c: Point2) -> f64 {
    let ray_a = (a.y - vertex.y).atan2(a.x - vertex.x);
    let ray_c = (c.y - vertex.y).atan2(c.x - vertex.x);

    let angle = (ray_c - ray_a).to_degrees().abs();
    let folded = if angle > 180.0 { 360.0 - angle } else { angle };

    if folded.is_finite() {
        folded.clamp(0.0, 180.0)
    } else {
        0.0
    }
}

/// Like [`compute_angle`], but `None` when either neighbour coincides with the vertex
pub fn joint_angle(a: Point2, vertex: Point2, c: Point2) -> Option<f64> {
    if a.distance_to(&vertex) < MIN_RAY_LENGTH || c.distance_to(&vertex) < MIN_RAY_LENGTH {
        return None;
    }
    Some(compute_angle(a, vertex, c))
}
