//! Small float-math helpers shared by targeting and limb animation.
//!
//! All simulation math is plain `f32` over [`glam::Vec2`]. The core runs a
//! single timeline in a single process, so bit-exact cross-platform
//! reproducibility is not a requirement here.

use glam::Vec2;

/// Clamp a value to the `[0, 1]` range.
#[must_use]
pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Linearly interpolate between `a` and `b`.
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Cubic ease-out curve: fast start, soft landing.
///
/// Used for swipe-arc progress so the limb snaps through the arc and
/// settles at the end.
#[must_use]
pub fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - clamp01(t);
    1.0 - inv * inv * inv
}

/// Normalize an angle in degrees to the `(-180, 180]` range.
#[must_use]
pub fn normalize_angle_deg(degrees: f32) -> f32 {
    let mut angle = degrees % 360.0;
    if angle > 180.0 {
        angle -= 360.0;
    } else if angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

/// Facing angle in degrees for a direction vector, in `(-180, 180]`.
///
/// Returns `0.0` for a zero-length direction.
#[must_use]
pub fn facing_angle_deg(direction: Vec2) -> f32 {
    if direction.length_squared() <= f32::EPSILON {
        return 0.0;
    }
    let dir = direction.normalize();
    normalize_angle_deg(dir.y.atan2(dir.x).to_degrees())
}

/// Rotate a vector by an angle given in degrees.
#[must_use]
pub fn rotate_deg(v: Vec2, degrees: f32) -> Vec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}
