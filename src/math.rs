use glam::Vec2;
use std::f32::consts::PI;

pub const EPSILON: f32 = 1.0e-6;

pub fn normalize_to_magnitude(v: Vec2, magnitude: f32) -> Vec2 {
    let len_sq = v.length_squared();
    if len_sq <= EPSILON || !len_sq.is_finite() {
        return Vec2::ZERO;
    }

    v * (magnitude / len_sq.sqrt())
}

pub fn limit_magnitude(v: Vec2, max_magnitude: f32) -> Vec2 {
    if max_magnitude <= 0.0 {
        return Vec2::ZERO;
    }

    let len_sq = v.length_squared();
    if len_sq <= max_magnitude * max_magnitude {
        return v;
    }

    normalize_to_magnitude(v, max_magnitude)
}

/// Signed difference `to - from` folded onto the shortest arc, in (-PI, PI].
pub fn shortest_angle(from: f32, to: f32) -> f32 {
    let diff = to - from;
    let folded = diff.sin().atan2(diff.cos());
    // atan2 can land on -PI for a half turn
    if folded < -PI + EPSILON {
        folded + 2.0 * PI
    } else {
        folded
    }
}

pub fn wrap_with_margin(value: f32, extent: f32, margin: f32) -> f32 {
    if value < -margin {
        extent + margin
    } else if value > extent + margin {
        -margin
    } else {
        value
    }
}

pub fn clamp_finite(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, max)
}
