//! Small stateless geometry helpers shared by the simulation crates.

use glam::Vec2;
use std::f32::consts::{PI, TAU};

/// Bearing in radians from `from` to `to`, measured from the +x axis.
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    (to.y - from.y).atan2(to.x - from.x)
}

/// Wraps an angle into `(-π, π]`.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

#[inline]
pub fn magnitude(v: Vec2) -> f32 {
    v.length()
}

#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Clamps `value` into `[min, max]`.
///
/// Unlike `f32::clamp` this never panics: an inverted range (`min > max`,
/// e.g. a circle wider than the arena) resolves to `min`.
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}
