//! Scalar interpolation helpers shared by the locator, resolver and animator.

/// Unit of the angles passed to [`interpolate_angle`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum AngleUnit {
    #[default]
    Degrees,
    Radians,
}

impl AngleUnit {
    pub fn full_turn(self) -> f32 {
        match self {
            Self::Degrees => 360.0,
            Self::Radians => std::f32::consts::TAU,
        }
    }

    pub fn half_turn(self) -> f32 {
        match self {
            Self::Degrees => 180.0,
            Self::Radians => std::f32::consts::PI,
        }
    }
}

/// `start + (end - start) * t`. `t` is not clamped.
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t
}

/// Fractional position of `value` within `[start, end]`.
///
/// A zero-length span pins the result to `0.0` instead of producing a non-finite value.
pub fn extrapolate(start: f32, end: f32, value: f32) -> f32 {
    let span = end - start;
    if span.abs() <= f32::EPSILON {
        return 0.0;
    }
    (value - start) / span
}

/// Maps `value` into the half-open interval `[min(a, b), max(a, b))`.
pub fn wrap(value: f32, a: f32, b: f32) -> f32 {
    let (min, max) = if a < b { (a, b) } else { (b, a) };
    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        return min;
    }
    let offset = (value - min).rem_euclid(range);
    // rem_euclid can round up to `range` for tiny negative offsets.
    if offset >= range {
        min
    } else {
        min + offset
    }
}

/// Two-sided clamp; the bounds may be given in either order.
pub fn clamp(value: f32, a: f32, b: f32) -> f32 {
    let (min, max) = if a < b { (a, b) } else { (b, a) };
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Interpolates between two angles.
///
/// With `spin == 0` the shortest path is taken (a delta of exactly half a turn keeps its
/// sign). A positive `spin` forces a non-negative delta (clockwise in Spriter's convention)
/// and a negative `spin` a non-positive one, so authored keys can request the long way round.
pub fn interpolate_angle(start: f32, end: f32, progress: f32, spin: i32, unit: AngleUnit) -> f32 {
    let full = unit.full_turn();
    let half = unit.half_turn();
    let raw = end - start;

    let delta = if spin > 0 {
        wrap(raw, 0.0, full)
    } else if spin < 0 {
        let d = wrap(raw, 0.0, full);
        if d > 0.0 { d - full } else { d }
    } else if raw.abs() <= half {
        raw
    } else {
        wrap(raw, -half, half)
    };

    start + delta * progress
}

pub(crate) fn sign(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else if value > 0.0 {
        1.0
    } else {
        0.0
    }
}
