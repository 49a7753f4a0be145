//! Small vector and curve helpers shared by scoring and perception.

use core::ops::{Add, Mul, Neg, Sub};

/// Tolerance used for "did this value actually change" comparisons.
pub const EPSILON: f32 = 1.0e-4;

/// Clamps to `[0, 1]`. NaN collapses to 0 so downstream blends stay finite.
#[inline]
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// World-space vector in engine units (centimetres, Z up).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const UP: Self = Self::new(0.0, 0.0, 1.0);
    pub const FORWARD: Self = Self::new(1.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or [`Vec3::ZERO`] for degenerate input.
    pub fn normalized_or_zero(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON || !len.is_finite() {
            Self::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    pub fn is_nearly_zero(self) -> bool {
        self.length_squared() <= EPSILON * EPSILON
    }

    pub fn approx_eq(self, other: Self, tolerance: f32) -> bool {
        (self - other).length() <= tolerance
    }

    /// Raised by `height` along Z.
    pub fn raised(self, height: f32) -> Self {
        Self::new(self.x, self.y, self.z + height)
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Angle in degrees between `forward` and the direction from `from` to `to`.
///
/// Returns `None` when either direction is degenerate (target on top of the
/// viewer or no facing).
pub fn view_angle_degrees(from: Vec3, forward: Vec3, to: Vec3) -> Option<f32> {
    let dir = (to - from).normalized_or_zero();
    let facing = forward.normalized_or_zero();
    if dir.is_nearly_zero() || facing.is_nearly_zero() {
        return None;
    }
    Some(facing.dot(dir).clamp(-1.0, 1.0).acos().to_degrees())
}

/// Piecewise-linear curve over sorted `(input, output)` keys.
///
/// Inputs outside the key range clamp to the first/last output. An empty curve
/// evaluates to 1.0 so it can stand in for "no scaling".
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreCurve {
    keys: Vec<(f32, f32)>,
}

impl ScoreCurve {
    pub fn new(mut keys: Vec<(f32, f32)>) -> Self {
        keys.retain(|(x, y)| x.is_finite() && y.is_finite());
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }

    pub fn evaluate(&self, input: f32) -> f32 {
        let Some(&(first_x, first_y)) = self.keys.first() else {
            return 1.0;
        };
        if input <= first_x {
            return first_y;
        }
        for pair in self.keys.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if input <= x1 {
                let span = x1 - x0;
                if span <= f32::EPSILON {
                    return y1;
                }
                return lerp(y0, y1, (input - x0) / span);
            }
        }
        self.keys.last().map_or(1.0, |&(_, y)| y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp01_handles_nan_and_bounds() {
        assert_eq!(clamp01(f32::NAN), 0.0);
        assert_eq!(clamp01(-3.0), 0.0);
        assert_eq!(clamp01(7.5), 1.0);
        assert_eq!(clamp01(0.25), 0.25);
    }

    #[test]
    fn view_angle_straight_ahead_and_behind() {
        let angle = view_angle_degrees(Vec3::ZERO, Vec3::FORWARD, Vec3::new(100.0, 0.0, 0.0));
        assert!(angle.is_some_and(|a| a.abs() < 0.01));

        let behind = view_angle_degrees(Vec3::ZERO, Vec3::FORWARD, Vec3::new(-100.0, 0.0, 0.0));
        assert!(behind.is_some_and(|a| (a - 180.0).abs() < 0.01));

        assert!(view_angle_degrees(Vec3::ZERO, Vec3::FORWARD, Vec3::ZERO).is_none());
    }

    #[test]
    fn curve_interpolates_and_clamps() {
        let curve = ScoreCurve::new(vec![(1.0, 2.0), (0.0, 0.5)]);
        assert_eq!(curve.evaluate(-1.0), 0.5);
        assert_eq!(curve.evaluate(2.0), 2.0);
        assert!((curve.evaluate(0.5) - 1.25).abs() < 1e-6);
        assert_eq!(ScoreCurve::default().evaluate(0.3), 1.0);
    }
}
