//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

/// Saturate a value into the range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T 
where
    T: Float
{
    value.max(min).min(max)
}

/// Move `value` towards `target` by no more than `max_step`.
///
/// If the target is within `max_step` of the value the target is returned.
pub fn step_towards<T>(value: T, target: T, max_step: T) -> T
where
    T: Float
{
    let diff = target - value;

    if diff.abs() <= max_step {
        target
    }
    else {
        value + max_step * diff.signum()
    }
}

/// Convert an angle in degrees into radians.
pub fn deg_to_rad<T>(deg: T) -> T
where
    T: Float
{
    deg.to_radians()
}

/// Get the signed angular distance from `a` to `b`, wrapped into `[-pi, pi]`.
///
/// This is the shortest rotation which takes `a` onto `b`, accounting for
/// wrapping at multiples of 2pi.
pub fn get_ang_dist<T>(a: T, b: T) -> T
where
    T: Float + FloatConst
{
    rem_euclid(b - a + T::PI(), T::PI() + T::PI()) - T::PI()
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// The return value `r` satisfies `0.0 <= r < rhs.abs()` in most cases,
/// however floating point round-off can result in `r == rhs.abs()` if `lhs`
/// is much smaller than `rhs.abs()` in magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_ang_dist() {
        const PI: f64 = std::f64::consts::PI;
        const TAU: f64 = std::f64::consts::TAU;

        assert!((get_ang_dist(1f64, 2f64) - 1f64).abs() < 1e-12);
        assert!((get_ang_dist(2f64, 1f64) + 1f64).abs() < 1e-12);
        assert!(get_ang_dist(0f64, TAU).abs() < 1e-12);
        assert!((get_ang_dist(0.1f64, TAU - 0.1) + 0.2).abs() < 1e-12);
        assert!((get_ang_dist(-3.0 * PI / 4.0, 3.0 * PI / 4.0) + PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_step_towards() {
        assert_eq!(step_towards(0.0, 10.0, 0.5), 0.5);
        assert_eq!(step_towards(10.0, 0.0, 0.5), 9.5);
        assert_eq!(step_towards(9.8, 10.0, 0.5), 10.0);
        assert_eq!(step_towards(3.0, 3.0, 0.5), 3.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-1.0, 0.0, 49.5), 0.0);
        assert_eq!(clamp(50.0, 0.0, 49.5), 49.5);
        assert_eq!(clamp(12.0, 0.0, 49.5), 12.0);
    }
}
