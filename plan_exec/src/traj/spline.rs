//! Natural cubic spline interpolation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{DMatrix, DVector};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A natural cubic spline `y = f(x)` through a set of anchor points.
///
/// Outside of the anchors the spline is continued linearly along its end slopes.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,

    /// Polynomial coefficients `[a, b, c, d]` of each segment, so that inside segment `i`
    /// `y = a + b*t + c*t^2 + d*t^3` with `t = x - x[i]`.
    coeffs: Vec<[f64; 4]>,

    /// Slopes used beyond the first and last anchors
    start_slope: f64,
    end_slope: f64,

    end_y: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SplineError {
    #[error("At least two anchor points are required, got {0}")]
    TooFewPoints(usize),

    #[error("Got {0} x values but {1} y values")]
    LengthMismatch(usize, usize),

    #[error("Anchor x values must be strictly increasing, anchor {0} is not")]
    NotIncreasing(usize),

    #[error("The spline system could not be solved")]
    Singular,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CubicSpline {
    /// Fit a spline through the given anchors.
    ///
    /// The `x` values must be strictly increasing.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, SplineError> {
        if x.len() != y.len() {
            return Err(SplineError::LengthMismatch(x.len(), y.len()));
        }

        let n = x.len();
        if n < 2 {
            return Err(SplineError::TooFewPoints(n));
        }

        if let Some(i) = x.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(SplineError::NotIncreasing(i + 1));
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

        // Solve for the second derivative at each anchor, which is zero at both ends
        let mut a = DMatrix::<f64>::zeros(n, n);
        let mut rhs = DVector::<f64>::zeros(n);

        a[(0, 0)] = 1.0;
        a[(n - 1, n - 1)] = 1.0;

        for i in 1..(n - 1) {
            a[(i, i - 1)] = h[i - 1];
            a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
            a[(i, i + 1)] = h[i];
            rhs[i] = 6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);
        }

        let m = a.lu().solve(&rhs).ok_or(SplineError::Singular)?;

        let coeffs: Vec<[f64; 4]> = (0..(n - 1))
            .map(|i| {
                let hi = h[i];
                [
                    y[i],
                    (y[i + 1] - y[i]) / hi - hi * (2.0 * m[i] + m[i + 1]) / 6.0,
                    m[i] / 2.0,
                    (m[i + 1] - m[i]) / (6.0 * hi),
                ]
            })
            .collect();

        let [_, b0, _, _] = coeffs[0];
        let [_, b, c, d] = coeffs[n - 2];
        let hl = h[n - 2];

        Ok(Self {
            x: x.to_vec(),
            coeffs,
            start_slope: b0,
            end_slope: b + 2.0 * c * hl + 3.0 * d * hl * hl,
            end_y: y[n - 1],
        })
    }

    /// Evaluate the spline at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let first_x = self.x[0];
        let last_x = self.x[self.x.len() - 1];

        if x < first_x {
            return self.coeffs[0][0] + self.start_slope * (x - first_x);
        }
        if x > last_x {
            return self.end_y + self.end_slope * (x - last_x);
        }

        let seg = self
            .x
            .partition_point(|&xi| xi <= x)
            .saturating_sub(1)
            .min(self.coeffs.len() - 1);

        let t = x - self.x[seg];
        let [a, b, c, d] = self.coeffs[seg];

        a + t * (b + t * (c + t * d))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_straight_anchors() {
        let x = [0.0, 1.0, 2.0, 5.0, 8.0, 11.0];
        let y = [0.0; 6];
        let spline = CubicSpline::new(&x, &y).unwrap();

        for i in 0..120 {
            let xi = -1.0 + i as f64 * 0.1;
            assert!(spline.eval(xi).abs() < 1e-12, "y({}) = {}", xi, spline.eval(xi));
        }
    }

    #[test]
    fn test_passes_through_anchors() {
        let x = [-1.0, 0.0, 12.5, 25.0, 37.5];
        let y = [0.1, 0.0, 1.2, 3.9, 4.0];
        let spline = CubicSpline::new(&x, &y).unwrap();

        for (xi, yi) in x.iter().zip(y.iter()) {
            assert!((spline.eval(*xi) - yi).abs() < 1e-9);
        }
    }

    #[test]
    fn test_smooth_at_anchors() {
        let x = [0.0, 3.0, 7.0, 12.0];
        let y = [0.0, 2.0, -1.0, 0.5];
        let spline = CubicSpline::new(&x, &y).unwrap();
        let eps = 1e-6;

        for &xi in &x[1..3] {
            let left = (spline.eval(xi) - spline.eval(xi - eps)) / eps;
            let right = (spline.eval(xi + eps) - spline.eval(xi)) / eps;
            assert!((left - right).abs() < 1e-4, "slope jump at {}", xi);
        }

        // Continues linearly past the last anchor
        let slope_a = spline.eval(13.0) - spline.eval(12.0);
        let slope_b = spline.eval(14.0) - spline.eval(13.0);
        assert!((slope_a - slope_b).abs() < 1e-9);
    }

    #[test]
    fn test_two_points_is_linear() {
        let spline = CubicSpline::new(&[0.0, 2.0], &[1.0, 2.0]).unwrap();

        assert!((spline.eval(1.0) - 1.5).abs() < 1e-12);
        assert!((spline.eval(4.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_anchors() {
        assert_eq!(
            CubicSpline::new(&[0.0], &[0.0]).unwrap_err(),
            SplineError::TooFewPoints(1)
        );
        assert_eq!(
            CubicSpline::new(&[0.0, 1.0], &[0.0]).unwrap_err(),
            SplineError::LengthMismatch(2, 1)
        );
        assert_eq!(
            CubicSpline::new(&[0.0, 1.0, 1.0], &[0.0, 1.0, 2.0]).unwrap_err(),
            SplineError::NotIncreasing(2)
        );
        assert_eq!(
            CubicSpline::new(&[0.0, f64::NAN], &[0.0, 1.0]).unwrap_err(),
            SplineError::NotIncreasing(1)
        );
    }
}
