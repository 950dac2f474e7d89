//! Scalar predicates and the quadratic root finder used by the predictor.

use std::error::Error;
use std::fmt;

use cgmath::BaseFloat;

const EPSILON: f64 = 1e-8;

/// Numerical tolerance used throughout the crate, cast to the scalar type.
pub fn epsilon<S>() -> S
where
    S: BaseFloat,
{
    S::from(EPSILON).unwrap()
}

/// Equality within [`epsilon`](fn.epsilon.html), scaled by the magnitude of
/// the operands once they grow past one.
pub fn float_equal<S>(a: S, b: S) -> bool
where
    S: BaseFloat,
{
    let scale = S::one().max(a.abs().max(b.abs()));
    (a - b).abs() <= epsilon::<S>() * scale
}

/// Sign of a scalar: `-1` below `-ε`, otherwise `+1`.
pub fn sign_of<S>(a: S) -> S
where
    S: BaseFloat,
{
    if a < -epsilon::<S>() {
        -S::one()
    } else {
        S::one()
    }
}

/// Division with mathematical conventions for a zero divisor: `0/0` is NaN,
/// otherwise the signed infinity of the numerator.
///
/// Lets slope and interval comparisons stay branchless: a vanished divisor
/// compares as "never" instead of needing a special case.
pub fn zero_divide<S>(a: S, b: S) -> S
where
    S: BaseFloat,
{
    if b.is_zero() {
        if a.is_zero() {
            S::nan()
        } else if a > S::zero() {
            S::infinity()
        } else {
            S::neg_infinity()
        }
    } else {
        a / b
    }
}

/// Real roots of a quadratic, at most two.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Roots<S> {
    /// No real root.
    None,
    /// A single root: the equation was linear, or the discriminant vanished.
    One(S),
    /// Two distinct roots, in no particular order.
    Two(S, S),
}

impl<S> Roots<S>
where
    S: Copy,
{
    /// Iterate over the contained roots.
    pub fn iter(&self) -> RootsIter<S> {
        match *self {
            Roots::None => RootsIter {
                first: None,
                second: None,
            },
            Roots::One(a) => RootsIter {
                first: Some(a),
                second: None,
            },
            Roots::Two(a, b) => RootsIter {
                first: Some(a),
                second: Some(b),
            },
        }
    }
}

impl<S> IntoIterator for Roots<S>
where
    S: Copy,
{
    type Item = S;
    type IntoIter = RootsIter<S>;

    fn into_iter(self) -> RootsIter<S> {
        self.iter()
    }
}

/// Iterator over the roots of a [`Roots`](enum.Roots.html) value.
pub struct RootsIter<S> {
    first: Option<S>,
    second: Option<S>,
}

impl<S> Iterator for RootsIter<S>
where
    S: Copy,
{
    type Item = S;

    fn next(&mut self) -> Option<S> {
        self.first.take().or_else(|| self.second.take())
    }
}

/// Degenerate outcomes of [`find_roots`](fn.find_roots.html).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootsError {
    /// All coefficients vanish: every value satisfies the equation.
    Identity,
    /// Only the constant term survives: no value satisfies the equation.
    Inequality,
}

impl fmt::Display for RootsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RootsError::Identity => write!(f, "equation is an identity"),
            RootsError::Inequality => write!(f, "equation has no solution"),
        }
    }
}

impl Error for RootsError {}

/// Real roots of `a·x² + b·x + c = 0`.
///
/// Linear equations fall back to the single root `-c/b`. A discriminant
/// within ε of zero collapses to the double root `-b/(2a)`. Otherwise the
/// roots are computed in the numerically stable form
/// `x₁ = (-b - sign(b)·√Δ) / 2a`, `x₂ = c / (a·x₁)`, which avoids
/// cancellation between `-b` and `√Δ`.
pub fn find_roots<S>(a: S, b: S, c: S) -> Result<Roots<S>, RootsError>
where
    S: BaseFloat,
{
    let zero = S::zero();
    let two = S::from(2).unwrap();
    if float_equal(a, zero) && float_equal(b, zero) {
        return if float_equal(c, zero) {
            Err(RootsError::Identity)
        } else {
            Err(RootsError::Inequality)
        };
    }
    if float_equal(a, zero) {
        return Ok(Roots::One(-c / b));
    }
    let discriminant = b * b - S::from(4).unwrap() * a * c;
    if discriminant < -epsilon::<S>() {
        Ok(Roots::None)
    } else if discriminant < epsilon::<S>() {
        Ok(Roots::One(-b / (two * a)))
    } else {
        let x1 = (-b - sign_of(b) * discriminant.sqrt()) / (two * a);
        Ok(Roots::Two(x1, c / (a * x1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_divide() {
        assert_eq!(zero_divide(4., 2.), 2.);
        assert_eq!(zero_divide(1., 0.), ::std::f64::INFINITY);
        assert_eq!(zero_divide(-1., 0.), ::std::f64::NEG_INFINITY);
        assert!(zero_divide(0., 0.).is_nan());
    }

    #[test]
    fn test_float_equal_scales() {
        assert!(float_equal(0., 1e-9));
        assert!(!float_equal(0., 1e-7));
        // relative at large magnitudes
        assert!(float_equal(1e12, 1e12 + 1e3));
        assert!(!float_equal(1e12, 1e12 + 1e6));
    }

    #[test]
    fn test_sign_of() {
        assert_eq!(sign_of(3.), 1.);
        assert_eq!(sign_of(-3.), -1.);
        assert_eq!(sign_of(0.), 1.);
    }

    #[test]
    fn test_find_roots_degenerate() {
        assert_eq!(find_roots(0., 0., 0.), Err(RootsError::Identity));
        assert_eq!(find_roots(0., 0., 1.), Err(RootsError::Inequality));
    }

    #[test]
    fn test_find_roots_linear() {
        assert_eq!(find_roots(0., 2., -4.), Ok(Roots::One(2.)));
    }

    #[test]
    fn test_find_roots_double() {
        // x² - 2x + 1 = (x - 1)²
        assert_eq!(find_roots(1., -2., 1.), Ok(Roots::One(1.)));
    }

    #[test]
    fn test_find_roots_none() {
        assert_eq!(find_roots(1., 0., 1.), Ok(Roots::None));
    }

    #[test]
    fn test_find_roots_two() {
        // x² - 5x + 6 = (x - 2)(x - 3)
        match find_roots(1.0f64, -5., 6.) {
            Ok(Roots::Two(a, b)) => {
                assert_ulps_eq!(a.min(b), 2.);
                assert_ulps_eq!(a.max(b), 3.);
            }
            other => panic!("expected two roots, got {:?}", other),
        }
    }

    #[test]
    fn test_find_roots_residual() {
        let cases = [
            (2.0f64, -3., -9.),
            (100., 0., -100.),
            (1., 1e4, 1.),
            (0.5, 3., 0.),
        ];
        for &(a, b, c) in &cases {
            let tolerance = epsilon::<f64>() * (a.abs() + b.abs() + c.abs());
            for x in find_roots(a, b, c).unwrap() {
                let residual = a * x * x + b * x + c;
                assert!(
                    residual.abs() <= tolerance,
                    "residual {} for root {} of ({}, {}, {})",
                    residual,
                    x,
                    a,
                    b,
                    c
                );
            }
        }
    }
}
