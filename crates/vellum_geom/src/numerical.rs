//! Numerical constants and solvers
//!
//! The root solvers return their roots in a [`Roots`] small vector. When a
//! `range` is supplied, roots outside `range` (with [`EPSILON`] slack) are
//! dropped and the remaining ones are clamped into it.

use smallvec::SmallVec;

/// Roots of a polynomial of degree three or less
pub type Roots = SmallVec<[f64; 3]>;

/// General purpose tolerance for comparisons against zero
pub const EPSILON: f64 = 1e-12;
/// The machine epsilon for double precision numbers, slightly raised
pub const MACHINE_EPSILON: f64 = 1.12e-16;
/// Tolerance for curve-time parameters
pub const CURVETIME_EPSILON: f64 = 1e-8;
/// Tolerance for geometric distances
pub const GEOMETRIC_EPSILON: f64 = 1e-7;
/// Tolerance for angle and collinearity checks
pub const TRIGONOMETRIC_EPSILON: f64 = 1e-8;

const GAUSS_ABSCISSAS: [f64; 8] = [
    0.0950125098376374,
    0.2816035507792589,
    0.4580167776572274,
    0.6178762444026438,
    0.7554044083550030,
    0.8656312023878318,
    0.9445750230732326,
    0.9894009349916499,
];

const GAUSS_WEIGHTS: [f64; 8] = [
    0.1894506104550685,
    0.1826034150449236,
    0.1691565193950025,
    0.1495959888165767,
    0.1246289712555339,
    0.0951585116824928,
    0.0622535239386479,
    0.0271524594117541,
];

pub fn is_zero(value: f64) -> bool {
    value >= -EPSILON && value <= EPSILON
}

pub fn is_machine_zero(value: f64) -> bool {
    value >= -MACHINE_EPSILON && value <= MACHINE_EPSILON
}

pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// 16-point Gauss-Legendre quadrature of `f` over `[a, b]`. A reversed
/// interval yields the negated integral.
pub fn integrate(f: impl Fn(f64) -> f64, a: f64, b: f64) -> f64 {
    let half = (b - a) * 0.5;
    let mid = (b + a) * 0.5;
    let mut sum = 0.0;
    for (x, w) in GAUSS_ABSCISSAS.iter().zip(GAUSS_WEIGHTS.iter()) {
        let dx = half * x;
        sum += w * (f(mid + dx) + f(mid - dx));
    }
    half * sum
}

/// Newton iteration with bisection fallback, bracketed in `[a, b]`
pub fn find_root(
    f: impl Fn(f64) -> f64,
    df: impl Fn(f64) -> f64,
    mut x: f64,
    mut a: f64,
    mut b: f64,
    iterations: usize,
    tolerance: f64,
) -> f64 {
    for _ in 0..iterations {
        let fx = f(x);
        let dfx = df(x);
        let dx = if dfx == 0.0 { 0.0 } else { fx / dfx };
        let nx = x - dx;
        if dx.abs() < tolerance {
            x = nx;
            break;
        }
        if fx > 0.0 {
            b = x;
            x = if nx <= a { (a + b) * 0.5 } else { nx };
        } else {
            a = x;
            x = if nx >= b { (a + b) * 0.5 } else { nx };
        }
    }
    clamp(x, a, b)
}

/// Splits a double into high and low halves (Dekker)
fn split(v: f64) -> (f64, f64) {
    let x = v * 134217729.0;
    let y = v - x;
    let hi = y + x;
    (hi, v - hi)
}

/// Discriminant `b^2 - ac` of the reduced quadratic, evaluated with extra
/// precision when cancellation is likely.
fn discriminant(a: f64, b: f64, c: f64) -> f64 {
    let mut d = b * b - a * c;
    let e = b * b + a * c;
    if d.abs() * 3.0 < e {
        let (ah, al) = split(a);
        let (bh, bl) = split(b);
        let (ch, cl) = split(c);
        let p = b * b;
        let dp = (bh * bh - p + 2.0 * bh * bl) + bl * bl;
        let q = a * c;
        let dq = (ah * ch - q + ah * cl + al * ch) + al * cl;
        d = (p - q) + (dp - dq);
    }
    d
}

/// Power of two that brings the largest coefficient near 1, or 0 when no
/// scaling is needed.
fn normalization_factor(values: &[f64]) -> f64 {
    let norm = values.iter().fold(0.0f64, |m, v| m.max(*v));
    if norm != 0.0 && (norm < 1e-8 || norm > 1e8) {
        2f64.powf(-(norm.log2().round()))
    } else {
        0.0
    }
}

fn push_root(roots: &mut Roots, x: f64, range: Option<(f64, f64)>) {
    if !x.is_finite() {
        return;
    }
    match range {
        None => roots.push(x),
        Some((min, max)) => {
            if x > min - EPSILON && x < max + EPSILON {
                roots.push(clamp(x, min, max));
            }
        }
    }
}

/// Solves `a x^2 + b x + c = 0`. Degenerate all-zero coefficients (infinite
/// solutions) yield no roots.
pub fn solve_quadratic(a: f64, b: f64, c: f64, range: Option<(f64, f64)>) -> Roots {
    let (mut a, mut b, mut c) = (a, b, c);
    let mut roots = Roots::new();
    let x1;
    let mut x2 = f64::INFINITY;
    if a.abs() < EPSILON {
        if b.abs() < EPSILON {
            return roots;
        }
        x1 = -c / b;
    } else {
        b *= -0.5;
        let mut d = discriminant(a, b, c);
        if d != 0.0 && d.abs() < MACHINE_EPSILON {
            let f = normalization_factor(&[a.abs(), b.abs(), c.abs()]);
            if f != 0.0 {
                a *= f;
                b *= f;
                c *= f;
                d = discriminant(a, b, c);
            }
        }
        if d >= -MACHINE_EPSILON {
            let q = if d < 0.0 { 0.0 } else { d.sqrt() };
            let r = b + if b < 0.0 { -q } else { q };
            if r == 0.0 {
                x1 = c / a;
                x2 = -x1;
            } else {
                x1 = r / a;
                x2 = c / r;
            }
        } else {
            return roots;
        }
    }
    push_root(&mut roots, x1, range);
    if x2 != x1 {
        push_root(&mut roots, x2, range);
    }
    roots
}

/// Solves `a x^3 + b x^2 + c x + d = 0`, deflating to a quadratic after
/// locating one real root by Newton iteration.
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64, range: Option<(f64, f64)>) -> Roots {
    let (mut a, mut b, mut c, mut d) = (a, b, c, d);
    let f = normalization_factor(&[a.abs(), b.abs(), c.abs(), d.abs()]);
    if f != 0.0 {
        a *= f;
        b *= f;
        c *= f;
        d *= f;
    }

    // evaluate(x0) -> (b1, c2, qd, q)
    let evaluate = |x0: f64| {
        let tmp = a * x0;
        let b1 = tmp + b;
        let c2 = b1 * x0 + c;
        let qd = (tmp + b1) * x0 + c2;
        let q = c2 * x0 + d;
        (b1, c2, qd, q)
    };

    let (qa, b1, c2, x);
    if a.abs() < EPSILON {
        qa = b;
        b1 = c;
        c2 = d;
        x = f64::INFINITY;
    } else if d.abs() < EPSILON {
        qa = a;
        b1 = b;
        c2 = c;
        x = 0.0;
    } else {
        qa = a;
        let mut xr = -(b / a) / 3.0;
        let (mut eb1, mut ec2, qd, q) = evaluate(xr);
        let t = q / a;
        let r = t.abs().powf(1.0 / 3.0);
        let s = if t < 0.0 { -1.0 } else { 1.0 };
        let td = -qd / a;
        let rd = if td > 0.0 {
            1.324717957244746 * r.max(td.sqrt())
        } else {
            r
        };
        let mut x1 = xr - s * rd;
        if x1 != xr {
            for _ in 0..128 {
                let (nb1, nc2, nqd, nq) = evaluate(x1);
                xr = x1;
                eb1 = nb1;
                ec2 = nc2;
                let x0 = if nqd == 0.0 {
                    x1
                } else {
                    x1 - nq / nqd / (1.0 + MACHINE_EPSILON)
                };
                if s * x0 > s * x1 {
                    x1 = x0;
                } else {
                    break;
                }
            }
            if a.abs() * xr * xr > (d / xr).abs() {
                ec2 = -d / xr;
                eb1 = (ec2 - c) / xr;
            }
        }
        b1 = eb1;
        c2 = ec2;
        x = xr;
    }

    let mut roots = solve_quadratic(qa, b1, c2, range);
    let count = roots.len();
    if x.is_finite() && (count == 0 || roots.iter().all(|r| *r != x)) {
        push_root(&mut roots, x, range);
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut roots: Roots) -> Vec<f64> {
        roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
        roots.into_vec()
    }

    #[test]
    fn test_quadratic_two_roots() {
        let roots = sorted(solve_quadratic(1.0, -3.0, 2.0, None));
        assert_eq!(roots.len(), 2);
        assert!((roots[0] - 1.0).abs() < 1e-12);
        assert!((roots[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_quadratic_range_filter() {
        let roots = solve_quadratic(1.0, -3.0, 2.0, Some((0.0, 1.5)));
        assert_eq!(roots.len(), 1);
        assert!((roots[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cubic_three_roots() {
        // (x - 1)(x - 2)(x - 3)
        let roots = sorted(solve_cubic(1.0, -6.0, 11.0, -6.0, None));
        assert_eq!(roots.len(), 3);
        for (root, expected) in roots.iter().zip([1.0, 2.0, 3.0]) {
            assert!((root - expected).abs() < 1e-9, "{root} != {expected}");
        }
    }

    #[test]
    fn test_cubic_degenerates_to_linear() {
        let roots = solve_cubic(0.0, 0.0, 2.0, -1.0, None);
        assert_eq!(roots.len(), 1);
        assert!((roots[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_integrate_polynomial() {
        let value = integrate(|x| 3.0 * x * x, 0.0, 2.0);
        assert!((value - 8.0).abs() < 1e-9);
        let reversed = integrate(|x| 3.0 * x * x, 2.0, 0.0);
        assert!((reversed + 8.0).abs() < 1e-9);
    }
}
