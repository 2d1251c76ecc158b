//! Cubic Bézier curve values
//!
//! A [`Cubic`] is the flat control-point tuple `[x0, y0, x1, y1, x2, y2, x3,
//! y3]` of one curve. Most algorithms address coordinates by axis index so
//! the same code can work along x or y: `v[axis]`, `v[axis + 2]`, ...

use std::ops::Index;

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use crate::numerical::{self, Roots, CURVETIME_EPSILON, EPSILON, GEOMETRIC_EPSILON};
use crate::point::Point;
use crate::rect::Rect;

/// Control points of a cubic Bézier curve
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cubic(pub [f64; 8]);

/// Shape classification of a cubic, see [`Cubic::classify`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveKind {
    Line,
    Quadratic,
    Serpentine,
    Cusp,
    Loop,
    Arch,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub kind: CurveKind,
    /// Curve-times of inflections (serpentine), the cusp, or the two times
    /// of the loop's self-intersection, all inside (0, 1)
    pub roots: SmallVec<[f64; 2]>,
}

impl Index<usize> for Cubic {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl Cubic {
    pub const fn new(values: [f64; 8]) -> Self {
        Self(values)
    }

    pub fn from_points(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Self([p0.x, p0.y, p1.x, p1.y, p2.x, p2.y, p3.x, p3.y])
    }

    /// Curve between two anchors with handles relative to them
    pub fn from_anchors(p1: Point, handle_out: Point, handle_in: Point, p2: Point) -> Self {
        Self::from_points(p1, p1 + handle_out, p2 + handle_in, p2)
    }

    /// Straight curve with control points on the anchors
    pub fn line(p0: Point, p3: Point) -> Self {
        Self::from_points(p0, p0, p3, p3)
    }

    pub fn values(&self) -> &[f64; 8] {
        &self.0
    }

    pub fn p0(&self) -> Point {
        Point::new(self.0[0], self.0[1])
    }

    pub fn p1(&self) -> Point {
        Point::new(self.0[2], self.0[3])
    }

    pub fn p2(&self) -> Point {
        Point::new(self.0[4], self.0[5])
    }

    pub fn p3(&self) -> Point {
        Point::new(self.0[6], self.0[7])
    }

    /// Outgoing handle of the first anchor
    pub fn handle1(&self) -> Point {
        self.p1() - self.p0()
    }

    /// Incoming handle of the second anchor
    pub fn handle2(&self) -> Point {
        self.p2() - self.p3()
    }

    pub fn reversed(&self) -> Cubic {
        let v = &self.0;
        Cubic([v[6], v[7], v[4], v[5], v[2], v[3], v[0], v[1]])
    }

    pub fn transformed(&self, matrix: &crate::Affine) -> Cubic {
        Cubic::from_points(
            matrix.transform_point(self.p0()),
            matrix.transform_point(self.p1()),
            matrix.transform_point(self.p2()),
            matrix.transform_point(self.p3()),
        )
    }

    /// Bounds of the control polygon: `[left, top, right, bottom]`. They
    /// always contain the curve and are cheap to compute.
    pub fn control_bounds(&self) -> [f64; 4] {
        let v = &self.0;
        [
            v[0].min(v[2]).min(v[4]).min(v[6]),
            v[1].min(v[3]).min(v[5]).min(v[7]),
            v[0].max(v[2]).max(v[4]).max(v[6]),
            v[1].max(v[3]).max(v[5]).max(v[7]),
        ]
    }

    /// Tight bounds including the curve's extrema
    pub fn bounds(&self) -> Rect {
        let mut min = [self.0[0].min(self.0[6]), self.0[1].min(self.0[7])];
        let mut max = [self.0[0].max(self.0[6]), self.0[1].max(self.0[7])];
        for axis in 0..2 {
            let (v0, v1, v2, v3) = (
                self.0[axis],
                self.0[axis + 2],
                self.0[axis + 4],
                self.0[axis + 6],
            );
            // Derivative coefficients of the axis polynomial
            let a = 3.0 * (v1 - v2) - v0 + v3;
            let b = 2.0 * (v0 + v2) - 4.0 * v1;
            let c = v1 - v0;
            for t in numerical::solve_quadratic(a, b, c, Some((0.0, 1.0))) {
                let value = self.point_at(t).coord(axis);
                min[axis] = min[axis].min(value);
                max[axis] = max[axis].max(value);
            }
        }
        Rect::from_ltrb([min[0], min[1], max[0], max[1]])
    }

    pub fn has_handles(&self) -> bool {
        !self.handle1().is_zero() || !self.handle2().is_zero()
    }

    pub fn has_length(&self, epsilon: f64) -> bool {
        (!self.p0().is_close(self.p3(), epsilon) || self.has_handles())
            && self.length() > epsilon
    }

    /// A curve is straight when it has no handles, or when both handles lie
    /// on the line between the anchors and point inwards without
    /// overshooting.
    pub fn is_straight(&self) -> bool {
        let h1 = self.handle1();
        let h2 = self.handle2();
        if h1.is_zero() && h2.is_zero() {
            return true;
        }
        let p1 = self.p0();
        let p2 = self.p3();
        let v = p2 - p1;
        if v.is_zero() {
            return false;
        }
        if v.is_collinear(h1) && v.is_collinear(h2) {
            if line_distance(p1, v, p1 + h1) < GEOMETRIC_EPSILON
                && line_distance(p1, v, p2 + h2) < GEOMETRIC_EPSILON
            {
                let div = v.dot(v);
                let s1 = v.dot(h1) / div;
                let s2 = v.dot(h2) / div;
                return (0.0..=1.0).contains(&s1) && (-1.0..=0.0).contains(&s2);
            }
        }
        false
    }

    /// Polynomial coefficients `(a, b, c)` per axis, with near-zero handles
    /// snapped onto their anchors.
    fn coefficients(&self) -> ([f64; 2], [f64; 2], [f64; 2], [f64; 8]) {
        let mut v = self.0;
        if numerical::is_zero(v[2] - v[0]) && numerical::is_zero(v[3] - v[1]) {
            v[2] = v[0];
            v[3] = v[1];
        }
        if numerical::is_zero(v[4] - v[6]) && numerical::is_zero(v[5] - v[7]) {
            v[4] = v[6];
            v[5] = v[7];
        }
        let cx = 3.0 * (v[2] - v[0]);
        let bx = 3.0 * (v[4] - v[2]) - cx;
        let ax = v[6] - v[0] - cx - bx;
        let cy = 3.0 * (v[3] - v[1]);
        let by = 3.0 * (v[5] - v[3]) - cy;
        let ay = v[7] - v[1] - cy - by;
        ([ax, ay], [bx, by], [cx, cy], v)
    }

    pub fn point_at(&self, t: f64) -> Point {
        if t == 0.0 {
            return self.p0();
        }
        if t == 1.0 {
            return self.p3();
        }
        let (a, b, c, v) = self.coefficients();
        Point::new(
            ((a[0] * t + b[0]) * t + c[0]) * t + v[0],
            ((a[1] * t + b[1]) * t + c[1]) * t + v[1],
        )
    }

    /// First derivative, using the handle directions at the very ends
    pub fn derivative_at(&self, t: f64) -> Point {
        let (a, b, c, v) = self.coefficients();
        let t_min = CURVETIME_EPSILON;
        let t_max = 1.0 - t_min;
        if t < t_min {
            Point::new(c[0], c[1])
        } else if t > t_max {
            Point::new(3.0 * (v[6] - v[4]), 3.0 * (v[7] - v[5]))
        } else {
            Point::new(
                (3.0 * a[0] * t + 2.0 * b[0]) * t + c[0],
                (3.0 * a[1] * t + 2.0 * b[1]) * t + c[1],
            )
        }
    }

    /// Normalized tangent. At an end with a zero handle the direction
    /// towards the other inner control point is used.
    pub fn tangent_at(&self, t: f64) -> Point {
        let mut d = self.derivative_at(t);
        let t_min = CURVETIME_EPSILON;
        if d.x == 0.0 && d.y == 0.0 && (t < t_min || t > 1.0 - t_min) {
            let (_, _, _, v) = self.coefficients();
            d = Point::new(v[4] - v[2], v[5] - v[3]);
        }
        let len = d.length();
        if len != 0.0 {
            Point::new(d.x / len, d.y / len)
        } else {
            d
        }
    }

    /// De Casteljau subdivision at `t`
    pub fn subdivide(&self, t: f64) -> (Cubic, Cubic) {
        let [x0, y0, x1, y1, x2, y2, x3, y3] = self.0;
        let u = 1.0 - t;
        let x4 = u * x0 + t * x1;
        let y4 = u * y0 + t * y1;
        let x5 = u * x1 + t * x2;
        let y5 = u * y1 + t * y2;
        let x6 = u * x2 + t * x3;
        let y6 = u * y2 + t * y3;
        let x7 = u * x4 + t * x5;
        let y7 = u * y4 + t * y5;
        let x8 = u * x5 + t * x6;
        let y8 = u * y5 + t * y6;
        let x9 = u * x7 + t * x8;
        let y9 = u * y7 + t * y8;
        (
            Cubic([x0, y0, x4, y4, x7, y7, x9, y9]),
            Cubic([x9, y9, x8, y8, x6, y6, x3, y3]),
        )
    }

    /// The part of the curve between two times. `from > to` returns the
    /// reversed part.
    pub fn part(&self, from: f64, to: f64) -> Cubic {
        let flip = from > to;
        let (from, to) = if flip { (to, from) } else { (from, to) };
        let mut v = *self;
        if from > 0.0 {
            v = v.subdivide(from).1;
        }
        if to < 1.0 {
            v = v.subdivide((to - from) / (1.0 - from)).0;
        }
        if flip {
            v.reversed()
        } else {
            v
        }
    }

    /// Times in `range` where the coordinate on `axis` equals `value`
    pub fn solve(&self, axis: usize, value: f64, range: Option<(f64, f64)>) -> Roots {
        let v0 = self.0[axis];
        let v1 = self.0[axis + 2];
        let v2 = self.0[axis + 4];
        let v3 = self.0[axis + 6];
        let all_below = v0 < value && v3 < value && v1 < value && v2 < value;
        let all_above = v0 > value && v3 > value && v1 > value && v2 > value;
        if all_below || all_above {
            return Roots::new();
        }
        let c = 3.0 * (v1 - v0);
        let b = 3.0 * (v2 - v1) - c;
        let a = v3 - v0 - c - b;
        numerical::solve_cubic(a, b, c, v0 - value, range)
    }

    /// Curve-time of a point on the curve, if the point lies on it within
    /// [`GEOMETRIC_EPSILON`]
    pub fn time_of(&self, point: Point) -> Option<f64> {
        let p0 = self.p0();
        let p3 = self.p3();
        if point.is_close(p0, EPSILON) {
            return Some(0.0);
        }
        if point.is_close(p3, EPSILON) {
            return Some(1.0);
        }
        for axis in 0..2 {
            for u in self.solve(axis, point.coord(axis), Some((0.0, 1.0))) {
                if point.is_close(self.point_at(u), GEOMETRIC_EPSILON) {
                    return Some(u);
                }
            }
        }
        if point.is_close(p0, GEOMETRIC_EPSILON) {
            Some(0.0)
        } else if point.is_close(p3, GEOMETRIC_EPSILON) {
            Some(1.0)
        } else {
            None
        }
    }

    /// Splits the curve into parts that are monotonic on `axis`
    pub fn monotone_parts(&self, axis: usize) -> SmallVec<[Cubic; 3]> {
        let o0 = self.0[axis];
        let o1 = self.0[axis + 2];
        let o2 = self.0[axis + 4];
        let o3 = self.0[axis + 6];
        if ((o0 >= o1) == (o1 >= o2) && (o1 >= o2) == (o2 >= o3)) || self.is_straight() {
            return smallvec![*self];
        }
        let a = 3.0 * (o1 - o2) - o0 + o3;
        let b = 2.0 * (o0 + o2) - 4.0 * o1;
        let c = o1 - o0;
        let t_min = 1e-8;
        let mut roots = numerical::solve_quadratic(a, b, c, Some((t_min, 1.0 - t_min)));
        if roots.is_empty() {
            return smallvec![*self];
        }
        roots.sort_by(|a, b| a.total_cmp(b));
        let mut parts = SmallVec::new();
        let t = roots[0];
        let (first, mut rest) = self.subdivide(t);
        parts.push(first);
        if roots.len() > 1 {
            let (second, third) = rest.subdivide((roots[1] - t) / (1.0 - t));
            parts.push(second);
            rest = third;
        }
        parts.push(rest);
        parts
    }

    /// Signed area between the curve and the straight line closing it,
    /// positive for clockwise in a y-down coordinate system.
    pub fn area(&self) -> f64 {
        let [x0, y0, x1, y1, x2, y2, x3, y3] = self.0;
        3.0 * ((y3 - y0) * (x1 + x2) - (x3 - x0) * (y1 + y2) + y1 * (x0 - x2) - x1 * (y0 - y2)
            + y3 * (x2 + x0 / 3.0)
            - x3 * (y2 + y0 / 3.0))
            / 20.0
    }

    fn speed(&self, t: f64) -> f64 {
        let (a, b, c, _) = self.coefficients();
        let dx = (3.0 * a[0] * t + 2.0 * b[0]) * t + c[0];
        let dy = (3.0 * a[1] * t + 2.0 * b[1]) * t + c[1];
        (dx * dx + dy * dy).sqrt()
    }

    pub fn length(&self) -> f64 {
        self.length_between(0.0, 1.0)
    }

    /// Arc length between two curve-times, negative for `a > b`
    pub fn length_between(&self, a: f64, b: f64) -> f64 {
        if !self.has_handles() && a == 0.0 && b == 1.0 {
            return self.p0().distance(self.p3());
        }
        numerical::integrate(|t| self.speed(t), a, b)
    }

    /// Curve-time at an arc length `offset` from `start`. Negative offsets
    /// measure backwards; the default start is the matching curve end.
    /// Returns `None` when the offset exceeds the available length.
    pub fn time_at(&self, offset: f64, start: Option<f64>) -> Option<f64> {
        let start = start.unwrap_or(if offset < 0.0 { 1.0 } else { 0.0 });
        if offset == 0.0 {
            return Some(start);
        }
        let forward = offset > 0.0;
        let a = if forward { start } else { 0.0 };
        let b = if forward { 1.0 } else { start };
        let range_length = self.length_between(a, b).abs();
        let diff = offset.abs() - range_length;
        if diff.abs() < EPSILON {
            return Some(if forward { b } else { a });
        } else if diff > EPSILON {
            return None;
        }
        let guess = offset / range_length;
        Some(numerical::find_root(
            |t| self.length_between(start, t) - offset,
            |t| self.speed(t),
            start + guess,
            a,
            b,
            32,
            EPSILON,
        ))
    }

    /// Point at an arc length offset, negative offsets measured from the end
    pub fn point_at_offset(&self, offset: f64) -> Option<Point> {
        self.time_at(offset, None).map(|t| self.point_at(t))
    }

    /// Curve-times of curvature peaks inside the curve, sorted
    pub fn peaks(&self) -> Roots {
        let [x0, y0, x1, y1, x2, y2, x3, y3] = self.0;
        let ax = -x0 + 3.0 * x1 - 3.0 * x2 + x3;
        let bx = 3.0 * x0 - 6.0 * x1 + 3.0 * x2;
        let cx = -3.0 * x0 + 3.0 * x1;
        let ay = -y0 + 3.0 * y1 - 3.0 * y2 + y3;
        let by = 3.0 * y0 - 6.0 * y1 + 3.0 * y2;
        let cy = -3.0 * y0 + 3.0 * y1;
        let t_min = CURVETIME_EPSILON;
        let mut roots = numerical::solve_cubic(
            9.0 * (ax * ax + ay * ay),
            9.0 * (ax * bx + by * ay),
            2.0 * (bx * bx + by * by) + 3.0 * (cx * ax + cy * ay),
            cx * bx + by * cy,
            Some((t_min, 1.0 - t_min)),
        );
        roots.sort_by(|a, b| a.total_cmp(b));
        roots
    }

    /// Classifies the curve by the canonical form of its inflection
    /// polynomial. Loop curves report the two times of the self-crossing.
    pub fn classify(&self) -> Classification {
        let [x0, y0, x1, y1, x2, y2, x3, y3] = self.0;
        let a1 = x0 * (y3 - y2) + y0 * (x2 - x3) + x3 * y2 - y3 * x2;
        let a2 = x1 * (y0 - y3) + y1 * (x3 - x0) + x0 * y3 - y0 * x3;
        let a3 = x2 * (y1 - y0) + y2 * (x0 - x1) + x1 * y0 - y1 * x0;
        let mut d3 = 3.0 * a3;
        let mut d2 = d3 - a2;
        let mut d1 = d2 - a2 + a1;
        let l = (d1 * d1 + d2 * d2 + d3 * d3).sqrt();
        let s = if l != 0.0 { 1.0 / l } else { 0.0 };
        d1 *= s;
        d2 *= s;
        d3 *= s;

        let make = |kind: CurveKind, t1: Option<f64>, t2: Option<f64>| {
            let in_range = |t: Option<f64>| t.map_or(false, |t| t > 0.0 && t < 1.0);
            let has_roots = t1.is_some();
            let mut t1_ok = in_range(t1);
            let mut t2_ok = in_range(t2);
            let mut kind = kind;
            if has_roots && (!(t1_ok || t2_ok) || kind == CurveKind::Loop && !(t1_ok && t2_ok)) {
                kind = CurveKind::Arch;
                t1_ok = false;
                t2_ok = false;
            }
            let mut roots: SmallVec<[f64; 2]> = SmallVec::new();
            match (t1_ok, t2_ok, t1, t2) {
                (true, true, Some(a), Some(b)) => {
                    roots.push(a.min(b));
                    roots.push(a.max(b));
                }
                (true, _, Some(a), _) => roots.push(a),
                (_, true, _, Some(b)) => roots.push(b),
                _ => {}
            }
            Classification { kind, roots }
        };

        if numerical::is_zero(d1) {
            return if numerical::is_zero(d2) {
                make(
                    if numerical::is_zero(d3) {
                        CurveKind::Line
                    } else {
                        CurveKind::Quadratic
                    },
                    None,
                    None,
                )
            } else {
                make(CurveKind::Serpentine, Some(d3 / (3.0 * d2)), None)
            };
        }
        let d = 3.0 * d2 * d2 - 4.0 * d1 * d3;
        if numerical::is_zero(d) {
            return make(CurveKind::Cusp, Some(d2 / (2.0 * d1)), None);
        }
        let f1 = if d > 0.0 { (d / 3.0).sqrt() } else { (-d).sqrt() };
        let f2 = 2.0 * d1;
        make(
            if d > 0.0 {
                CurveKind::Serpentine
            } else {
                CurveKind::Loop
            },
            Some((d2 + f1) / f2),
            Some((d2 - f1) / f2),
        )
    }
}

/// Signed distance of `point` from the infinite line through `origin` along
/// `direction`. Axis-aligned lines avoid the division.
pub fn signed_line_distance(origin: Point, direction: Point, point: Point) -> f64 {
    let (px, py, vx, vy, x, y) = (origin.x, origin.y, direction.x, direction.y, point.x, point.y);
    if vx == 0.0 {
        if vy > 0.0 {
            x - px
        } else {
            px - x
        }
    } else if vy == 0.0 {
        if vx < 0.0 {
            y - py
        } else {
            py - y
        }
    } else {
        ((x - px) * vy - (y - py) * vx)
            / if vy > vx {
                vy * (1.0 + (vx * vx) / (vy * vy)).sqrt()
            } else {
                vx * (1.0 + (vy * vy) / (vx * vx)).sqrt()
            }
    }
}

pub fn line_distance(origin: Point, direction: Point, point: Point) -> f64 {
    signed_line_distance(origin, direction, point).abs()
}

/// Intersection point of two finite line segments, with [`EPSILON`] slack on
/// the segment parameters
pub fn line_intersection(p1: Point, p2: Point, p3: Point, p4: Point) -> Option<Point> {
    let v1 = p2 - p1;
    let v2 = p4 - p3;
    let cross = v1.x * v2.y - v1.y * v2.x;
    if numerical::is_machine_zero(cross) {
        return None;
    }
    let dx = p1.x - p3.x;
    let dy = p1.y - p3.y;
    let u1 = (v2.x * dy - v2.y * dx) / cross;
    let u2 = (v1.x * dy - v1.y * dx) / cross;
    let u_min = -EPSILON;
    let u_max = 1.0 + EPSILON;
    if u_min < u1 && u1 < u_max && u_min < u2 && u2 < u_max {
        let u1 = numerical::clamp(u1, 0.0, 1.0);
        Some(Point::new(p1.x + u1 * v1.x, p1.y + u1 * v1.y))
    } else {
        None
    }
}
