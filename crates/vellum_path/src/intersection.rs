//! Curve intersections
//!
//! Finds the locations where the curves of one or two contour sets meet.
//! Candidate pairs come from the bounds collision index; each pair is then
//! solved by the cheapest applicable method:
//!
//! - coincident runs (overlaps), reported as two locations at the run ends
//! - straight against straight, by line intersection
//! - curve against straight, by rotating the curve onto the line and solving
//!   the cubic
//! - curve against curve, by Bézier clipping with fat lines
//!
//! Every location is created together with its partner on the other curve.
//! The main list holds one location per pair, sorted by contour and curve
//! position, with equal locations merged; [`Locations::expand`] adds the
//! partners.

use std::ops::Range;

use vellum_geom::curve::{line_distance, line_intersection, signed_line_distance};
use vellum_geom::numerical::{CURVETIME_EPSILON, EPSILON, GEOMETRIC_EPSILON};
use vellum_geom::{find_curve_bounds_collisions, Cubic, Point};

/// Recursion limits of the fat-line clipper
const MAX_RECURSION: usize = 40;
const MAX_CALLS: usize = 4096;
const FAT_LINE_EPSILON: f64 = 1e-9;

/// Which locations a query keeps
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Include {
    All,
    Crossings,
    CrossingsOrOverlaps,
}

/// One curve of a [`CurveSet`] with its neighbors in the contour
#[derive(Clone, Debug)]
pub(crate) struct CurveEntry {
    pub values: Cubic,
    pub contour: usize,
    /// Position of the curve within its contour
    pub index: usize,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    /// Arc length of the contour before this curve
    pub offset: f64,
}

/// Flat list of the curves of several contours
#[derive(Clone, Debug, Default)]
pub(crate) struct CurveSet {
    pub curves: Vec<CurveEntry>,
    contour_lengths: Vec<f64>,
}

impl CurveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the curves of one contour and returns their index range
    pub fn push_contour(&mut self, curves: &[Cubic], closed: bool) -> Range<usize> {
        let contour = self.contour_lengths.len();
        let start = self.curves.len();
        let count = curves.len();
        let mut offset = 0.0;
        for (index, values) in curves.iter().enumerate() {
            let prev = if index > 0 {
                Some(start + index - 1)
            } else if closed {
                Some(start + count - 1)
            } else {
                None
            };
            let next = if index + 1 < count {
                Some(start + index + 1)
            } else if closed {
                Some(start)
            } else {
                None
            };
            self.curves.push(CurveEntry {
                values: *values,
                contour,
                index,
                prev,
                next,
                offset,
            });
            offset += values.length();
        }
        self.contour_lengths.push(offset);
        start..self.curves.len()
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }
}

/// A point on a curve where it meets another curve
#[derive(Clone, Debug, PartialEq)]
pub struct CurveLocation {
    /// Index of the curve in the set that was searched
    pub curve: usize,
    pub contour: usize,
    /// Position of the curve within its contour
    pub index: usize,
    pub time: f64,
    pub point: Point,
    /// Arc length from the start of the contour
    pub offset: f64,
    /// Part of a coincident run rather than a single point
    pub overlap: bool,
    /// Arena index of the matching location on the other curve
    pub other: usize,
}

/// Arena of locations plus the sorted list of reported ones
#[derive(Clone, Debug, Default)]
pub(crate) struct Locations {
    pub arena: Vec<CurveLocation>,
    pub list: Vec<usize>,
    /// Some location was accepted for being part of an overlap
    pub has_overlaps: bool,
    /// Some location was accepted for being a crossing
    pub has_crossings: bool,
}

impl Locations {
    /// The sorted list with the partner of every location added
    pub fn expand(&mut self, set: &CurveSet) -> Vec<usize> {
        let mut expanded = self.list.clone();
        for i in (0..self.list.len()).rev() {
            let other = self.arena[self.list[i]].other;
            insert(set, &mut self.arena, &mut expanded, other, false);
        }
        expanded
    }
}

/// Finds the intersections between the curves in `first` and `second`, or
/// among the curves of `first` when `second` is `None`.
pub(crate) fn find(
    set: &CurveSet,
    first: Range<usize>,
    second: Option<Range<usize>>,
    include: Include,
) -> Locations {
    let own = second.is_none();
    let values1: Vec<Cubic> = set.curves[first.clone()].iter().map(|c| c.values).collect();
    let collisions = match &second {
        None => find_curve_bounds_collisions(&values1, None, GEOMETRIC_EPSILON),
        Some(range) => {
            let values2: Vec<Cubic> = set.curves[range.clone()].iter().map(|c| c.values).collect();
            find_curve_bounds_collisions(&values1, Some(&values2), GEOMETRIC_EPSILON)
        }
    };
    let offset2 = second.as_ref().map_or(first.start, |range| range.start);

    let mut finder = Finder {
        set,
        include,
        locations: Locations::default(),
    };
    for (index1, candidates) in collisions.iter().enumerate() {
        let c1 = first.start + index1;
        if own {
            finder.add_self_intersection(c1);
        }
        for &index2 in candidates {
            if !own || index2 > index1 {
                finder.add_curve_intersections(c1, offset2 + index2);
            }
        }
    }
    tracing::trace!(
        "intersections: {} locations among {} curves",
        finder.locations.list.len(),
        set.len()
    );
    finder.locations
}

struct Finder<'a> {
    set: &'a CurveSet,
    include: Include,
    locations: Locations,
}

impl Finder<'_> {
    fn values(&self, curve: usize) -> Cubic {
        self.set.curves[curve].values
    }

    fn add_self_intersection(&mut self, c1: usize) {
        let info = self.values(c1).classify();
        if info.kind == vellum_geom::CurveKind::Loop && info.roots.len() == 2 {
            self.add_location(c1, Some(info.roots[0]), c1, Some(info.roots[1]), false);
        }
    }

    fn add_curve_intersections(&mut self, c1: usize, c2: usize) {
        let v1 = self.values(c1);
        let v2 = self.values(c2);
        let [l1, t1, r1, b1] = v1.control_bounds();
        let [l2, t2, r2, b2] = v2.control_bounds();
        if !(r1 + EPSILON > l2 && l1 - EPSILON < r2 && b1 + EPSILON > t2 && t1 - EPSILON < b2) {
            return;
        }
        if let Some(overlaps) = curve_overlaps(&v1, &v2) {
            for (t1, t2) in overlaps {
                self.add_location(c1, Some(t1), c2, Some(t2), true);
            }
            return;
        }
        let straight1 = v1.is_straight();
        let straight2 = v2.is_straight();
        let straight = straight1 && straight2;
        let flip = straight1 && !straight2;
        let before = self.locations.list.len();
        let (va, vb, ca, cb) = if flip { (v2, v1, c2, c1) } else { (v1, v2, c1, c2) };
        if straight {
            self.add_line_intersection(&va, &vb, ca, cb);
        } else if straight1 || straight2 {
            self.add_curve_line_intersections(&va, &vb, ca, cb, flip);
        } else {
            let mut clip = Clip {
                recursion: 0,
                calls: 0,
            };
            self.add_fat_line_intersections(va, vb, ca, cb, flip, &mut clip, 0.0, 1.0, 0.0, 1.0);
        }
        if !straight || self.locations.list.len() == before {
            // Touching end points are found by distance alone
            for i in 0..4 {
                let t1 = (i >> 1) as f64;
                let t2 = (i & 1) as f64;
                let p1 = if t1 == 0.0 { v1.p0() } else { v1.p3() };
                let p2 = if t2 == 0.0 { v2.p0() } else { v2.p3() };
                if p1.is_close(p2, EPSILON) {
                    self.add_location(c1, Some(t1), c2, Some(t2), false);
                }
            }
        }
    }

    fn add_line_intersection(&mut self, v1: &Cubic, v2: &Cubic, c1: usize, c2: usize) {
        if let Some(pt) = line_intersection(v1.p0(), v1.p3(), v2.p0(), v2.p3()) {
            self.add_location(c1, v1.time_of(pt), c2, v2.time_of(pt), false);
        }
    }

    /// `v1` is the curve, `v2` the straight one
    fn add_curve_line_intersections(
        &mut self,
        v1: &Cubic,
        v2: &Cubic,
        c1: usize,
        c2: usize,
        flip: bool,
    ) {
        let origin = v2.p0();
        let direction = v2.p3() - origin;
        for t1 in curve_line_roots(v1, origin, direction) {
            let p1 = v1.point_at(t1);
            if let Some(t2) = v2.time_of(p1) {
                if flip {
                    self.add_location(c2, Some(t2), c1, Some(t1), false);
                } else {
                    self.add_location(c1, Some(t1), c2, Some(t2), false);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn add_fat_line_intersections(
        &mut self,
        v1: Cubic,
        v2: Cubic,
        c1: usize,
        c2: usize,
        flip: bool,
        clip: &mut Clip,
        t_min: f64,
        t_max: f64,
        u_min: f64,
        u_max: f64,
    ) {
        clip.calls += 1;
        let recursion = clip.recursion + 1;
        if clip.calls >= MAX_CALLS || recursion >= MAX_RECURSION {
            return;
        }
        let q0 = v2.p0();
        let q3 = v2.p3();
        let dir = q3 - q0;
        let distance = |p: Point| signed_line_distance(q0, dir, p);
        let d1 = distance(v2.p1());
        let d2 = distance(v2.p2());
        let factor = if d1 * d2 > 0.0 { 3.0 / 4.0 } else { 4.0 / 9.0 };
        let d_min = factor * 0f64.min(d1).min(d2);
        let d_max = factor * 0f64.max(d1).max(d2);
        let dp0 = distance(v1.p0());
        let dp1 = distance(v1.p1());
        let dp2 = distance(v1.p2());
        let dp3 = distance(v1.p3());
        if d1 == 0.0 && d2 == 0.0 && dp0 == 0.0 && dp1 == 0.0 && dp2 == 0.0 && dp3 == 0.0 {
            return;
        }
        let (mut top, mut bottom) = convex_hull(dp0, dp1, dp2, dp3);
        let Some(t_min_clip) = clip_convex_hull(&top, &bottom, d_min, d_max) else {
            return;
        };
        top.reverse();
        bottom.reverse();
        let Some(t_max_clip) = clip_convex_hull(&top, &bottom, d_min, d_max) else {
            return;
        };

        let t_min_new = t_min + (t_max - t_min) * t_min_clip;
        let t_max_new = t_min + (t_max - t_min) * t_max_clip;
        if (u_max - u_min).max(t_max_new - t_min_new) < FAT_LINE_EPSILON {
            let t = (t_min_new + t_max_new) / 2.0;
            let u = (u_min + u_max) / 2.0;
            if flip {
                self.add_location(c2, Some(u), c1, Some(t), false);
            } else {
                self.add_location(c1, Some(t), c2, Some(u), false);
            }
            return;
        }

        let v1 = v1.part(t_min_clip, t_max_clip);
        let u_diff = u_max - u_min;
        let saved = clip.recursion;
        clip.recursion = recursion;
        if t_max_clip - t_min_clip > 0.8 {
            // Clipping did not converge, subdivide the longer curve
            if t_max_new - t_min_new > u_diff {
                let (left, right) = v1.subdivide(0.5);
                let t = (t_min_new + t_max_new) / 2.0;
                self.add_fat_line_intersections(
                    v2, left, c2, c1, !flip, clip, u_min, u_max, t_min_new, t,
                );
                clip.recursion = recursion;
                self.add_fat_line_intersections(
                    v2, right, c2, c1, !flip, clip, u_min, u_max, t, t_max_new,
                );
            } else {
                let (left, right) = v2.subdivide(0.5);
                let u = (u_min + u_max) / 2.0;
                self.add_fat_line_intersections(
                    left, v1, c2, c1, !flip, clip, u_min, u, t_min_new, t_max_new,
                );
                clip.recursion = recursion;
                self.add_fat_line_intersections(
                    right, v1, c2, c1, !flip, clip, u, u_max, t_min_new, t_max_new,
                );
            }
        } else if u_diff == 0.0 || u_diff >= FAT_LINE_EPSILON {
            self.add_fat_line_intersections(
                v2, v1, c2, c1, !flip, clip, u_min, u_max, t_min_new, t_max_new,
            );
        } else {
            // Only v1 still needs clipping
            self.add_fat_line_intersections(
                v1, v2, c1, c2, flip, clip, t_min_new, t_max_new, u_min, u_max,
            );
        }
        clip.recursion = saved;
    }

    /// Records a location pair unless it is the shared end point of two
    /// adjacent curves.
    fn add_location(
        &mut self,
        c1: usize,
        t1: Option<f64>,
        c2: usize,
        t2: Option<f64>,
        overlap: bool,
    ) {
        let (Some(t1), Some(t2)) = (t1, t2) else {
            return;
        };
        let curves = &self.set.curves;
        let exclude_start = !overlap && curves[c1].prev == Some(c2);
        let exclude_end = !overlap && c1 != c2 && curves[c1].next == Some(c2);
        let t_min = CURVETIME_EPSILON;
        let t_max = 1.0 - t_min;
        let t1_ok = t1 >= if exclude_start { t_min } else { 0.0 }
            && t1 <= if exclude_end { t_max } else { 1.0 };
        let t2_ok = t2 >= if exclude_end { t_min } else { 0.0 }
            && t2 <= if exclude_start { t_max } else { 1.0 };
        if !(t1_ok && t2_ok) {
            return;
        }

        let loc1 = self.locations.arena.len();
        let loc2 = loc1 + 1;
        let first = new_location(self.set, c1, t1, overlap, loc2);
        let second = new_location(self.set, c2, t2, overlap, loc1);
        let keep = match self.include {
            Include::All => true,
            Include::Crossings => is_crossing(self.set, &first, &second),
            Include::CrossingsOrOverlaps => {
                if overlap {
                    self.locations.has_overlaps = true;
                    true
                } else if is_crossing(self.set, &first, &second) {
                    self.locations.has_crossings = true;
                    true
                } else {
                    false
                }
            }
        };
        if !keep {
            return;
        }
        self.locations.arena.push(first);
        self.locations.arena.push(second);
        let Locations { arena, list, .. } = &mut self.locations;
        insert(self.set, arena, list, loc1, true);
    }
}

struct Clip {
    recursion: usize,
    calls: usize,
}

/// Location on `curve` at `time`. A time at the very end moves to the start
/// of the following curve.
fn new_location(set: &CurveSet, curve: usize, time: f64, overlap: bool, other: usize) -> CurveLocation {
    let (curve, time) = match set.curves[curve].next {
        Some(next) if time >= 1.0 - CURVETIME_EPSILON => (next, 0.0),
        _ => (curve, time),
    };
    let entry = &set.curves[curve];
    CurveLocation {
        curve,
        contour: entry.contour,
        index: entry.index,
        time,
        point: entry.values.point_at(time),
        offset: entry.offset + entry.values.length_between(0.0, time),
        overlap,
        other,
    }
}

fn locations_equal(
    set: &CurveSet,
    arena: &[CurveLocation],
    a: usize,
    b: usize,
    ignore_other: bool,
) -> bool {
    if a == b {
        return true;
    }
    let (la, lb) = (&arena[a], &arena[b]);
    if la.contour != lb.contour {
        return false;
    }
    let diff = (la.offset - lb.offset).abs();
    let length = set.contour_lengths[la.contour];
    (diff < GEOMETRIC_EPSILON || (length - diff).abs() < GEOMETRIC_EPSILON)
        && (ignore_other || locations_equal(set, arena, la.other, lb.other, true))
}

/// Inserts `loc` into the sorted `list`. With `merge`, an equal location
/// already in the list absorbs it and is returned instead.
fn insert(
    set: &CurveSet,
    arena: &mut [CurveLocation],
    list: &mut Vec<usize>,
    loc: usize,
    merge: bool,
) -> usize {
    let length = list.len() as isize;
    let search = |arena: &[CurveLocation], list: &[usize], index: isize, dir: isize| {
        let mut i = index + dir;
        while i >= -1 && i <= length {
            let other = list[i.rem_euclid(length) as usize];
            if !arena[loc].point.is_close(arena[other].point, GEOMETRIC_EPSILON) {
                break;
            }
            if locations_equal(set, arena, loc, other, false) {
                return Some(other);
            }
            i += dir;
        }
        None
    };

    let mut l: isize = 0;
    let mut r: isize = length - 1;
    while l <= r {
        let m = (l + r) / 2;
        let current = list[m as usize];
        if merge {
            let found = if locations_equal(set, arena, loc, current, false) {
                Some(current)
            } else {
                search(&*arena, list, m, -1).or_else(|| search(&*arena, list, m, 1))
            };
            if let Some(found) = found {
                if arena[loc].overlap {
                    arena[found].overlap = true;
                    let partner = arena[found].other;
                    arena[partner].overlap = true;
                }
                return found;
            }
        }
        let (la, lb) = (&arena[loc], &arena[current]);
        let diff = if la.contour != lb.contour {
            la.contour as f64 - lb.contour as f64
        } else {
            (la.index as f64 + la.time) - (lb.index as f64 + lb.time)
        };
        if diff < 0.0 {
            r = m - 1;
        } else {
            l = m + 1;
        }
    }
    list.insert(l as usize, loc);
    loc
}

/// Times on `v` where it crosses the infinite line through `origin`
fn curve_line_roots(v: &Cubic, origin: Point, direction: Point) -> vellum_geom::numerical::Roots {
    if direction.is_zero() {
        return v.time_of(origin).into_iter().collect();
    }
    let angle = (-direction.y).atan2(direction.x);
    let (sin, cos) = angle.sin_cos();
    let mut rotated = [0.0; 8];
    for i in (0..8).step_by(2) {
        let x = v[i] - origin.x;
        let y = v[i + 1] - origin.y;
        rotated[i] = x * cos - y * sin;
        rotated[i + 1] = x * sin + y * cos;
    }
    Cubic::new(rotated).solve(1, 0.0, Some((0.0, 1.0)))
}

type Hull = Vec<(f64, f64)>;

/// Top and bottom of the convex hull of the distance function control
/// points, see Sederberg & Nishita
fn convex_hull(dq0: f64, dq1: f64, dq2: f64, dq3: f64) -> (Hull, Hull) {
    let p0 = (0.0, dq0);
    let p1 = (1.0 / 3.0, dq1);
    let p2 = (2.0 / 3.0, dq2);
    let p3 = (1.0, dq3);
    let dist1 = dq1 - (2.0 * dq0 + dq3) / 3.0;
    let dist2 = dq2 - (dq0 + 2.0 * dq3) / 3.0;
    let (top, bottom) = if dist1 * dist2 < 0.0 {
        (vec![p0, p1, p3], vec![p0, p2, p3])
    } else {
        let ratio = dist1 / dist2;
        let top = if ratio >= 2.0 {
            vec![p0, p1, p3]
        } else if ratio <= 0.5 {
            vec![p0, p2, p3]
        } else {
            vec![p0, p1, p2, p3]
        };
        (top, vec![p0, p3])
    };
    let lead = if dist1 != 0.0 { dist1 } else { dist2 };
    if lead < 0.0 {
        (bottom, top)
    } else {
        (top, bottom)
    }
}

fn clip_convex_hull(top: &[(f64, f64)], bottom: &[(f64, f64)], d_min: f64, d_max: f64) -> Option<f64> {
    if top[0].1 < d_min {
        clip_convex_hull_part(top, true, d_min)
    } else if bottom[0].1 > d_max {
        clip_convex_hull_part(bottom, false, d_max)
    } else {
        Some(top[0].0)
    }
}

fn clip_convex_hull_part(part: &[(f64, f64)], top: bool, threshold: f64) -> Option<f64> {
    let (mut px, mut py) = part[0];
    for &(qx, qy) in &part[1..] {
        let reached = if top { qy >= threshold } else { qy <= threshold };
        if reached {
            return Some(if qy == threshold {
                qx
            } else {
                px + (threshold - py) * (qx - px) / (qy - py)
            });
        }
        px = qx;
        py = qy;
    }
    None
}

/// Detects a coincident run of two curves and returns its two end points as
/// `(time on v1, time on v2)` pairs.
pub(crate) fn curve_overlaps(v1: &Cubic, v2: &Cubic) -> Option<[(f64, f64); 2]> {
    let squared_line_length = |v: &Cubic| (v.p3() - v.p0()).dot(v.p3() - v.p0());
    let mut straight1 = v1.is_straight();
    let mut straight2 = v2.is_straight();
    let mut straight_both = straight1 && straight2;
    let flip = squared_line_length(v1) < squared_line_length(v2);
    let (l1, l2) = if flip { (v2, v1) } else { (v1, v2) };
    let origin = l1.p0();
    let direction = l1.p3() - origin;
    let near = |p: Point| line_distance(origin, direction, p) < GEOMETRIC_EPSILON;
    if near(l2.p0()) && near(l2.p3()) {
        if !straight_both && near(l1.p1()) && near(l1.p2()) && near(l2.p1()) && near(l2.p2()) {
            straight1 = true;
            straight2 = true;
            straight_both = true;
        }
    } else if straight_both {
        return None;
    }
    if straight1 != straight2 {
        return None;
    }

    let curves = [v1, v2];
    let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(2);
    for i in 0..4 {
        if pairs.len() >= 2 {
            break;
        }
        let i1 = i & 1;
        let i2 = i1 ^ 1;
        let t1 = (i >> 1) as f64;
        let end = if t1 == 0.0 { curves[i2].p0() } else { curves[i2].p3() };
        if let Some(t2) = curves[i1].time_of(end) {
            let pair = if i1 == 1 { (t1, t2) } else { (t2, t1) };
            if pairs.is_empty()
                || (pair.0 - pairs[0].0).abs() > CURVETIME_EPSILON
                    && (pair.1 - pairs[0].1).abs() > CURVETIME_EPSILON
            {
                pairs.push(pair);
            }
        }
        if i > 2 && pairs.is_empty() {
            break;
        }
    }
    if pairs.len() != 2 {
        return None;
    }
    if !straight_both {
        let o1 = v1.part(pairs[0].0, pairs[1].0);
        let o2 = v2.part(pairs[0].1, pairs[1].1);
        if (2..6).any(|i| (o2[i] - o1[i]).abs() > GEOMETRIC_EPSILON) {
            return None;
        }
    }
    Some([pairs[0], pairs[1]])
}

fn is_in_range(angle: f64, min: f64, max: f64) -> bool {
    if min < max {
        angle > min && angle < max
    } else {
        angle > min || angle < max
    }
}

fn is_touching(set: &CurveSet, loc: &CurveLocation, other: &CurveLocation) -> bool {
    let v1 = set.curves[loc.curve].values;
    let v2 = set.curves[other.curve].values;
    if v1.tangent_at(loc.time).is_collinear(v2.tangent_at(other.time)) {
        let crossing_lines = v1.is_straight()
            && v2.is_straight()
            && line_intersection(v1.p0(), v1.p3(), v2.p0(), v2.p3()).is_some();
        return !crossing_lines;
    }
    false
}

/// Whether the curves pass through each other at the location, rather than
/// touching. Locations at curve ends compare the four adjacent curves by the
/// angles of short stubs along them.
pub(crate) fn is_crossing(set: &CurveSet, loc: &CurveLocation, other: &CurveLocation) -> bool {
    let t1 = loc.time;
    let t2 = other.time;
    let t_min = CURVETIME_EPSILON;
    let t_max = 1.0 - t_min;
    let t1_inside = t1 >= t_min && t1 <= t_max;
    let t2_inside = t2 >= t_min && t2 <= t_max;
    if t1_inside && t2_inside {
        return !is_touching(set, loc, other);
    }
    let curves = &set.curves;
    let c1 = if t1 < t_min { curves[loc.curve].prev } else { Some(loc.curve) };
    let c2 = if t1 > t_max { curves[loc.curve].next } else { Some(loc.curve) };
    let c3 = if t2 < t_min { curves[other.curve].prev } else { Some(other.curve) };
    let c4 = if t2 > t_max { curves[other.curve].next } else { Some(other.curve) };
    let (Some(c1), Some(c2), Some(c3), Some(c4)) = (c1, c2, c3, c4) else {
        return false;
    };
    let (v1, v2, v3, v4) = (
        curves[c1].values,
        curves[c2].values,
        curves[c3].values,
        curves[c4].values,
    );

    let mut offsets: smallvec::SmallVec<[f64; 4]> = smallvec::SmallVec::new();
    let mut add_offsets = |v: &Cubic, end: bool| {
        let classified = v.classify().roots;
        let roots: smallvec::SmallVec<[f64; 3]> = if classified.is_empty() {
            v.peaks()
        } else {
            classified.into_iter().collect()
        };
        let count = roots.len();
        let from = if end && count > 0 { roots[count - 1] } else { 0.0 };
        let to = if !end && count > 0 { roots[0] } else { 1.0 };
        let offset = v.length_between(from, to);
        offsets.push(if count > 0 { offset } else { offset / 32.0 });
    };
    if !t1_inside {
        add_offsets(&v1, true);
        add_offsets(&v2, false);
    }
    if !t2_inside {
        add_offsets(&v3, true);
        add_offsets(&v4, false);
    }
    let offset = offsets.iter().copied().fold(f64::INFINITY, f64::min);
    let pt = loc.point;
    let stub = |v: &Cubic, offset: f64| {
        let fallback = if offset < 0.0 { v.p0() } else { v.p3() };
        v.point_at_offset(offset).unwrap_or(fallback) - pt
    };
    let (a1, a2) = if t1_inside {
        let tangent = v2.tangent_at(t1);
        ((-tangent).angle(), tangent.angle())
    } else {
        (stub(&v1, -offset).angle(), stub(&v2, offset).angle())
    };
    let (a3, a4) = if t2_inside {
        let tangent = v4.tangent_at(t2);
        ((-tangent).angle(), tangent.angle())
    } else {
        (stub(&v3, -offset).angle(), stub(&v4, offset).angle())
    };
    if t1_inside {
        (is_in_range(a1, a3, a4) ^ is_in_range(a2, a3, a4))
            && (is_in_range(a1, a4, a3) ^ is_in_range(a2, a4, a3))
    } else {
        (is_in_range(a3, a1, a2) ^ is_in_range(a4, a1, a2))
            && (is_in_range(a3, a2, a1) ^ is_in_range(a4, a2, a1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Vec<Cubic> {
        let p = [
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ];
        (0..4).map(|i| Cubic::line(p[i], p[(i + 1) % 4])).collect()
    }

    #[test]
    fn test_overlapping_squares_cross_twice() {
        let mut set = CurveSet::new();
        let a = set.push_contour(&square(0.0, 0.0, 100.0), true);
        let b = set.push_contour(&square(50.0, 50.0, 100.0), true);
        let mut locations = find(&set, a, Some(b), Include::Crossings);
        assert_eq!(locations.list.len(), 2);
        let mut points: Vec<Point> = locations
            .list
            .iter()
            .map(|&i| locations.arena[i].point)
            .collect();
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        assert!(points[0].is_close(Point::new(50.0, 100.0), 1e-9));
        assert!(points[1].is_close(Point::new(100.0, 50.0), 1e-9));
        assert_eq!(locations.expand(&set).len(), 4);
    }

    #[test]
    fn test_touching_corner_is_not_crossing() {
        let mut set = CurveSet::new();
        let a = set.push_contour(&square(0.0, 0.0, 10.0), true);
        let b = set.push_contour(&square(10.0, 10.0, 10.0), true);
        let all = find(&set, a.clone(), Some(b.clone()), Include::All);
        assert!(!all.list.is_empty());
        let crossings = find(&set, a, Some(b), Include::Crossings);
        assert!(crossings.list.is_empty());
    }

    #[test]
    fn test_curve_curve_intersection() {
        let arch = Cubic::from_points(
            Point::new(0.0, 0.0),
            Point::new(0.0, 100.0),
            Point::new(100.0, 100.0),
            Point::new(100.0, 0.0),
        );
        let cap = Cubic::from_points(
            Point::new(0.0, 100.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
        );
        let mut set = CurveSet::new();
        let a = set.push_contour(&[arch], false);
        let b = set.push_contour(&[cap], false);
        let locations = find(&set, a, Some(b), Include::All);
        assert_eq!(locations.list.len(), 2);
        for &i in &locations.list {
            let loc = &locations.arena[i];
            let other = &locations.arena[loc.other];
            let p = set.curves[other.curve].values.point_at(other.time);
            assert!(loc.point.is_close(p, 1e-6));
            assert!((loc.point.y - 50.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_collinear_lines_overlap() {
        let v1 = Cubic::line(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let v2 = Cubic::line(Point::new(5.0, 0.0), Point::new(15.0, 0.0));
        let overlaps = curve_overlaps(&v1, &v2).expect("collinear run");
        assert!((overlaps[0].0 - 0.5).abs() < 1e-9 && overlaps[0].1 == 0.0);
        assert!(overlaps[1].0 == 1.0 && (overlaps[1].1 - 0.5).abs() < 1e-9);
        let apart = Cubic::line(Point::new(0.0, 1.0), Point::new(10.0, 1.0));
        assert!(curve_overlaps(&v1, &apart).is_none());
    }

    #[test]
    fn test_self_intersection_of_loop() {
        let looped = Cubic::from_points(
            Point::new(0.0, 0.0),
            Point::new(150.0, 100.0),
            Point::new(-50.0, 100.0),
            Point::new(100.0, 0.0),
        );
        let mut set = CurveSet::new();
        let a = set.push_contour(&[looped], false);
        let locations = find(&set, a, None, Include::All);
        assert_eq!(locations.list.len(), 1);
        let loc = &locations.arena[locations.list[0]];
        assert!(loc.point.is_close(Point::new(50.0, 42.857142857), 1e-6));
    }
}
