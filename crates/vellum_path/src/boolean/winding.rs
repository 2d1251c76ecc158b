//! Winding numbers
//!
//! A ray is cast from the point along one axis and every crossing curve
//! contributes its direction. Two counts just left and right of the point
//! are counted separately so points on a curve still get a definite answer.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use vellum_geom::{AxisCollisions, Cubic, Point};

use crate::path::Path;

use super::graph::{Graph, Operand, SegId};

const WINDING_EPSILON: f64 = 1e-9;
const QUALITY_EPSILON: f64 = 1e-6;

/// Winding of a point against a set of contours
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Winding {
    /// `max(left, right)`
    pub winding: i32,
    pub left: i32,
    pub right: i32,
    /// Confidence in `[0, 1]`, lowered when a crossing lies very close to
    /// the point or at a curve end
    pub quality: f64,
    /// The point lies on one of the contours
    pub on_path: bool,
}

#[derive(Clone, Debug)]
struct ContourCurves {
    range: Range<usize>,
    closed: bool,
    clockwise: bool,
    /// Curve from the last segment back to the first, open contours only:
    /// `(straight, with handles)`
    closing: Option<(Cubic, Cubic)>,
}

/// Curves of one or more contours, grouped by contour
#[derive(Clone, Debug, Default)]
pub(crate) struct CurveTable {
    curves: Vec<Cubic>,
    owner: Vec<usize>,
    contours: Vec<ContourCurves>,
}

impl CurveTable {
    pub fn from_paths(paths: &[Path]) -> Self {
        let mut table = Self::default();
        for path in paths {
            let closing = if path.is_closed() {
                None
            } else {
                path.closing_curve(true)
                    .zip(path.closing_curve(false))
            };
            table.push_contour(path.curves(), path.is_closed(), path.is_clockwise(), closing);
        }
        table
    }

    /// Curves of the graph contours accepted by `filter`. The second value
    /// maps each curve start node to its index in the table.
    pub fn from_graph(
        graph: &Graph,
        filter: impl Fn(Operand) -> bool,
    ) -> (Self, Vec<Option<usize>>) {
        let mut table = Self::default();
        let mut index_of: Vec<Option<usize>> = vec![None; graph.nodes.len()];
        for contour in 0..graph.contours.len() {
            if !filter(graph.contours[contour].operand) {
                continue;
            }
            let path = graph.to_path(contour);
            let segments = graph.contour_segments(contour);
            let mut curves = Vec::with_capacity(segments.len());
            for &seg in &segments {
                if let Some(values) = graph.curve(seg) {
                    index_of[seg] = Some(table.curves.len() + curves.len());
                    curves.push(values);
                }
            }
            let closing = if path.is_closed() {
                None
            } else {
                path.closing_curve(true)
                    .zip(path.closing_curve(false))
            };
            table.push_contour(curves, path.is_closed(), path.is_clockwise(), closing);
        }
        (table, index_of)
    }

    fn push_contour(
        &mut self,
        curves: Vec<Cubic>,
        closed: bool,
        clockwise: bool,
        closing: Option<(Cubic, Cubic)>,
    ) {
        let contour = self.contours.len();
        let start = self.curves.len();
        self.owner.extend(std::iter::repeat(contour).take(curves.len()));
        self.curves.extend(curves);
        self.contours.push(ContourCurves {
            range: start..self.curves.len(),
            closed,
            clockwise,
            closing,
        });
    }

    pub fn curves(&self) -> &[Cubic] {
        &self.curves
    }

    pub fn all(&self) -> Vec<usize> {
        (0..self.curves.len()).collect()
    }
}

/// The curves a ray is tested against
#[derive(Clone, Copy, Debug)]
pub(crate) enum Candidates<'a> {
    /// The same list for both axes
    List(&'a [usize]),
    /// Per-axis lists from the collision index
    Axes(&'a AxisCollisions),
}

impl<'a> Candidates<'a> {
    fn list(&self, vertical: bool) -> &'a [usize] {
        match *self {
            Candidates::List(list) => list,
            Candidates::Axes(collisions) => {
                if vertical {
                    &collisions.horizontal
                } else {
                    &collisions.vertical
                }
            }
        }
    }
}

/// Winding of `point` against the candidate curves of `table`.
///
/// `vertical` casts the ray along the y axis. `closed` closes open contours
/// with their handles instead of a straight line. When the ray meets a curve
/// running parallel to it right at the point, the other axis is tried once.
pub(crate) fn winding(
    table: &CurveTable,
    point: Point,
    candidates: Candidates<'_>,
    vertical: bool,
    closed: bool,
) -> Winding {
    let mut ray = Ray::new(table, point, vertical, closed, true);
    let result = ray.run(candidates.list(vertical));
    if !ray.tangent {
        return result;
    }
    tracing::trace!("winding: ambiguous tangent at {:?}, flipping axis", point);
    Ray::new(table, point, !vertical, closed, false).run(candidates.list(!vertical))
}

struct Ray<'a> {
    table: &'a CurveTable,
    vertical: bool,
    closed: bool,
    allow_flip: bool,
    /// The ray touched a curve tangentially at the point
    tangent: bool,
    ia: usize,
    io: usize,
    pa: f64,
    po: f64,
    pa_l: f64,
    pa_r: f64,
    winding_l: i32,
    winding_r: i32,
    path_l: i32,
    path_r: i32,
    on_path: bool,
    on_any_path: bool,
    quality: f64,
    v_prev: Cubic,
}

impl<'a> Ray<'a> {
    fn new(table: &'a CurveTable, point: Point, vertical: bool, closed: bool, allow_flip: bool) -> Self {
        let ia = usize::from(vertical);
        let io = ia ^ 1;
        let pa = point.coord(ia);
        Self {
            table,
            vertical,
            closed,
            allow_flip,
            tangent: false,
            ia,
            io,
            pa,
            po: point.coord(io),
            pa_l: pa - WINDING_EPSILON,
            pa_r: pa + WINDING_EPSILON,
            winding_l: 0,
            winding_r: 0,
            path_l: 0,
            path_r: 0,
            on_path: false,
            on_any_path: false,
            quality: 1.0,
            v_prev: Cubic::default(),
        }
    }

    /// Counts the crossings. Stops early and sets `tangent` when the other
    /// axis should be tried instead.
    fn run(&mut self, list: &[usize]) -> Winding {
        let table = self.table;
        let io = self.io;
        let mut v_close: Option<Cubic> = None;
        for (i, &index) in list.iter().enumerate() {
            let contour = table.owner[index];
            let info = &table.contours[contour];
            let v = table.curves[index];
            if i == 0 || table.owner[list[i - 1]] != contour {
                let mut v_prev = None;
                if let Some((straight, curved)) = info.closing {
                    let close = if self.closed { curved } else { straight };
                    v_close = Some(close);
                    if close[io] != close[io + 6] {
                        v_prev = Some(close);
                    }
                }
                self.v_prev = v_prev.unwrap_or_else(|| self.previous_non_horizontal(info, index, v));
            }
            if self.handle_curve(&v) {
                self.tangent = true;
                break;
            }
            if i + 1 == list.len() || table.owner[list[i + 1]] != contour {
                if let Some(close) = v_close.take() {
                    if self.handle_curve(&close) {
                        self.tangent = true;
                        break;
                    }
                }
                if self.on_path && self.path_l == 0 && self.path_r == 0 {
                    let w = if info.clockwise ^ self.vertical { 1 } else { -1 };
                    self.path_l = w;
                    self.path_r = w;
                }
                self.winding_l += self.path_l;
                self.winding_r += self.path_r;
                self.path_l = 0;
                self.path_r = 0;
                if self.on_path {
                    self.on_any_path = true;
                    self.on_path = false;
                }
            }
        }
        let left = self.winding_l.abs();
        let right = self.winding_r.abs();
        Winding {
            winding: left.max(right),
            left,
            right,
            quality: self.quality,
            on_path: self.on_any_path,
        }
    }

    /// Last curve before `index` in its contour that is not parallel to the
    /// ray, walking backwards from the contour's end
    fn previous_non_horizontal(&self, info: &ContourCurves, index: usize, v: Cubic) -> Cubic {
        let io = self.io;
        let mut prev = info.range.end.checked_sub(1).filter(|p| info.range.contains(p));
        while let Some(p) = prev {
            if p == index {
                break;
            }
            let values = self.table.curves[p];
            if values[io] != values[io + 6] {
                return values;
            }
            prev = if p > info.range.start {
                Some(p - 1)
            } else if info.closed {
                Some(info.range.end - 1)
            } else {
                None
            };
        }
        v
    }

    fn handle_curve(&mut self, v: &Cubic) -> bool {
        let (ia, io) = (self.ia, self.io);
        let (o0, o1, o2, o3) = (v[io], v[io + 2], v[io + 4], v[io + 6]);
        if self.po <= o0.max(o1).max(o2).max(o3) && self.po >= o0.min(o1).min(o2).min(o3) {
            let (a0, a1, a2, a3) = (v[ia], v[ia + 2], v[ia + 4], v[ia + 6]);
            let outside =
                self.pa_l > a0.max(a1).max(a2).max(a3) || self.pa_r < a0.min(a1).min(a2).min(a3);
            if outside {
                return self.add_winding(v);
            }
            for part in v.monotone_parts(io) {
                if self.add_winding(&part) {
                    return true;
                }
            }
        }
        false
    }

    /// Adds the crossing of one monotonic piece. Returns true when the axis
    /// has to be flipped.
    fn add_winding(&mut self, v: &Cubic) -> bool {
        let (ia, io) = (self.ia, self.io);
        let (pa, po, pa_l, pa_r) = (self.pa, self.po, self.pa_l, self.pa_r);
        let o0 = v[io];
        let o3 = v[io + 6];
        if po < o0.min(o3) || po > o0.max(o3) {
            return false;
        }
        let (a0, a1, a2, a3) = (v[ia], v[ia + 2], v[ia + 4], v[ia + 6]);
        if o0 == o3 {
            // Parallel to the ray: only on-path matters
            if a0 < pa_r && a3 > pa_l || a3 < pa_r && a0 > pa_l {
                self.on_path = true;
            }
            return false;
        }
        let t = if po == o0 {
            0.0
        } else if po == o3 {
            1.0
        } else if pa_l > a0.max(a1).max(a2).max(a3) || pa_r < a0.min(a1).min(a2).min(a3) {
            1.0
        } else {
            v.solve(io, po, Some((0.0, 1.0)))
                .first()
                .copied()
                .unwrap_or(1.0)
        };
        let a = if t == 0.0 {
            a0
        } else if t == 1.0 {
            a3
        } else {
            v.point_at(t).coord(ia)
        };
        let winding = if o0 > o3 { 1 } else { -1 };
        let v_prev = self.v_prev;
        let winding_prev = if v_prev[io] > v_prev[io + 6] { 1 } else { -1 };
        let a3_prev = v_prev[ia + 6];
        if po != o0 {
            if a < pa_l {
                self.path_l += winding;
            } else if a > pa_r {
                self.path_r += winding;
            } else {
                self.on_path = true;
            }
            if a > pa - QUALITY_EPSILON && a < pa + QUALITY_EPSILON {
                self.quality /= 2.0;
            }
        } else {
            if winding != winding_prev {
                // Direction changes at the start: count the turn once
                if a0 < pa_l {
                    self.path_l += winding;
                } else if a0 > pa_r {
                    self.path_r += winding;
                }
            } else if a0 != a3_prev {
                // A parallel run lies between this piece and the previous
                if a3_prev < pa_r && a > pa_r {
                    self.path_r += winding;
                    self.on_path = true;
                } else if a3_prev > pa_l && a < pa_l {
                    self.path_l += winding;
                    self.on_path = true;
                }
            }
            self.quality /= 4.0;
        }
        self.v_prev = *v;
        self.allow_flip && a > pa_l && a < pa_r && v.tangent_at(t).coord(io) == 0.0
    }
}

/// Winding of a graph node's neighborhood, as used by propagation
pub(crate) fn graph_index(index_of: &[Option<usize>], seg: SegId) -> Option<usize> {
    index_of.get(seg).copied().flatten()
}

/// Whether `point` is inside `paths` under the given rule. Points on an
/// outline count as inside.
pub(crate) fn contains(paths: &[Path], point: Point, even_odd: bool) -> bool {
    let mut ltrb = [
        f64::INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NEG_INFINITY,
    ];
    for path in paths {
        let [l, t, r, b] = path.handle_bounds();
        ltrb = [ltrb[0].min(l), ltrb[1].min(t), ltrb[2].max(r), ltrb[3].max(b)];
    }
    if !(point.x >= ltrb[0] && point.x <= ltrb[2] && point.y >= ltrb[1] && point.y <= ltrb[3]) {
        return false;
    }
    let table = CurveTable::from_paths(paths);
    let all = table.all();
    let w = winding(&table, point, Candidates::List(&all), false, false);
    w.on_path
        || if even_odd {
            w.left & 1 == 1 || w.right & 1 == 1
        } else {
            w.winding != 0
        }
}

/// A point inside the outline: the bounds center when that is inside,
/// otherwise the middle of the two leftmost intercepts of a horizontal ray
/// through the center.
pub(crate) fn interior_point(paths: &[Path], even_odd: bool) -> Point {
    let mut bounds: Option<vellum_geom::Rect> = None;
    for path in paths.iter().filter(|p| !p.is_empty()) {
        let b = path.bounds();
        bounds = Some(bounds.map_or(b, |acc| acc.union(&b)));
    }
    let Some(bounds) = bounds else {
        return Point::ZERO;
    };
    let mut point = bounds.center();
    if contains(paths, point, even_odd) {
        return point;
    }
    let y = point.y;
    let mut intercepts: Vec<f64> = Vec::new();
    for path in paths {
        for v in path.curves() {
            let (o0, o1, o2, o3) = (v[1], v[3], v[5], v[7]);
            if y < o0.min(o1).min(o2).min(o3) || y > o0.max(o1).max(o2).max(o3) {
                continue;
            }
            for mono in v.monotone_parts(1) {
                let (mo0, mo3) = (mono[1], mono[7]);
                if mo0 != mo3 && (y >= mo0 && y <= mo3 || y >= mo3 && y <= mo0) {
                    let x = if y == mo0 {
                        mono[0]
                    } else if y == mo3 {
                        mono[6]
                    } else {
                        let roots = mono.solve(1, y, Some((0.0, 1.0)));
                        if roots.len() == 1 {
                            mono.point_at(roots[0]).x
                        } else {
                            (mono[0] + mono[6]) / 2.0
                        }
                    };
                    intercepts.push(x);
                }
            }
        }
    }
    if intercepts.len() > 1 {
        intercepts.sort_by(|a, b| a.total_cmp(b));
        point.x = (intercepts[0] + intercepts[1]) / 2.0;
    }
    point
}
