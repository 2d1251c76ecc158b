//! Single contours
//!
//! A [`Path`] is one ordered run of segments, open or closed. Curves are not
//! stored; they are derived from consecutive segment pairs on demand, with the
//! closing curve from the last segment back to the first when closed.

use serde::{Deserialize, Serialize};
use vellum_geom::numerical::GEOMETRIC_EPSILON;
use vellum_geom::{Affine, Cubic, Point, Rect};

use crate::intersection::curve_overlaps;
use crate::segment::Segment;

/// One contour of segments
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    segments: Vec<Segment>,
    #[serde(default)]
    closed: bool,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Segment>, closed: bool) -> Self {
        Self { segments, closed }
    }

    /// Polygon through `points`
    pub fn from_points(points: impl IntoIterator<Item = Point>, closed: bool) -> Self {
        Self {
            segments: points.into_iter().map(Segment::corner).collect(),
            closed,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn add(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn remove_segment(&mut self, index: usize) -> Segment {
        self.segments.remove(index)
    }

    pub fn truncate(&mut self, len: usize) {
        self.segments.truncate(len);
    }

    pub fn first_segment(&self) -> Option<&Segment> {
        self.segments.first()
    }

    pub fn last_segment(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn first_segment_mut(&mut self) -> Option<&mut Segment> {
        self.segments.first_mut()
    }

    pub fn last_segment_mut(&mut self) -> Option<&mut Segment> {
        self.segments.last_mut()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn curve_count(&self) -> usize {
        let n = self.segments.len();
        if self.closed {
            n
        } else {
            n.saturating_sub(1)
        }
    }

    /// Curve from segment `index` to its successor
    pub fn curve(&self, index: usize) -> Cubic {
        let n = self.segments.len();
        let s1 = &self.segments[index];
        let s2 = &self.segments[(index + 1) % n];
        Cubic::from_anchors(s1.point, s1.handle_out, s2.handle_in, s2.point)
    }

    pub fn curves(&self) -> Vec<Cubic> {
        (0..self.curve_count()).map(|i| self.curve(i)).collect()
    }

    /// Curve from the last segment back to the first. `straight` ignores the
    /// handles, the way an open contour is filled.
    pub fn closing_curve(&self, straight: bool) -> Option<Cubic> {
        let first = self.segments.first()?;
        let last = self.segments.last()?;
        Some(if straight {
            Cubic::line(last.point, first.point)
        } else {
            Cubic::from_anchors(last.point, last.handle_out, first.handle_in, first.point)
        })
    }

    /// Signed area, positive for clockwise contours in y-down coordinates.
    /// Open contours are measured as if closed by a straight line.
    pub fn area(&self) -> f64 {
        let n = self.segments.len();
        let mut area = 0.0;
        for i in 0..n {
            let last = i + 1 == n;
            let curve = if last && !self.closed {
                Cubic::line(self.segments[i].point, self.segments[0].point)
            } else {
                self.curve(i)
            };
            area += curve.area();
        }
        area
    }

    pub fn is_clockwise(&self) -> bool {
        self.area() >= 0.0
    }

    pub fn set_clockwise(&mut self, clockwise: bool) {
        if self.is_clockwise() != clockwise {
            self.reverse();
        }
    }

    pub fn reverse(&mut self) {
        self.segments.reverse();
        for segment in &mut self.segments {
            segment.reverse();
        }
    }

    pub fn length(&self) -> f64 {
        (0..self.curve_count()).map(|i| self.curve(i).length()).sum()
    }

    /// Tight bounds of the contour's geometry
    pub fn bounds(&self) -> Rect {
        let Some(first) = self.segments.first() else {
            return Rect::ZERO;
        };
        let mut bounds = Rect::new(first.point.x, first.point.y, 0.0, 0.0);
        for i in 0..self.curve_count() {
            bounds = bounds.union(&self.curve(i).bounds());
        }
        bounds
    }

    /// Bounds including all handles, as `[left, top, right, bottom]`
    pub fn handle_bounds(&self) -> [f64; 4] {
        let mut ltrb = [
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        ];
        for segment in &self.segments {
            for p in [
                segment.point,
                segment.point + segment.handle_in,
                segment.point + segment.handle_out,
            ] {
                ltrb[0] = ltrb[0].min(p.x);
                ltrb[1] = ltrb[1].min(p.y);
                ltrb[2] = ltrb[2].max(p.x);
                ltrb[3] = ltrb[3].max(p.y);
            }
        }
        ltrb
    }

    pub fn transform(&mut self, matrix: &Affine) {
        for segment in &mut self.segments {
            segment.transform(matrix);
        }
    }

    /// Closes the contour. When the first and last anchors are within
    /// `tolerance`, the last segment is merged into the first.
    pub fn close_path(&mut self, tolerance: f64) {
        self.closed = true;
        let n = self.segments.len();
        if n > 1 && self.segments[0].point.is_close(self.segments[n - 1].point, tolerance) {
            if let Some(last) = self.segments.pop() {
                self.segments[0].handle_in = last.handle_in;
            }
        }
    }

    /// Removes straight curves without length. With `simplify`, straight
    /// curves shorter than [`GEOMETRIC_EPSILON`] or collinear with the
    /// following straight curve are merged away as well.
    pub fn reduce(&mut self, simplify: bool) {
        let tolerance = if simplify { GEOMETRIC_EPSILON } else { 0.0 };
        let mut i = self.curve_count();
        while i > 0 {
            i -= 1;
            if i >= self.curve_count() {
                continue;
            }
            let curve = self.curve(i);
            if curve.has_handles() {
                continue;
            }
            let collinear = simplify && {
                let next = if i + 1 < self.curve_count() {
                    Some(i + 1)
                } else if self.closed {
                    Some(0)
                } else {
                    None
                };
                next.map_or(false, |next| {
                    let next = self.curve(next);
                    curve.is_straight()
                        && next.is_straight()
                        && (curve.p3() - curve.p0()).is_collinear(next.p3() - next.p0())
                })
            };
            if !curve.has_length(tolerance) || collinear {
                // Drop the curve's end segment and keep its outgoing handle
                let n = self.segments.len();
                let end = (i + 1) % n;
                let handle_out = self.segments[end].handle_out;
                self.segments.remove(end);
                let start = if end < i { i - 1 } else { i };
                if let Some(segment) = self.segments.get_mut(start) {
                    segment.handle_out = handle_out;
                }
            }
        }
    }

    /// Whether both contours run along the same outline in the same
    /// direction, regardless of where they start or how they are subdivided.
    pub fn compare(&self, other: &Path) -> bool {
        const EPSILON: f64 = 1e-8;
        let curves1 = self.curves();
        let curves2 = other.curves();
        let (length1, length2) = (curves1.len(), curves2.len());
        if length1 == 0 || length2 == 0 {
            return length1 == length2;
        }
        let mut pos2 = None;
        let mut end2 = 0.0;
        for (i, v2) in curves2.iter().enumerate() {
            if let Some(overlaps) = curve_overlaps(&curves1[0], v2) {
                pos2 = Some(if i == 0 && overlaps[0].0 > 0.0 { length2 - 1 } else { i });
                end2 = overlaps[0].1;
                break;
            }
        }
        let Some(mut pos2) = pos2 else {
            return false;
        };
        let mut pos1 = 0;
        let mut end1 = 0.0;
        let mut start2: Option<(usize, f64)> = None;
        while let Some(v1) = curves1.get(pos1) {
            let Some(overlaps) = curve_overlaps(v1, &curves2[pos2]) else {
                break;
            };
            if (overlaps[0].0 - end1).abs() >= EPSILON {
                break;
            }
            end1 = overlaps[1].0;
            let exhausted = end1 == 1.0;
            if exhausted {
                pos1 += 1;
                end1 = 0.0;
            }
            let t2 = overlaps[0].1;
            if (t2 - end2).abs() >= EPSILON {
                break;
            }
            start2.get_or_insert((pos2, t2));
            end2 = overlaps[1].1;
            if end2 == 1.0 {
                pos2 = (pos2 + 1) % length2;
                end2 = 0.0;
            }
            if exhausted && pos1 >= length1 {
                return start2 == Some((pos2, end2));
            }
        }
        false
    }

    /// Point at an arc-length `offset` from the start of the contour
    pub fn point_at(&self, offset: f64) -> Option<Point> {
        let mut remaining = offset;
        let count = self.curve_count();
        for i in 0..count {
            let curve = self.curve(i);
            let length = curve.length();
            if remaining <= length || i + 1 == count {
                let t = curve.time_at(remaining.min(length), Some(0.0))?;
                return Some(curve.point_at(t));
            }
            remaining -= length;
        }
        self.segments.first().map(|s| s.point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Path {
        Path::from_points(
            [
                Point::new(0.0, 0.0),
                Point::new(size, 0.0),
                Point::new(size, size),
                Point::new(0.0, size),
            ],
            true,
        )
    }

    #[test]
    fn test_area_and_orientation() {
        let mut path = square(10.0);
        assert!((path.area() - 100.0).abs() < 1e-9);
        assert!(path.is_clockwise());
        path.reverse();
        assert!((path.area() + 100.0).abs() < 1e-9);
        path.set_clockwise(true);
        assert!(path.is_clockwise());
    }

    #[test]
    fn test_open_contour_area_closes_straight() {
        let mut path = square(10.0);
        path.set_closed(false);
        assert_eq!(path.curve_count(), 3);
        assert!((path.area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_close_path_merges_coincident_ends() {
        let mut path = Path::from_points(
            [
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 1e-13),
            ],
            false,
        );
        path.close_path(1e-12);
        assert!(path.is_closed());
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_reduce_drops_zero_length_curves() {
        let mut path = Path::from_points(
            [
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
            ],
            true,
        );
        path.reduce(false);
        assert_eq!(path.len(), 3);
        assert!((path.area() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_simplify_merges_collinear_lines() {
        let mut path = Path::from_points(
            [
                Point::new(0.0, 0.0),
                Point::new(5.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ],
            true,
        );
        path.reduce(false);
        assert_eq!(path.len(), 5);
        path.reduce(true);
        assert_eq!(path.len(), 4);
        assert!((path.area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_at_offset() {
        let path = square(10.0);
        assert!((path.length() - 40.0).abs() < 1e-9);
        let p = path.point_at(15.0).unwrap();
        assert!(p.distance(Point::new(10.0, 5.0)) < 1e-9);
    }

    #[test]
    fn test_compare_ignores_start_segment() {
        let a = square(10.0);
        let b = Path::from_points(
            [
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
            ],
            true,
        );
        assert!(a.compare(&b));
        let mut reversed = b.clone();
        reversed.reverse();
        assert!(!a.compare(&reversed));
        assert!(!a.compare(&square(11.0)));
    }
}
