//! Path segments

use serde::{Deserialize, Serialize};
use vellum_geom::{Affine, Point};

/// An anchor point with incoming and outgoing handles. Handles are stored
/// relative to the anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub point: Point,
    #[serde(default)]
    pub handle_in: Point,
    #[serde(default)]
    pub handle_out: Point,
}

impl Segment {
    pub const fn new(point: Point, handle_in: Point, handle_out: Point) -> Self {
        Self {
            point,
            handle_in,
            handle_out,
        }
    }

    /// A corner segment without handles
    pub const fn corner(point: Point) -> Self {
        Self::new(point, Point::ZERO, Point::ZERO)
    }

    pub fn has_handles(&self) -> bool {
        !self.handle_in.is_zero() || !self.handle_out.is_zero()
    }

    pub fn clear_handles(&mut self) {
        self.handle_in = Point::ZERO;
        self.handle_out = Point::ZERO;
    }

    /// Swaps the handles, as needed when the owning contour is reversed
    pub fn reverse(&mut self) {
        std::mem::swap(&mut self.handle_in, &mut self.handle_out);
    }

    pub fn transform(&mut self, matrix: &Affine) {
        self.point = matrix.transform_point(self.point);
        self.handle_in = matrix.transform_vector(self.handle_in);
        self.handle_out = matrix.transform_vector(self.handle_out);
    }

    /// Linear blend of two segments, `factor` 0 gives `from` and 1 gives `to`
    pub fn interpolate(from: &Segment, to: &Segment, factor: f64) -> Segment {
        Segment::new(
            from.point.lerp(to.point, factor),
            from.handle_in.lerp(to.handle_in, factor),
            from.handle_out.lerp(to.handle_out, factor),
        )
    }
}

impl From<Point> for Segment {
    fn from(point: Point) -> Self {
        Segment::corner(point)
    }
}

impl From<(f64, f64)> for Segment {
    fn from(xy: (f64, f64)) -> Self {
        Segment::corner(xy.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_keeps_handles_relative() {
        let mut seg = Segment::new(
            Point::new(1.0, 1.0),
            Point::new(-1.0, 0.0),
            Point::new(1.0, 0.0),
        );
        seg.transform(&Affine::translation(10.0, 0.0).then(&Affine::scale(2.0, 2.0)));
        assert_eq!(seg.point, Point::new(12.0, 2.0));
        assert_eq!(seg.handle_out, Point::new(2.0, 0.0));
    }

    #[test]
    fn test_interpolate_midway() {
        let a = Segment::corner(Point::new(0.0, 0.0));
        let b = Segment::new(Point::new(10.0, 20.0), Point::new(2.0, 2.0), Point::ZERO);
        let mid = Segment::interpolate(&a, &b, 0.5);
        assert_eq!(mid.point, Point::new(5.0, 10.0));
        assert_eq!(mid.handle_in, Point::new(1.0, 1.0));
    }
}
