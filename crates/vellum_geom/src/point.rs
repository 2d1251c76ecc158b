//! 2D points and vectors

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::numerical::{self, TRIGONOMETRIC_EPSILON};

/// 2D point, also used as a vector for handles and tangents
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Coordinate by axis index, `0` for x and `1` for y
    pub fn coord(&self, axis: usize) -> f64 {
        if axis == 0 {
            self.x
        } else {
            self.y
        }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(&self, other: Point) -> f64 {
        (*self - other).length()
    }

    pub fn dot(&self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn cross(&self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len)
        } else {
            Self::ZERO
        }
    }

    /// Angle of the vector in degrees, in the range (-180, 180]
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x).to_degrees()
    }

    /// Both coordinates are within [`numerical::EPSILON`] of zero
    pub fn is_zero(&self) -> bool {
        numerical::is_zero(self.x) && numerical::is_zero(self.y)
    }

    pub fn is_close(&self, other: Point, tolerance: f64) -> bool {
        self.distance(other) <= tolerance
    }

    /// Checks if the two vectors are parallel, allowing for a small angular
    /// deviation scaled by their magnitudes.
    pub fn is_collinear(&self, other: Point) -> bool {
        let (x1, y1, x2, y2) = (self.x, self.y, other.x, other.y);
        (x1 * y2 - y1 * x2).abs()
            <= ((x1 * x1 + y1 * y1) * (x2 * x2 + y2 * y2)).sqrt() * TRIGONOMETRIC_EPSILON
    }

    pub fn lerp(&self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collinear_vectors() {
        assert!(Point::new(1.0, 2.0).is_collinear(Point::new(-2.0, -4.0)));
        assert!(!Point::new(1.0, 0.0).is_collinear(Point::new(0.0, 1.0)));
        assert!(Point::ZERO.is_collinear(Point::new(3.0, 1.0)));
    }

    #[test]
    fn test_angle_in_degrees() {
        assert!((Point::new(0.0, 1.0).angle() - 90.0).abs() < 1e-12);
        assert!((Point::new(-1.0, 0.0).angle() - 180.0).abs() < 1e-12);
    }
}
