//! Vellum Geometry
//!
//! Leaf crate with the numeric building blocks used by the path engine:
//!
//! - **Primitives**: [`Point`], [`Rect`] and [`Affine`] in double precision
//! - **Numerical**: epsilons and robust quadratic/cubic root solvers
//! - **Curves**: [`Cubic`] control-point tuples with evaluation, splitting,
//!   monotonic decomposition, arc length and classification
//! - **Collision**: sweep-and-prune bounding box overlap queries
//!
//! # Example
//!
//! ```rust
//! use vellum_geom::{Cubic, Point};
//!
//! let line = Cubic::line(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
//! assert!(line.is_straight());
//! assert!((line.length() - 10.0).abs() < 1e-9);
//! ```

pub mod affine;
pub mod collision;
pub mod curve;
pub mod numerical;
pub mod point;
pub mod rect;

pub use affine::Affine;
pub use collision::{
    find_bounds_collisions, find_curve_bounds_collisions, find_curve_bounds_collisions_both_axes,
    AxisCollisions,
};
pub use curve::{Classification, Cubic, CurveKind};
pub use point::Point;
pub use rect::Rect;
