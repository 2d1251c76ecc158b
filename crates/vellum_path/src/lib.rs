//! Vellum Paths
//!
//! Vector paths made of cubic Bézier segments, and boolean operations on
//! them:
//!
//! - **Paths**: [`Segment`]s with relative handles form a [`Path`] contour;
//!   a [`PathItem`] groups contours under one fill rule
//! - **Booleans**: unite, intersect, subtract, exclude and divide, plus
//!   self-crossing resolution and contour reorientation
//! - **SVG**: path data parsing and formatting
//! - **Scene**: an ordered item collection that boolean results are
//!   inserted into
//!
//! # Example
//!
//! ```rust
//! use vellum_path::{BooleanOptions, PathItem};
//!
//! let a = PathItem::rectangle(0.0, 0.0, 100.0, 100.0);
//! let b = PathItem::rectangle(50.0, 50.0, 100.0, 100.0);
//!
//! let union = a.unite(&b, &BooleanOptions::default());
//! assert!((union.area() - 17500.0).abs() < 1e-6);
//!
//! let overlap = a.intersect(&b, &BooleanOptions::default());
//! assert!((overlap.area() - 2500.0).abs() < 1e-6);
//! ```

pub mod boolean;
pub mod error;
mod intersection;
pub mod item;
pub mod path;
pub mod scene;
pub mod segment;
pub mod svg;

pub use boolean::{BooleanOptions, Operator, Winding};
pub use error::{PathError, Result};
pub use intersection::CurveLocation;
pub use item::{FillRule, Group, Item, PathItem, Style};
pub use path::Path;
pub use scene::{BooleanOutput, ItemKey, Scene};
pub use segment::Segment;
