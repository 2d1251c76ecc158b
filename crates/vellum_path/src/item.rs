//! Path items
//!
//! A [`PathItem`] is a compound path: an ordered list of contours sharing a
//! fill rule, a pending transform and a style. Boolean operations take two
//! items and return a new one; see [`crate::boolean`].

use serde::{Deserialize, Serialize};
use vellum_geom::{Affine, Cubic, Point, Rect};

use crate::boolean::reorient::reorient_paths;
use crate::boolean::split::{split_boolean, SplitMode};
use crate::boolean::winding::{self, Candidates, CurveTable, Winding};
use crate::boolean::{resolve_crossings, trace_boolean, BooleanOptions, Operator};
use crate::error::{PathError, Result};
use crate::intersection::{self, CurveLocation, CurveSet, Include};
use crate::path::Path;
use crate::segment::Segment;
use crate::svg;

/// Handle length factor for quarter circles
const KAPPA: f64 = 0.5522847498307936;

/// Rule deciding which winding numbers are filled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

impl FillRule {
    pub fn is_inside(self, winding: i32) -> bool {
        match self {
            FillRule::NonZero => winding != 0,
            FillRule::EvenOdd => winding & 1 == 1,
        }
    }
}

/// Presentation attributes carried over to boolean results
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
}

/// A compound path
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    children: Vec<Path>,
    #[serde(default)]
    fill_rule: FillRule,
    /// Transform not yet applied to the segments
    #[serde(default)]
    matrix: Affine,
    #[serde(default)]
    style: Style,
}

impl PathItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path(path: Path) -> Self {
        Self::from_paths(vec![path])
    }

    pub fn from_paths(children: Vec<Path>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    /// Clockwise rectangle starting at its top-left corner
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_path(Path::from_points(
            [
                Point::new(x, y),
                Point::new(x + width, y),
                Point::new(x + width, y + height),
                Point::new(x, y + height),
            ],
            true,
        ))
    }

    /// Clockwise circle of four cubic arcs, starting at its leftmost point
    pub fn circle(center: Point, radius: f64) -> Self {
        let k = radius * KAPPA;
        let segments = vec![
            Segment::new(
                center + Point::new(-radius, 0.0),
                Point::new(0.0, k),
                Point::new(0.0, -k),
            ),
            Segment::new(
                center + Point::new(0.0, -radius),
                Point::new(-k, 0.0),
                Point::new(k, 0.0),
            ),
            Segment::new(
                center + Point::new(radius, 0.0),
                Point::new(0.0, -k),
                Point::new(0.0, k),
            ),
            Segment::new(
                center + Point::new(0.0, radius),
                Point::new(k, 0.0),
                Point::new(-k, 0.0),
            ),
        ];
        Self::from_path(Path::from_segments(segments, true))
    }

    /// Parses SVG path data such as `M0 0h10v10h-10z`
    pub fn from_svg_path_data(data: &str) -> Result<Self> {
        Ok(Self::from_paths(svg::parse(data)?))
    }

    pub fn to_svg_path_data(&self, precision: usize) -> String {
        if self.matrix.is_identity() {
            svg::format(&self.children, precision)
        } else {
            svg::format(&self.transformed_children(), precision)
        }
    }

    pub fn children(&self) -> &[Path] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Path> {
        &mut self.children
    }

    pub fn take_children(&mut self) -> Vec<Path> {
        std::mem::take(&mut self.children)
    }

    pub fn set_children(&mut self, children: Vec<Path>) {
        self.children = children;
    }

    pub fn add_child(&mut self, path: Path) {
        self.children.push(path);
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    pub fn set_fill_rule(&mut self, fill_rule: FillRule) {
        self.fill_rule = fill_rule;
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }

    pub fn matrix(&self) -> &Affine {
        &self.matrix
    }

    /// Copies the fill rule and style of `source`
    pub fn copy_attributes(&mut self, source: &PathItem) {
        self.fill_rule = source.fill_rule;
        self.style = source.style.clone();
    }

    /// Appends `matrix` to the pending transform
    pub fn transform(&mut self, matrix: &Affine) {
        self.matrix = matrix.then(&self.matrix);
    }

    /// Bakes the pending transform into the segments
    pub fn apply_transform(&mut self) {
        if self.matrix.is_identity() {
            return;
        }
        for path in &mut self.children {
            path.transform(&self.matrix);
        }
        self.matrix = Affine::IDENTITY;
    }

    fn transformed_children(&self) -> Vec<Path> {
        let mut children = self.children.clone();
        for path in &mut children {
            path.transform(&self.matrix);
        }
        children
    }

    /// Curves of all contours, in item coordinates
    pub fn curves(&self) -> Vec<Cubic> {
        self.children
            .iter()
            .flat_map(|path| path.curves())
            .map(|curve| curve.transformed(&self.matrix))
            .collect()
    }

    pub fn bounds(&self) -> Rect {
        let children = self.transformed_children();
        children
            .iter()
            .filter(|path| !path.is_empty())
            .map(Path::bounds)
            .reduce(|acc, bounds| acc.union(&bounds))
            .unwrap_or_default()
    }

    /// Signed area summed over all contours
    pub fn area(&self) -> f64 {
        self.children.iter().map(Path::area).sum::<f64>() * self.matrix.determinant()
    }

    /// Orientation of the first contour. An empty item counts as clockwise,
    /// like a contour of zero area.
    pub fn is_clockwise(&self) -> bool {
        self.children
            .first()
            .map_or(true, |path| path.is_clockwise() == (self.matrix.determinant() >= 0.0))
    }

    pub fn set_clockwise(&mut self, clockwise: bool) {
        if self.is_clockwise() != clockwise {
            self.reverse();
        }
    }

    pub fn length(&self) -> f64 {
        self.curves().iter().map(Cubic::length).sum()
    }

    /// Reverses the direction of every contour
    pub fn reverse(&mut self) {
        for path in &mut self.children {
            path.reverse();
        }
    }

    /// Reduces every contour and drops the empty ones
    pub fn reduce(&mut self, simplify: bool) {
        for path in &mut self.children {
            path.reduce(simplify);
        }
        self.children.retain(|path| !path.is_empty());
    }

    /// Closes the last contour
    pub fn close_path(&mut self, tolerance: f64) {
        if let Some(path) = self.children.last_mut() {
            path.close_path(tolerance);
        }
    }

    /// Winding of the item's outline around `point`
    pub fn winding_at(&self, point: Point) -> Winding {
        let children = self.transformed_children();
        let table = CurveTable::from_paths(&children);
        let all = table.all();
        winding::winding(&table, point, Candidates::List(&all), false, false)
    }

    /// Whether `point` is filled under the item's fill rule. Points on the
    /// outline count as inside.
    pub fn contains(&self, point: Point) -> bool {
        winding::contains(
            &self.transformed_children(),
            point,
            self.fill_rule == FillRule::EvenOdd,
        )
    }

    /// A point inside the filled area
    pub fn interior_point(&self) -> Point {
        winding::interior_point(
            &self.transformed_children(),
            self.fill_rule == FillRule::EvenOdd,
        )
    }

    /// Locations where this item meets `other`, or meets itself when
    /// `other` is `None`. Curve indices count through the curves of this
    /// item first and then those of `other`.
    pub fn intersections(&self, other: Option<&PathItem>) -> Vec<CurveLocation> {
        self.locations(other, Include::All)
    }

    /// Like [`PathItem::intersections`], keeping only true crossings
    pub fn crossings(&self, other: Option<&PathItem>) -> Vec<CurveLocation> {
        self.locations(other, Include::Crossings)
    }

    fn locations(&self, other: Option<&PathItem>, include: Include) -> Vec<CurveLocation> {
        let mut set = CurveSet::new();
        let first = push_contours(&mut set, &self.transformed_children());
        let second = other.map(|other| push_contours(&mut set, &other.transformed_children()));
        let found = intersection::find(&set, first, second, include);
        found
            .list
            .iter()
            .map(|&index| found.arena[index].clone())
            .collect()
    }

    /// Whether both items run along the same outlines, contour by contour
    pub fn compare(&self, other: &PathItem) -> bool {
        let (a, b) = (self.transformed_children(), other.transformed_children());
        a.len() == b.len() && a.iter().zip(&b).all(|(p1, p2)| p1.compare(p2))
    }

    /// Blends `from` into `to`. Both must have the same number of contours
    /// and each contour pair the same number of segments.
    pub fn interpolate(from: &PathItem, to: &PathItem, factor: f64) -> Result<PathItem> {
        if from.children.len() != to.children.len() {
            return Err(PathError::InterpolationMismatch {
                from: format!("item with {} contours", from.children.len()),
                to: format!("item with {} contours", to.children.len()),
            });
        }
        let mut children = Vec::with_capacity(from.children.len());
        for (index, (p1, p2)) in from.children.iter().zip(&to.children).enumerate() {
            if p1.len() != p2.len() {
                return Err(PathError::InterpolationMismatch {
                    from: format!("contour {} with {} segments", index, p1.len()),
                    to: format!("contour {} with {} segments", index, p2.len()),
                });
            }
            let segments = p1
                .segments()
                .iter()
                .zip(p2.segments())
                .map(|(s1, s2)| Segment::interpolate(s1, s2, factor))
                .collect();
            children.push(Path::from_segments(segments, p1.is_closed()));
        }
        let mut result = PathItem::from_paths(children);
        result.copy_attributes(from);
        result.matrix = from.matrix;
        Ok(result)
    }

    /// Removes this item's overlaps with itself and splits its
    /// self-crossing contours apart
    pub fn resolve_crossings(&mut self) {
        self.apply_transform();
        let children = resolve_crossings(self.take_children());
        self.children = children;
    }

    /// Orients non-crossing contours so that holes run against their
    /// containers, dropping contours that do not change the filled area.
    /// `clockwise` fixes the orientation of the outermost contours.
    pub fn reorient(&mut self, non_zero: bool, clockwise: Option<bool>) {
        let children = self.take_children();
        self.children = if non_zero {
            reorient_paths(children, |w| w != 0, clockwise)
        } else {
            reorient_paths(children, |w| w & 1 == 1, clockwise)
        };
    }

    pub fn unite(&self, other: &PathItem, options: &BooleanOptions) -> PathItem {
        trace_boolean(self, other, Operator::Unite, options)
    }

    pub fn intersect(&self, other: &PathItem, options: &BooleanOptions) -> PathItem {
        trace_boolean(self, other, Operator::Intersect, options)
    }

    pub fn subtract(&self, other: &PathItem, options: &BooleanOptions) -> PathItem {
        trace_boolean(self, other, Operator::Subtract, options)
    }

    pub fn exclude(&self, other: &PathItem, options: &BooleanOptions) -> PathItem {
        trace_boolean(self, other, Operator::Exclude, options)
    }

    /// Splits this item by `other`. Traced, the result is a group of the
    /// parts outside and inside `other`; in split mode, the pieces of both
    /// outlines cut at their crossings.
    pub fn divide(&self, other: &PathItem, options: &BooleanOptions) -> Item {
        if options.split() {
            return Item::Path(split_boolean(self, other, SplitMode::Divide));
        }
        Item::Group(Group::new(vec![
            Item::Path(self.subtract(other, options)),
            Item::Path(self.intersect(other, options)),
        ]))
    }
}

fn push_contours(set: &mut CurveSet, paths: &[Path]) -> std::ops::Range<usize> {
    let start = set.len();
    for path in paths {
        set.push_contour(&path.curves(), path.is_closed());
    }
    start..set.len()
}

/// A list of items
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub children: Vec<Item>,
}

impl Group {
    pub fn new(children: Vec<Item>) -> Self {
        Self { children }
    }
}

/// Anything a [`crate::Scene`] holds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Item {
    Path(PathItem),
    Group(Group),
}

impl Item {
    pub fn as_path(&self) -> Option<&PathItem> {
        match self {
            Item::Path(path) => Some(path),
            Item::Group(_) => None,
        }
    }

    /// Signed area of the item and all of its descendants
    pub fn area(&self) -> f64 {
        match self {
            Item::Path(path) => path.area(),
            Item::Group(group) => group.children.iter().map(Item::area).sum(),
        }
    }
}

impl From<PathItem> for Item {
    fn from(path: PathItem) -> Self {
        Item::Path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_is_clockwise() {
        let rect = PathItem::rectangle(0.0, 0.0, 10.0, 20.0);
        assert!(rect.is_clockwise());
        assert!((rect.area() - 200.0).abs() < 1e-9);
        assert!((rect.length() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_circle_area() {
        let circle = PathItem::circle(Point::new(50.0, 50.0), 10.0);
        assert!(circle.is_clockwise());
        let expected = std::f64::consts::PI * 100.0;
        assert!((circle.area() - expected).abs() / expected < 1e-3);
        let bounds = circle.bounds();
        assert!((bounds.left() - 40.0).abs() < 1e-9);
        assert!((bounds.bottom() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_pending_transform_is_applied_to_queries() {
        let mut rect = PathItem::rectangle(0.0, 0.0, 10.0, 10.0);
        rect.transform(&Affine::translation(100.0, 0.0));
        assert!(rect.contains(Point::new(105.0, 5.0)));
        assert!(!rect.contains(Point::new(5.0, 5.0)));
        rect.apply_transform();
        assert!(rect.matrix().is_identity());
        assert_eq!(rect.children()[0].segments()[0].point, Point::new(100.0, 0.0));
    }

    #[test]
    fn test_empty_item_counts_as_clockwise() {
        let mut empty = PathItem::new();
        assert!(empty.is_clockwise());
        assert_eq!(empty.area(), 0.0);
        empty.set_clockwise(true);
        assert!(empty.children().is_empty());
    }

    #[test]
    fn test_mirroring_flips_orientation() {
        let mut rect = PathItem::rectangle(0.0, 0.0, 10.0, 10.0);
        rect.transform(&Affine::scale(-1.0, 1.0));
        assert!(!rect.is_clockwise());
        assert!(rect.area() < 0.0);
    }

    #[test]
    fn test_winding_of_clockwise_rectangle() {
        let rect = PathItem::rectangle(0.0, 0.0, 1.0, 1.0);
        assert_eq!(rect.winding_at(Point::new(0.5, 0.5)).winding, 1);
        assert_eq!(rect.winding_at(Point::new(2.0, 0.5)).winding, 0);
    }

    #[test]
    fn test_even_odd_hole() {
        let mut item = PathItem::from_paths(vec![
            PathItem::rectangle(0.0, 0.0, 100.0, 100.0).take_children().remove(0),
            PathItem::rectangle(25.0, 25.0, 50.0, 50.0).take_children().remove(0),
        ]);
        assert!(item.contains(Point::new(50.0, 50.0)));
        item.set_fill_rule(FillRule::EvenOdd);
        assert!(!item.contains(Point::new(50.0, 50.0)));
        assert!(item.contains(Point::new(10.0, 50.0)));
    }

    #[test]
    fn test_reorient_turns_hole() {
        let mut item = PathItem::from_paths(vec![
            PathItem::rectangle(0.0, 0.0, 100.0, 100.0).take_children().remove(0),
            PathItem::rectangle(25.0, 25.0, 50.0, 50.0).take_children().remove(0),
        ]);
        item.set_fill_rule(FillRule::EvenOdd);
        item.reorient(false, Some(true));
        assert_eq!(item.children().len(), 2);
        assert!(!item.children()[1].is_clockwise());
        assert!((item.area() - 7500.0).abs() < 1e-9);
    }

    #[test]
    fn test_crossings_of_two_squares() {
        let a = PathItem::rectangle(0.0, 0.0, 100.0, 100.0);
        let b = PathItem::rectangle(50.0, 50.0, 100.0, 100.0);
        let crossings = a.crossings(Some(&b));
        assert_eq!(crossings.len(), 2);
        for location in &crossings {
            assert!(
                location.point.is_close(Point::new(100.0, 50.0), 1e-9)
                    || location.point.is_close(Point::new(50.0, 100.0), 1e-9)
            );
        }
        assert!(a.crossings(None).is_empty());
    }

    #[test]
    fn test_interpolate_halfway() {
        let a = PathItem::rectangle(0.0, 0.0, 10.0, 10.0);
        let b = PathItem::rectangle(10.0, 0.0, 10.0, 10.0);
        let mid = PathItem::interpolate(&a, &b, 0.5).unwrap();
        assert_eq!(mid.children()[0].segments()[0].point, Point::new(5.0, 0.0));
        assert!(mid.children()[0].is_closed());
    }

    #[test]
    fn test_interpolate_rejects_mismatched_segments() {
        let a = PathItem::rectangle(0.0, 0.0, 10.0, 10.0);
        let b = PathItem::circle(Point::ZERO, 5.0);
        let triangle = PathItem::from_path(Path::from_points(
            [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(5.0, 5.0)],
            true,
        ));
        assert!(PathItem::interpolate(&a, &b, 0.5).is_ok());
        assert!(matches!(
            PathItem::interpolate(&a, &triangle, 0.5),
            Err(PathError::InterpolationMismatch { .. })
        ));
    }

    #[test]
    fn test_divide_traced_returns_group() {
        let a = PathItem::rectangle(0.0, 0.0, 100.0, 100.0);
        let b = PathItem::rectangle(50.0, 50.0, 100.0, 100.0);
        let divided = a.divide(&b, &BooleanOptions::default());
        let Item::Group(group) = &divided else {
            panic!("expected a group");
        };
        assert_eq!(group.children.len(), 2);
        assert!((divided.area() - 10000.0).abs() < 1e-6);
    }

    #[test]
    fn test_result_keeps_first_operand_style() {
        let mut a = PathItem::rectangle(0.0, 0.0, 100.0, 100.0);
        a.style_mut().fill = Some("red".to_string());
        let b = PathItem::rectangle(50.0, 50.0, 100.0, 100.0);
        let result = a.unite(&b, &BooleanOptions::default());
        assert_eq!(result.style().fill.as_deref(), Some("red"));
    }
}
