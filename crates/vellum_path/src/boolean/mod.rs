//! Boolean operations on path items
//!
//! Every call copies its operands into a [`graph::Graph`] workspace and
//! runs the same pipeline over it:
//!
//! 1. prepare both operands: flatten transforms, resolve self-crossings
//! 2. find the crossings and overlaps between them
//! 3. divide the curves at those locations
//! 4. propagate winding numbers along the curve chains between crossings
//! 5. trace the outlines whose winding the operator accepts
//!
//! Operands that do not cross at all skip to [`reorient::reorient_paths`].
//! The workspace is dropped when the call returns.

pub(crate) mod divide;
pub(crate) mod graph;
pub(crate) mod propagate;
pub(crate) mod reorient;
pub(crate) mod split;
pub(crate) mod trace;
pub(crate) mod winding;

use serde::{Deserialize, Serialize};
use vellum_geom::numerical::{EPSILON, GEOMETRIC_EPSILON};

use crate::item::{FillRule, PathItem};
use crate::path::Path;

use self::divide::divide;
use self::graph::{Graph, LocId, Operand, SegId};
use self::propagate::{propagate, WindingContext};
use self::reorient::reorient_paths;
use self::split::{split_boolean, SplitMode};
use self::trace::trace;
use crate::intersection::Include;

pub use self::winding::Winding;

/// A boolean set operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Unite,
    Intersect,
    Subtract,
    Exclude,
}

impl Operator {
    /// Whether a curve with this winding number belongs to the result.
    ///
    /// Exclude accepts -1 as well so that the signed windings of
    /// [`reorient_paths`] work with the same table.
    pub fn contains(self, winding: i32) -> bool {
        match self {
            Operator::Unite => matches!(winding, 1 | 2),
            Operator::Intersect => winding == 2,
            Operator::Subtract => winding == 1,
            Operator::Exclude => matches!(winding, 1 | -1),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operator::Unite => "unite",
            Operator::Intersect => "intersect",
            Operator::Subtract => "subtract",
            Operator::Exclude => "exclude",
        }
    }
}

/// Options of a boolean operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BooleanOptions {
    /// Insert the result into the scene above the topmost operand
    pub insert: bool,
    /// Treat both operands as areas. When false, subtract, intersect and
    /// divide only split the first operand's outline at the crossings.
    pub trace: bool,
    /// Treat the first operand as a stroke; implies splitting
    pub stroke: bool,
}

impl Default for BooleanOptions {
    fn default() -> Self {
        Self {
            insert: true,
            trace: true,
            stroke: false,
        }
    }
}

impl BooleanOptions {
    pub(crate) fn split(&self) -> bool {
        !self.trace || self.stroke
    }
}

/// Copies `item` for a boolean pass: simplified, with its transform
/// applied, and with its own crossings resolved when `resolve` is set.
pub(crate) fn prepare(item: &PathItem, resolve: bool) -> PathItem {
    let mut result = item.clone();
    result.reduce(true);
    result.apply_transform();
    if resolve {
        for path in result.children_mut() {
            if !path.is_closed() && !path.is_empty() {
                path.close_path(EPSILON);
                if let Some(first) = path.first_segment_mut() {
                    first.handle_in = vellum_geom::Point::ZERO;
                }
                if let Some(last) = path.last_segment_mut() {
                    last.handle_out = vellum_geom::Point::ZERO;
                }
            }
        }
        let non_zero = result.fill_rule() == FillRule::NonZero;
        let children = resolve_crossings(result.take_children());
        result.set_children(children);
        result.reorient(non_zero, Some(true));
    }
    result
}

/// Runs a traced boolean operation. Subtract and intersect fall back to
/// splitting when the options ask for it.
pub(crate) fn trace_boolean(
    first: &PathItem,
    second: &PathItem,
    operator: Operator,
    options: &BooleanOptions,
) -> PathItem {
    if options.split() && matches!(operator, Operator::Subtract | Operator::Intersect) {
        let mode = if operator == Operator::Subtract {
            SplitMode::Subtract
        } else {
            SplitMode::Intersect
        };
        return split_boolean(first, second, mode);
    }

    let own = std::ptr::eq(first, second);
    let path1 = prepare(first, true);
    let mut path2 = (!own).then(|| prepare(second, true));
    if let Some(path2) = path2.as_mut() {
        let opposite = matches!(operator, Operator::Subtract | Operator::Exclude);
        if opposite ^ (path2.is_clockwise() != path1.is_clockwise()) {
            path2.reverse();
        }
    }

    let mut graph = Graph::new();
    graph.add_paths(path1.children(), Operand::First);
    if let Some(path2) = &path2 {
        graph.add_paths(path2.children(), Operand::Second);
    }

    let disjoint = path2
        .as_ref()
        .map_or(false, |path2| !path1.bounds().intersects(&path2.bounds(), EPSILON));
    let crossings = if disjoint {
        Vec::new()
    } else {
        let found = graph.intersections(own, Include::CrossingsOrOverlaps);
        divide(&mut graph, &found.locations, None, None)
    };
    tracing::debug!(
        "{}: {} + {} contours, {} crossings",
        operator.name(),
        path1.children().len(),
        path2.as_ref().map_or(0, |p| p.children().len()),
        crossings.len()
    );

    let paths = if crossings.is_empty() {
        let mut paths = path1.children().to_vec();
        if let Some(path2) = &path2 {
            paths.extend(path2.children().iter().cloned());
        }
        reorient_paths(paths, |w| operator.contains(w), Some(true))
    } else {
        let context = WindingContext::new(&graph, operator, path2.is_some());
        for &loc in &crossings {
            if let Some(seg) = graph.locations[loc].segment {
                propagate(&mut graph, seg, &context);
            }
        }
        for contour in &mut graph.contours {
            contour.overlaps_only = true;
        }
        let segments = graph.segments();
        for &seg in &segments {
            if graph.winding[seg].is_none() {
                propagate(&mut graph, seg, &context);
            }
            let overlap = graph.intersection[seg].map_or(false, |i| graph.locations[i].overlap);
            if !overlap {
                let contour = graph.nodes[seg].contour;
                graph.contours[contour].overlaps_only = false;
            }
        }
        trace(&mut graph, &segments, Some(operator))
    };
    create_result(paths, true, first)
}

/// Wraps result contours into an item carrying the attributes of `source`
pub(crate) fn create_result(paths: Vec<Path>, simplify: bool, source: &PathItem) -> PathItem {
    let mut result = PathItem::from_paths(paths);
    result.reduce(simplify);
    result.copy_attributes(source);
    result
}

/// Resolves the crossings of a set of contours with themselves and each
/// other. Overlapping stretches are removed first, then the remaining
/// crossings are divided and the contours retraced.
pub(crate) fn resolve_crossings(paths: Vec<Path>) -> Vec<Path> {
    let mut graph = Graph::new();
    graph.add_paths(&paths, Operand::First);
    let found = graph.intersections(true, Include::CrossingsOrOverlaps);
    let (has_overlaps, has_crossings) = (found.has_overlaps, found.has_crossings);
    if !has_overlaps && !has_crossings {
        return paths;
    }
    tracing::debug!(
        "resolve crossings: {} contours, overlaps {}, crossings {}",
        paths.len(),
        has_overlaps,
        has_crossings
    );

    let mut carry = (has_overlaps && has_crossings).then(Vec::new);
    if has_overlaps {
        let mut at_overlap = |graph: &mut Graph, loc: LocId| graph.locations[loc].overlap;
        let overlaps = divide(&mut graph, &found.locations, Some(&mut at_overlap), carry.as_mut());
        for &loc in overlaps.iter().rev() {
            remove_overlap(&mut graph, loc);
        }
    }

    if has_crossings {
        let mut still_live = |graph: &mut Graph, loc: LocId| {
            let other = graph.locations[loc].other;
            if relocate(graph, loc) && relocate(graph, other) {
                return true;
            }
            for l in [loc, other] {
                if let Some(seg) = nearest_segment(graph, l) {
                    graph.intersection[seg] = None;
                }
            }
            false
        };
        let include: Option<&mut divide::IncludeFn<'_>> =
            if has_overlaps { Some(&mut still_live) } else { None };
        divide(&mut graph, &found.locations, include, carry.as_mut());
        if let Some(carry) = &carry {
            for &seg in carry.iter().rev() {
                graph.clear_curve_handles(seg);
            }
        }
        let segments = graph.segments();
        trace(&mut graph, &segments, None)
    } else {
        graph.to_paths()
    }
}

/// Whether `seg` sits on an overlap whose partner lies on `contour`
fn has_overlap(graph: &Graph, seg: Option<SegId>, contour: usize) -> bool {
    let Some(inter) = seg.and_then(|seg| graph.intersection[seg]) else {
        return false;
    };
    graph.locations[inter].overlap && graph.contour_of_location(inter) == contour
}

/// Removes the node of an overlap location when both its neighbors are on
/// overlaps as well, so the stretch is covered by another contour
fn remove_overlap(graph: &mut Graph, loc: LocId) {
    let Some(seg) = graph.locations[loc].segment else {
        return;
    };
    if graph.nodes[seg].removed {
        return;
    }
    let contour = graph.nodes[seg].contour;
    let (prev, next) = (graph.nodes[seg].prev, graph.nodes[seg].next);
    if !(has_overlap(graph, prev, contour) && has_overlap(graph, next, contour)) {
        return;
    }
    let (Some(prev), Some(next)) = (prev, next) else {
        return;
    };
    graph.remove(seg);
    if prev == seg {
        return;
    }
    graph.nodes[prev].handle_out = vellum_geom::Point::ZERO;
    graph.nodes[next].handle_in = vellum_geom::Point::ZERO;
    let remnant = graph.curve(prev).map_or(false, |curve| !curve.has_length(0.0));
    if remnant {
        graph.nodes[next].handle_in = graph.nodes[prev].handle_in;
        graph.remove(prev);
    }
}

/// Makes sure a location still lies on a live curve, moving it to a
/// neighboring curve when its own one was removed or reshaped
fn relocate(graph: &mut Graph, loc: LocId) -> bool {
    let location = &graph.locations[loc];
    let (curve, time, point, segment) = (location.curve, location.time, location.point, location.segment);
    let on_curve = graph.is_live_curve(curve)
        && graph
            .curve(curve)
            .map_or(false, |values| values.point_at(time).is_close(point, GEOMETRIC_EPSILON));
    if on_curve {
        return true;
    }
    let candidates = [
        segment,
        Some(curve),
        segment.and_then(|s| graph.nodes[s].prev),
        graph.nodes[curve].prev,
    ];
    for candidate in candidates.into_iter().flatten() {
        if !graph.is_live_curve(candidate) {
            continue;
        }
        if let Some(t) = graph.curve(candidate).and_then(|values| values.time_of(point)) {
            let location = &mut graph.locations[loc];
            location.curve = candidate;
            location.time = t;
            return true;
        }
    }
    false
}

/// The location's node, or the nearer end of its curve before division
fn nearest_segment(graph: &Graph, loc: LocId) -> Option<SegId> {
    let location = &graph.locations[loc];
    if location.segment.is_some() {
        return location.segment;
    }
    let node = &graph.nodes[location.curve];
    if node.removed {
        return None;
    }
    if location.time < 0.5 {
        Some(location.curve)
    } else {
        node.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_geom::Point;

    #[test]
    fn test_operator_table() {
        assert!(Operator::Unite.contains(1) && Operator::Unite.contains(2));
        assert!(!Operator::Unite.contains(0));
        assert!(Operator::Intersect.contains(2) && !Operator::Intersect.contains(1));
        assert!(Operator::Subtract.contains(1) && !Operator::Subtract.contains(2));
        assert!(Operator::Exclude.contains(-1) && !Operator::Exclude.contains(2));
    }

    #[test]
    fn test_options_fill_missing_fields_with_defaults() {
        let options: BooleanOptions = serde_json::from_str("{\"trace\": false}").unwrap();
        assert!(options.insert);
        assert!(!options.trace);
        assert!(options.split());
    }

    #[test]
    fn test_resolve_figure_eight() {
        let eight = Path::from_points(
            [
                Point::new(0.0, 0.0),
                Point::new(100.0, 100.0),
                Point::new(100.0, 0.0),
                Point::new(0.0, 100.0),
            ],
            true,
        );
        let resolved = resolve_crossings(vec![eight]);
        assert_eq!(resolved.len(), 2);
        for path in &resolved {
            assert!((path.area().abs() - 2500.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_resolve_leaves_simple_contours_alone() {
        let square = Path::from_points(
            [
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ],
            true,
        );
        let resolved = resolve_crossings(vec![square.clone()]);
        assert_eq!(resolved, vec![square]);
    }
}
