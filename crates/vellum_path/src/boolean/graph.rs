//! Per-call workspace of the boolean engine
//!
//! The operands are copied into flat arenas: segment nodes linked per
//! contour by index, and curve locations linked into rings by index. Winding
//! records, visited marks and intersection pointers live in arrays parallel
//! to the nodes. Nothing here outlives a single boolean call.

use vellum_geom::{Cubic, Point};

use crate::intersection::{self, CurveSet, Include};
use crate::path::Path;
use crate::segment::Segment;

use super::winding::Winding;

/// Index of a segment node
pub(crate) type SegId = usize;
/// Index of a curve location
pub(crate) type LocId = usize;

/// Which operand of a boolean call a contour came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Operand {
    First,
    Second,
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub point: Point,
    pub handle_in: Point,
    pub handle_out: Point,
    pub contour: usize,
    pub next: Option<SegId>,
    pub prev: Option<SegId>,
    pub removed: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct Contour {
    pub first: Option<SegId>,
    pub closed: bool,
    pub operand: Operand,
    /// Every segment of the contour sits on an overlap
    pub overlaps_only: bool,
}

/// A location on a curve of the graph, see [`crate::intersection`]
#[derive(Clone, Debug)]
pub(crate) struct Location {
    /// Start node of the curve the location lies on
    pub curve: SegId,
    pub time: f64,
    pub point: Point,
    /// Node at the location once its curve has been divided
    pub segment: Option<SegId>,
    pub overlap: bool,
    pub other: LocId,
    pub next: Option<LocId>,
    pub prev: Option<LocId>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Graph {
    pub nodes: Vec<Node>,
    pub contours: Vec<Contour>,
    pub locations: Vec<Location>,
    pub winding: Vec<Option<Winding>>,
    pub visited: Vec<bool>,
    pub intersection: Vec<Option<LocId>>,
}

/// Locations imported from an intersection query
pub(crate) struct Found {
    /// Sorted and expanded
    pub locations: Vec<LocId>,
    pub has_overlaps: bool,
    pub has_crossings: bool,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies `paths` into the graph as contours of `operand`
    pub fn add_paths(&mut self, paths: &[Path], operand: Operand) {
        for path in paths {
            let contour = self.contours.len();
            self.contours.push(Contour {
                first: None,
                closed: path.is_closed(),
                operand,
                overlaps_only: false,
            });
            let start = self.nodes.len();
            let count = path.len();
            for (i, segment) in path.segments().iter().enumerate() {
                let next = if i + 1 < count {
                    Some(start + i + 1)
                } else if path.is_closed() {
                    Some(start)
                } else {
                    None
                };
                let prev = if i > 0 {
                    Some(start + i - 1)
                } else if path.is_closed() {
                    Some(start + count - 1)
                } else {
                    None
                };
                self.push_node(Node {
                    point: segment.point,
                    handle_in: segment.handle_in,
                    handle_out: segment.handle_out,
                    contour,
                    next,
                    prev,
                    removed: false,
                });
            }
            if count > 0 {
                self.contours[contour].first = Some(start);
            }
        }
    }

    fn push_node(&mut self, node: Node) -> SegId {
        self.nodes.push(node);
        self.winding.push(None);
        self.visited.push(false);
        self.intersection.push(None);
        self.nodes.len() - 1
    }

    /// Live nodes of one contour in order
    pub fn contour_segments(&self, contour: usize) -> Vec<SegId> {
        let mut segments = Vec::new();
        let first = self.contours[contour].first;
        let mut current = first;
        while let Some(seg) = current {
            segments.push(seg);
            current = self.nodes[seg].next;
            if current == first {
                break;
            }
        }
        segments
    }

    /// Live nodes of all contours, contour by contour
    pub fn segments(&self) -> Vec<SegId> {
        (0..self.contours.len())
            .flat_map(|contour| self.contour_segments(contour))
            .collect()
    }

    /// Position of every node within its contour
    pub fn indices(&self) -> Vec<usize> {
        let mut indices = vec![0; self.nodes.len()];
        for contour in 0..self.contours.len() {
            for (index, seg) in self.contour_segments(contour).into_iter().enumerate() {
                indices[seg] = index;
            }
        }
        indices
    }

    pub fn is_first(&self, seg: SegId) -> bool {
        self.contours[self.nodes[seg].contour].first == Some(seg)
    }

    pub fn is_last(&self, seg: SegId) -> bool {
        match self.nodes[seg].next {
            None => true,
            Some(next) => self.is_first(next),
        }
    }

    pub fn first_of_contour(&self, seg: SegId) -> SegId {
        self.contours[self.nodes[seg].contour].first.unwrap_or(seg)
    }

    /// Curve from `seg` to its successor
    pub fn curve(&self, seg: SegId) -> Option<Cubic> {
        let next = self.nodes[seg].next?;
        let (a, b) = (&self.nodes[seg], &self.nodes[next]);
        Some(Cubic::from_anchors(a.point, a.handle_out, b.handle_in, b.point))
    }

    pub fn is_live_curve(&self, seg: SegId) -> bool {
        !self.nodes[seg].removed && self.nodes[seg].next.is_some()
    }

    /// Splits the curve starting at `seg` at time `t` and returns the new
    /// node between the two halves.
    pub fn split(&mut self, seg: SegId, t: f64) -> Option<SegId> {
        let next = self.nodes[seg].next?;
        let values = self.curve(seg)?;
        let (left, right) = values.subdivide(t);
        let contour = self.nodes[seg].contour;
        let node = self.push_node(Node {
            point: left.p3(),
            handle_in: left.handle2(),
            handle_out: right.handle1(),
            contour,
            next: Some(next),
            prev: Some(seg),
            removed: false,
        });
        self.nodes[seg].handle_out = left.handle1();
        self.nodes[seg].next = Some(node);
        self.nodes[next].handle_in = right.handle2();
        self.nodes[next].prev = Some(node);
        Some(node)
    }

    /// Unlinks a node from its contour
    pub fn remove(&mut self, seg: SegId) {
        let Node {
            prev,
            next,
            contour,
            ..
        } = self.nodes[seg];
        let alone = prev == Some(seg) || next == Some(seg);
        if let Some(prev) = prev.filter(|_| !alone) {
            self.nodes[prev].next = next;
        }
        if let Some(next) = next.filter(|_| !alone) {
            self.nodes[next].prev = prev;
        }
        if self.contours[contour].first == Some(seg) {
            self.contours[contour].first = if alone { None } else { next };
        }
        let node = &mut self.nodes[seg];
        node.removed = true;
        node.next = None;
        node.prev = None;
    }

    /// Zeroes the handles of the curve starting at `seg`
    pub fn clear_curve_handles(&mut self, seg: SegId) {
        if self.nodes[seg].removed {
            return;
        }
        self.nodes[seg].handle_out = Point::ZERO;
        if let Some(next) = self.nodes[seg].next {
            self.nodes[next].handle_in = Point::ZERO;
        }
    }

    pub fn to_path(&self, contour: usize) -> Path {
        let segments = self
            .contour_segments(contour)
            .into_iter()
            .map(|seg| {
                let node = &self.nodes[seg];
                Segment::new(node.point, node.handle_in, node.handle_out)
            })
            .collect();
        Path::from_segments(segments, self.contours[contour].closed)
    }

    /// All contours with at least one segment left
    pub fn to_paths(&self) -> Vec<Path> {
        (0..self.contours.len())
            .filter(|&contour| self.contours[contour].first.is_some())
            .map(|contour| self.to_path(contour))
            .collect()
    }

    pub fn contour_of_location(&self, loc: LocId) -> usize {
        let location = &self.locations[loc];
        self.nodes[location.segment.unwrap_or(location.curve)].contour
    }

    /// Puts a location at a node: time 0 of its outgoing curve, or time 1
    /// at the end of an open contour
    pub fn set_segment(&mut self, loc: LocId, seg: SegId) {
        let (curve, time) = match self.nodes[seg].next {
            Some(_) => (seg, 0.0),
            None => (self.nodes[seg].prev.unwrap_or(seg), 1.0),
        };
        let location = &mut self.locations[loc];
        location.segment = Some(seg);
        location.curve = curve;
        location.time = time;
    }

    /// Joins the location ring of `to` onto the ring of `from`, unless they
    /// are already connected
    pub fn link(&mut self, from: LocId, to: LocId) {
        let mut prev = Some(from);
        while let Some(current) = prev {
            if current == to {
                return;
            }
            prev = self.locations[current].prev;
        }
        let mut from = from;
        while let Some(next) = self.locations[from].next {
            if next == to {
                break;
            }
            from = next;
        }
        if self.locations[from].next.is_none() {
            let mut to = to;
            while let Some(prev) = self.locations[to].prev {
                to = prev;
            }
            self.locations[from].next = Some(to);
            self.locations[to].prev = Some(from);
        }
    }

    /// Finds the intersections between the two operands, or among all
    /// contours when `own` is set, and imports them as locations.
    pub fn intersections(&mut self, own: bool, include: Include) -> Found {
        let mut set = CurveSet::new();
        let mut curve_nodes = Vec::new();
        let mut first = 0..0;
        let mut second = 0..0;
        for contour in 0..self.contours.len() {
            let segments = self.contour_segments(contour);
            let mut curves = Vec::with_capacity(segments.len());
            for &seg in &segments {
                if let Some(values) = self.curve(seg) {
                    curves.push(values);
                    curve_nodes.push(seg);
                }
            }
            let range = set.push_contour(&curves, self.contours[contour].closed);
            match self.contours[contour].operand {
                Operand::First => first.end = range.end,
                Operand::Second => {
                    if second.is_empty() {
                        second.start = range.start;
                    }
                    second.end = range.end;
                }
            }
        }
        if own {
            first = 0..set.len();
        }

        let mut found = intersection::find(
            &set,
            first,
            if own { None } else { Some(second) },
            include,
        );
        let expanded = found.expand(&set);
        let base = self.locations.len();
        let mut ids = vec![usize::MAX; found.arena.len()];
        for (i, &arena_index) in expanded.iter().enumerate() {
            ids[arena_index] = base + i;
        }
        for &arena_index in &expanded {
            let source = &found.arena[arena_index];
            self.locations.push(Location {
                curve: curve_nodes[source.curve],
                time: source.time,
                point: source.point,
                segment: None,
                overlap: source.overlap,
                other: ids[source.other],
                next: None,
                prev: None,
            });
        }
        Found {
            locations: (base..self.locations.len()).collect(),
            has_overlaps: found.has_overlaps,
            has_crossings: found.has_crossings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Path {
        Path::from_points(
            [
                Point::new(x, y),
                Point::new(x + size, y),
                Point::new(x + size, y + size),
                Point::new(x, y + size),
            ],
            true,
        )
    }

    #[test]
    fn test_split_and_remove_keep_ring_consistent() {
        let mut graph = Graph::new();
        graph.add_paths(&[square(0.0, 0.0, 10.0)], Operand::First);
        let node = graph.split(0, 0.5).unwrap();
        assert_eq!(graph.nodes[node].point, Point::new(5.0, 0.0));
        assert_eq!(graph.contour_segments(0), vec![0, node, 1, 2, 3]);
        assert!((graph.to_path(0).area() - 100.0).abs() < 1e-9);
        graph.remove(0);
        assert_eq!(graph.contour_segments(0), vec![node, 1, 2, 3]);
        assert!(graph.is_first(node));
        assert!(graph.is_last(3));
    }

    #[test]
    fn test_link_joins_rings_once() {
        let mut graph = Graph::new();
        for i in 0..3 {
            graph.locations.push(Location {
                curve: 0,
                time: 0.0,
                point: Point::ZERO,
                segment: None,
                overlap: false,
                other: i,
                next: None,
                prev: None,
            });
        }
        graph.link(0, 1);
        graph.link(1, 2);
        graph.link(2, 0);
        assert_eq!(graph.locations[0].next, Some(1));
        assert_eq!(graph.locations[1].next, Some(2));
        assert_eq!(graph.locations[2].next, None);
        assert_eq!(graph.locations[0].prev, None);
    }

    #[test]
    fn test_intersections_between_operands() {
        let mut graph = Graph::new();
        graph.add_paths(&[square(0.0, 0.0, 100.0)], Operand::First);
        graph.add_paths(&[square(50.0, 50.0, 100.0)], Operand::Second);
        let found = graph.intersections(false, Include::CrossingsOrOverlaps);
        assert_eq!(found.locations.len(), 4);
        assert!(found.has_crossings && !found.has_overlaps);
        for &loc in &found.locations {
            let other = graph.locations[loc].other;
            assert_eq!(graph.locations[other].other, loc);
        }
    }
}
