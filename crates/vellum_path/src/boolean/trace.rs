//! Path tracing
//!
//! Walks the divided graph and collects closed outlines made of the
//! segments whose winding the operator accepts. At intersections the walk
//! may switch to another contour. When a walk runs into a segment it cannot
//! use, it rolls back to the last crossing and tries the next alternative,
//! using an explicit stack of branch records.

use std::cmp::Ordering;
use std::collections::VecDeque;

use vellum_geom::Point;

use crate::path::Path;
use crate::segment::Segment;

use super::graph::{Graph, SegId};
use super::Operator;

/// A point where the walk chose between alternatives
struct Branch {
    /// Length of the outline when the branch was taken
    start: usize,
    /// Alternatives not tried yet, the root itself last
    crossings: VecDeque<SegId>,
    /// Segments visited since the branch was taken
    visited: Vec<SegId>,
    handle_in: Point,
}

struct Tracer<'a> {
    graph: &'a mut Graph,
    operator: Option<Operator>,
    starts: Vec<SegId>,
}

impl Tracer<'_> {
    fn is_valid(&self, seg: Option<SegId>) -> bool {
        let Some(seg) = seg else {
            return false;
        };
        if self.graph.nodes[seg].removed || self.graph.visited[seg] {
            return false;
        }
        let Some(operator) = self.operator else {
            return true;
        };
        let Some(w) = self.graph.winding[seg] else {
            return false;
        };
        operator.contains(w.winding)
            && !(operator == Operator::Unite && w.winding == 2 && w.left != 0 && w.right != 0)
    }

    fn is_start(&self, seg: SegId) -> bool {
        self.starts.contains(&seg)
    }

    fn next_or_first(&self, seg: SegId) -> SegId {
        self.graph.nodes[seg]
            .next
            .unwrap_or_else(|| self.graph.first_of_contour(seg))
    }

    /// Segments at the same point as `segment` that the walk may switch to,
    /// in ring order starting after `segment`'s own intersection
    fn crossing_segments(&mut self, segment: SegId, collect_starts: bool) -> VecDeque<SegId> {
        let mut crossings = VecDeque::new();
        if collect_starts {
            self.starts = vec![segment];
        }
        let Some(start) = self.graph.intersection[segment] else {
            return crossings;
        };
        self.collect(segment, Some(start), None, collect_starts, &mut crossings);
        let mut head = start;
        while let Some(prev) = self.graph.locations[head].prev {
            head = prev;
        }
        self.collect(segment, Some(head), Some(start), collect_starts, &mut crossings);
        crossings
    }

    fn collect(
        &mut self,
        segment: SegId,
        mut inter: Option<usize>,
        end: Option<usize>,
        collect_starts: bool,
        crossings: &mut VecDeque<SegId>,
    ) {
        while let Some(current) = inter.filter(|&i| Some(i) != end) {
            let location = &self.graph.locations[current];
            inter = location.next;
            let Some(other) = location.segment.filter(|&s| !self.graph.nodes[s].removed) else {
                continue;
            };
            let next = self.next_or_first(other);
            let next_inter_segment = self.graph.intersection[next]
                .and_then(|i| self.graph.locations[i].segment);
            if other != segment
                && (self.is_start(other)
                    || self.is_start(next)
                    || (self.is_valid(Some(other))
                        && (self.is_valid(Some(next)) || self.is_valid(next_inter_segment))))
            {
                crossings.push_back(other);
            }
            if collect_starts {
                self.starts.push(other);
            }
        }
    }

    fn visit_contour(&mut self, contour: usize) {
        for seg in self.graph.contour_segments(contour) {
            self.graph.visited[seg] = true;
        }
    }

    /// Handles a start segment on a contour made only of overlaps. Returns
    /// true when the contour coincides with its partner and was consumed.
    fn trace_coincident(&mut self, seg: SegId, paths: &mut Vec<Path>) -> bool {
        let contour1 = self.graph.nodes[seg].contour;
        let Some(contour2) = self.graph.intersection[seg]
            .and_then(|i| self.graph.locations[i].segment)
            .map(|s| self.graph.nodes[s].contour)
        else {
            return false;
        };
        let path1 = self.graph.to_path(contour1);
        if !path1.compare(&self.graph.to_path(contour2)) {
            return false;
        }
        if path1.area() != 0.0 {
            paths.push(path1);
        }
        self.visit_contour(contour1);
        self.visit_contour(contour2);
        true
    }

    fn trace_from(&mut self, mut seg: SegId, paths: &mut Vec<Path>) {
        let mut valid = self.is_valid(Some(seg));
        if valid
            && self.graph.contours[self.graph.nodes[seg].contour].overlaps_only
            && self.trace_coincident(seg, paths)
        {
            valid = false;
        }

        let mut path: Option<Vec<Segment>> = None;
        let mut finished = false;
        let mut closed = true;
        let mut branches: Vec<Branch> = Vec::new();
        let mut branch: Option<Branch> = None;
        let mut handle_in = Point::ZERO;

        while valid {
            let first = path.is_none();
            let mut crossings = self.crossing_segments(seg, first);
            let other = crossings.pop_front();
            finished = !first && (self.is_start(seg) || other.map_or(false, |o| self.is_start(o)));
            let cross = if finished { None } else { other };
            let segments = path.get_or_insert_with(Vec::new);
            if first {
                branch = None;
            }
            if finished {
                if self.graph.is_first(seg) || self.graph.is_last(seg) {
                    closed = self.graph.contours[self.graph.nodes[seg].contour].closed;
                }
                self.graph.visited[seg] = true;
                break;
            }
            if cross.is_some() {
                if let Some(current) = branch.take() {
                    branches.push(current);
                }
            }
            if branch.is_none() {
                if cross.is_some() {
                    crossings.push_back(seg);
                }
                branch = Some(Branch {
                    start: segments.len(),
                    crossings,
                    visited: Vec::new(),
                    handle_in,
                });
            }
            if let Some(other) = cross {
                seg = other;
            }
            if !self.is_valid(Some(seg)) {
                if let Some(current) = branch.as_mut() {
                    segments.truncate(current.start);
                    for visited in current.visited.drain(..) {
                        self.graph.visited[visited] = false;
                    }
                }
                let mut retry;
                loop {
                    retry = branch.as_mut().and_then(|b| b.crossings.pop_front());
                    if retry.map_or(true, |s| self.graph.nodes[s].removed) {
                        retry = None;
                        branch = branches.pop();
                        if let Some(previous) = &branch {
                            handle_in = previous.handle_in;
                        }
                    }
                    if !(branch.is_some() && !self.is_valid(retry)) {
                        break;
                    }
                }
                match retry {
                    Some(retry) => seg = retry,
                    None => {
                        tracing::trace!("trace: abandoned outline at segment {}", seg);
                        break;
                    }
                }
            }
            let node = &self.graph.nodes[seg];
            let next = node.next;
            let handle_out = if next.is_some() { node.handle_out } else { Point::ZERO };
            segments.push(Segment::new(node.point, handle_in, handle_out));
            self.graph.visited[seg] = true;
            if let Some(current) = branch.as_mut() {
                current.visited.push(seg);
            }
            handle_in = next.map_or(Point::ZERO, |n| self.graph.nodes[n].handle_in);
            seg = next.unwrap_or_else(|| self.graph.first_of_contour(seg));
        }

        if finished {
            let Some(mut segments) = path else {
                return;
            };
            if closed {
                if let Some(first) = segments.first_mut() {
                    first.handle_in = handle_in;
                }
            }
            let path = Path::from_segments(segments, closed);
            if path.area() != 0.0 {
                paths.push(path);
            } else {
                tracing::trace!("trace: dropped outline without area");
            }
        }
    }
}

/// Traces outlines through `segments`. Without an operator every unvisited
/// segment may be used.
pub(crate) fn trace(graph: &mut Graph, segments: &[SegId], operator: Option<Operator>) -> Vec<Path> {
    let indices = graph.indices();
    let mut order = segments.to_vec();
    {
        let graph = &*graph;
        let overlap = |seg: SegId| {
            graph.intersection[seg].map_or(false, |i| graph.locations[i].overlap)
        };
        order.sort_by(|&a, &b| {
            let (over_a, over_b) = (overlap(a), overlap(b));
            if over_a != over_b {
                return if over_a { Ordering::Greater } else { Ordering::Less };
            }
            let (inter_a, inter_b) = (graph.intersection[a].is_some(), graph.intersection[b].is_some());
            if inter_a != inter_b {
                return if inter_a { Ordering::Greater } else { Ordering::Less };
            }
            graph.nodes[a]
                .contour
                .cmp(&graph.nodes[b].contour)
                .then(indices[a].cmp(&indices[b]))
        });
    }

    let mut tracer = Tracer {
        graph,
        operator,
        starts: Vec::new(),
    };
    let mut paths = Vec::new();
    for seg in order {
        tracer.trace_from(seg, &mut paths);
    }
    tracing::trace!("trace: {} outlines", paths.len());
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boolean::divide::divide;
    use crate::boolean::graph::Operand;
    use crate::boolean::propagate::{propagate, WindingContext};
    use crate::intersection::Include;

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

    fn traced(operator: Operator) -> Vec<Path> {
        let mut graph = Graph::new();
        graph.add_paths(&[square(0.0, 0.0, 100.0)], Operand::First);
        let mut second = square(50.0, 50.0, 100.0);
        if operator == Operator::Subtract {
            second.reverse();
        }
        graph.add_paths(&[second], Operand::Second);
        let found = graph.intersections(false, Include::CrossingsOrOverlaps);
        divide(&mut graph, &found.locations, None, None);
        let context = WindingContext::new(&graph, operator, true);
        let segments = graph.segments();
        for &seg in &segments {
            if graph.winding[seg].is_none() {
                propagate(&mut graph, seg, &context);
            }
        }
        trace(&mut graph, &segments, Some(operator))
    }

    #[test]
    fn test_trace_union_of_squares() {
        let paths = traced(Operator::Unite);
        assert_eq!(paths.len(), 1);
        assert!((paths[0].area().abs() - 17500.0).abs() < 1e-6);
        assert_eq!(paths[0].len(), 8);
    }

    #[test]
    fn test_trace_intersection_of_squares() {
        let paths = traced(Operator::Intersect);
        assert_eq!(paths.len(), 1);
        assert!((paths[0].area().abs() - 2500.0).abs() < 1e-6);
    }

    #[test]
    fn test_trace_difference_of_squares() {
        let paths = traced(Operator::Subtract);
        assert_eq!(paths.len(), 1);
        assert!((paths[0].area().abs() - 7500.0).abs() < 1e-6);
    }
}
