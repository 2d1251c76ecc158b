//! Split mode
//!
//! Instead of tracing areas, the first operand's outline is cut at its
//! crossings with the second operand and each piece is kept or dropped by
//! whether its middle lies inside the second operand. Dividing cuts both
//! outlines and keeps every piece. Used for strokes and when tracing is
//! turned off.

use vellum_geom::Point;

use crate::intersection::Include;
use crate::item::PathItem;
use crate::path::Path;
use crate::segment::Segment;

use super::divide::divide;
use super::graph::{Graph, Operand, SegId};
use super::{create_result, prepare};

/// Which pieces a split keeps
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SplitMode {
    /// Pieces outside the second operand
    Subtract,
    /// Pieces inside the second operand
    Intersect,
    /// All pieces of both operands
    Divide,
}

pub(crate) fn split_boolean(first: &PathItem, second: &PathItem, mode: SplitMode) -> PathItem {
    let path1 = prepare(first, false);
    let path2 = prepare(second, false);

    let mut graph = Graph::new();
    graph.add_paths(path1.children(), Operand::First);
    graph.add_paths(path2.children(), Operand::Second);
    let found = graph.intersections(false, Include::CrossingsOrOverlaps);
    let both = mode == SplitMode::Divide;
    let cut_at: Vec<usize> = found
        .locations
        .iter()
        .copied()
        .filter(|&loc| {
            let contour = graph.nodes[graph.locations[loc].curve].contour;
            both || graph.contours[contour].operand == Operand::First
        })
        .collect();
    divide(&mut graph, &cut_at, None, None);

    let mut cuts = vec![false; graph.nodes.len()];
    for &loc in &cut_at {
        if let Some(seg) = graph.locations[loc].segment {
            cuts[seg] = true;
        }
    }

    let mut pieces = Vec::new();
    for contour in 0..graph.contours.len() {
        if !both && graph.contours[contour].operand != Operand::First {
            continue;
        }
        for piece in pieces_of(&graph, contour, &cuts) {
            let keep = match mode {
                SplitMode::Divide => true,
                SplitMode::Subtract | SplitMode::Intersect => {
                    let middle = piece.point_at(piece.length() / 2.0).unwrap_or(Point::ZERO);
                    let inside = path2.contains(middle);
                    inside ^ (mode == SplitMode::Subtract)
                }
            };
            if keep {
                pieces.push(piece);
            }
        }
    }
    tracing::debug!("split: {} cuts, {} pieces kept", cut_at.len(), pieces.len());
    create_result(pieces, false, first)
}

/// Cuts one contour at the marked nodes into open pieces. A contour without
/// cuts comes back whole.
fn pieces_of(graph: &Graph, contour: usize, cuts: &[bool]) -> Vec<Path> {
    let segments = graph.contour_segments(contour);
    let closed = graph.contours[contour].closed;
    let Some(first_cut) = segments.iter().position(|&seg| cuts[seg]) else {
        return vec![graph.to_path(contour)];
    };

    // Closed contours are walked once around, starting at the first cut
    let order: Vec<SegId> = if closed {
        let mut order: Vec<SegId> = segments[first_cut..]
            .iter()
            .chain(&segments[..first_cut])
            .copied()
            .collect();
        order.push(segments[first_cut]);
        order
    } else {
        segments
    };

    let mut pieces = Vec::new();
    let mut current: Vec<Segment> = Vec::new();
    for (i, &seg) in order.iter().enumerate() {
        let node = &graph.nodes[seg];
        let segment = Segment::new(node.point, node.handle_in, node.handle_out);
        let last = i + 1 == order.len();
        let cut = (cuts[seg] && i > 0 && !last) || (closed && last);
        current.push(segment);
        if cut {
            pieces.push(finish_piece(std::mem::take(&mut current)));
            current.push(segment);
        }
    }
    if current.len() > 1 {
        pieces.push(finish_piece(current));
    }
    pieces
}

fn finish_piece(mut segments: Vec<Segment>) -> Path {
    if let Some(first) = segments.first_mut() {
        first.handle_in = Point::ZERO;
    }
    if let Some(last) = segments.last_mut() {
        last.handle_out = Point::ZERO;
    }
    Path::from_segments(segments, false)
}
