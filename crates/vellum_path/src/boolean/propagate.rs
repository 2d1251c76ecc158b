//! Winding propagation along curve chains
//!
//! The winding contribution cannot change between two intersections, so it
//! is sampled once per chain and copied onto every segment of it.

use std::f64::consts::FRAC_1_SQRT_2;

use vellum_geom::numerical::clamp;
use vellum_geom::{AxisCollisions, Cubic};

use super::graph::{Graph, Operand, SegId};
use super::winding::{self, graph_index, Candidates, CurveTable, Winding};
use super::Operator;

/// Curve tables the propagator samples against
pub(crate) struct WindingContext {
    /// All curves of both operands
    pub table: CurveTable,
    pub index_of: Vec<Option<usize>>,
    pub collisions: Vec<AxisCollisions>,
    /// Per operand tables used while subtracting: `[first, second]`
    pub operands: Option<[CurveTable; 2]>,
}

impl WindingContext {
    pub fn new(graph: &Graph, operator: Operator, two_operands: bool) -> Self {
        let (table, index_of) = CurveTable::from_graph(graph, |_| true);
        let collisions = vellum_geom::find_curve_bounds_collisions_both_axes(table.curves(), 0.0);
        let operands = (operator == Operator::Subtract && two_operands).then(|| {
            [
                CurveTable::from_graph(graph, |o| o == Operand::First).0,
                CurveTable::from_graph(graph, |o| o == Operand::Second).0,
            ]
        });
        Self {
            table,
            index_of,
            collisions,
            operands,
        }
    }
}

struct Link {
    segment: SegId,
    values: Cubic,
    length: f64,
}

/// Determines the winding of the chain starting at `start` and stores it on
/// each of its segments
pub(crate) fn propagate(graph: &mut Graph, start: SegId, context: &WindingContext) {
    let mut chain: Vec<Link> = Vec::new();
    let mut total_length = 0.0;
    let mut segment = Some(start);
    while let Some(seg) = segment {
        if let Some(values) = graph.curve(seg) {
            let length = values.length();
            chain.push(Link {
                segment: seg,
                values,
                length,
            });
            total_length += length;
        }
        segment = graph.nodes[seg]
            .next
            .filter(|&next| graph.intersection[next].is_none() && next != start);
    }

    let t_min = 1e-3;
    let t_max = 1.0 - t_min;
    let mut best = Winding {
        quality: -1.0,
        ..Winding::default()
    };
    for offset in [0.5, 0.25, 0.75] {
        if best.quality >= 0.5 {
            break;
        }
        let mut length = total_length * offset;
        for link in &chain {
            if length <= link.length {
                let t = clamp(link.values.time_at(length, None).unwrap_or(0.0), t_min, t_max);
                let point = link.values.point_at(t);
                let vertical = link.values.tangent_at(t).y.abs() < FRAC_1_SQRT_2;
                let operand = graph.contours[graph.nodes[link.segment].contour].operand;
                let mut wind = None;
                if let Some([first, second]) = &context.operands {
                    let other = match operand {
                        Operand::First => second,
                        Operand::Second => first,
                    };
                    let all = other.all();
                    let path_winding =
                        winding::winding(other, point, Candidates::List(&all), vertical, true);
                    let omit = match operand {
                        Operand::First => path_winding.winding != 0,
                        Operand::Second => path_winding.winding == 0,
                    };
                    if omit {
                        if path_winding.quality < 1.0 {
                            // Too close to call, sample the next curve
                            continue;
                        }
                        wind = Some(Winding {
                            quality: 1.0,
                            ..Winding::default()
                        });
                    }
                }
                let wind = match wind {
                    Some(wind) => wind,
                    None => match graph_index(&context.index_of, link.segment) {
                        Some(index) => winding::winding(
                            &context.table,
                            point,
                            Candidates::Axes(&context.collisions[index]),
                            vertical,
                            true,
                        ),
                        None => Winding::default(),
                    },
                };
                if wind.quality > best.quality {
                    best = wind;
                }
                break;
            }
            length -= link.length;
        }
    }
    for link in &chain {
        graph.winding[link.segment] = Some(best);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boolean::divide::divide;
    use crate::intersection::Include;
    use crate::path::Path;
    use vellum_geom::Point;

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
    fn test_chains_inside_other_operand_wind_twice() {
        let mut graph = Graph::new();
        graph.add_paths(&[square(0.0, 0.0, 100.0)], Operand::First);
        graph.add_paths(&[square(50.0, 50.0, 100.0)], Operand::Second);
        let found = graph.intersections(false, Include::CrossingsOrOverlaps);
        divide(&mut graph, &found.locations, None, None);
        let context = WindingContext::new(&graph, Operator::Unite, true);
        for seg in graph.segments() {
            if graph.winding[seg].is_none() {
                propagate(&mut graph, seg, &context);
            }
        }
        for seg in graph.segments() {
            let Some(next) = graph.nodes[seg].next else {
                continue;
            };
            let mid = graph.nodes[seg].point.lerp(graph.nodes[next].point, 0.5);
            let w = graph.winding[seg].unwrap();
            let inside_first = mid.x > 0.0 && mid.x < 100.0 && mid.y > 0.0 && mid.y < 100.0;
            let inside_second = mid.x > 50.0 && mid.x < 150.0 && mid.y > 50.0 && mid.y < 150.0;
            let expected = if inside_first || inside_second { 2 } else { 1 };
            assert_eq!(w.winding, expected, "segment at {:?}", graph.nodes[seg].point);
        }
    }

    /// Rectangle 100 by 50 starting in the middle of its top edge, so half
    /// its length ends in the middle of the bottom edge
    fn notched_start() -> Path {
        Path::from_points(
            [
                Point::new(50.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(100.0, 50.0),
                Point::new(0.0, 50.0),
                Point::new(0.0, 0.0),
            ],
            true,
        )
    }

    #[test]
    fn test_low_quality_sample_is_retried_along_the_chain() {
        let mut graph = Graph::new();
        graph.add_paths(&[notched_start()], Operand::First);
        let context = WindingContext::new(&graph, Operator::Unite, false);

        // The vertical ray from the middle of the bottom edge runs through
        // the contour's first node.
        let all = context.table.all();
        let middle = winding::winding(
            &context.table,
            Point::new(50.0, 50.0),
            Candidates::List(&all),
            true,
            true,
        );
        assert!(middle.quality < 0.5);

        propagate(&mut graph, 0, &context);
        for seg in graph.contour_segments(0) {
            let w = graph.winding[seg].unwrap();
            assert_eq!(w.winding, 1);
            assert!((w.quality - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_uncertain_omission_samples_the_next_curve() {
        let mut graph = Graph::new();
        graph.add_paths(&[notched_start()], Operand::First);
        // The slanted edge runs through the middle of the bottom edge
        let wedge = Path::from_points(
            [Point::new(40.0, 40.0), Point::new(60.0, 60.0), Point::new(60.0, 40.0)],
            true,
        );
        graph.add_paths(&[wedge], Operand::Second);
        let context = WindingContext::new(&graph, Operator::Subtract, true);

        // Right on the wedge's outline the omission is not trusted. The next
        // curve is sampled near (0, 0), well outside the wedge.
        propagate(&mut graph, 0, &context);
        for seg in graph.contour_segments(0) {
            let w = graph.winding[seg].unwrap();
            assert_eq!(w.winding, 1);
            assert!(w.quality < 1.0);
        }
    }

    #[test]
    fn test_subtract_omits_first_operand_inside_second() {
        let mut graph = Graph::new();
        graph.add_paths(&[square(0.0, 0.0, 100.0)], Operand::First);
        let mut second = square(50.0, 50.0, 100.0);
        second.reverse();
        graph.add_paths(&[second], Operand::Second);
        let found = graph.intersections(false, Include::CrossingsOrOverlaps);
        divide(&mut graph, &found.locations, None, None);
        let context = WindingContext::new(&graph, Operator::Subtract, true);
        for seg in graph.contour_segments(0) {
            if graph.winding[seg].is_none() {
                propagate(&mut graph, seg, &context);
            }
        }
        for seg in graph.contour_segments(0) {
            let next = graph.nodes[seg].next.unwrap();
            let mid = graph.nodes[seg].point.lerp(graph.nodes[next].point, 0.5);
            let inside_second = mid.x > 50.0 && mid.y > 50.0;
            let w = graph.winding[seg].unwrap();
            assert_eq!(w.winding, if inside_second { 0 } else { 1 });
        }
    }
}
