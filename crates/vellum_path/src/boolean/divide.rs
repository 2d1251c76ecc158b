//! Division of curves at intersection locations

use rustc_hash::FxHashMap;
use vellum_geom::numerical::CURVETIME_EPSILON;

use super::graph::{Graph, LocId, SegId};

/// Decides per location whether the graph is divided there. It may move the
/// location onto another curve before answering.
pub(crate) type IncludeFn<'a> = dyn FnMut(&mut Graph, LocId) -> bool + 'a;

/// Divides the graph's curves at `locations`, which must be sorted by
/// contour, curve and time.
///
/// Locations are processed from the end, so a curve is always split at its
/// later locations first. Locations still waiting on a split curve get their
/// times rescaled onto the half they now lie on, skipped ones included.
///
/// Curves that had no handles before splitting get their handles cleared
/// again afterwards. With `carry`, the curves to clear are appended to it
/// instead, and the curves already in it count as handle-less.
///
/// Returns the divided locations in order when `include` is given,
/// otherwise all of them.
pub(crate) fn divide(
    graph: &mut Graph,
    locations: &[LocId],
    mut include: Option<&mut IncludeFn<'_>>,
    carry: Option<&mut Vec<SegId>>,
) -> Vec<LocId> {
    let t_min = CURVETIME_EPSILON;
    let t_max = 1.0 - t_min;

    let mut pending: FxHashMap<SegId, Vec<LocId>> = FxHashMap::default();
    for &loc in locations {
        pending.entry(graph.locations[loc].curve).or_default().push(loc);
    }

    let carried: Vec<SegId> = carry.as_deref().cloned().unwrap_or_default();
    let mut clear: Vec<SegId> = Vec::new();
    let mut clear_handles = false;
    let mut prev_curve: Option<SegId> = None;
    let mut results = Vec::new();

    for &loc in locations.iter().rev() {
        let filed_under = graph.locations[loc].curve;
        let excluded = match include.as_mut() {
            Some(include) => !include(graph, loc),
            None => false,
        };
        let curve = graph.locations[loc].curve;
        if curve != filed_under {
            refile(&mut pending, loc, filed_under, curve);
        }
        if excluded {
            continue;
        }
        if let Some(list) = pending.get_mut(&curve) {
            list.retain(|&l| l != loc);
        }
        if include.is_some() {
            results.push(loc);
        }
        if !graph.is_live_curve(curve) {
            continue;
        }
        if prev_curve != Some(curve) {
            let has_handles = graph.curve(curve).map_or(false, |c| c.has_handles());
            clear_handles = !has_handles || carried.contains(&curve);
            prev_curve = Some(curve);
        }

        let time = graph.locations[loc].time;
        let segment = if time < t_min {
            curve
        } else if time > t_max {
            match graph.nodes[curve].next {
                Some(next) => next,
                None => curve,
            }
        } else {
            let Some(node) = graph.split(curve, time) else {
                continue;
            };
            if clear_handles {
                clear.push(curve);
                clear.push(node);
            }
            renormalize(graph, &mut pending, curve, node, time);
            node
        };

        graph.set_segment(loc, segment);
        let dest = graph.locations[loc].other;
        match graph.intersection[segment] {
            Some(inter) => {
                graph.link(inter, dest);
                let mut other = Some(inter);
                while let Some(o) = other {
                    let partner = graph.locations[o].other;
                    graph.link(partner, inter);
                    other = graph.locations[o].next;
                }
            }
            None => graph.intersection[segment] = Some(dest),
        }
    }

    match carry {
        Some(carry) => carry.extend(clear),
        None => {
            for &seg in clear.iter().rev() {
                graph.clear_curve_handles(seg);
            }
        }
    }

    if include.is_some() {
        results.reverse();
        results
    } else {
        locations.to_vec()
    }
}

fn refile(pending: &mut FxHashMap<SegId, Vec<LocId>>, loc: LocId, from: SegId, to: SegId) {
    if let Some(list) = pending.get_mut(&from) {
        list.retain(|&l| l != loc);
    }
    pending.entry(to).or_default().push(loc);
}

/// Moves waiting locations after a split of `curve` at `t` that produced
/// `node`: later ones onto the new curve, earlier ones rescaled in place.
fn renormalize(
    graph: &mut Graph,
    pending: &mut FxHashMap<SegId, Vec<LocId>>,
    curve: SegId,
    node: SegId,
    t: f64,
) {
    let Some(waiting) = pending.remove(&curve) else {
        return;
    };
    let (mut left, mut right) = (Vec::new(), Vec::new());
    for loc in waiting {
        let location = &mut graph.locations[loc];
        if location.time > t {
            location.time = (location.time - t) / (1.0 - t);
            location.curve = node;
            right.push(loc);
        } else {
            location.time /= t;
            left.push(loc);
        }
    }
    if !left.is_empty() {
        pending.insert(curve, left);
    }
    if !right.is_empty() {
        pending.entry(node).or_default().extend(right);
    }
}
