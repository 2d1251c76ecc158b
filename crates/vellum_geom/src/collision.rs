//! Bounds collision index
//!
//! Sweep-and-prune overlap queries over axis-aligned bounding boxes. Bounds
//! are `[left, top, right, bottom]` arrays. The sweep runs along the primary
//! axis with an active list kept sorted by the upper bound, so each query is
//! close to `O((n + k) log n)` for `k` reported pairs.

use crate::curve::Cubic;

/// Collisions of one curve with others, split by the sweep axis
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AxisCollisions {
    /// Indices whose horizontal extent overlaps; candidates for a vertical ray
    pub horizontal: Vec<usize>,
    /// Indices whose vertical extent overlaps; candidates for a horizontal ray
    pub vertical: Vec<usize>,
}

/// Finds collisions between two sets of bounding rectangles.
///
/// With `bounds_b == None` the collisions within `bounds_a` are returned, and
/// `include_self` decides whether each entry lists its own index. The result
/// has one sorted index list per entry of `bounds_a`.
///
/// `sweep_vertical` sweeps along y instead of x. With `only_sweep_axis` no
/// check is done on the secondary axis.
pub fn find_bounds_collisions(
    bounds_a: &[[f64; 4]],
    bounds_b: Option<&[[f64; 4]]>,
    include_self: bool,
    tolerance: f64,
    sweep_vertical: bool,
    only_sweep_axis: bool,
) -> Vec<Vec<usize>> {
    let own = bounds_b.is_none();
    let all_bounds: Vec<[f64; 4]> = match bounds_b {
        None => bounds_a.to_vec(),
        Some(b) => bounds_a.iter().chain(b.iter()).copied().collect(),
    };
    let length_a = bounds_a.len();
    let length_all = all_bounds.len();

    // Rightmost index whose `coord` is below `value`, or -1
    let search = |indices: &[usize], coord: usize, value: f64| -> isize {
        let mut lo = 0usize;
        let mut hi = indices.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            if all_bounds[indices[mid]][coord] < value {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo as isize - 1
    };

    let pri0 = if sweep_vertical { 1 } else { 0 };
    let pri1 = pri0 + 2;
    let sec0 = if sweep_vertical { 0 } else { 1 };
    let sec1 = sec0 + 2;

    let mut by_pri0: Vec<usize> = (0..length_all).collect();
    by_pri0.sort_by(|&i1, &i2| all_bounds[i1][pri0].total_cmp(&all_bounds[i2][pri0]));

    let mut active: Vec<usize> = Vec::new();
    let mut all_collisions: Vec<Vec<usize>> = vec![Vec::new(); length_a];

    for &cur_index in &by_pri0 {
        let cur_bounds = all_bounds[cur_index];
        let orig_index = if own { cur_index } else { cur_index.wrapping_sub(length_a) };
        let is_current_a = cur_index < length_a;
        let is_current_b = own || !is_current_a;
        let mut cur_collisions: Vec<usize> = Vec::new();

        if !active.is_empty() {
            let prune = (search(&active, pri1, cur_bounds[pri0] - tolerance) + 1) as usize;
            active.drain(..prune);
            if own && only_sweep_axis {
                cur_collisions.extend(active.iter().copied());
                for &active_index in &active {
                    all_collisions[active_index].push(orig_index);
                }
            } else {
                let cur_sec0 = cur_bounds[sec0];
                let cur_sec1 = cur_bounds[sec1];
                for &active_index in &active {
                    let active_bounds = all_bounds[active_index];
                    let is_active_a = active_index < length_a;
                    let is_active_b = own || active_index >= length_a;
                    let paired = is_current_a && is_active_b || is_current_b && is_active_a;
                    if only_sweep_axis
                        || paired
                            && cur_sec1 >= active_bounds[sec0] - tolerance
                            && cur_sec0 <= active_bounds[sec1] + tolerance
                    {
                        if is_current_a && is_active_b {
                            cur_collisions.push(if own {
                                active_index
                            } else {
                                active_index - length_a
                            });
                        }
                        if is_current_b && is_active_a {
                            all_collisions[active_index].push(orig_index);
                        }
                    }
                }
            }
        }
        if is_current_a {
            if own && include_self {
                cur_collisions.push(cur_index);
            }
            all_collisions[cur_index] = cur_collisions;
        }
        if active.is_empty() {
            active.push(cur_index);
        } else {
            let index = search(&active, pri1, cur_bounds[pri1]);
            active.insert((index + 1) as usize, cur_index);
        }
    }

    for collisions in &mut all_collisions {
        collisions.sort_unstable();
    }
    all_collisions
}

fn curve_bounds(curves: &[Cubic]) -> Vec<[f64; 4]> {
    curves.iter().map(Cubic::control_bounds).collect()
}

/// Collisions between the control bounds of curves. These broad bounds are
/// cheap and always contain the curve. `curves2 == None` compares `curves1`
/// with itself, each entry including its own index.
pub fn find_curve_bounds_collisions(
    curves1: &[Cubic],
    curves2: Option<&[Cubic]>,
    tolerance: f64,
) -> Vec<Vec<usize>> {
    let bounds1 = curve_bounds(curves1);
    match curves2 {
        None => find_bounds_collisions(&bounds1, None, true, tolerance, false, false),
        Some(curves2) => {
            let bounds2 = curve_bounds(curves2);
            find_bounds_collisions(&bounds1, Some(&bounds2), false, tolerance, false, false)
        }
    }
}

/// Collisions of curves with each other along each sweep axis separately.
/// The winding calculator uses these to limit the curves tested by a ray
/// cast from a point on a given curve.
pub fn find_curve_bounds_collisions_both_axes(
    curves: &[Cubic],
    tolerance: f64,
) -> Vec<AxisCollisions> {
    let bounds = curve_bounds(curves);
    let horizontal = find_bounds_collisions(&bounds, None, true, tolerance, false, true);
    let vertical = find_bounds_collisions(&bounds, None, true, tolerance, true, true);
    horizontal
        .into_iter()
        .zip(vertical)
        .map(|(horizontal, vertical)| AxisCollisions {
            horizontal,
            vertical,
        })
        .collect()
}
