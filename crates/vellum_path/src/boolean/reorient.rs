//! Orientation of non-crossing contours
//!
//! Contours are ranked from the largest to the smallest area. Each one finds
//! its nearest container among the larger ones, sums up the containment
//! winding, and is either dropped (when crossing it does not change whether
//! the area is filled) or turned against its container.

use vellum_geom::numerical::GEOMETRIC_EPSILON;
use vellum_geom::find_bounds_collisions;

use crate::path::Path;

use super::winding::{contains, interior_point};

#[derive(Clone, Copy, Debug)]
struct Entry {
    winding: i32,
    container: Option<usize>,
    exclude: bool,
}

/// Reorients `paths`, which must not cross each other.
///
/// `is_inside` maps a winding number to whether it is filled. `clockwise`
/// sets the orientation of the outermost contours, defaulting to that of
/// the largest one. Kept contours are returned in their original order.
pub(crate) fn reorient_paths(
    mut paths: Vec<Path>,
    is_inside: impl Fn(i32) -> bool,
    clockwise: Option<bool>,
) -> Vec<Path> {
    if paths.is_empty() {
        return paths;
    }
    let mut entries: Vec<Entry> = paths
        .iter()
        .map(|path| Entry {
            winding: if path.is_clockwise() { 1 } else { -1 },
            container: None,
            exclude: false,
        })
        .collect();
    let areas: Vec<f64> = paths.iter().map(|path| path.area().abs()).collect();
    let mut sorted: Vec<usize> = (0..paths.len()).collect();
    sorted.sort_by(|&a, &b| areas[b].total_cmp(&areas[a]));

    let bounds: Vec<[f64; 4]> = sorted.iter().map(|&i| paths[i].bounds().to_ltrb()).collect();
    let collisions = find_bounds_collisions(&bounds, None, false, GEOMETRIC_EPSILON, false, false);
    let clockwise = clockwise.unwrap_or_else(|| paths[sorted[0]].is_clockwise());

    for (rank, &index) in sorted.iter().enumerate() {
        let mut container_winding = 0;
        let mut point = None;
        for &other_rank in collisions[rank].iter().rev() {
            if other_rank >= rank {
                continue;
            }
            let point = *point.get_or_insert_with(|| {
                interior_point(std::slice::from_ref(&paths[index]), false)
            });
            let other = sorted[other_rank];
            if contains(std::slice::from_ref(&paths[other]), point, false) {
                let container = entries[other];
                container_winding = container.winding;
                entries[index].winding += container_winding;
                entries[index].container = if container.exclude {
                    container.container
                } else {
                    Some(other)
                };
                break;
            }
        }
        if is_inside(entries[index].winding) == is_inside(container_winding) {
            entries[index].exclude = true;
        } else {
            let orientation = match entries[index].container {
                Some(container) => !paths[container].is_clockwise(),
                None => clockwise,
            };
            paths[index].set_clockwise(orientation);
        }
    }

    paths
        .into_iter()
        .zip(entries)
        .filter(|(_, entry)| !entry.exclude)
        .map(|(path, _)| path)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn test_hole_is_turned_against_container() {
        let paths = vec![square(20.0, 20.0, 10.0), square(0.0, 0.0, 100.0)];
        let result = reorient_paths(paths, |w| w != 0 && w & 1 == 1, Some(true));
        assert_eq!(result.len(), 2);
        assert!(!result[0].is_clockwise());
        assert!(result[1].is_clockwise());
    }

    #[test]
    fn test_nonzero_drops_same_direction_inner() {
        let paths = vec![square(0.0, 0.0, 100.0), square(20.0, 20.0, 10.0)];
        let result = reorient_paths(paths, |w| w != 0, None);
        assert_eq!(result.len(), 1);
        assert!((result[0].area() - 10000.0).abs() < 1e-9);
    }

    #[test]
    fn test_islands_follow_largest_orientation() {
        let mut small = square(200.0, 0.0, 10.0);
        small.reverse();
        let paths = vec![square(0.0, 0.0, 100.0), small];
        let result = reorient_paths(paths, |w| w != 0, None);
        assert_eq!(result.len(), 2);
        assert!(result[1].is_clockwise());
    }
}
