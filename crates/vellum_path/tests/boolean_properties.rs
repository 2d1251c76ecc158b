use vellum_geom::{Affine, Point};
use vellum_path::{BooleanOptions, FillRule, Path, PathError, PathItem};

fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance * expected.abs().max(1.0),
        "expected {} but got {}",
        expected,
        actual
    );
}

/// Shows the engine's logs for failing tests, filtered by RUST_LOG
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn options() -> BooleanOptions {
    BooleanOptions::default()
}

/// Operand pairs that cross each other in different ways
fn pairs() -> Vec<(&'static str, PathItem, PathItem)> {
    vec![
        (
            "offset squares",
            PathItem::rectangle(0.0, 0.0, 100.0, 100.0),
            PathItem::rectangle(50.0, 50.0, 100.0, 100.0),
        ),
        (
            "square and circle",
            PathItem::rectangle(0.0, 0.0, 100.0, 100.0),
            PathItem::circle(Point::new(110.0, 40.0), 45.0),
        ),
        (
            "two circles",
            PathItem::circle(Point::new(0.0, 0.0), 50.0),
            PathItem::circle(Point::new(40.0, 10.0), 35.0),
        ),
        (
            "cross",
            PathItem::rectangle(0.0, 40.0, 100.0, 20.0),
            PathItem::rectangle(40.0, 0.0, 20.0, 100.0),
        ),
    ]
}

#[test]
fn rectangle_scenario() {
    init_logging();
    let a = PathItem::rectangle(0.0, 0.0, 100.0, 100.0);
    let b = PathItem::rectangle(50.0, 50.0, 100.0, 100.0);
    assert_close(a.unite(&b, &options()).area(), 17500.0, 1e-9);
    assert_close(a.intersect(&b, &options()).area(), 2500.0, 1e-9);
    assert_close(a.subtract(&b, &options()).area(), 7500.0, 1e-9);
}

#[test]
fn unite_with_identical_copy_keeps_area() {
    for item in [
        PathItem::rectangle(0.0, 0.0, 100.0, 100.0),
        PathItem::circle(Point::new(0.0, 0.0), 30.0),
    ] {
        let copy = item.clone();
        let union = item.unite(&copy, &options());
        assert_close(union.area(), item.area(), 1e-6);
    }
}

#[test]
fn inclusion_exclusion() {
    init_logging();
    for (name, a, b) in pairs() {
        let union = a.unite(&b, &options()).area();
        let inter = a.intersect(&b, &options()).area();
        assert!(
            (union - (a.area() + b.area() - inter)).abs() < 1e-3 * union,
            "{}: union {} intersection {}",
            name,
            union,
            inter
        );
    }
}

#[test]
fn difference_and_intersection_make_up_the_operand() {
    for (name, a, b) in pairs() {
        let diff = a.subtract(&b, &options()).area();
        let inter = a.intersect(&b, &options()).area();
        assert!(
            (diff + inter - a.area()).abs() < 1e-3 * a.area(),
            "{}: difference {} intersection {}",
            name,
            diff,
            inter
        );
    }
}

#[test]
fn unite_and_intersect_commute() {
    for (name, a, b) in pairs() {
        let ab = a.unite(&b, &options()).area();
        let ba = b.unite(&a, &options()).area();
        assert!((ab - ba).abs() < 1e-6 * ab, "{}: {} vs {}", name, ab, ba);
        let ab = a.intersect(&b, &options()).area();
        let ba = b.intersect(&a, &options()).area();
        assert!((ab - ba).abs() < 1e-6 * ab.max(1.0), "{}: {} vs {}", name, ab, ba);
    }
}

#[test]
fn exclude_fills_areas_covered_once() {
    let cases = [
        (
            PathItem::rectangle(0.0, 0.0, 100.0, 100.0),
            PathItem::rectangle(50.0, 50.0, 100.0, 100.0),
            [(25.0, 25.0), (75.0, 75.0), (125.0, 125.0), (125.0, 25.0)],
        ),
        (
            PathItem::rectangle(0.0, 40.0, 100.0, 20.0),
            PathItem::rectangle(40.0, 0.0, 20.0, 100.0),
            [(10.0, 50.0), (50.0, 50.0), (50.0, 10.0), (10.0, 10.0)],
        ),
    ];
    for (a, b, [only_a, both, only_b, neither]) in cases {
        let xor = a.exclude(&b, &options());
        assert!(xor.contains(Point::new(only_a.0, only_a.1)));
        assert!(!xor.contains(Point::new(both.0, both.1)));
        assert!(xor.contains(Point::new(only_b.0, only_b.1)));
        assert!(!xor.contains(Point::new(neither.0, neither.1)));
    }
}

#[test]
fn disjoint_operands() {
    let a = PathItem::rectangle(0.0, 0.0, 10.0, 10.0);
    let b = PathItem::rectangle(100.0, 0.0, 10.0, 10.0);
    let union = a.unite(&b, &options());
    assert_eq!(union.children().len(), 2);
    assert_close(union.area(), 200.0, 1e-12);
    assert!(a.intersect(&b, &options()).children().is_empty());
    assert_close(a.subtract(&b, &options()).area(), 100.0, 1e-12);
}

#[test]
fn disjoint_operands_keep_clockwise_results() {
    // The second operand is the larger one, so it ranks first when the
    // contours are reoriented.
    let a = PathItem::rectangle(0.0, 0.0, 10.0, 10.0);
    let b = PathItem::rectangle(100.0, 0.0, 50.0, 50.0);
    let diff = a.subtract(&b, &options());
    let inter = a.intersect(&b, &options());
    assert_close(diff.area(), 100.0, 1e-12);
    assert!(inter.children().is_empty());
    assert_close(diff.area() + inter.area(), a.area(), 1e-12);

    let xor = a.exclude(&b, &options());
    assert_close(xor.area(), 2600.0, 1e-12);
    assert!(xor.children().iter().all(|path| path.is_clockwise()));
    assert_close(b.subtract(&a, &options()).area(), 2500.0, 1e-12);
}

#[test]
fn empty_operands() {
    let empty = PathItem::new();
    let rect = PathItem::rectangle(0.0, 0.0, 10.0, 10.0);
    assert_close(empty.unite(&rect, &options()).area(), 100.0, 1e-12);
    assert_close(rect.unite(&empty, &options()).area(), 100.0, 1e-12);
    assert_close(rect.subtract(&empty, &options()).area(), 100.0, 1e-12);
    assert_close(rect.exclude(&empty, &options()).area(), 100.0, 1e-12);
    assert_close(empty.exclude(&rect, &options()).area(), 100.0, 1e-12);
    assert!(empty.subtract(&rect, &options()).children().is_empty());
    assert!(empty.intersect(&rect, &options()).children().is_empty());
    assert!(rect.intersect(&empty, &options()).children().is_empty());
}

#[test]
fn excluding_a_larger_container_leaves_a_ring() {
    let small = PathItem::rectangle(40.0, 40.0, 20.0, 20.0);
    let large = PathItem::rectangle(0.0, 0.0, 100.0, 100.0);
    let ring = small.exclude(&large, &options());
    assert_eq!(ring.children().len(), 2);
    assert_close(ring.area(), 9600.0, 1e-12);
    assert!(!ring.contains(Point::new(50.0, 50.0)));
    assert!(ring.contains(Point::new(10.0, 10.0)));
    assert!(small.subtract(&large, &options()).children().is_empty());
}

#[test]
fn subtracting_a_contained_square_leaves_a_hole() {
    let outer = PathItem::rectangle(0.0, 0.0, 100.0, 100.0);
    let inner = PathItem::rectangle(25.0, 25.0, 50.0, 50.0);
    let ring = outer.subtract(&inner, &options());
    assert_eq!(ring.children().len(), 2);
    assert_close(ring.area(), 7500.0, 1e-12);
    assert!(!ring.contains(Point::new(50.0, 50.0)));
    assert!(ring.contains(Point::new(10.0, 50.0)));
    assert_close(outer.intersect(&inner, &options()).area(), 2500.0, 1e-12);
}

#[test]
fn transforms_are_applied_before_the_operation() {
    let a = PathItem::rectangle(0.0, 0.0, 100.0, 100.0);
    let mut b = PathItem::rectangle(0.0, 0.0, 100.0, 100.0);
    b.transform(&Affine::translation(50.0, 50.0));
    assert_close(a.unite(&b, &options()).area(), 17500.0, 1e-9);
}

#[test]
fn rectangle_winding() {
    let rect = PathItem::rectangle(0.0, 0.0, 1.0, 1.0);
    assert!(rect.is_clockwise());
    assert_eq!(rect.winding_at(Point::new(0.5, 0.5)).winding, 1);
    assert_eq!(rect.winding_at(Point::new(1.5, 0.5)).winding, 0);
    assert_eq!(rect.winding_at(Point::new(0.5, -3.0)).winding, 0);
}

#[test]
fn figure_eight_resolves_into_two_loops() {
    init_logging();
    let mut eight = PathItem::from_path(Path::from_points(
        [
            Point::new(0.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(100.0, 0.0),
            Point::new(0.0, 100.0),
        ],
        true,
    ));
    eight.resolve_crossings();
    assert_eq!(eight.children().len(), 2);
    for loop_path in eight.children() {
        assert!(loop_path.area().abs() > 1.0);
    }
}

#[test]
fn even_odd_operands_are_reoriented() {
    let mut a = PathItem::from_svg_path_data("M0,0h100v100h-100z M25,25h50v50h-50z").unwrap();
    a.set_fill_rule(FillRule::EvenOdd);
    let b = PathItem::rectangle(200.0, 0.0, 10.0, 10.0);
    let union = a.unite(&b, &options());
    assert_close(union.area(), 7600.0, 1e-12);
    assert_eq!(union.fill_rule(), FillRule::EvenOdd);
}

#[test]
fn split_mode_cuts_outlines() {
    let a = PathItem::rectangle(0.0, 0.0, 100.0, 100.0);
    let b = PathItem::rectangle(50.0, 50.0, 100.0, 100.0);
    let split = BooleanOptions {
        trace: false,
        ..BooleanOptions::default()
    };
    let outside = a.subtract(&b, &split);
    assert!(outside.children().iter().all(|path| !path.is_closed()));
    assert_close(outside.length(), 300.0, 1e-9);
}

#[test]
fn interpolation_requires_matching_structure() {
    let a = PathItem::rectangle(0.0, 0.0, 10.0, 10.0);
    let b = PathItem::from_svg_path_data("M0,0h10v10h-10z M20,20h5v5z").unwrap();
    let err = PathItem::interpolate(&a, &b, 0.5).unwrap_err();
    assert!(matches!(err, PathError::InterpolationMismatch { .. }));
    assert!(err.to_string().starts_with("Invalid operands in interpolate"));
}

#[test]
fn svg_round_trip() {
    let data = "M10,10h80v80h-80z";
    let item = PathItem::from_svg_path_data(data).unwrap();
    assert_eq!(item.to_svg_path_data(3), data);
    assert_close(item.area(), 6400.0, 1e-12);
}

#[test]
fn boolean_result_serializes() {
    let a = PathItem::rectangle(0.0, 0.0, 100.0, 100.0);
    let b = PathItem::rectangle(50.0, 50.0, 100.0, 100.0);
    let union = a.unite(&b, &options());
    let json = serde_json::to_string(&union).unwrap();
    let back: PathItem = serde_json::from_str(&json).unwrap();
    assert!(back.compare(&union));
}
