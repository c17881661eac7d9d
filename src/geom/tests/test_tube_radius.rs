use crate::geom::{
    Point3, PolylineSet, PolylineSource, TubeConfig, TubeMesh, TubeOptions, VaryRadius,
    generate_tubes,
};

const SIDES: usize = 6;

fn straight_line(count: usize) -> PolylineSet {
    let points: Vec<Point3> = (0..count).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
    PolylineSet::from_points(&points)
}

/// Distance of every vertex of ring `ring` from its point.
fn ring_radii(mesh: &TubeMesh, lines: &PolylineSet, ring: usize) -> Vec<f64> {
    let center = lines.point(ring);
    (0..SIDES)
        .map(|k| Point3::from_array(mesh.positions[ring * SIDES + k]).distance_to(center))
        .collect()
}

fn config(vary_radius: VaryRadius, radius: f64, radius_factor: f64) -> TubeConfig {
    TubeConfig::new(TubeOptions {
        radius,
        radius_factor,
        vary_radius,
        number_of_sides: SIDES,
        ..Default::default()
    })
    .expect("valid tube options")
}

#[test]
fn radius_by_scalar_is_linear_in_scalar() {
    let scalars = vec![0.0, 1.0, 2.0, 3.0, 4.0];
    let lines = straight_line(5).with_scalars(scalars.clone());
    let cfg = config(VaryRadius::ByScalar, 1.0, 5.0);

    let (mesh, diag) = generate_tubes(&lines, &cfg).unwrap();

    assert!(diag.is_clean());
    for (ring, s) in scalars.iter().enumerate() {
        for r in ring_radii(&mesh, &lines, ring) {
            assert!((r - (1.0 + s)).abs() < 1e-12, "ring {ring}: radius {r}");
        }
    }
    // Input scalars are carried onto the output points.
    let point_scalars = mesh.point_scalars.as_ref().expect("scalars copied");
    assert_eq!(point_scalars[3 * SIDES], 3.0);
}

#[test]
fn radius_by_scalar_uses_each_lines_own_range() {
    let mut lines = PolylineSet::new();
    lines.push_polyline(&[Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)]);
    lines.push_polyline(&[Point3::new(0.0, 5.0, 0.0), Point3::new(1.0, 5.0, 0.0)]);
    let lines = lines.with_scalars(vec![0.0, 1.0, 100.0, 200.0]);
    let cfg = config(VaryRadius::ByScalar, 0.5, 3.0);

    let (mesh, _) = generate_tubes(&lines, &cfg).unwrap();

    let last_ring_of = |line: usize| {
        let index = (2 * line + 1) * SIDES;
        Point3::from_array(mesh.positions[index]).distance_to(lines.point(2 * line + 1))
    };
    assert!((last_ring_of(0) - 1.5).abs() < 1e-12);
    assert!((last_ring_of(1) - 1.5).abs() < 1e-12);
}

#[test]
fn zero_scalar_range_is_noted() {
    let lines = straight_line(3).with_scalars(vec![2.0; 3]);
    let cfg = config(VaryRadius::ByScalar, 0.25, 4.0);

    let (mesh, diag) = generate_tubes(&lines, &cfg).unwrap();

    assert!(diag.has_warnings());
    assert!(diag.warnings[0].starts_with("line 0:"));
    for r in ring_radii(&mesh, &lines, 1) {
        assert!((r - 0.25).abs() < 1e-12);
    }
}

#[test]
fn radius_by_vector_conserves_flux() {
    let speeds = [1.0, 2.0, 4.0, 8.0];
    let lines = straight_line(4).with_vectors(speeds.iter().map(|s| [*s, 0.0, 0.0]).collect());
    let cfg = config(VaryRadius::ByVector, 0.1, 10.0);

    let (mesh, _) = generate_tubes(&lines, &cfg).unwrap();

    let expected_flux = 0.1 * 0.1 * 8.0;
    for (ring, speed) in speeds.iter().enumerate() {
        for r in ring_radii(&mesh, &lines, ring) {
            assert!((r * r * speed - expected_flux).abs() < 1e-12, "ring {ring}: radius {r}");
        }
    }
}

#[test]
fn radius_by_absolute_scalar_is_clamped() {
    let lines = straight_line(4).with_scalars(vec![-0.1, 0.75, -1.5, 30.0]);
    let cfg = config(VaryRadius::ByAbsoluteScalar, 0.5, 4.0);

    let (mesh, _) = generate_tubes(&lines, &cfg).unwrap();

    for (ring, expected) in [0.5, 0.75, 1.5, 2.0].into_iter().enumerate() {
        for r in ring_radii(&mesh, &lines, ring) {
            assert!((r - expected).abs() < 1e-12, "ring {ring}: radius {r}");
        }
    }
}

#[test]
fn every_mode_stays_within_bounds() {
    let lines = straight_line(6)
        .with_scalars(vec![-3.0, 0.0, 0.2, 7.0, 1.0, 2.0])
        .with_vectors(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 50.0, 0.0], [0.1, 0.1, 0.1], [2.0, 0.0, 0.0], [0.0, 0.0, 3.0]]);

    for mode in VaryRadius::ALL {
        let cfg = config(mode, 0.2, 3.0);
        let (mesh, _) = generate_tubes(&lines, &cfg).unwrap();
        for ring in 0..6 {
            for r in ring_radii(&mesh, &lines, ring) {
                assert!(r >= 0.2 - 1e-12 && r <= 0.6 + 1e-12, "{mode}: radius {r}");
            }
        }
    }
}
