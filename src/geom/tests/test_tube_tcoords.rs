use crate::geom::{Point3, PolylineSet, TCoordMode, TubeConfig, TubeOptions, generate_tubes};

fn config(mode: TCoordMode, texture_length: f64) -> TubeConfig {
    TubeConfig::new(TubeOptions {
        number_of_sides: 4,
        generate_tcoords: mode,
        texture_length,
        ..Default::default()
    })
    .expect("valid tube options")
}

fn uneven_line() -> PolylineSet {
    PolylineSet::from_points(&[
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.1, 0.0, 0.0),
        Point3::new(0.3, 0.2, 0.0),
        Point3::new(0.7, 0.2, 0.1),
        Point3::new(1.3, 0.9, 0.4),
        Point3::new(1.4, 1.7, 0.4),
    ])
}

#[test]
fn normalized_length_spans_exactly_zero_to_one() {
    let (mesh, _) = generate_tubes(&uneven_line(), &config(TCoordMode::NormalizedLength, 1.0)).unwrap();
    let tcoords = mesh.tcoords.as_ref().expect("tcoords enabled");

    assert_eq!(tcoords.len(), mesh.vertex_count());
    assert!(tcoords[..4].iter().all(|&t| t == 0.0));
    assert!(tcoords[20..].iter().all(|&t| t == 1.0));
    assert!(tcoords.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn normalized_length_ignores_texture_length() {
    let (a, _) = generate_tubes(&uneven_line(), &config(TCoordMode::NormalizedLength, 1.0)).unwrap();
    let (b, _) = generate_tubes(&uneven_line(), &config(TCoordMode::NormalizedLength, 7.5)).unwrap();
    assert_eq!(a.tcoords, b.tcoords);
}

#[test]
fn length_mode_divides_by_texture_length() {
    let lines = PolylineSet::from_points(&[
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.0, 3.0, 0.0),
        Point3::new(4.0, 3.0, 0.0),
    ]);

    let (mesh, _) = generate_tubes(&lines, &config(TCoordMode::Length, 2.0)).unwrap();
    let tcoords = mesh.tcoords.unwrap();

    assert_eq!(tcoords[0], 0.0);
    assert!((tcoords[4] - 1.5).abs() < 1e-12);
    assert!((tcoords[8] - 3.5).abs() < 1e-12);
}

#[test]
fn scalar_mode_follows_scalar_distance() {
    let lines = PolylineSet::from_points(&[
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
    ])
    .with_scalars(vec![10.0, 12.0, 13.0]);

    let (mesh, _) = generate_tubes(&lines, &config(TCoordMode::Scalars, 0.5)).unwrap();
    let tcoords = mesh.tcoords.unwrap();

    let rings: Vec<f64> = tcoords.chunks(4).map(|ring| ring[0]).collect();
    assert_eq!(rings, vec![0.0, 4.0, 6.0]);
    assert!(tcoords.chunks(4).all(|ring| ring.iter().all(|&t| t == ring[0])));
}

#[test]
fn tcoords_off_leaves_buffer_empty() {
    let (mesh, _) = generate_tubes(&uneven_line(), &config(TCoordMode::Off, 1.0)).unwrap();
    assert!(mesh.tcoords.is_none());
}
