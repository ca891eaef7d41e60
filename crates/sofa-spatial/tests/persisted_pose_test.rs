//! Integration tests: poses written through the container and resolved
//! after reading back.

use approx::assert_relative_eq;
use ndarray::{arr1, arr2};
use sofa_format::{Axis, Dataset, Selection, SofaReader, SofaWriter};
use sofa_spatial::{pose, AngleUnit, Coordinates, Descriptor, ObjectKind, Query, System};

/// Listener turned to face +y, ears at ±9 cm, one source per measurement.
fn turned_head() -> Dataset {
    let mut ds = Dataset::new();
    ds.create_dimension(Axis::I, 1).unwrap();
    ds.create_dimension(Axis::C, 3).unwrap();
    ds.create_dimension(Axis::M, 2).unwrap();
    ds.create_dimension(Axis::R, 2).unwrap();

    for (descriptor, v) in [
        (Descriptor::Position, [0.0, 0.0, 0.0]),
        (Descriptor::View, [0.0, 1.0, 0.0]),
        (Descriptor::Up, [0.0, 0.0, 1.0]),
    ] {
        let coords = Coordinates::new(ObjectKind::Listener, descriptor);
        coords.initialize(&mut ds, false).unwrap();
        coords
            .set_values(
                &mut ds,
                arr1(&v).into_dyn().view(),
                &Selection::new(),
                Some(&[Axis::C]),
                &[Axis::I],
                None,
                None,
            )
            .unwrap();
    }

    let ears = Coordinates::new(ObjectKind::Receiver, Descriptor::Position);
    ears.initialize(&mut ds, false).unwrap();
    ears.set_values(
        &mut ds,
        arr2(&[[0.0, 0.09, 0.0], [0.0, -0.09, 0.0]]).into_dyn().view(),
        &Selection::new(),
        Some(&[Axis::R, Axis::C]),
        &[Axis::I],
        None,
        None,
    )
    .unwrap();

    let source = Coordinates::new(ObjectKind::Source, Descriptor::Position);
    source.initialize(&mut ds, true).unwrap();
    source.set_system(&mut ds, System::Spherical, None).unwrap();
    source
        .set_values(
            &mut ds,
            arr2(&[[0.0, 0.0, 1.5], [90.0, 0.0, 1.5]]).into_dyn().view(),
            &Selection::new(),
            None,
            &[],
            None,
            None,
        )
        .unwrap();
    ds
}

fn reopen(ds: &Dataset) -> Dataset {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("turned.sofa");
    SofaWriter::write(ds, &path).unwrap();
    SofaReader::open(&path).unwrap().into_dataset()
}

#[test]
fn test_receiver_pose_survives_round_trip() {
    let ds = reopen(&turned_head());
    let p = pose(
        &ds,
        ObjectKind::Receiver,
        &Query::new().with_dim_order(&[Axis::R, Axis::M, Axis::C]),
    )
    .unwrap();

    assert_eq!(p.position.shape(), &[2, 2, 3]);
    // Facing +y, the left ear sits at -x.
    assert_relative_eq!(p.position[[0, 1, 0]], -0.09, epsilon = 1e-12);
    assert_relative_eq!(p.position[[1, 0, 0]], 0.09, epsilon = 1e-12);
    // Receivers without their own view inherit the listener's.
    assert_relative_eq!(p.view[[1, 1, 1]], 1.0, epsilon = 1e-12);
}

#[test]
fn test_source_seen_from_turned_listener() {
    let ds = reopen(&turned_head());
    let source = Coordinates::new(ObjectKind::Source, Descriptor::Position);
    let seen = source
        .relative_values(&ds, Some(ObjectKind::Listener), &Query::new())
        .unwrap();

    // Stored spherical in degrees; output keeps both.
    assert_eq!(seen.shape(), &[2, 3]);
    assert_relative_eq!(seen[[0, 0]], -90.0, epsilon = 1e-9);
    assert_relative_eq!(seen[[1, 0]], 0.0, epsilon = 1e-9);
    assert_relative_eq!(seen[[1, 2]], 1.5, epsilon = 1e-12);
}

#[test]
fn test_pose_defaults_to_radians() {
    let ds = turned_head();
    let p = pose(
        &ds,
        ObjectKind::Listener,
        &Query::new()
            .with_selection(Selection::new().at(Axis::M, 0))
            .with_system(System::Spherical),
    )
    .unwrap();
    assert_eq!(p.view.shape(), &[3]);
    assert_relative_eq!(p.view[[0]], std::f64::consts::FRAC_PI_2, epsilon = 1e-12);

    let degrees = pose(
        &ds,
        ObjectKind::Listener,
        &Query::new()
            .with_selection(Selection::new().at(Axis::M, 0))
            .with_system(System::Spherical)
            .with_angle_unit(AngleUnit::Degree),
    )
    .unwrap();
    assert_relative_eq!(degrees.view[[0]], 90.0, epsilon = 1e-9);
}

#[test]
fn test_representation_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&System::Spherical).unwrap(), "\"spherical\"");
    assert_eq!(
        serde_json::from_str::<AngleUnit>("\"radian\"").unwrap(),
        AngleUnit::Radian
    );
}
