//! Integration tests: datasets written to disk with `SofaWriter` and read
//! back with `SofaReader`.

use ndarray::{arr1, Array3};
use sofa_format::{Axis, Dataset, FormatError, Selection, SofaReader, SofaWriter};

fn measurement_set() -> Dataset {
    let mut ds = Dataset::new();
    ds.create_dimension(Axis::I, 1).unwrap();
    ds.create_dimension(Axis::C, 3).unwrap();
    ds.create_dimension(Axis::M, 3).unwrap();
    ds.create_dimension(Axis::R, 2).unwrap();
    ds.create_dimension(Axis::N, 8).unwrap();

    let ir = Array3::from_shape_fn((3, 2, 8), |(m, r, n)| (m * 100 + r * 10 + n) as f64 * 0.5);
    ds.create_variable("Data.IR", &[Axis::M, Axis::R, Axis::N])
        .unwrap();
    ds.set_values("Data.IR", ir.into_dyn().view(), &Selection::new(), None, &[])
        .unwrap();

    ds.create_variable("Data.SamplingRate", &[Axis::I])
        .unwrap()
        .set_attribute("Units", "hertz");
    ds.set_values(
        "Data.SamplingRate",
        arr1(&[44100.0]).into_dyn().view(),
        &Selection::new(),
        None,
        &[],
    )
    .unwrap();

    ds.create_variable("ListenerView", &[Axis::I, Axis::C])
        .unwrap();
    ds.set_values(
        "ListenerView",
        arr1(&[0.0, 1.0, 0.0]).into_dyn().view(),
        &Selection::new(),
        Some(&[Axis::C]),
        &[Axis::I],
    )
    .unwrap();

    let metadata = ds.metadata_mut();
    metadata.set("SOFAConventions", "GeneralFIR");
    metadata.set("Title", "Three measurements, two ears");
    ds
}

#[test]
fn test_values_survive_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("set.sofa");
    let original = measurement_set();
    SofaWriter::write(&original, &path).unwrap();

    let back = SofaReader::open(&path).unwrap().into_dataset();
    assert_eq!(back.dimensions(), original.dimensions());
    assert_eq!(back.metadata(), original.metadata());
    assert_eq!(back.variable_names(), original.variable_names());
    for variable in original.variables() {
        let read = back.variable(variable.name()).unwrap();
        assert_eq!(read.dims(), variable.dims());
        assert_eq!(read.data(), variable.data());
        assert_eq!(read.attributes(), variable.attributes());
    }
}

#[test]
fn test_scalar_axis_alias_after_reading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("set.sofa");
    SofaWriter::write(&measurement_set(), &path).unwrap();

    let back = SofaReader::open(&path).unwrap().into_dataset();
    let views = back
        .get_values("ListenerView", &Selection::new(), Some(&[Axis::M, Axis::C]))
        .unwrap();
    assert_eq!(views.shape(), &[3, 3]);
    for m in 0..3 {
        assert_eq!(views[[m, 1]], 1.0);
    }

    let ir = back
        .get_values(
            "Data.IR",
            &Selection::new().at(Axis::M, 2).at(Axis::R, 1),
            None,
        )
        .unwrap();
    assert_eq!(ir.shape(), &[8]);
    assert_eq!(ir[[3]], (200 + 10 + 3) as f64 * 0.5);
}

#[test]
fn test_flipped_byte_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("set.sofa");
    SofaWriter::write(&measurement_set(), &path).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    bytes[40] ^= 0xFF;
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        SofaReader::open(&path),
        Err(FormatError::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        SofaReader::open(&dir.path().join("absent.sofa")),
        Err(FormatError::Io(_))
    ));
}
