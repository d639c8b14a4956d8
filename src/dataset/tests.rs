use approx::assert_abs_diff_eq;

use super::*;

fn small_dataset() -> Dataset {
    let mut ds = Dataset::default();
    ds.insert_var(
        "DATA",
        Variable::new(
            &[Dim::Row, Dim::Chan, Dim::Pol],
            Array3::from_shape_fn((3, 2, 2), |(r, c, p)| {
                c32::new(r as f32, (c * 2 + p) as f32)
            }),
        ),
    )
    .unwrap();
    ds.insert_var(
        "ANTENNA1",
        Variable::new(&[Dim::Row], array![0, 0, 1]),
    )
    .unwrap();
    ds.insert_coord("chan", Variable::new(&[Dim::Chan], array![1.0e9, 1.1e9]))
        .unwrap();
    ds
}

#[test]
fn test_dims_are_registered_in_order() {
    let ds = small_dataset();
    let dims: Vec<(Dim, usize)> = ds.dims().iter().map(|(&d, &l)| (d, l)).collect();
    assert_eq!(dims, vec![(Dim::Row, 3), (Dim::Chan, 2), (Dim::Pol, 2)]);
    assert_eq!(ds.dim_len(Dim::UvwIndex), None);
}

#[test]
fn test_mismatched_variables_are_rejected() {
    let mut ds = small_dataset();
    let result = ds.insert_var("ANTENNA2", Variable::new(&[Dim::Row], array![0, 1]));
    assert!(matches!(
        result,
        Err(DatasetError::DimLenMismatch {
            dim: Dim::Row,
            got: 2,
            expected: 3,
            ..
        })
    ));

    let result = ds.insert_var("UVW", Variable::new(&[Dim::Row], Array2::<f64>::zeros((3, 3))));
    assert!(matches!(result, Err(DatasetError::DimCountMismatch { .. })));

    let mut bad_mask = Variable::new(&[Dim::Row], array![1.0, 2.0, 3.0]);
    bad_mask.mask = Some(ArrayD::from_elem(IxDyn(&[2]), false));
    assert!(matches!(
        ds.insert_var("TIME", bad_mask),
        Err(DatasetError::MaskShape(_))
    ));
}

#[test]
fn test_get_prefers_data_vars() {
    let mut ds = small_dataset();
    assert!(ds.contains("chan"));
    assert!(ds.data_var("chan").is_none());
    ds.insert_var("chan", Variable::new(&[Dim::Chan], array![7, 8]))
        .unwrap();
    assert_eq!(ds.get("chan").unwrap().values.type_name(), "int");
    assert!(!ds.contains("UVW"));
}

#[test]
fn test_masking_keeps_type_and_values() {
    let mut var = Variable::new(&[Dim::Row], array![1, 2, 3]);
    var.mask_where(array![false, true, false].into_dyn().view());
    var.mask_where(array![true, false, false].into_dyn().view());
    assert_eq!(var.values, Values::Int(array![1, 2, 3].into_dyn()));
    assert!(var.is_masked(&[0]));
    assert!(var.is_masked(&[1]));
    assert!(!var.is_masked(&[2]));

    let floats = var.to_f64("ANTENNA1").unwrap();
    assert!(floats[0].is_nan());
    assert!(floats[1].is_nan());
    assert_abs_diff_eq!(floats[2], 3.0);
}

#[test]
fn test_complex_has_no_real_representation() {
    let ds = small_dataset();
    let result = ds.get("DATA").unwrap().to_f64("DATA");
    assert!(matches!(result, Err(DatasetError::ComplexToReal(_))));
}

#[test]
fn test_isel_selects_every_spanning_variable() {
    let mut ds = small_dataset();
    let mut ant = ds.remove_var("ANTENNA1").unwrap();
    ant.mask = Some(array![false, false, true].into_dyn());
    ds.insert_var("ANTENNA1", ant).unwrap();

    let sel = ds.isel(Dim::Row, &[2, 0]).unwrap();
    assert_eq!(sel.dim_len(Dim::Row), Some(2));
    assert_eq!(sel.get("DATA").unwrap().shape(), &[2, 2, 2]);
    let ant = sel.get("ANTENNA1").unwrap();
    assert_eq!(ant.values, Values::Int(array![1, 0].into_dyn()));
    assert!(ant.is_masked(&[0]));
    assert!(!ant.is_masked(&[1]));
    // Coordinates not on the row dimension are untouched.
    assert_eq!(sel.coord("chan"), ds.coord("chan"));

    let sel = ds.isel(Dim::Chan, &[1]).unwrap();
    match &sel.get("chan").unwrap().values {
        Values::Float(f) => assert_abs_diff_eq!(f[[0]], 1.1e9),
        v => panic!("unexpected {}", v.type_name()),
    }

    assert!(matches!(
        ds.isel(Dim::Chan, &[2]),
        Err(DatasetError::IndexOutOfRange { index: 2, len: 2, .. })
    ));
    assert!(matches!(
        ds.isel(Dim::UvwIndex, &[0]),
        Err(DatasetError::NoSuchDim(Dim::UvwIndex))
    ));
}

#[test]
fn test_filter_rows() {
    let ds = small_dataset();
    let sel = ds.filter_rows(&[true, false, true]).unwrap();
    assert_eq!(
        sel.get("ANTENNA1").unwrap().values,
        Values::Int(array![0, 1].into_dyn())
    );
}
