use approx::assert_abs_diff_eq;
use ndarray::{array, Array3};

use super::*;
use crate::units::FreqFrame;

/// Three rows (baselines 0&0, 0&1 and 1&1), two channels and two
/// polarisations.
fn test_dataset() -> Dataset {
    let mut ds = Dataset::default();
    ds.insert_var(
        "DATA",
        Variable::new(
            &[Dim::Row, Dim::Chan, Dim::Pol],
            Array3::from_shape_fn((3, 2, 2), |(r, c, p)| match (r, c, p) {
                (0, 0, 0) => c32::new(3.0, 4.0),
                (0, 0, 1) => c32::new(0.0, 1.0),
                _ => c32::new(1.0 + r as f32, -(c as f32)),
            }),
        ),
    )
    .unwrap();
    ds.insert_var(
        "FLAG",
        Variable::new(
            &[Dim::Row, Dim::Chan, Dim::Pol],
            Array3::from_shape_fn((3, 2, 2), |(r, c, p)| (r, c, p) == (2, 1, 1)),
        ),
    )
    .unwrap();
    ds.insert_var(
        "WEIGHT",
        Variable::new(&[Dim::Row, Dim::Pol], array![[2.0, 1.0], [1.0, 1.0], [0.5, 4.0]]),
    )
    .unwrap();
    ds.insert_var("ANTENNA1", Variable::new(&[Dim::Row], array![0, 0, 1]))
        .unwrap();
    ds.insert_var("ANTENNA2", Variable::new(&[Dim::Row], array![0, 1, 1]))
        .unwrap();
    ds.insert_var(
        "UVW",
        Variable::new(
            &[Dim::Row, Dim::UvwIndex],
            array![[0.0, 0.0, 0.0], [3.0, 4.0, 1.0], [-6.0, 8.0, 2.0]],
        ),
    )
    .unwrap();
    ds.insert_coord("chan", Variable::new(&[Dim::Chan], array![1.0e9, 2.0e9]))
        .unwrap();
    ds.insert_coord("pol", Variable::new(&[Dim::Pol], array![9, 12]))
        .unwrap();
    ds
}

fn flagged_dataset() -> Dataset {
    let mut ds = test_dataset();
    apply_flags(&mut ds);
    ds
}

#[test]
fn test_array_dims() {
    let ds = test_dataset();
    assert_eq!(
        array_dims(&ds, Axis::Amp.key(), Axis::Amp).unwrap(),
        vec![Dim::Row, Dim::Chan, Dim::Pol]
    );
    assert_eq!(
        array_dims(&ds, Axis::Baseline.key(), Axis::Baseline).unwrap(),
        vec![Dim::Row]
    );
    // WEIGHT's dims are a subset of DATA's.
    assert_eq!(
        array_dims(&ds, Axis::WtxAmp.key(), Axis::WtxAmp).unwrap(),
        vec![Dim::Row, Dim::Chan, Dim::Pol]
    );
    // Neither contains the other; the second variable's dims come first.
    assert_eq!(
        array_dims(&ds, Axis::UWave.key(), Axis::UWave).unwrap(),
        vec![Dim::Chan, Dim::Row, Dim::UvwIndex]
    );
}

#[test]
fn test_missing_column() {
    let ds = test_dataset();
    let result = get_data(&ds, Axis::WtSp);
    assert!(matches!(
        result,
        Err(DeriveError::MissingColumn { ref name, axis: Axis::WtSp }) if name == "WEIGHT_SPECTRUM"
    ));
}

#[test]
fn test_flags_mask_only_matching_variables() {
    let ds = flagged_dataset();
    assert!(ds.get("DATA").unwrap().is_masked(&[2, 1, 1]));
    assert!(!ds.get("DATA").unwrap().is_masked(&[2, 1, 0]));
    assert!(ds.get("WEIGHT").unwrap().mask.is_none());
    assert!(ds.get("UVW").unwrap().mask.is_none());
    assert!(ds.get("FLAG").unwrap().mask.is_none());

    // Without flags nothing changes.
    let mut ds = test_dataset();
    ds.remove_var("FLAG");
    let before = ds.clone();
    apply_flags(&mut ds);
    assert_eq!(ds, before);
}

#[test]
fn test_visibility_components() {
    let ds = flagged_dataset();
    let amp = get_data(&ds, Axis::Amp).unwrap();
    assert_eq!(amp.shape(), &[3, 2, 2]);
    assert_abs_diff_eq!(amp[[0, 0, 0]], 5.0, epsilon = 1e-6);
    assert!(amp[[2, 1, 1]].is_nan());

    let phase = get_data(&ds, Axis::Phase).unwrap();
    assert_abs_diff_eq!(phase[[0, 0, 1]], 90.0, epsilon = 1e-6);

    let real = get_data(&ds, Axis::Real).unwrap();
    let imag = get_data(&ds, Axis::Imag).unwrap();
    assert_abs_diff_eq!(real[[0, 0, 0]], 3.0);
    assert_abs_diff_eq!(imag[[0, 0, 0]], 4.0);
    assert_abs_diff_eq!(real[[1, 1, 0]], 2.0);
    assert_abs_diff_eq!(imag[[1, 1, 0]], -1.0);
    assert!(real[[2, 1, 1]].is_nan());
}

#[test]
fn test_flag_axis() {
    let ds = flagged_dataset();
    let flags = get_data(&ds, Axis::Flag).unwrap();
    assert_abs_diff_eq!(flags.sum(), 1.0);
    assert_abs_diff_eq!(flags[[2, 1, 1]], 1.0);
}

#[test]
fn test_geometry() {
    let ds = flagged_dataset();
    let u = get_data(&ds, Axis::U).unwrap();
    assert_eq!(u.shape(), &[3]);
    assert_abs_diff_eq!(u[[2]], -6.0);
    let w = get_data(&ds, Axis::W).unwrap();
    assert_abs_diff_eq!(w[[1]], 1.0);
    let uvdist = get_data(&ds, Axis::UvDist).unwrap();
    assert_abs_diff_eq!(uvdist, array![0.0, 5.0, 10.0].into_dyn());
}

#[test]
fn test_channel_and_frequency() {
    let ds = test_dataset();
    assert_abs_diff_eq!(
        get_data(&ds, Axis::Channel).unwrap(),
        array![0.0, 1.0].into_dyn()
    );
    assert_abs_diff_eq!(
        get_data(&ds, Axis::Frequency).unwrap(),
        array![1.0e9, 2.0e9].into_dyn()
    );
    assert_abs_diff_eq!(get_data(&ds, Axis::Corr).unwrap(), array![9.0, 12.0].into_dyn());
}

#[test]
fn test_baseline_index_is_symmetric_and_unique() {
    let num_ant = 5;
    let mut seen = vec![];
    for a in 0..num_ant {
        for b in a..num_ant {
            assert_eq!(baseline_index(a, b, num_ant), baseline_index(b, a, num_ant));
            seen.push(baseline_index(a, b, num_ant));
        }
    }
    let expected: Vec<usize> = (0..num_ant * (num_ant + 1) / 2).collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_baseline_axis() {
    let ds = flagged_dataset();
    let baselines = get_data(&ds, Axis::Baseline).unwrap();
    assert_abs_diff_eq!(baselines, array![0.0, 1.0, 2.0].into_dyn());
}

#[test]
fn test_negative_antenna() {
    let mut ds = test_dataset();
    ds.remove_var("ANTENNA2");
    ds.insert_var("ANTENNA2", Variable::new(&[Dim::Row], array![0, -1, 1]))
        .unwrap();
    assert!(matches!(
        get_data(&ds, Axis::Baseline),
        Err(DeriveError::NegativeAntenna(-1))
    ));
}

#[test]
fn test_wtxamp() {
    let ds = flagged_dataset();
    let wtxamp = calc_values(&ds, Axis::WtxAmp).unwrap();
    let amp = get_data(&ds, Axis::Amp).unwrap();
    assert_eq!(wtxamp.shape(), amp.shape());
    assert_abs_diff_eq!(wtxamp[[0, 0, 0]], 10.0, epsilon = 1e-6);
    for r in 0..3 {
        for c in 0..2 {
            for p in 0..2 {
                let weight = [[2.0, 1.0], [1.0, 1.0], [0.5, 4.0]][r][p];
                let expected = weight * amp[[r, c, p]];
                if expected.is_nan() {
                    assert!(wtxamp[[r, c, p]].is_nan());
                } else {
                    assert_abs_diff_eq!(wtxamp[[r, c, p]], expected, epsilon = 1e-9);
                }
            }
        }
    }
}

#[test]
fn test_wave_axes() {
    let ds = flagged_dataset();
    let uwave = calc_values(&ds, Axis::UWave).unwrap();
    assert_eq!(uwave.shape(), &[2, 3]);
    let freqs = [1.0e9, 2.0e9];
    let u = [0.0, 3.0, -6.0];
    for (i_chan, f) in freqs.iter().enumerate() {
        for (i_row, u) in u.iter().enumerate() {
            assert_abs_diff_eq!(uwave[[i_chan, i_row]], u / VEL_C * f, epsilon = 1e-9);
        }
    }

    let uvwave = calc_values(&ds, Axis::UvWave).unwrap();
    assert_abs_diff_eq!(uvwave[[1, 2]], 10.0 / VEL_C * 2.0e9, epsilon = 1e-9);

    // Channel frequencies in a different unit are scaled to Hz.
    let mut ds_mhz = ds.clone();
    ds_mhz.freq_unit = FreqUnit::MHz;
    ds_mhz
        .insert_coord("chan", Variable::new(&[Dim::Chan], array![1.0e3, 2.0e3]))
        .unwrap();
    assert_abs_diff_eq!(calc_values(&ds_mhz, Axis::UWave).unwrap(), uwave, epsilon = 1e-9);
}

#[test]
fn test_calc_values_needs_a_pair() {
    let ds = test_dataset();
    assert!(matches!(
        calc_values(&ds, Axis::Amp),
        Err(DeriveError::NotDerived(Axis::Amp))
    ));
}

#[test]
fn test_plot_dataset_dims_follow_the_dataset() {
    let ds = flagged_dataset();
    let plot_ds = plot_dataset(&ds, Axis::UWave, Axis::Amp).unwrap();
    assert_eq!(
        plot_ds.dims,
        vec![(Dim::Row, 3), (Dim::Chan, 2), (Dim::Pol, 2)]
    );
    assert_eq!(plot_ds.x.dims, vec![Dim::Chan, Dim::Row]);
    assert!(plot_ds.coords.contains_key(&Dim::Chan));
    assert!(plot_ds.coords.contains_key(&Dim::Pol));
    assert!(!plot_ds.coords.contains_key(&Dim::UvwIndex));

    let plot_ds = plot_dataset(&ds, Axis::U, Axis::V).unwrap();
    assert_eq!(plot_ds.dims, vec![(Dim::Row, 3)]);
}

#[test]
fn test_table_broadcasts_and_skips_invalid_points() {
    let ds = flagged_dataset();
    let table = plot_dataset(&ds, Axis::Baseline, Axis::Amp)
        .unwrap()
        .to_table();
    assert_eq!(table.dims, vec![Dim::Row, Dim::Chan, Dim::Pol]);
    assert_eq!(table.len(), 12);
    // The one flagged sample is dropped.
    assert_eq!(table.points().count(), 11);

    let row = &table.rows[1];
    assert_eq!(row.index, vec![0, 0, 1]);
    assert_abs_diff_eq!(row.x, 0.0);
    assert_abs_diff_eq!(row.y, 1.0, epsilon = 1e-6);
    // Every row in a baseline shares its x.
    assert!(table.rows.iter().filter(|r| r.index[0] == 2).all(|r| r.x == 2.0));

    let ((x0, x1), (y0, y1)) = table.ranges().unwrap();
    assert_abs_diff_eq!(x0, 0.0);
    assert_abs_diff_eq!(x1, 2.0);
    assert_abs_diff_eq!(y0, 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(y1, 5.0, epsilon = 1e-6);
}

#[test]
fn test_conjugate() {
    let ds = flagged_dataset();
    let table = plot_dataset(&ds, Axis::U, Axis::V).unwrap().to_table();
    let conj = table.conjugate();
    assert_eq!(conj.len(), table.len());
    assert_abs_diff_eq!(conj.rows[2].x, 6.0);
    assert_abs_diff_eq!(conj.rows[2].y, -8.0);
}

#[test]
fn test_frequency_conversion() {
    let ds = flagged_dataset();
    let params = FreqParams::new(FreqFrame::Lsrk, FreqUnit::Hz, &[1.0e9, 2.0e9]).unwrap();

    let mut plot_ds = plot_dataset(&ds, Axis::Frequency, Axis::Velocity).unwrap();
    convert_frequency_axes(&mut plot_ds, Some(&params)).unwrap();
    assert_abs_diff_eq!(plot_ds.x.values, array![1.0, 2.0].into_dyn());
    // The rest frequency is the middle channel, 2 GHz.
    assert_abs_diff_eq!(plot_ds.y.values[[1]], 0.0);
    assert_abs_diff_eq!(plot_ds.y.values[[0]], VEL_C * 0.5 / 1e3, epsilon = 1e-6);

    let mut plot_ds = plot_dataset(&ds, Axis::Velocity, Axis::Amp).unwrap();
    assert!(matches!(
        convert_frequency_axes(&mut plot_ds, None),
        Err(DeriveError::MissingFreqParams(Axis::Velocity))
    ));

    let zero = FreqParams {
        rest_freq: 0.0,
        ..params
    };
    assert!(matches!(
        convert_frequency_axes(&mut plot_ds, Some(&zero)),
        Err(DeriveError::Unit(UnitError::ZeroRestFreq))
    ));
}

#[test]
fn test_plot_table_applies_flags() {
    let ds = test_dataset();
    let table = plot_table(&ds, Axis::Channel, Axis::Amp, None).unwrap();
    assert_eq!(table.len(), 12);
    assert_eq!(table.points().count(), 11);
    // The source dataset is untouched.
    assert!(ds.get("DATA").unwrap().mask.is_none());
}
