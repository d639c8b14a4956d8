use std::str::FromStr;

use strum::IntoEnumIterator;

use super::*;

#[test]
fn test_every_axis_has_a_key() {
    for axis in Axis::iter() {
        match axis.key() {
            AxisKey::Column(name) => assert!(!name.is_empty(), "{axis} has an empty source"),
            AxisKey::Derived(first, second) => {
                assert!(!first.is_empty(), "{axis} has an empty source");
                assert!(!second.is_empty(), "{axis} has an empty source");
            }
        }
    }
}

#[test]
fn test_axis_names_round_trip() {
    for axis in Axis::iter() {
        let name = axis.to_string();
        assert_eq!(Axis::from_str(&name).unwrap(), axis);
        assert_eq!(Axis::from_str(&name.to_uppercase()).unwrap(), axis);
    }
    assert_eq!(Axis::from_str("wtxamp").unwrap(), Axis::WtxAmp);
    assert_eq!(Axis::from_str("uvwave").unwrap(), Axis::UvWave);
    assert!(Axis::from_str("azimuth").is_err());
}

#[test]
fn test_paired_keys() {
    let derived: Vec<Axis> = Axis::iter()
        .filter(|a| matches!(a.key(), AxisKey::Derived(..)))
        .collect();
    assert_eq!(
        derived,
        vec![
            Axis::Baseline,
            Axis::WtxAmp,
            Axis::UWave,
            Axis::VWave,
            Axis::WWave,
            Axis::UvWave
        ]
    );
    assert_eq!(Axis::WtxAmp.key(), AxisKey::Derived("WEIGHT", "DATA"));
    assert_eq!(Axis::UWave.key(), AxisKey::Derived("UVW", "chan"));
}

#[test]
fn test_same_column_for_many_axes() {
    for axis in [Axis::Amp, Axis::Phase, Axis::Real, Axis::Imag] {
        assert_eq!(axis.key(), AxisKey::Column("DATA"));
    }
    for axis in [Axis::Channel, Axis::Frequency, Axis::Velocity] {
        assert_eq!(axis.key(), AxisKey::Column("chan"));
    }
}

#[test]
fn test_labels() {
    assert_eq!(Axis::Amp.label(), "Amp");
    assert_eq!(Axis::UvDist.label(), "UVdist");
    assert_eq!(Axis::WtxAmp.label(), "Wt*Amp");
    assert_eq!(Axis::Antenna1.label(), "Antenna1");

    assert_eq!(Axis::Phase.label_with_unit(None, None), "Phase (deg)");
    assert_eq!(Axis::UvDist.label_with_unit(None, None), "UVdist (m)");
    assert_eq!(Axis::VWave.label_with_unit(None, None), "Vwave (\u{03BB})");
    assert_eq!(
        Axis::Frequency.label_with_unit(None, Some(FreqFrame::Lsrk)),
        "Frequency (GHz) LSRK"
    );
    let t = Epoch::from_gregorian_utc_hms(2012, 11, 19, 8, 0, 4);
    assert_eq!(
        Axis::Time.label_with_unit(Some(t), None),
        "Time (from 2012-11-19)"
    );
    assert_eq!(Axis::Scan.label_with_unit(Some(t), None), "Scan");
}

#[test]
fn test_uv_plot() {
    assert!(is_uv_plot(Axis::U, Axis::V));
    assert!(is_uv_plot(Axis::W, Axis::U));
    assert!(!is_uv_plot(Axis::UvDist, Axis::Amp));
    assert!(!is_uv_plot(Axis::UWave, Axis::VWave));
}

#[test]
fn test_freq_params_needed() {
    assert!(Axis::Velocity.needs_freq_params());
    assert!(Axis::UvWave.needs_freq_params());
    assert!(!Axis::Channel.needs_freq_params());
    assert!(!Axis::Amp.needs_freq_params());
}
