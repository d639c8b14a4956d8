use approx::assert_abs_diff_eq;

use super::*;

#[test]
fn test_parse_freq_str_without_units() {
    let result = parse_freq(" 40.0 ");
    assert!(result.is_ok(), "{:?}", result.unwrap_err());
    let pair = result.unwrap();
    assert_abs_diff_eq!(pair.0, 40.0);
    assert_eq!(pair.1, None);
}

#[test]
fn test_parse_freq_str_with_units() {
    for freq_unit in FreqUnit::iter() {
        let unit_str: &'static str = freq_unit.into();
        for unit_str in [unit_str.to_lowercase(), unit_str.to_uppercase()] {
            let result = parse_freq(&format!("1.5{unit_str}"));
            assert!(result.is_ok(), "{:?}", result.unwrap_err());
            let pair = result.unwrap();
            assert_abs_diff_eq!(pair.0, 1.5);
            assert_eq!(pair.1, Some(freq_unit));

            let result = parse_freq(&format!(" 1.5 {unit_str} "));
            assert!(result.is_ok(), "{:?}", result.unwrap_err());
            assert_eq!(result.unwrap().1, Some(freq_unit));
        }
    }
}

#[test]
fn test_parse_freq_garbage() {
    assert!(matches!(parse_freq("1.5 parsecs"), Err(UnitError::UnknownFreq(_))));
    assert!(matches!(
        parse_freq("1.5.5MHz"),
        Err(UnitError::GotFreqUnitButCantParse(_))
    ));
}

#[test]
fn test_unit_names() {
    assert_eq!(FreqUnit::parse("Hz"), Ok(FreqUnit::Hz));
    assert_eq!(FreqUnit::parse(" MHz"), Ok(FreqUnit::MHz));
    assert_eq!(FreqUnit::parse("ghz"), Ok(FreqUnit::GHz));
    assert_eq!(
        FreqUnit::parse("m"),
        Err(UnitError::UnknownFreqUnit("m".to_string()))
    );
    assert!(FreqUnit::parse("").is_err());
}

#[test]
fn test_freq_round_trip() {
    let freqs_hz = [3.5e8, 1.0e9, 2.30042e11, 1.42040575e9];
    for &f in &freqs_hz {
        let ghz = convert_freq(f, FreqUnit::Hz, FreqUnit::GHz);
        assert_abs_diff_eq!(ghz, f / 1e9, epsilon = 1e-12);
        let back = convert_freq(ghz, FreqUnit::GHz, FreqUnit::Hz);
        assert_abs_diff_eq!(back, f, epsilon = 1e-3);
    }

    let mhz = convert_freq(150.0, FreqUnit::MHz, FreqUnit::kHz);
    assert_abs_diff_eq!(mhz, 150e3);
}

#[test]
fn test_frames_from_codes() {
    assert_eq!(FreqFrame::from_meas_freq_ref(0).unwrap(), FreqFrame::Rest);
    assert_eq!(FreqFrame::from_meas_freq_ref(1).unwrap(), FreqFrame::Lsrk);
    assert_eq!(FreqFrame::from_meas_freq_ref(5).unwrap(), FreqFrame::Topo);
    assert_eq!(FreqFrame::from_meas_freq_ref(8).unwrap(), FreqFrame::Cmb);
    assert_eq!(
        FreqFrame::from_meas_freq_ref(9),
        Err(UnitError::UnknownFrame(9))
    );
    assert_eq!(
        FreqFrame::from_meas_freq_ref(-1),
        Err(UnitError::UnknownFrame(-1))
    );
    assert_eq!(FreqFrame::Lsrk.to_string(), "LSRK");
}

#[test]
fn test_radio_velocity() {
    let rest = 1.0e9;
    assert_abs_diff_eq!(radio_velocity(rest, rest).unwrap(), 0.0);
    // A frequency below rest is receding.
    let v = radio_velocity(0.999e9, rest).unwrap();
    assert_abs_diff_eq!(v, VEL_C * 1e-3 / 1e3, epsilon = 1e-9);
    assert!(v > 0.0);
    assert!(radio_velocity(1.001e9, rest).unwrap() < 0.0);
    assert_eq!(radio_velocity(1.0, 0.0), Err(UnitError::ZeroRestFreq));
}

#[test]
fn test_freq_params_rest_freq_is_middle_channel() {
    let freqs = [1.0, 2.0, 3.0, 4.0];
    let params = FreqParams::new(FreqFrame::Topo, FreqUnit::Hz, &freqs).unwrap();
    assert_abs_diff_eq!(params.rest_freq, 3.0);
    assert!(FreqParams::new(FreqFrame::Topo, FreqUnit::Hz, &[]).is_none());
}
