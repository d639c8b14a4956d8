//! Frequency units, reference frames and Doppler velocities.

mod error;
#[cfg(test)]
mod tests;

pub use error::UnitError;

use marlu::constants::VEL_C;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
#[allow(non_camel_case_types)]
pub enum FreqUnit {
    /// Hertz
    Hz,

    /// kiloHertz
    kHz,

    /// MegaHertz
    MHz,

    /// GigaHertz
    GHz,
}

impl FreqUnit {
    /// The number of Hz in one of this unit.
    pub fn hz(self) -> f64 {
        match self {
            FreqUnit::Hz => 1.0,
            FreqUnit::kHz => 1e3,
            FreqUnit::MHz => 1e6,
            FreqUnit::GHz => 1e9,
        }
    }

    /// Parse a unit name such as a `QuantumUnits` keyword value.
    pub fn parse(s: &str) -> Result<FreqUnit, UnitError> {
        s.trim()
            .parse()
            .map_err(|_| UnitError::UnknownFreqUnit(s.to_string()))
    }
}

/// Convert a frequency between units.
pub fn convert_freq(value: f64, from: FreqUnit, to: FreqUnit) -> f64 {
    if from == to {
        return value;
    }
    value * from.hz() / to.hz()
}

/// Parse a string that may have a unit of frequency attached to it. A naked
/// number comes back without a unit.
pub fn parse_freq(s: &str) -> Result<(f64, Option<FreqUnit>), UnitError> {
    let maybe_number: Option<f64> = s.trim().parse().ok();
    if let Some(number) = maybe_number {
        return Ok((number, None));
    };

    let suffix = s
        .trim()
        .trim_start_matches(|c| char::is_numeric(c) || c == '.' || c == '-' || c == 'e')
        .trim();
    for freq_unit in FreqUnit::iter() {
        let unit_str: &'static str = freq_unit.into();
        if suffix.to_uppercase() == unit_str.to_uppercase() {
            let prefix = s.trim().trim_end_matches(char::is_alphabetic).trim();
            let number: f64 = match prefix.parse() {
                Ok(n) => n,
                Err(_) => return Err(UnitError::GotFreqUnitButCantParse(s.to_string())),
            };
            return Ok((number, Some(freq_unit)));
        }
    }

    Err(UnitError::UnknownFreq(s.to_string()))
}

/// Frequency reference frames, numbered as casacore's `MFrequency` types are
/// in a `MEAS_FREQ_REF` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum FreqFrame {
    Rest,
    Lsrk,
    Lsrd,
    Bary,
    Geo,
    Topo,
    Galacto,
    Lgroup,
    Cmb,
}

impl FreqFrame {
    pub fn from_meas_freq_ref(code: i32) -> Result<FreqFrame, UnitError> {
        usize::try_from(code)
            .ok()
            .and_then(|i| FreqFrame::iter().nth(i))
            .ok_or(UnitError::UnknownFrame(code))
    }
}

/// Radio-convention Doppler velocity \[km/s\] of `freq` relative to
/// `rest_freq`. Both frequencies must be in the same unit.
pub fn radio_velocity(freq: f64, rest_freq: f64) -> Result<f64, UnitError> {
    if rest_freq == 0.0 {
        return Err(UnitError::ZeroRestFreq);
    }
    Ok(VEL_C * (1.0 - freq / rest_freq) / 1e3)
}

/// The frequency metadata needed to label and convert frequency-like axes.
#[derive(Debug, Clone, PartialEq)]
pub struct FreqParams {
    pub frame: FreqFrame,

    /// The unit of the stored channel frequencies.
    pub unit: FreqUnit,

    /// The rest frequency used for velocities, in `unit`. This is the middle
    /// channel of the first spectral window.
    pub rest_freq: f64,
}

impl FreqParams {
    pub fn new(frame: FreqFrame, unit: FreqUnit, chan_freqs: &[f64]) -> Option<FreqParams> {
        if chan_freqs.is_empty() {
            return None;
        }
        Some(FreqParams {
            frame,
            unit,
            rest_freq: chan_freqs[chan_freqs.len() / 2],
        })
    }
}
