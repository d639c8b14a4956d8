//! The plot-axis vocabulary and the table mapping each axis onto the
//! dataset variables it is built from.

#[cfg(test)]
mod tests;

use hifitime::Epoch;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::units::FreqFrame;

/// Every axis that can be plotted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Axis {
    // Metadata
    Scan,
    Field,
    Time,
    Interval,
    Spw,
    Channel,
    Frequency,
    Velocity,
    Corr,
    Antenna1,
    Antenna2,
    Baseline,
    Observation,
    Intent,
    Feed1,
    Feed2,

    // Visibilities and flags
    Amp,
    Phase,
    Real,
    Imag,
    Weight,
    WtxAmp,
    WtSp,
    Sigma,
    SigmaSp,
    Flag,

    // Observational geometry
    U,
    V,
    W,
    UvDist,
    UWave,
    VWave,
    WWave,
    UvWave,
}

/// The complex components that can be rastered or summarised.
pub const VIS_AXES: [Axis; 4] = [Axis::Amp, Axis::Phase, Axis::Real, Axis::Imag];

/// Where the values of an axis come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKey {
    /// A single data variable or coordinate.
    Column(&'static str),

    /// Calculated from two variables.
    Derived(&'static str, &'static str),
}

impl Axis {
    pub fn key(self) -> AxisKey {
        use AxisKey::*;

        match self {
            Axis::Scan => Column("SCAN_NUMBER"),
            Axis::Field => Column("FIELD_ID"),
            Axis::Time => Column("TIME"),
            Axis::Interval => Column("INTERVAL"),
            Axis::Spw => Column("spw_id"),
            Axis::Channel | Axis::Frequency | Axis::Velocity => Column("chan"),
            Axis::Corr => Column("pol"),
            Axis::Antenna1 => Column("ANTENNA1"),
            Axis::Antenna2 => Column("ANTENNA2"),
            Axis::Baseline => Derived("ANTENNA1", "ANTENNA2"),
            Axis::Observation => Column("OBSERVATION_ID"),
            Axis::Intent => Column("STATE_ID"),
            Axis::Feed1 => Column("FEED1"),
            Axis::Feed2 => Column("FEED2"),

            Axis::Amp | Axis::Phase | Axis::Real | Axis::Imag => Column("DATA"),
            Axis::Weight => Column("WEIGHT"),
            Axis::WtxAmp => Derived("WEIGHT", "DATA"),
            Axis::WtSp => Column("WEIGHT_SPECTRUM"),
            Axis::Sigma => Column("SIGMA"),
            Axis::SigmaSp => Column("SIGMA_SPECTRUM"),
            Axis::Flag => Column("FLAG"),

            Axis::U | Axis::V | Axis::W | Axis::UvDist => Column("UVW"),
            Axis::UWave | Axis::VWave | Axis::WWave | Axis::UvWave => Derived("UVW", "chan"),
        }
    }

    /// Is this one of the wavelength-scaled geometry axes?
    pub fn is_wave(self) -> bool {
        matches!(self, Axis::UWave | Axis::VWave | Axis::WWave | Axis::UvWave)
    }

    /// Do we need the spectral window's frame, unit and rest frequency for
    /// this axis?
    pub fn needs_freq_params(self) -> bool {
        matches!(self, Axis::Frequency | Axis::Velocity) || self.is_wave()
    }

    /// The short label drawn on the plot.
    pub fn label(self) -> String {
        match self {
            Axis::UvDist => "UVdist".to_string(),
            Axis::UvWave => "UVwave".to_string(),
            Axis::WtxAmp => "Wt*Amp".to_string(),
            Axis::WtSp => "WtSp".to_string(),
            Axis::SigmaSp => "SigmaSp".to_string(),
            _ => {
                let name: &'static str = self.into();
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }

    /// The label with its unit. `first_time` is only used by [`Axis::Time`]
    /// and `frame` only by [`Axis::Frequency`].
    pub fn label_with_unit(self, first_time: Option<Epoch>, frame: Option<FreqFrame>) -> String {
        let label = self.label();
        match self {
            Axis::Interval => format!("{label} (s)"),
            Axis::Frequency => match frame {
                Some(frame) => format!("{label} (GHz) {frame}"),
                None => format!("{label} (GHz)"),
            },
            Axis::Velocity => format!("{label} (km/s)"),
            Axis::Phase => format!("{label} (deg)"),
            Axis::Time => match first_time {
                Some(t) => {
                    let (y, m, d, _, _, _, _) = t.to_gregorian_utc();
                    format!("{label} (from {y:04}-{m:02}-{d:02})")
                }
                None => label,
            },
            Axis::U | Axis::V | Axis::W | Axis::UvDist => format!("{label} (m)"),
            Axis::UWave | Axis::VWave | Axis::WWave | Axis::UvWave => format!("{label} (\u{03BB})"),
            _ => label,
        }
    }
}

/// A UV plot is one where both axes are UVW components; these are drawn
/// square and with their conjugates.
pub fn is_uv_plot(x: Axis, y: Axis) -> bool {
    let uvw = [Axis::U, Axis::V, Axis::W];
    uvw.contains(&x) && uvw.contains(&y)
}
