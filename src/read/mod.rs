//! Reading visibilities into partitions.

mod error;
mod ms;

pub use error::MsReadError;
pub use ms::MsReader;

use std::path::PathBuf;

use hifitime::{Epoch, TimeUnits};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use vec1::Vec1;

use crate::{
    dataset::{Dataset, Values},
    units::{convert_freq, FreqFrame, FreqParams, FreqUnit},
};

/// Which column of the main table holds the visibilities.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DataGroup {
    #[default]
    Base,
    Corrected,
    Model,
}

impl DataGroup {
    pub fn column(self) -> &'static str {
        match self {
            DataGroup::Base => "DATA",
            DataGroup::Corrected => "CORRECTED_DATA",
            DataGroup::Model => "MODEL_DATA",
        }
    }
}

/// casacore `Stokes` type names, indexed by `CORR_TYPE` value.
const STOKES_NAMES: [&str; 33] = [
    "Undefined", "I", "Q", "U", "V", "RR", "RL", "LR", "LL", "XX", "XY", "YX", "YY", "RX", "RY",
    "LX", "LY", "XR", "XL", "YR", "YL", "PP", "PQ", "QP", "QQ", "RCircular", "LCircular",
    "Linear", "Ptotal", "Plinear", "PFtotal", "PFlinear", "Pangle",
];

/// The name of a polarisation product from its casacore `CORR_TYPE` value.
pub fn pol_name(corr_type: i32) -> &'static str {
    usize::try_from(corr_type)
        .ok()
        .and_then(|i| STOKES_NAMES.get(i).copied())
        .unwrap_or("Undefined")
}

/// casacore stores times as UTC MJD seconds. The values can be slightly off
/// of their intended values; round them to the nearest 10 milliseconds.
pub fn casacore_time_to_epoch(utc_mjd_seconds: f64) -> Epoch {
    let e = Epoch::from_utc_seconds(
        utc_mjd_seconds - hifitime::J1900_OFFSET * hifitime::SECONDS_PER_DAY,
    );
    e.round(10.milliseconds())
}

/// Measurement-set-wide metadata shared by every partition.
#[derive(Debug, Clone)]
pub struct MsMeta {
    pub path: PathBuf,

    /// Indexed by antenna number.
    pub antenna_names: Vec1<String>,

    /// Indexed by `FIELD_ID`.
    pub field_names: Vec<String>,

    /// Indexed by `STATE_ID`. Empty if the STATE table is absent or empty.
    pub intents: Vec<String>,
}

impl MsMeta {
    pub fn antenna_name(&self, ant: i32) -> String {
        usize::try_from(ant)
            .ok()
            .and_then(|i| self.antenna_names.get(i))
            .cloned()
            .unwrap_or_else(|| ant.to_string())
    }

    pub fn field_name(&self, field_id: i32) -> String {
        usize::try_from(field_id)
            .ok()
            .and_then(|i| self.field_names.get(i))
            .cloned()
            .unwrap_or_else(|| field_id.to_string())
    }

    /// The name of a measurement set, without directories or extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// The rows of one data description (a spectral window with a polarisation
/// setup).
#[derive(Debug, Clone)]
pub struct Partition {
    pub ddid: usize,

    pub spw_id: usize,

    pub spw_name: String,

    pub frame: FreqFrame,

    pub corr_types: Vec<i32>,

    pub dataset: Dataset,
}

fn unique_ints(ds: &Dataset, name: &str) -> Vec<i32> {
    let mut values: Vec<i32> = match ds.get(name).map(|v| &v.values) {
        Some(Values::Int(a)) => a.iter().copied().collect(),
        _ => return vec![],
    };
    values.sort_unstable();
    values.dedup();
    values
}

impl Partition {
    /// The unique raw (casacore) times, sorted.
    pub fn raw_times(&self) -> Vec<f64> {
        let mut times: Vec<f64> = match self.dataset.get("TIME").map(|v| &v.values) {
            Some(Values::Float(a)) => a.iter().copied().collect(),
            _ => return vec![],
        };
        times.sort_unstable_by(f64::total_cmp);
        times.dedup();
        times
    }

    pub fn times(&self) -> Vec<Epoch> {
        self.raw_times()
            .into_iter()
            .map(casacore_time_to_epoch)
            .collect()
    }

    /// The unique antenna pairs, sorted.
    pub fn baselines(&self) -> Vec<(i32, i32)> {
        let (ant1, ant2) = match (
            self.dataset.get("ANTENNA1").map(|v| &v.values),
            self.dataset.get("ANTENNA2").map(|v| &v.values),
        ) {
            (Some(Values::Int(a1)), Some(Values::Int(a2))) => (a1, a2),
            _ => return vec![],
        };
        let mut pairs: Vec<(i32, i32)> = ant1.iter().copied().zip(ant2.iter().copied()).collect();
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    /// Channel frequencies in the dataset's frequency unit.
    pub fn chan_freqs(&self) -> Vec<f64> {
        match self.dataset.coord("chan").map(|v| &v.values) {
            Some(Values::Float(a)) => a.iter().copied().collect(),
            _ => vec![],
        }
    }

    /// Channel frequencies \[Hz\].
    pub fn chan_freqs_hz(&self) -> Vec<f64> {
        let unit = self.dataset.freq_unit;
        self.chan_freqs()
            .into_iter()
            .map(|f| convert_freq(f, unit, FreqUnit::Hz))
            .collect()
    }

    pub fn pol_names(&self) -> Vec<&'static str> {
        self.corr_types.iter().map(|&c| pol_name(c)).collect()
    }

    pub fn scan_numbers(&self) -> Vec<i32> {
        unique_ints(&self.dataset, "SCAN_NUMBER")
    }

    pub fn field_ids(&self) -> Vec<i32> {
        unique_ints(&self.dataset, "FIELD_ID")
    }

    pub fn state_ids(&self) -> Vec<i32> {
        unique_ints(&self.dataset, "STATE_ID")
    }

    /// (times, baselines, channels, polarisations)
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        (
            self.raw_times().len(),
            self.baselines().len(),
            self.chan_freqs().len(),
            self.corr_types.len(),
        )
    }

    pub fn freq_params(&self) -> Option<FreqParams> {
        FreqParams::new(self.frame, self.dataset.freq_unit, &self.chan_freqs())
    }
}

/// Something that can produce partitions.
pub trait VisRead: Sync + Send {
    fn meta(&self) -> &MsMeta;

    fn data_group(&self) -> DataGroup;

    /// Every data group that could be read, not only the one being read.
    fn data_groups(&self) -> Vec<DataGroup> {
        vec![self.data_group()]
    }

    fn num_partitions(&self) -> usize;

    fn read_partition(&self, index: usize) -> Result<Partition, MsReadError>;
}
