//! A processing set: every partition of a measurement set, with summaries,
//! selections and statistics.

mod error;
mod select;
mod time;

pub use error::PsError;
pub use select::{MsSelection, PsSelection};
pub use time::{format_time, parse_time};

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, trace};
use rayon::prelude::*;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    axis::{Axis, VIS_AXES},
    derive::{apply_flags, get_data},
    read::{casacore_time_to_epoch, DataGroup, MsMeta, Partition, VisRead},
};

/// The dimensions that can be listed and selected on. The first four are the
/// dimensions of the visibilities themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PsDim {
    Time,

    #[strum(to_string = "baseline", serialize = "antenna_name")]
    Baseline,

    Antenna1,

    Antenna2,

    Frequency,

    Polarization,
}

pub const DATA_DIMS: [PsDim; 4] = [
    PsDim::Time,
    PsDim::Baseline,
    PsDim::Frequency,
    PsDim::Polarization,
];

impl PsDim {
    pub fn parse(s: &str) -> Result<PsDim, PsError> {
        PsDim::from_str(s).map_err(|_| PsError::UnknownDimension(s.to_string()))
    }
}

/// One summary row per partition.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub name: String,
    pub intents: Vec<String>,
    /// (times, baselines, channels, polarisations)
    pub shape: (usize, usize, usize, usize),
    pub polarization: Vec<String>,
    pub scan_numbers: Vec<i32>,
    pub spw_name: String,
    pub field_names: Vec<String>,
    /// \[Hz\]
    pub start_frequency: f64,
    /// \[Hz\]
    pub end_frequency: f64,
}

impl fmt::Display for SummaryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (t, b, c, p) = self.shape;
        writeln!(f, "MS name: {}", self.name)?;
        writeln!(f, "intent: {:?}", self.intents)?;
        writeln!(
            f,
            "shape: {t} times, {b} baselines, {c} channels, {p} polarizations"
        )?;
        writeln!(f, "polarization: {:?}", self.polarization)?;
        writeln!(f, "scan_number: {:?}", self.scan_numbers)?;
        writeln!(f, "spw_name: {}", self.spw_name)?;
        writeln!(f, "field_name: {:?}", self.field_names)?;
        write!(
            f,
            "frequency range: {:e} - {:e}",
            self.start_frequency, self.end_frequency
        )
    }
}

/// Statistics of the unflagged samples of a visibility component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
}

/// Welford's running mean and variance.
#[derive(Default)]
struct StatsAccumulator {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl StatsAccumulator {
    fn add(&mut self, v: f64) {
        if self.count == 0 {
            self.min = v;
            self.max = v;
        } else {
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
        self.count += 1;
        let delta = v - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (v - self.mean);
    }

    fn finish(self) -> Option<VisStats> {
        if self.count == 0 {
            return None;
        }
        Some(VisStats {
            min: self.min,
            max: self.max,
            mean: self.mean,
            std: (self.m2 / self.count as f64).sqrt(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProcessingSet {
    meta: MsMeta,

    data_group: DataGroup,

    /// The data groups present in the measurement set.
    data_groups: Vec<DataGroup>,

    partitions: Vec<Partition>,
}

impl ProcessingSet {
    pub fn new(meta: MsMeta, data_group: DataGroup, partitions: Vec<Partition>) -> ProcessingSet {
        ProcessingSet {
            meta,
            data_group,
            data_groups: vec![data_group],
            partitions,
        }
    }

    /// Read every partition.
    pub fn read(reader: &dyn VisRead) -> Result<ProcessingSet, PsError> {
        let num_partitions = reader.num_partitions();
        if num_partitions == 0 {
            return Err(PsError::NoPartitions);
        }
        let partitions = (0..num_partitions)
            .map(|i| {
                trace!("Reading partition {i}");
                reader.read_partition(i)
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Read {num_partitions} partitions from {}",
            reader.meta().path.display()
        );
        Ok(ProcessingSet {
            meta: reader.meta().clone(),
            data_group: reader.data_group(),
            data_groups: reader.data_groups(),
            partitions,
        })
    }

    pub fn meta(&self) -> &MsMeta {
        &self.meta
    }

    pub fn data_group(&self) -> DataGroup {
        self.data_group
    }

    pub fn data_groups(&self) -> &[DataGroup] {
        &self.data_groups
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    fn with_partitions(&self, partitions: Vec<Partition>) -> ProcessingSet {
        ProcessingSet {
            meta: self.meta.clone(),
            data_group: self.data_group,
            data_groups: self.data_groups.clone(),
            partitions,
        }
    }

    pub fn partition_name(&self, p: &Partition) -> String {
        format!("{}_{}", self.meta.stem(), p.ddid)
    }

    pub(crate) fn partition_intents(&self, p: &Partition) -> Vec<String> {
        p.state_ids()
            .into_iter()
            .filter_map(|id| usize::try_from(id).ok())
            .filter_map(|id| self.meta.intents.get(id).cloned())
            .collect()
    }

    pub(crate) fn partition_field_names(&self, p: &Partition) -> Vec<String> {
        p.field_ids()
            .into_iter()
            .map(|id| self.meta.field_name(id))
            .collect()
    }

    pub fn summary(&self) -> Vec<SummaryRow> {
        self.partitions
            .iter()
            .map(|p| {
                let freqs = p.chan_freqs_hz();
                SummaryRow {
                    name: self.partition_name(p),
                    intents: self.partition_intents(p),
                    shape: p.shape(),
                    polarization: p.pol_names().into_iter().map(String::from).collect(),
                    scan_numbers: p.scan_numbers(),
                    spw_name: p.spw_name.clone(),
                    field_names: self.partition_field_names(p),
                    start_frequency: freqs.first().copied().unwrap_or(f64::NAN),
                    end_frequency: freqs.last().copied().unwrap_or(f64::NAN),
                }
            })
            .collect()
    }

    pub fn data_dimensions(&self) -> Vec<PsDim> {
        DATA_DIMS.to_vec()
    }

    /// The largest length of each data dimension across the partitions.
    pub fn max_dims(&self) -> IndexMap<PsDim, usize> {
        let mut max_dims: IndexMap<PsDim, usize> = DATA_DIMS.iter().map(|&d| (d, 0)).collect();
        for p in &self.partitions {
            let (t, b, c, pol) = p.shape();
            for (dim, len) in DATA_DIMS.iter().zip([t, b, c, pol]) {
                let max = &mut max_dims[dim];
                *max = (*max).max(len);
            }
        }
        max_dims
    }

    /// The sorted, unique values of a dimension across every partition.
    pub fn dimension_values(&self, dim: PsDim) -> Vec<String> {
        let ps = &self.partitions;
        let names_of = |ants: Vec<i32>| -> Vec<String> {
            ants.into_iter()
                .map(|a| self.meta.antenna_name(a))
                .sorted()
                .dedup()
                .collect()
        };

        match dim {
            PsDim::Time => ps
                .iter()
                .flat_map(|p| p.raw_times())
                .sorted_by(|a, b| a.total_cmp(b))
                .dedup()
                .map(|t| format_time(casacore_time_to_epoch(t)))
                .dedup()
                .collect(),

            PsDim::Baseline => ps
                .iter()
                .flat_map(|p| p.baselines())
                .sorted()
                .dedup()
                .map(|(a1, a2)| {
                    format!(
                        "{} & {}",
                        self.meta.antenna_name(a1),
                        self.meta.antenna_name(a2)
                    )
                })
                .collect(),

            PsDim::Antenna1 => names_of(
                ps.iter()
                    .flat_map(|p| p.baselines().into_iter().map(|(a, _)| a))
                    .collect(),
            ),

            PsDim::Antenna2 => names_of(
                ps.iter()
                    .flat_map(|p| p.baselines().into_iter().map(|(_, a)| a))
                    .collect(),
            ),

            PsDim::Frequency => ps
                .iter()
                .flat_map(|p| p.chan_freqs_hz())
                .sorted_by(|a, b| a.total_cmp(b))
                .dedup()
                .map(|f| f.to_string())
                .collect(),

            PsDim::Polarization => ps
                .iter()
                .flat_map(|p| p.pol_names())
                .sorted()
                .dedup()
                .map(String::from)
                .collect(),
        }
    }

    /// The name of the first partition's spectral window.
    pub fn first_spw(&self) -> Option<&str> {
        self.partitions.first().map(|p| p.spw_name.as_str())
    }

    /// Keep the partitions matching `selection`.
    pub fn select_ps(&self, selection: &PsSelection) -> Result<ProcessingSet, PsError> {
        let partitions: Vec<Partition> = self
            .partitions
            .iter()
            .filter(|p| {
                selection.keeps(
                    p,
                    &self.partition_field_names(p),
                    &self.partition_intents(p),
                )
            })
            .cloned()
            .collect();
        debug!(
            "Processing set selection kept {} of {} partitions",
            partitions.len(),
            self.partitions.len()
        );
        if partitions.is_empty() {
            return Err(PsError::EmptySelection(format!("{selection:?}")));
        }
        Ok(self.with_partitions(partitions))
    }

    /// Select rows, channels and polarisations within each partition.
    /// Partitions left without data are dropped.
    pub fn select_ms(&self, selection: &MsSelection) -> Result<ProcessingSet, PsError> {
        let mut partitions = Vec::with_capacity(self.partitions.len());
        for p in &self.partitions {
            match selection.apply(p, &self.meta)? {
                Some(p) => partitions.push(p),
                None => trace!("Selection removed all of partition {}", p.ddid),
            }
        }
        if partitions.is_empty() {
            return Err(PsError::EmptySelection(format!("{selection:?}")));
        }
        Ok(self.with_partitions(partitions))
    }

    /// Statistics of the unflagged `vis_axis` values in every partition.
    pub fn vis_stats(&self, vis_axis: Axis) -> Result<VisStats, PsError> {
        if !VIS_AXES.contains(&vis_axis) {
            return Err(PsError::BadVisAxis(vis_axis));
        }
        let values = self
            .partitions
            .par_iter()
            .map(|p| {
                let mut ds = p.dataset.clone();
                apply_flags(&mut ds);
                get_data(&ds, vis_axis)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut acc = StatsAccumulator::default();
        values
            .iter()
            .flat_map(|v| v.iter())
            .filter(|v| v.is_finite())
            .for_each(|&v| acc.add(v));
        acc.finish().ok_or(PsError::AllFlagged)
    }
}
