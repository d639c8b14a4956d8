use hifitime::Epoch;
use log::trace;

use super::{format_time, parse_time, PsError};
use crate::{
    dataset::Dim,
    read::{casacore_time_to_epoch, pol_name, MsMeta, Partition},
};

/// Select whole partitions by their summary metadata. Each non-empty list
/// must match at least one of the partition's values.
#[derive(Debug, Clone)]
pub struct PsSelection {
    pub spw_names: Vec<String>,

    pub field_names: Vec<String>,

    pub scan_numbers: Vec<i32>,

    pub intents: Vec<String>,

    /// If false, a requested string only needs to be contained in a
    /// partition's value.
    pub string_exact_match: bool,
}

impl Default for PsSelection {
    fn default() -> Self {
        PsSelection {
            spw_names: vec![],
            field_names: vec![],
            scan_numbers: vec![],
            intents: vec![],
            string_exact_match: true,
        }
    }
}

impl PsSelection {
    pub fn is_empty(&self) -> bool {
        self.spw_names.is_empty()
            && self.field_names.is_empty()
            && self.scan_numbers.is_empty()
            && self.intents.is_empty()
    }

    fn matches_any(&self, have: &[String], wanted: &[String]) -> bool {
        wanted.is_empty()
            || have.iter().any(|h| {
                wanted.iter().any(|w| {
                    if self.string_exact_match {
                        h == w
                    } else {
                        h.contains(w.as_str())
                    }
                })
            })
    }

    pub(super) fn keeps(&self, p: &Partition, field_names: &[String], intents: &[String]) -> bool {
        self.matches_any(std::slice::from_ref(&p.spw_name), &self.spw_names)
            && self.matches_any(field_names, &self.field_names)
            && self.matches_any(intents, &self.intents)
            && (self.scan_numbers.is_empty()
                || p.scan_numbers()
                    .iter()
                    .any(|s| self.scan_numbers.contains(s)))
    }
}

/// Select within partitions by dimension values, as listed by
/// [`super::ProcessingSet::dimension_values`].
#[derive(Debug, Clone, Default)]
pub struct MsSelection {
    /// e.g. `19-Nov-2012 07:36:57`
    pub times: Vec<String>,

    /// If set, each requested time selects the nearest time in the data,
    /// provided it is within this many seconds.
    pub time_tolerance: Option<f64>,

    /// e.g. `DA41 & DA42`
    pub baselines: Vec<String>,

    pub antenna1: Vec<String>,

    pub antenna2: Vec<String>,

    /// Channel indices.
    pub frequencies: Vec<usize>,

    pub polarizations: Vec<String>,
}

impl MsSelection {
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
            && self.baselines.is_empty()
            && self.antenna1.is_empty()
            && self.antenna2.is_empty()
            && self.frequencies.is_empty()
            && self.polarizations.is_empty()
    }

    fn selected_times(&self, p: &Partition) -> Result<Vec<Epoch>, PsError> {
        let wanted: Vec<Epoch> = self
            .times
            .iter()
            .map(|t| parse_time(t))
            .collect::<Result<_, _>>()?;
        let available = p.times();

        let selected = match self.time_tolerance {
            None => {
                let wanted: Vec<String> = wanted.into_iter().map(format_time).collect();
                available
                    .into_iter()
                    .filter(|&t| wanted.contains(&format_time(t)))
                    .collect()
            }
            Some(tolerance) => wanted
                .into_iter()
                .filter_map(|w| {
                    let offset = |t: &Epoch| (*t - w).to_seconds().abs();
                    available
                        .iter()
                        .min_by(|a, b| offset(a).total_cmp(&offset(b)))
                        .filter(|t| offset(t) <= tolerance)
                        .copied()
                })
                .collect(),
        };
        Ok(selected)
    }

    /// The selected part of a partition, if any of it is left.
    pub(super) fn apply(&self, p: &Partition, meta: &MsMeta) -> Result<Option<Partition>, PsError> {
        let ds = &p.dataset;
        let num_rows = ds.dim_len(Dim::Row).unwrap_or(0);
        let mut keep = vec![true; num_rows];

        if !self.times.is_empty() {
            let selected = self.selected_times(p)?;
            let times = match ds.get("TIME") {
                Some(v) => v.to_f64("TIME")?,
                None => return Ok(None),
            };
            for (k, &t) in keep.iter_mut().zip(times.iter()) {
                *k &= selected.contains(&casacore_time_to_epoch(t));
            }
        }

        if !(self.baselines.is_empty() && self.antenna1.is_empty() && self.antenna2.is_empty()) {
            let (ant1, ant2) = match (ds.get("ANTENNA1"), ds.get("ANTENNA2")) {
                (Some(a1), Some(a2)) => (a1.to_f64("ANTENNA1")?, a2.to_f64("ANTENNA2")?),
                _ => return Ok(None),
            };
            for ((k, &a1), &a2) in keep.iter_mut().zip(ant1.iter()).zip(ant2.iter()) {
                let name1 = meta.antenna_name(a1 as i32);
                let name2 = meta.antenna_name(a2 as i32);
                if !self.baselines.is_empty() {
                    *k &= self.baselines.contains(&format!("{name1} & {name2}"));
                }
                if !self.antenna1.is_empty() {
                    *k &= self.antenna1.contains(&name1);
                }
                if !self.antenna2.is_empty() {
                    *k &= self.antenna2.contains(&name2);
                }
            }
        }

        let mut ds = if keep.iter().all(|&k| k) {
            ds.clone()
        } else {
            ds.filter_rows(&keep)?
        };
        if ds.dim_len(Dim::Row).unwrap_or(0) == 0 {
            return Ok(None);
        }

        if !self.frequencies.is_empty() {
            let num_chans = ds.dim_len(Dim::Chan).unwrap_or(0);
            let chans: Vec<usize> = self
                .frequencies
                .iter()
                .copied()
                .filter(|&c| c < num_chans)
                .collect();
            if chans.is_empty() {
                return Ok(None);
            }
            ds = ds.isel(Dim::Chan, &chans)?;
        }

        let mut corr_types = p.corr_types.clone();
        if !self.polarizations.is_empty() {
            let pols: Vec<usize> = p
                .corr_types
                .iter()
                .enumerate()
                .filter(|&(_, &c)| self.polarizations.iter().any(|s| s == pol_name(c)))
                .map(|(i, _)| i)
                .collect();
            if pols.is_empty() {
                return Ok(None);
            }
            ds = ds.isel(Dim::Pol, &pols)?;
            corr_types = pols.iter().map(|&i| p.corr_types[i]).collect();
        }

        trace!(
            "Selected {} rows of partition {}",
            ds.dim_len(Dim::Row).unwrap_or(0),
            p.ddid
        );
        Ok(Some(Partition {
            ddid: p.ddid,
            spw_id: p.spw_id,
            spw_name: p.spw_name.clone(),
            frame: p.frame,
            corr_types,
            dataset: ds,
        }))
    }
}
