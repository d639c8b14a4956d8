//! MsRaster: 2-D planes of a visibility component over two data dimensions,
//! with the other dimensions aggregated, iterated or fixed at their first
//! index.

mod error;

pub use error::RasterError;

use std::cmp::Ordering;

use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, info, trace, warn};
use ndarray::prelude::*;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    axis::{Axis as PlotAxis, VIS_AXES},
    derive::{apply_flags, get_data},
    ps::{format_time, ProcessingSet, PsDim, VisStats, DATA_DIMS},
    read::{casacore_time_to_epoch, MsMeta, Partition},
    units::{convert_freq, FreqUnit},
};

/// How to reduce the aggregated dimensions. NaNs (flagged samples) are
/// skipped; a lane with nothing but NaNs reduces to NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Aggregator {
    Max,
    Mean,
    Median,
    Min,
    Std,
    Sum,
    Var,
}

impl Aggregator {
    pub fn apply<I: IntoIterator<Item = f64>>(self, values: I) -> f64 {
        let mut v: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        if v.is_empty() {
            return f64::NAN;
        }
        let n = v.len() as f64;
        let mean = || v.iter().sum::<f64>() / n;
        let var = |mean: f64| v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        match self {
            Aggregator::Max => v.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregator::Min => v.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregator::Sum => v.iter().sum(),
            Aggregator::Mean => mean(),
            Aggregator::Var => var(mean()),
            Aggregator::Std => var(mean()).sqrt(),
            Aggregator::Median => {
                v.sort_unstable_by(f64::total_cmp);
                let mid = v.len() / 2;
                if v.len() % 2 == 0 {
                    (v[mid - 1] + v[mid]) / 2.0
                } else {
                    v[mid]
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ColorMode {
    /// Limits from the statistics of the whole selection.
    Auto,

    /// Limits from `color_range`.
    Manual,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterInputs {
    pub x_axis: PsDim,

    pub y_axis: PsDim,

    pub vis_axis: PlotAxis,

    pub aggregator: Option<Aggregator>,

    /// The dimensions to aggregate over. If an aggregator is given without
    /// any, every dimension that isn't plotted or iterated is aggregated.
    pub agg_axis: Vec<PsDim>,

    pub iter_axis: Option<PsDim>,

    /// (start, end), both inclusive. An end of -1 means the last index.
    pub iter_range: Option<(usize, i64)>,

    /// (rows, columns) of planes in each image.
    pub subplots: Option<(usize, usize)>,

    pub color_mode: Option<ColorMode>,

    pub color_range: Option<(f64, f64)>,

    pub title: Option<String>,
}

impl Default for RasterInputs {
    fn default() -> Self {
        RasterInputs {
            x_axis: PsDim::Baseline,
            y_axis: PsDim::Time,
            vis_axis: PlotAxis::Amp,
            aggregator: None,
            agg_axis: vec![],
            iter_axis: None,
            iter_range: None,
            subplots: None,
            color_mode: None,
            color_range: None,
            title: None,
        }
    }
}

impl RasterInputs {
    /// Validate the inputs against the dimensions of the data, filling in
    /// the aggregation axes if they weren't given.
    pub fn check(&mut self, data_dims: &[PsDim]) -> Result<(), RasterError> {
        let (x, y) = (self.x_axis, self.y_axis);
        if x == y {
            return Err(RasterError::SameAxes(x));
        }
        let is_data_dim = |dim: PsDim| -> Result<(), RasterError> {
            if data_dims.contains(&dim) {
                Ok(())
            } else {
                Err(RasterError::NotDataDim {
                    dim,
                    valid: data_dims.iter().join(", "),
                })
            }
        };
        is_data_dim(x)?;
        is_data_dim(y)?;
        if let Some(iter_axis) = self.iter_axis {
            if iter_axis == x || iter_axis == y {
                return Err(RasterError::IterIsPlotted(iter_axis));
            }
            is_data_dim(iter_axis)?;
        }

        if !VIS_AXES.contains(&self.vis_axis) {
            return Err(RasterError::BadVisAxis(self.vis_axis));
        }

        self.agg_axis = self.agg_axis.iter().copied().unique().collect();
        for &dim in &self.agg_axis {
            if dim == x || dim == y {
                return Err(RasterError::AggIsPlotted(dim));
            }
            if Some(dim) == self.iter_axis {
                return Err(RasterError::AggIsIterated(dim));
            }
            is_data_dim(dim)?;
        }
        match self.aggregator {
            Some(_) if self.agg_axis.is_empty() => {
                self.agg_axis = data_dims
                    .iter()
                    .copied()
                    .filter(|&d| d != x && d != y && Some(d) != self.iter_axis)
                    .collect();
                debug!("Aggregating over {}", self.agg_axis.iter().join(", "));
            }
            None if !self.agg_axis.is_empty() => {
                warn!("agg_axis was given without an aggregator; ignoring it");
                self.agg_axis.clear();
            }
            _ => (),
        }

        if let Some((lo, hi)) = self.color_range {
            if lo.partial_cmp(&hi) != Some(Ordering::Less) {
                return Err(RasterError::BadColorRange(lo, hi));
            }
        }
        if self.color_mode == Some(ColorMode::Manual) && self.color_range.is_none() {
            return Err(RasterError::ManualWithoutRange);
        }

        if let Some((rows, cols)) = self.subplots {
            if rows == 0 || cols == 0 {
                return Err(RasterError::BadSubplots(rows, cols));
            }
        }
        Ok(())
    }

    /// The iteration indices to plot, given the length of the iteration
    /// axis.
    pub fn iter_indices(&self, len: usize) -> Result<Vec<usize>, RasterError> {
        let (start, end) = match self.iter_range {
            None => return Ok((0..len).collect()),
            Some(r) => r,
        };
        let bad = || RasterError::BadIterRange { start, end, len };
        if len == 0 {
            return Err(bad());
        }
        let last = match end {
            -1 => len - 1,
            e if e < 0 => return Err(bad()),
            e => usize::try_from(e).map_err(|_| bad())?.min(len - 1),
        };
        if start > last {
            return Err(bad());
        }
        Ok((start..=last).collect())
    }
}

/// The colour-scale limits of every plane. `None` means each plane uses its
/// own data range.
pub fn color_limits(inputs: &RasterInputs, stats: Option<&VisStats>) -> Option<(f64, f64)> {
    match inputs.color_mode {
        None => None,
        Some(ColorMode::Manual) => inputs.color_range,
        Some(ColorMode::Auto) => {
            if inputs.vis_axis == PlotAxis::Phase {
                return Some((-180.0, 180.0));
            }
            stats.map(|s| {
                (
                    s.min.max(s.mean - 3.0 * s.std),
                    s.max.min(s.mean + 3.0 * s.std),
                )
            })
        }
    }
}

/// The finite (min, max) of a plane.
pub fn plane_range(values: &Array2<f64>) -> Option<(f64, f64)> {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// A visibility component of one partition on a
/// `[time, baseline, frequency, polarization]` grid. Flagged samples and
/// missing (time, baseline) pairs are NaN.
#[derive(Debug, Clone)]
pub struct VisCube {
    pub values: Array4<f64>,

    /// The value labels along each of [`DATA_DIMS`].
    pub labels: IndexMap<PsDim, Vec<String>>,
}

impl VisCube {
    pub fn new(p: &Partition, meta: &MsMeta, vis_axis: PlotAxis) -> Result<VisCube, RasterError> {
        let mut ds = p.dataset.clone();
        apply_flags(&mut ds);
        let vis = get_data(&ds, vis_axis)?.into_dimensionality::<Ix3>()?;

        let column = |name: &'static str| -> Result<Vec<f64>, RasterError> {
            let var = ds.get(name).ok_or(RasterError::MissingColumn(name))?;
            Ok(var.to_f64(name)?.into_iter().collect())
        };
        let row_times = column("TIME")?;
        let ant1 = column("ANTENNA1")?;
        let ant2 = column("ANTENNA2")?;

        let times = p.raw_times();
        let baselines = p.baselines();
        let (num_chans, num_pols) = (vis.len_of(Axis(1)), vis.len_of(Axis(2)));
        let mut values = Array4::from_elem(
            (times.len(), baselines.len(), num_chans, num_pols),
            f64::NAN,
        );
        for (row, row_vis) in vis.outer_iter().enumerate() {
            let t = row_times[row];
            let bl = (ant1[row] as i32, ant2[row] as i32);
            let (Ok(ti), Ok(bi)) = (
                times.binary_search_by(|x| x.total_cmp(&t)),
                baselines.binary_search(&bl),
            ) else {
                trace!("Row {row} has no place on the grid");
                continue;
            };
            values.slice_mut(s![ti, bi, .., ..]).assign(&row_vis);
        }

        let freq_unit = ds.freq_unit;
        let mut labels = IndexMap::new();
        labels.insert(
            PsDim::Time,
            times
                .iter()
                .map(|&t| format_time(casacore_time_to_epoch(t)))
                .collect(),
        );
        labels.insert(
            PsDim::Baseline,
            baselines
                .iter()
                .map(|&(a1, a2)| format!("{} & {}", meta.antenna_name(a1), meta.antenna_name(a2)))
                .collect(),
        );
        labels.insert(
            PsDim::Frequency,
            p.chan_freqs()
                .iter()
                .map(|&f| format!("{:.6}", convert_freq(f, freq_unit, FreqUnit::GHz)))
                .collect(),
        );
        labels.insert(
            PsDim::Polarization,
            p.pol_names().into_iter().map(String::from).collect(),
        );

        Ok(VisCube { values, labels })
    }

    pub fn len_of(&self, dim: PsDim) -> usize {
        DATA_DIMS
            .iter()
            .position(|&d| d == dim)
            .map(|i| self.values.len_of(Axis(i)))
            .unwrap_or(0)
    }

    /// Reduce to a `[y, x]` plane. Aggregated dimensions are reduced
    /// together; the iteration axis is fixed at `iter_index`; anything else
    /// is fixed at its first index.
    pub fn plane(&self, inputs: &RasterInputs, iter_index: Option<usize>) -> Array2<f64> {
        let mut view = self.values.view().into_dyn();
        let mut remaining = DATA_DIMS.to_vec();
        for pos in (0..DATA_DIMS.len()).rev() {
            let dim = DATA_DIMS[pos];
            if dim == inputs.x_axis || dim == inputs.y_axis || inputs.agg_axis.contains(&dim) {
                continue;
            }
            let index = match (inputs.iter_axis, iter_index) {
                (Some(iter_axis), Some(i)) if iter_axis == dim => i,
                _ => 0,
            };
            view = view.index_axis_move(Axis(pos), index);
            remaining.remove(pos);
        }

        let position = |dim: PsDim| remaining.iter().position(|&d| d == dim);
        let perm: Vec<usize> = [inputs.y_axis, inputs.x_axis]
            .into_iter()
            .chain(inputs.agg_axis.iter().copied())
            .unique()
            .filter_map(position)
            .collect();
        let view = view.permuted_axes(IxDyn(&perm));
        let (ny, nx) = (view.shape()[0], view.shape()[1]);

        Array2::from_shape_fn((ny, nx), |(i, j)| {
            let row = view.index_axis(Axis(0), i);
            let cell = row.index_axis(Axis(0), j);
            match inputs.aggregator {
                Some(agg) => agg.apply(cell.iter().copied()),
                None => cell.iter().next().copied().unwrap_or(f64::NAN),
            }
        })
    }
}

/// One heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterPlane {
    pub title: String,

    pub x_axis: PsDim,

    pub y_axis: PsDim,

    pub x_labels: Vec<String>,

    pub y_labels: Vec<String>,

    /// `[y, x]`
    pub values: Array2<f64>,

    /// The colour-bar label.
    pub vis_label: String,

    pub color_limits: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterData {
    pub planes: Vec<RasterPlane>,

    /// (rows, columns)
    pub subplots: (usize, usize),
}

/// Make the planes for `inputs` from the first partition of `ps`. `inputs`
/// must already be checked. `stats` are only used for automatic colour
/// limits.
pub fn raster_data(
    ps: &ProcessingSet,
    inputs: &RasterInputs,
    stats: Option<&VisStats>,
) -> Result<RasterData, RasterError> {
    let p = ps.partitions().first().ok_or(RasterError::EmptyData)?;
    if ps.len() > 1 {
        info!(
            "Selection has {} spectral windows; plotting the first, {}",
            ps.len(),
            p.spw_name
        );
    }
    let cube = VisCube::new(p, ps.meta(), inputs.vis_axis)?;
    if cube.values.is_empty() {
        return Err(RasterError::EmptyData);
    }

    let color_limits = color_limits(inputs, stats);
    let base_title = inputs
        .title
        .clone()
        .unwrap_or_else(|| ps.partition_name(p));
    let vis_label = inputs.vis_axis.label_with_unit(None, None);
    let labels_of = |dim: PsDim| cube.labels.get(&dim).cloned().unwrap_or_default();

    let iterations: Vec<Option<usize>> = match inputs.iter_axis {
        Some(iter_axis) => inputs
            .iter_indices(cube.len_of(iter_axis))?
            .into_iter()
            .map(Some)
            .collect(),
        None => vec![None],
    };

    let planes = iterations
        .into_iter()
        .map(|iter_index| {
            let title = match (inputs.iter_axis, iter_index) {
                (Some(dim), Some(i)) => {
                    let value = cube
                        .labels
                        .get(&dim)
                        .and_then(|l| l.get(i))
                        .cloned()
                        .unwrap_or_else(|| i.to_string());
                    format!("{base_title} {dim} {value}")
                }
                _ => base_title.clone(),
            };
            trace!("Making plane '{title}'");
            RasterPlane {
                title,
                x_axis: inputs.x_axis,
                y_axis: inputs.y_axis,
                x_labels: labels_of(inputs.x_axis),
                y_labels: labels_of(inputs.y_axis),
                values: cube.plane(inputs, iter_index),
                vis_label: vis_label.clone(),
                color_limits,
            }
        })
        .collect::<Vec<_>>();
    debug!("Made {} raster planes", planes.len());

    Ok(RasterData {
        planes,
        subplots: inputs.subplots.unwrap_or((1, 1)),
    })
}
