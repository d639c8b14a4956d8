//! Turn plot axes into values.
//!
//! Each [`Axis`] maps onto one or two dataset variables (see
//! [`Axis::key`]). Single-variable axes are extracted with [`values`]; paired
//! axes are calculated by [`calc_values`], which dispatches on the axis and
//! not on the variable names (`DATA` alone gives amp, phase, real and imag).
//! Flags must be applied with [`apply_flags`] before anything is derived so
//! that flagged samples come out as NaN.

mod error;
#[cfg(test)]
mod tests;

pub use error::DeriveError;

use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, trace};
use marlu::{c32, constants::VEL_C};
use ndarray::{Array1, Array2, ArrayD, IxDyn, Zip};

use crate::{
    axis::{Axis, AxisKey},
    dataset::{Dataset, DatasetError, Dim, Values, Variable},
    units::{convert_freq, radio_velocity, FreqParams, FreqUnit, UnitError},
};

/// The data variable holding per-sample flags.
pub const FLAG_COL: &str = "FLAG";

fn format_dims(dims: &[Dim]) -> String {
    format!("({})", dims.iter().join(", "))
}

fn column_dims(ds: &Dataset, name: &str, axis: Axis) -> Result<Vec<Dim>, DeriveError> {
    ds.get(name)
        .map(|v| v.dims.clone())
        .ok_or_else(|| DeriveError::MissingColumn {
            name: name.to_string(),
            axis,
        })
}

/// The dimensions spanned by the values of `key`. For a paired key this is
/// the superset of both variables' dimensions; if neither contains the other,
/// the second variable's dimensions come first (for the wavelength axes this
/// puts `chan` before `row`).
pub fn array_dims(ds: &Dataset, key: AxisKey, axis: Axis) -> Result<Vec<Dim>, DeriveError> {
    match key {
        AxisKey::Column(name) => column_dims(ds, name, axis),
        AxisKey::Derived(first, second) => {
            let dims0 = column_dims(ds, first, axis)?;
            let dims1 = column_dims(ds, second, axis)?;
            let dims = if dims0 == dims1 {
                dims0
            } else if dims0.iter().all(|d| dims1.contains(d)) {
                dims1
            } else if dims1.iter().all(|d| dims0.contains(d)) {
                dims0
            } else {
                dims1.into_iter().chain(dims0).collect()
            };
            Ok(dims)
        }
    }
}

/// Mask every data variable that has exactly the dimensions of the flags
/// wherever a flag is set. The values (and their types) are left alone. A
/// dataset without flags is untouched.
pub fn apply_flags(ds: &mut Dataset) {
    let (flag_dims, flags) = match ds.data_var(FLAG_COL) {
        Some(Variable { dims, values, .. }) => {
            let flags = match values {
                Values::Bool(f) => f.clone(),
                Values::Int(f) => f.mapv(|f| f != 0),
                Values::Float(f) => f.mapv(|f| f != 0.0),
                Values::Complex(_) => {
                    debug!("{FLAG_COL} is complex; not applying flags");
                    return;
                }
            };
            (dims.clone(), flags)
        }
        None => {
            debug!("No {FLAG_COL} variable; not applying flags");
            return;
        }
    };

    for (name, var) in ds.data_vars_mut() {
        if name == FLAG_COL || var.dims != flag_dims {
            continue;
        }
        trace!("Applying flags to {name}");
        var.mask_where(flags.view());
    }
}

/// Extract the values of a single variable for `axis`. Masked elements are
/// NaN.
pub fn values(ds: &Dataset, name: &str, axis: Axis) -> Result<ArrayD<f64>, DeriveError> {
    let var = ds.get(name).ok_or_else(|| DeriveError::MissingColumn {
        name: name.to_string(),
        axis,
    })?;

    match name {
        "UVW" => uvw_values(var, axis),
        "DATA" => complex_values(var, name, axis),
        "chan" if axis == Axis::Channel => {
            let num_chans = var.shape().iter().product::<usize>();
            Ok(Array1::from_iter((0..num_chans).map(|i| i as f64)).into_dyn())
        }
        _ => Ok(var.to_f64(name)?),
    }
}

fn uvw_values(var: &Variable, axis: Axis) -> Result<ArrayD<f64>, DeriveError> {
    let uvw = var.to_f64("UVW")?;
    let i_axis = var
        .dims
        .iter()
        .position(|&d| d == Dim::UvwIndex)
        .ok_or(DatasetError::NoSuchDim(Dim::UvwIndex))?;
    let len = uvw.len_of(ndarray::Axis(i_axis));
    if len < 3 {
        return Err(DatasetError::IndexOutOfRange {
            dim: Dim::UvwIndex,
            index: 2,
            len,
        }
        .into());
    }
    let component = |c: usize| uvw.index_axis(ndarray::Axis(i_axis), c).to_owned();

    let out = match axis {
        Axis::U | Axis::UWave => component(0),
        Axis::V | Axis::VWave => component(1),
        Axis::W | Axis::WWave => component(2),
        Axis::UvDist | Axis::UvWave => {
            let u = component(0);
            let v = component(1);
            Zip::from(&u)
                .and(&v)
                .map_collect(|&u, &v| (u * u + v * v).sqrt())
        }
        _ => uvw,
    };
    Ok(out)
}

fn complex_values(var: &Variable, name: &str, axis: Axis) -> Result<ArrayD<f64>, DeriveError> {
    let data = match &var.values {
        Values::Complex(d) => d,
        v => {
            return Err(DeriveError::WrongType {
                name: name.to_string(),
                axis,
                got: v.type_name(),
                expected: "complex",
            })
        }
    };

    let component: fn(&c32) -> f64 = match axis {
        Axis::Amp | Axis::WtxAmp => |c| f64::from(c.re).hypot(f64::from(c.im)),
        Axis::Phase => |c| f64::from(c.im).atan2(f64::from(c.re)).to_degrees(),
        Axis::Real => |c| f64::from(c.re),
        Axis::Imag => |c| f64::from(c.im),
        _ => {
            return Err(DeriveError::WrongType {
                name: name.to_string(),
                axis,
                got: "complex",
                expected: "real",
            })
        }
    };

    let mut out = Zip::from(data).par_map_collect(component);
    var.apply_mask(&mut out);
    Ok(out)
}

/// The index of a baseline in the upper triangle (autos included) of
/// `num_ant` antennas. The antenna order doesn't matter.
pub fn baseline_index(ant1: usize, ant2: usize, num_ant: usize) -> usize {
    let (a, b) = if ant1 <= ant2 { (ant1, ant2) } else { (ant2, ant1) };
    a * num_ant - a * (a + 1) / 2 + b
}

/// Calculate the values of an axis built from two variables.
pub fn calc_values(ds: &Dataset, axis: Axis) -> Result<ArrayD<f64>, DeriveError> {
    let (first, second) = match axis.key() {
        AxisKey::Derived(first, second) => (first, second),
        AxisKey::Column(_) => return Err(DeriveError::NotDerived(axis)),
    };
    let data0 = values(ds, first, axis)?;
    let data1 = values(ds, second, axis)?;
    let incompatible = || -> Result<DeriveError, DeriveError> {
        Ok(DeriveError::IncompatibleDims {
            axis,
            first,
            first_dims: format_dims(&column_dims(ds, first, axis)?),
            second,
            second_dims: format_dims(&column_dims(ds, second, axis)?),
        })
    };

    match axis {
        Axis::WtxAmp => {
            // data0 is the weights, data1 the amplitudes. Scale each channel
            // plane by the weights.
            let weight_dims = column_dims(ds, first, axis)?;
            let mut plane_dims = column_dims(ds, second, axis)?;
            let i_chan = match plane_dims.iter().position(|&d| d == Dim::Chan) {
                Some(i) => i,
                None => return Err(incompatible()?),
            };
            plane_dims.remove(i_chan);
            if plane_dims != weight_dims {
                return Err(incompatible()?);
            }

            let mut amps = data1;
            for mut plane in amps.axis_iter_mut(ndarray::Axis(i_chan)) {
                plane *= &data0;
            }
            Ok(amps)
        }

        Axis::Baseline => {
            if data0.shape() != data1.shape() {
                return Err(incompatible()?);
            }
            let valid = data0.iter().chain(data1.iter()).filter(|a| a.is_finite());
            let mut max_ant = 0.0_f64;
            for &ant in valid {
                if ant < 0.0 {
                    return Err(DeriveError::NegativeAntenna(ant as i64));
                }
                max_ant = max_ant.max(ant);
            }
            let num_ant = max_ant as usize + 1;
            trace!("Baseline indices for {num_ant} antennas");

            Ok(Zip::from(&data0).and(&data1).map_collect(|&a1, &a2| {
                if a1.is_nan() || a2.is_nan() {
                    f64::NAN
                } else {
                    baseline_index(a1 as usize, a2 as usize, num_ant) as f64
                }
            }))
        }

        _ if axis.is_wave() => {
            // data0 is a geometry value per row [m], data1 the channel
            // frequencies.
            let to_hz = ds.freq_unit.hz();
            let geom: Vec<f64> = data0.iter().copied().collect();
            let freqs: Vec<f64> = data1.iter().map(|f| f * to_hz).collect();
            let wave = Array2::from_shape_fn((freqs.len(), geom.len()), |(i_chan, i_row)| {
                geom[i_row] / VEL_C * freqs[i_chan]
            });
            Ok(wave.into_dyn())
        }

        _ => Err(DeriveError::UnsupportedDerivation(axis)),
    }
}

/// The values for an axis, however they are made.
pub fn get_data(ds: &Dataset, axis: Axis) -> Result<ArrayD<f64>, DeriveError> {
    match axis.key() {
        AxisKey::Column(name) => values(ds, name, axis),
        AxisKey::Derived(..) => calc_values(ds, axis),
    }
}

#[derive(Debug, Clone)]
pub struct PlotVar {
    pub axis: Axis,

    pub dims: Vec<Dim>,

    pub values: ArrayD<f64>,

    /// Where each of `dims` sits in the plot dataset's dims.
    positions: Vec<usize>,
}

/// A dataset holding only the two plotted axes and the coordinates they
/// need.
#[derive(Debug, Clone)]
pub struct PlotDataset {
    /// The union of both axes' dims, in the source dataset's order.
    pub dims: Vec<(Dim, usize)>,

    pub coords: IndexMap<Dim, Variable>,

    pub x: PlotVar,

    pub y: PlotVar,

    /// The unit of frequencies before any conversion.
    pub freq_unit: FreqUnit,
}

/// Build the dataset of `x` against `y`. `ds` should already have had
/// [`apply_flags`] run on it.
pub fn plot_dataset(ds: &Dataset, x: Axis, y: Axis) -> Result<PlotDataset, DeriveError> {
    // uvw_index has already been indexed away to get u, v and w.
    let plot_dims_of = |axis: Axis| -> Result<Vec<Dim>, DeriveError> {
        Ok(array_dims(ds, axis.key(), axis)?
            .into_iter()
            .filter(|&d| d != Dim::UvwIndex)
            .collect())
    };
    let xdims = plot_dims_of(x)?;
    let ydims = plot_dims_of(y)?;

    let dims: Vec<(Dim, usize)> = ds
        .dims()
        .iter()
        .filter(|(d, _)| xdims.contains(d) || ydims.contains(d))
        .map(|(&d, &l)| (d, l))
        .collect();
    let coords = dims
        .iter()
        .filter_map(|&(d, _)| {
            let name: &'static str = d.into();
            ds.coord(name).map(|c| (d, c.clone()))
        })
        .collect();

    let make_var = |axis: Axis, var_dims: Vec<Dim>| -> Result<PlotVar, DeriveError> {
        let values = get_data(ds, axis)?;
        let mut positions = Vec::with_capacity(var_dims.len());
        let mut expected_shape = Vec::with_capacity(var_dims.len());
        for d in &var_dims {
            if let Some(p) = dims.iter().position(|(pd, _)| pd == d) {
                positions.push(p);
                expected_shape.push(dims[p].1);
            }
        }
        if values.shape() != expected_shape.as_slice() {
            let (first, second) = match axis.key() {
                AxisKey::Column(c) => (c, c),
                AxisKey::Derived(a, b) => (a, b),
            };
            return Err(DeriveError::IncompatibleDims {
                axis,
                first,
                first_dims: format_dims(&var_dims),
                second,
                second_dims: format!("{:?}", values.shape()),
            });
        }
        Ok(PlotVar {
            axis,
            dims: var_dims,
            values,
            positions,
        })
    };

    let plot_ds = PlotDataset {
        x: make_var(x, xdims)?,
        y: make_var(y, ydims)?,
        dims,
        coords,
        freq_unit: ds.freq_unit,
    };
    trace!(
        "Plot dataset dims: {}",
        format_dims(&plot_ds.dims.iter().map(|&(d, _)| d).collect::<Vec<_>>())
    );
    Ok(plot_ds)
}

/// Convert `frequency` values to GHz and `velocity` values (stored as
/// frequencies) to radio velocities in km/s.
pub fn convert_frequency_axes(
    plot_ds: &mut PlotDataset,
    freq_params: Option<&FreqParams>,
) -> Result<(), DeriveError> {
    let native_unit = plot_ds.freq_unit;
    for var in [&mut plot_ds.x, &mut plot_ds.y] {
        match var.axis {
            Axis::Frequency if native_unit != FreqUnit::GHz => {
                var.values
                    .mapv_inplace(|f| convert_freq(f, native_unit, FreqUnit::GHz));
            }
            Axis::Velocity => {
                let params = freq_params.ok_or(DeriveError::MissingFreqParams(Axis::Velocity))?;
                let rest_freq = convert_freq(params.rest_freq, params.unit, native_unit);
                if rest_freq == 0.0 {
                    return Err(UnitError::ZeroRestFreq.into());
                }
                var.values
                    .mapv_inplace(|f| radio_velocity(f, rest_freq).unwrap_or(f64::NAN));
            }
            _ => (),
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotRow {
    /// The index into each of the table's dims.
    pub index: Vec<usize>,
    pub x: f64,
    pub y: f64,
}

/// A flat, row-oriented table of x against y.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotTable {
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub dims: Vec<Dim>,
    pub rows: Vec<PlotRow>,
}

impl PlotDataset {
    /// Flatten into one row per element of the broadcast dims.
    pub fn to_table(&self) -> PlotTable {
        let rows = self
            .dims
            .iter()
            .map(|&(_, len)| 0..len)
            .multi_cartesian_product()
            .map(|index| {
                let xi: Vec<usize> = self.x.positions.iter().map(|&p| index[p]).collect();
                let yi: Vec<usize> = self.y.positions.iter().map(|&p| index[p]).collect();
                PlotRow {
                    x: self.x.values[IxDyn(&xi)],
                    y: self.y.values[IxDyn(&yi)],
                    index,
                }
            })
            .collect();

        PlotTable {
            x_axis: self.x.axis,
            y_axis: self.y.axis,
            dims: self.dims.iter().map(|&(d, _)| d).collect(),
            rows,
        }
    }
}

impl PlotTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The plottable points, i.e. those where neither x nor y is NaN or
    /// infinite.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.rows
            .iter()
            .filter(|r| r.x.is_finite() && r.y.is_finite())
            .map(|r| (r.x, r.y))
    }

    /// The same table with every point reflected through the origin. UV
    /// plots show these alongside the originals.
    pub fn conjugate(&self) -> PlotTable {
        PlotTable {
            rows: self
                .rows
                .iter()
                .map(|r| PlotRow {
                    index: r.index.clone(),
                    x: -r.x,
                    y: -r.y,
                })
                .collect(),
            ..self.clone()
        }
    }

    /// The finite (min, max) of x and of y, if there are any points.
    pub fn ranges(&self) -> Option<((f64, f64), (f64, f64))> {
        self.points().fold(None, |acc, (x, y)| match acc {
            None => Some(((x, x), (y, y))),
            Some(((x0, x1), (y0, y1))) => Some(((x0.min(x), x1.max(x)), (y0.min(y), y1.max(y)))),
        })
    }
}

/// Everything between a partition's dataset and its table: flag, build the
/// plot dataset, convert frequencies and flatten.
pub fn plot_table(
    ds: &Dataset,
    x: Axis,
    y: Axis,
    freq_params: Option<&FreqParams>,
) -> Result<PlotTable, DeriveError> {
    let mut flagged = ds.clone();
    apply_flags(&mut flagged);
    let mut plot_ds = plot_dataset(&flagged, x, y)?;
    convert_frequency_axes(&mut plot_ds, freq_params)?;
    Ok(plot_ds.to_table())
}
