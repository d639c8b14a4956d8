//! A small labelled-array table: named dimensions, data variables and
//! coordinates, in the shape of a MeasurementSet partition.

mod error;
#[cfg(test)]
mod tests;

pub use error::DatasetError;

use indexmap::IndexMap;
use marlu::c32;
use ndarray::prelude::*;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::units::FreqUnit;

/// The dimensions a variable may span.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Dim {
    /// One row of the main table, i.e. a baseline at a time.
    Row,
    Chan,
    Pol,
    UvwIndex,
}

/// The values of a variable. Masking never changes which of these a variable
/// holds.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Complex(ArrayD<c32>),
    Float(ArrayD<f64>),
    Int(ArrayD<i32>),
    Bool(ArrayD<bool>),
}

impl Values {
    pub fn shape(&self) -> &[usize] {
        match self {
            Values::Complex(a) => a.shape(),
            Values::Float(a) => a.shape(),
            Values::Int(a) => a.shape(),
            Values::Bool(a) => a.shape(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Values::Complex(_) => "complex",
            Values::Float(_) => "float",
            Values::Int(_) => "int",
            Values::Bool(_) => "bool",
        }
    }

    fn select(&self, axis: Axis, indices: &[usize]) -> Values {
        match self {
            Values::Complex(a) => Values::Complex(a.select(axis, indices)),
            Values::Float(a) => Values::Float(a.select(axis, indices)),
            Values::Int(a) => Values::Int(a.select(axis, indices)),
            Values::Bool(a) => Values::Bool(a.select(axis, indices)),
        }
    }
}

impl<D: Dimension> From<Array<c32, D>> for Values {
    fn from(a: Array<c32, D>) -> Values {
        Values::Complex(a.into_dyn())
    }
}

impl<D: Dimension> From<Array<f64, D>> for Values {
    fn from(a: Array<f64, D>) -> Values {
        Values::Float(a.into_dyn())
    }
}

impl<D: Dimension> From<Array<i32, D>> for Values {
    fn from(a: Array<i32, D>) -> Values {
        Values::Int(a.into_dyn())
    }
}

impl<D: Dimension> From<Array<bool, D>> for Values {
    fn from(a: Array<bool, D>) -> Values {
        Values::Bool(a.into_dyn())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub dims: Vec<Dim>,

    pub values: Values,

    /// `true` marks an invalid (e.g. flagged) element. `None` means every
    /// element is valid.
    pub mask: Option<ArrayD<bool>>,
}

impl Variable {
    pub fn new<V: Into<Values>>(dims: &[Dim], values: V) -> Variable {
        Variable {
            dims: dims.to_vec(),
            values: values.into(),
            mask: None,
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    /// Mark elements invalid wherever `flags` is set. Existing masked
    /// elements stay masked.
    pub fn mask_where(&mut self, flags: ArrayViewD<bool>) {
        match self.mask.as_mut() {
            Some(mask) => mask.zip_mut_with(&flags, |m, &f| *m |= f),
            None => self.mask = Some(flags.to_owned()),
        }
    }

    /// Is the element at `index` masked?
    pub fn is_masked(&self, index: &[usize]) -> bool {
        self.mask
            .as_ref()
            .and_then(|m| m.get(IxDyn(index)).copied())
            .unwrap_or(false)
    }

    /// The values as floats, with masked elements set to NaN. Bools become 0
    /// or 1. Complex values have no single real representation, so they are
    /// rejected; `name` is only used for the error.
    pub fn to_f64(&self, name: &str) -> Result<ArrayD<f64>, DatasetError> {
        let mut out = match &self.values {
            Values::Float(a) => a.clone(),
            Values::Int(a) => a.mapv(f64::from),
            Values::Bool(a) => a.mapv(|b| if b { 1.0 } else { 0.0 }),
            Values::Complex(_) => return Err(DatasetError::ComplexToReal(name.to_string())),
        };
        self.apply_mask(&mut out);
        Ok(out)
    }

    /// Set every masked element of `out` to NaN. `out` must have this
    /// variable's shape.
    pub fn apply_mask(&self, out: &mut ArrayD<f64>) {
        if let Some(mask) = self.mask.as_ref() {
            out.zip_mut_with(mask, |o, &m| {
                if m {
                    *o = f64::NAN;
                }
            });
        }
    }

    fn select(&self, axis: Axis, indices: &[usize]) -> Variable {
        Variable {
            dims: self.dims.clone(),
            values: self.values.select(axis, indices),
            mask: self.mask.as_ref().map(|m| m.select(axis, indices)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Dimension lengths, in the order they were first seen.
    dims: IndexMap<Dim, usize>,

    data_vars: IndexMap<String, Variable>,

    coords: IndexMap<String, Variable>,

    /// The unit of the `chan` coordinate's frequencies.
    pub freq_unit: FreqUnit,
}

impl Default for Dataset {
    fn default() -> Self {
        Dataset::new(FreqUnit::Hz)
    }
}

impl Dataset {
    pub fn new(freq_unit: FreqUnit) -> Dataset {
        Dataset {
            dims: IndexMap::new(),
            data_vars: IndexMap::new(),
            coords: IndexMap::new(),
            freq_unit,
        }
    }

    pub fn dims(&self) -> &IndexMap<Dim, usize> {
        &self.dims
    }

    pub fn dim_len(&self, dim: Dim) -> Option<usize> {
        self.dims.get(&dim).copied()
    }

    pub fn data_vars(&self) -> &IndexMap<String, Variable> {
        &self.data_vars
    }

    pub fn data_vars_mut(&mut self) -> impl Iterator<Item = (&String, &mut Variable)> {
        self.data_vars.iter_mut()
    }

    pub fn coords(&self) -> &IndexMap<String, Variable> {
        &self.coords
    }

    pub fn data_var(&self, name: &str) -> Option<&Variable> {
        self.data_vars.get(name)
    }

    pub fn coord(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name)
    }

    /// Look up a variable by name, data variables first.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.data_vars.get(name).or_else(|| self.coords.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn insert_var<S: Into<String>>(&mut self, name: S, var: Variable) -> Result<(), DatasetError> {
        let name = name.into();
        self.register_dims(&name, &var)?;
        self.data_vars.insert(name, var);
        Ok(())
    }

    pub fn insert_coord<S: Into<String>>(
        &mut self,
        name: S,
        var: Variable,
    ) -> Result<(), DatasetError> {
        let name = name.into();
        self.register_dims(&name, &var)?;
        self.coords.insert(name, var);
        Ok(())
    }

    pub fn remove_var(&mut self, name: &str) -> Option<Variable> {
        self.data_vars.shift_remove(name)
    }

    fn register_dims(&mut self, name: &str, var: &Variable) -> Result<(), DatasetError> {
        let shape = var.shape();
        if shape.len() != var.dims.len() {
            return Err(DatasetError::DimCountMismatch {
                name: name.to_string(),
                num_values: shape.len(),
                num_dims: var.dims.len(),
            });
        }
        if let Some(mask) = var.mask.as_ref() {
            if mask.shape() != shape {
                return Err(DatasetError::MaskShape(name.to_string()));
            }
        }
        for (&dim, &len) in var.dims.iter().zip(shape) {
            match self.dims.get(&dim) {
                Some(&expected) if expected != len => {
                    return Err(DatasetError::DimLenMismatch {
                        name: name.to_string(),
                        dim,
                        got: len,
                        expected,
                    })
                }
                Some(_) => (),
                None => {
                    self.dims.insert(dim, len);
                }
            }
        }
        Ok(())
    }

    /// Keep only `indices` along `dim` in every variable spanning it.
    pub fn isel(&self, dim: Dim, indices: &[usize]) -> Result<Dataset, DatasetError> {
        let len = self.dim_len(dim).ok_or(DatasetError::NoSuchDim(dim))?;
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(DatasetError::IndexOutOfRange { dim, index, len });
        }

        let select = |vars: &IndexMap<String, Variable>| {
            vars.iter()
                .map(|(name, var)| {
                    let var = match var.dims.iter().position(|&d| d == dim) {
                        Some(i) => var.select(Axis(i), indices),
                        None => var.clone(),
                    };
                    (name.clone(), var)
                })
                .collect::<IndexMap<_, _>>()
        };

        let mut dims = self.dims.clone();
        dims.insert(dim, indices.len());
        Ok(Dataset {
            dims,
            data_vars: select(&self.data_vars),
            coords: select(&self.coords),
            freq_unit: self.freq_unit,
        })
    }

    /// Keep the rows for which `keep` is true.
    pub fn filter_rows(&self, keep: &[bool]) -> Result<Dataset, DatasetError> {
        let indices = keep
            .iter()
            .enumerate()
            .filter(|&(_, &k)| k)
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        self.isel(Dim::Row, &indices)
    }
}
