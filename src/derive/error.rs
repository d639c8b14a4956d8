use thiserror::Error;

use crate::{axis::Axis, dataset::DatasetError, units::UnitError};

#[derive(Error, Debug)]
pub enum DeriveError {
    #[error("Column {name} for the {axis} axis does not exist in the MeasurementSet")]
    MissingColumn { name: String, axis: Axis },

    #[error("Cannot calculate the {0} axis from two columns")]
    UnsupportedDerivation(Axis),

    #[error("Cannot calculate the {0} axis from one column")]
    NotDerived(Axis),

    #[error("Column {name} has type {got}, but the {axis} axis needs {expected}")]
    WrongType {
        name: String,
        axis: Axis,
        got: &'static str,
        expected: &'static str,
    },

    #[error("Cannot combine {first} (dims {first_dims}) with {second} (dims {second_dims}) for the {axis} axis")]
    IncompatibleDims {
        axis: Axis,
        first: &'static str,
        first_dims: String,
        second: &'static str,
        second_dims: String,
    },

    #[error("Found a negative antenna number ({0}); all antenna numbers must be positive")]
    NegativeAntenna(i64),

    #[error("The {0} axis needs the spectral window's frequency parameters, but none were available")]
    MissingFreqParams(Axis),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Unit(#[from] UnitError),
}
