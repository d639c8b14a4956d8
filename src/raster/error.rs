use thiserror::Error;

use crate::{
    axis::Axis,
    dataset::DatasetError,
    derive::DeriveError,
    ps::{PsDim, PsError},
};

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("x_axis and y_axis cannot both be {0}")]
    SameAxes(PsDim),

    #[error("iter_axis {0} cannot also be plotted")]
    IterIsPlotted(PsDim),

    #[error("agg_axis {0} cannot also be plotted")]
    AggIsPlotted(PsDim),

    #[error("agg_axis {0} cannot also be iter_axis")]
    AggIsIterated(PsDim),

    #[error("{dim} is not a data dimension; use one of {valid}")]
    NotDataDim { dim: PsDim, valid: String },

    #[error("Cannot raster the {0} axis; use one of amp, phase, real, imag")]
    BadVisAxis(Axis),

    #[error("color_mode manual needs a color_range")]
    ManualWithoutRange,

    #[error("color_range ({0}, {1}) must have its minimum below its maximum")]
    BadColorRange(f64, f64),

    #[error("subplots ({0}, {1}) must have at least one row and one column")]
    BadSubplots(usize, usize),

    #[error("iter_range ({start}, {end}) is not valid for {len} iterations")]
    BadIterRange { start: usize, end: i64, len: usize },

    #[error("The selected data has no {0} column")]
    MissingColumn(&'static str),

    #[error("The selected data is empty")]
    EmptyData,

    #[error(transparent)]
    Ps(#[from] PsError),

    #[error(transparent)]
    Derive(#[from] DeriveError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}
