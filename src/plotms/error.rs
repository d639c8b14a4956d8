use std::path::PathBuf;

use thiserror::Error;

use crate::{derive::DeriveError, plot::PlotError, read::MsReadError};

#[derive(Error, Debug)]
pub enum PlotmsError {
    #[error("Visibility file {0} does not exist")]
    NoVis(PathBuf),

    #[error("The measurement set has no data to plot")]
    NoPartitions,

    #[error(transparent)]
    Read(#[from] MsReadError),

    #[error(transparent)]
    Derive(#[from] DeriveError),

    #[error(transparent)]
    Plot(#[from] PlotError),
}
