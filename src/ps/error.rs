use thiserror::Error;

use crate::{axis::Axis, dataset::DatasetError, derive::DeriveError, read::MsReadError};

#[derive(Error, Debug)]
pub enum PsError {
    #[error("Unknown dimension '{0}'; valid dimensions are: time, baseline, antenna1, antenna2, frequency, polarization")]
    UnknownDimension(String),

    #[error("The processing set has no partitions")]
    NoPartitions,

    #[error("Selection {0} matched no data")]
    EmptySelection(String),

    #[error("Could not parse '{0}' as a time; expected e.g. '19-Nov-2012 07:36:57'")]
    BadTimeString(String),

    #[error("Cannot calculate statistics of the {0} axis; use one of amp, phase, real, imag")]
    BadVisAxis(Axis),

    #[error("Every sample of the selected data is flagged")]
    AllFlagged,

    #[error(transparent)]
    Read(#[from] MsReadError),

    #[error(transparent)]
    Derive(#[from] DeriveError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
