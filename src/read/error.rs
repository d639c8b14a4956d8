//! Errors associated with reading measurement sets.

use std::path::PathBuf;

use marlu::rubbl_casatables;
use thiserror::Error;

use super::DataGroup;
use crate::{dataset::DatasetError, units::UnitError};

#[derive(Error, Debug)]
pub enum MsReadError {
    #[error("Supplied file path {0} does not exist or is not readable!")]
    BadFile(PathBuf),

    #[error("The main table of the measurement set contains no rows!")]
    MainTableEmpty,

    #[error("The antenna table of the measurement set contains no rows!")]
    AntennaTableEmpty,

    #[error("The {group} data group needs the {column} column, but the measurement set doesn't have it")]
    NoDataGroup {
        group: DataGroup,
        column: &'static str,
    },

    #[error("Main table row refers to data description {ddid}, but there are only {num} data descriptions")]
    BadDataDescription { ddid: i32, num: usize },

    #[error("Data description {ddid} refers to a missing {table} row {id}")]
    BadDataDescriptionRef {
        ddid: usize,
        table: &'static str,
        id: i32,
    },

    #[error("Asked for partition {index}, but there are only {num}")]
    NoSuchPartition { index: usize, num: usize },

    #[error("MS {column} from row {row_index} did not have the expected {expected_len} elements (got {got})")]
    BadArraySize {
        column: &'static str,
        row_index: u64,
        expected_len: usize,
        got: usize,
    },

    #[error("Error when trying to interface with measurement set: {0}")]
    Table(#[from] rubbl_casatables::TableError),

    #[error("Error from casacore: {0}")]
    Casacore(#[from] rubbl_casatables::CasacoreError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Unit(#[from] UnitError),
}
