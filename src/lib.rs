//! Plot the visibilities of CASA measurement sets: `plotms`-style scatter
//! plots of one axis against another, and `MsRaster`-style rasters of a
//! visibility component over two data dimensions.

pub mod axis;
pub mod dataset;
pub mod derive;
pub mod ms_data;
pub mod plot;
pub mod plotms;
pub mod ps;
pub mod raster;
pub mod read;
pub mod units;

use thiserror::Error;

/// Everything that can go wrong, for callers that don't care which layer it
/// came from.
#[derive(Error, Debug)]
pub enum MsPlotError {
    #[error(transparent)]
    Unit(#[from] units::UnitError),

    #[error(transparent)]
    Dataset(#[from] dataset::DatasetError),

    #[error(transparent)]
    Derive(#[from] derive::DeriveError),

    #[error(transparent)]
    Read(#[from] read::MsReadError),

    #[error(transparent)]
    Ps(#[from] ps::PsError),

    #[error(transparent)]
    Raster(#[from] raster::RasterError),

    #[error(transparent)]
    Plot(#[from] plot::PlotError),

    #[error(transparent)]
    Plotms(#[from] plotms::PlotmsError),
}

/// Log to stdout; `RUST_LOG` applies first, then the verbosity (the number of
/// `-v` flags).
pub fn setup_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.init();
}
