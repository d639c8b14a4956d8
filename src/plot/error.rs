use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlotError {
    #[cfg(not(feature = "plotting"))]
    #[error("msplot was not compiled with the \"plotting\" feature.\nYou need to compile msplot from source with this feature to export plots.")]
    NoPlottingFeature,

    #[error("Cannot export a plot to '{0}'; supported extensions: png, svg")]
    InvalidExtension(PathBuf),

    #[error("PDF export is not supported; use a .png or .svg plot file")]
    PdfUnsupported,

    #[error("There is nothing to plot")]
    NothingToPlot,

    #[cfg(feature = "plotting")]
    #[error("Error from the plotters library: {0}")]
    Draw(#[from] super::plotting::DrawError),
}
