use std::path::PathBuf;

use clap::{AppSettings, Parser};
use log::{error, info};

use msplot::{
    axis::Axis,
    plotms::{plotms, PlotmsParams},
    read::DataGroup,
    setup_logging,
    units::{convert_freq, parse_freq, FreqUnit, UnitError},
    MsPlotError,
};

/// Plot one axis of a measurement set against another, one colour per
/// spectral window.
#[derive(Parser)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_long_args = true)]
struct Args {
    /// The measurement set to plot.
    vis: PathBuf,

    /// The axis plotted horizontally, e.g. time, frequency, u, baseline.
    #[clap(short, long, default_value = "time")]
    xaxis: Axis,

    /// The axis plotted vertically, e.g. amp, phase, v.
    #[clap(short, long, default_value = "amp")]
    yaxis: Axis,

    /// The title of the plot. The default names the measurement set and both
    /// axes.
    #[clap(long)]
    title: Option<String>,

    /// The rest frequency for the velocity axis, e.g. 372.67GHz. A number
    /// without a unit is in Hz. The default is the middle channel of the first
    /// spectral window.
    #[clap(long, parse(try_from_str = parse_freq_hz))]
    rest_freq: Option<f64>,

    /// Export the plot to this file (.png or .svg).
    #[clap(short, long)]
    plotfile: Option<PathBuf>,

    /// Which visibilities to plot: base (DATA), corrected or model.
    #[clap(long, default_value = "base")]
    data_group: DataGroup,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    verbosity: u8,

    /// Disable progress bars.
    #[clap(long)]
    no_progress_bars: bool,
}

fn parse_freq_hz(s: &str) -> Result<f64, UnitError> {
    let (value, unit) = parse_freq(s)?;
    Ok(convert_freq(value, unit.unwrap_or(FreqUnit::Hz), FreqUnit::Hz))
}

fn main() {
    let args = Args::parse();
    setup_logging(args.verbosity);

    if let Err(e) = try_main(args) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn try_main(args: Args) -> Result<(), MsPlotError> {
    let params = PlotmsParams {
        vis: args.vis,
        x_axis: args.xaxis,
        y_axis: args.yaxis,
        title: args.title,
        rest_freq: args.rest_freq,
        plotfile: args.plotfile,
        data_group: args.data_group,
        no_progress_bars: args.no_progress_bars,
    };
    let plot = plotms(&params)?;

    let num_points: usize = plot.layers.iter().map(|l| l.table.points().count()).sum();
    info!(
        "{}: {num_points} points in {} spectral windows",
        plot.title,
        plot.layers.len()
    );
    match params.plotfile {
        Some(plotfile) => info!("Plot written to {}", plotfile.display()),
        None => info!("No plot file given; nothing exported"),
    }
    Ok(())
}
