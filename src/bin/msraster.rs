use std::path::PathBuf;

use clap::{AppSettings, Parser};
use itertools::Itertools;
use log::{error, info, warn};

use msplot::{
    axis::Axis,
    ms_data::MsData,
    plot::export_raster,
    ps::{MsSelection, PsDim, PsSelection},
    raster::{Aggregator, ColorMode, RasterInputs},
    read::DataGroup,
    setup_logging, MsPlotError,
};

/// Raster plots of a visibility component over two data dimensions of a
/// measurement set.
#[derive(Parser)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_long_args = true)]
struct Args {
    /// The measurement set to plot.
    vis: PathBuf,

    /// Print a summary of each partition and the values of each data
    /// dimension, then exit.
    #[clap(long)]
    summary: bool,

    #[clap(short, long, default_value = "baseline", parse(try_from_str = PsDim::parse))]
    xaxis: PsDim,

    #[clap(short, long, default_value = "time", parse(try_from_str = PsDim::parse))]
    yaxis: PsDim,

    /// amp, phase, real or imag.
    #[clap(long, default_value = "amp")]
    vis_axis: Axis,

    /// Reduce the dimensions that aren't plotted with one of max, mean,
    /// median, min, std, sum or var.
    #[clap(long)]
    aggregator: Option<Aggregator>,

    /// The dimensions to aggregate over. The default is every dimension that
    /// isn't plotted or iterated.
    #[clap(long, parse(try_from_str = PsDim::parse))]
    agg_axis: Vec<PsDim>,

    /// Make one plane for each value of this dimension.
    #[clap(long, parse(try_from_str = PsDim::parse))]
    iter_axis: Option<PsDim>,

    /// The first and last iteration indices, e.g. 0,-1 for all of them.
    #[clap(long, parse(try_from_str = parse_iter_range))]
    iter_range: Option<(usize, i64)>,

    /// Rows and columns of planes in each image, e.g. 2,3.
    #[clap(long, parse(try_from_str = parse_subplots))]
    subplots: Option<(usize, usize)>,

    /// auto or manual. Without one, each plane is scaled to its own range.
    #[clap(long)]
    color_mode: Option<ColorMode>,

    /// The colour limits for the manual colour mode, e.g. 0,10.
    #[clap(long, parse(try_from_str = parse_color_range))]
    color_range: Option<(f64, f64)>,

    #[clap(long)]
    title: Option<String>,

    /// Which visibilities to plot: base (DATA), corrected or model.
    #[clap(long, default_value = "base")]
    data_group: DataGroup,

    /// Keep partitions with these spectral window names.
    #[clap(long)]
    spw: Vec<String>,

    /// Keep partitions with these field names.
    #[clap(long)]
    field: Vec<String>,

    /// Keep partitions with these scan numbers.
    #[clap(long)]
    scan: Vec<i32>,

    /// Keep partitions with these intents.
    #[clap(long)]
    intent: Vec<String>,

    /// Match spw, field and intent names on substrings.
    #[clap(long)]
    substring: bool,

    /// Keep these times, e.g. "19-Nov-2012 07:36:57".
    #[clap(long)]
    time: Vec<String>,

    /// Select the nearest time within this many seconds.
    #[clap(long)]
    time_tolerance: Option<f64>,

    /// Keep these baselines, e.g. "DA41 & DA42".
    #[clap(long)]
    baseline: Vec<String>,

    #[clap(long)]
    antenna1: Vec<String>,

    #[clap(long)]
    antenna2: Vec<String>,

    /// Keep these channel indices.
    #[clap(long)]
    chan: Vec<usize>,

    /// Keep these polarisations, e.g. XX.
    #[clap(long)]
    pol: Vec<String>,

    /// Export the planes to this file (.png or .svg). Planes that don't fit
    /// in one image go to numbered files next to it.
    #[clap(short, long)]
    plotfile: Option<PathBuf>,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    verbosity: u8,
}

fn parse_pair(s: &str) -> Option<(&str, &str)> {
    let (a, b) = s.split_once(',')?;
    Some((a.trim(), b.trim()))
}

fn parse_iter_range(s: &str) -> Result<(usize, i64), String> {
    let err = || format!("expected 'start,end', got '{s}'");
    let (start, end) = parse_pair(s).ok_or_else(err)?;
    Ok((
        start.parse().map_err(|_| err())?,
        end.parse().map_err(|_| err())?,
    ))
}

fn parse_subplots(s: &str) -> Result<(usize, usize), String> {
    let err = || format!("expected 'rows,columns', got '{s}'");
    let (rows, cols) = parse_pair(s).ok_or_else(err)?;
    Ok((
        rows.parse().map_err(|_| err())?,
        cols.parse().map_err(|_| err())?,
    ))
}

fn parse_color_range(s: &str) -> Result<(f64, f64), String> {
    let err = || format!("expected 'min,max', got '{s}'");
    let (lo, hi) = parse_pair(s).ok_or_else(err)?;
    Ok((lo.parse().map_err(|_| err())?, hi.parse().map_err(|_| err())?))
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
    let mut data = MsData::new(Some(args.vis.as_path()), args.data_group)?;

    let ps_selection = PsSelection {
        spw_names: args.spw,
        field_names: args.field,
        scan_numbers: args.scan,
        intents: args.intent,
        string_exact_match: !args.substring,
    };
    if !ps_selection.is_empty() {
        data.select_ps(&ps_selection)?;
    }
    let ms_selection = MsSelection {
        times: args.time,
        time_tolerance: args.time_tolerance,
        baselines: args.baseline,
        antenna1: args.antenna1,
        antenna2: args.antenna2,
        frequencies: args.chan,
        polarizations: args.pol,
    };
    if !ms_selection.is_empty() {
        data.select_ms(&ms_selection)?;
    }

    if args.summary {
        let groups = data.data_groups().unwrap_or_default();
        println!("data groups: {}\n", groups.iter().join(", "));
        for row in data.summary().unwrap_or_default() {
            println!("{row}\n");
        }
        for dim in data.data_dimensions().unwrap_or_default() {
            let values = data.dimension_values(dim).unwrap_or_default();
            println!("{dim} ({}): {}", values.len(), values.join(", "));
        }
        return Ok(());
    }

    let mut inputs = RasterInputs {
        x_axis: args.xaxis,
        y_axis: args.yaxis,
        vis_axis: args.vis_axis,
        aggregator: args.aggregator,
        agg_axis: args.agg_axis,
        iter_axis: args.iter_axis,
        iter_range: args.iter_range,
        subplots: args.subplots,
        color_mode: args.color_mode,
        color_range: args.color_range,
        title: args.title,
    };
    let raster = match data.raster_data(&mut inputs)? {
        Some(r) => r,
        None => return Ok(()),
    };
    info!("{} raster planes", raster.planes.len());

    match args.plotfile {
        Some(plotfile) => {
            for path in export_raster(&raster, &plotfile)? {
                info!("Wrote {}", path.display());
            }
        }
        None => warn!("No plot file given; nothing exported"),
    }
    Ok(())
}
