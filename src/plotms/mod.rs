//! plotms: one axis of a measurement set against another, for every
//! spectral window.

mod error;

pub use error::PlotmsError;

use std::{
    path::{Path, PathBuf},
    thread::scope,
};

use crossbeam_channel::{bounded, Receiver, Sender};
use crossbeam_utils::atomic::AtomicCell;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info, trace};

use crate::{
    axis::{is_uv_plot, Axis},
    derive::{plot_table, DeriveError},
    plot::{export_scatter, time_in_hours, PlotFormat, ScatterLayer, ScatterPlot},
    read::{casacore_time_to_epoch, DataGroup, MsReadError, MsReader, Partition, VisRead},
    units::{convert_freq, FreqParams, FreqUnit},
};

#[derive(Debug, Clone)]
pub struct PlotmsParams {
    pub vis: PathBuf,

    pub x_axis: Axis,

    pub y_axis: Axis,

    /// Defaults to e.g. `twhya.ms: Amp vs. Time`.
    pub title: Option<String>,

    /// The rest frequency for velocities \[Hz\]. The default is the middle
    /// channel of the first spectral window.
    pub rest_freq: Option<f64>,

    pub plotfile: Option<PathBuf>,

    pub data_group: DataGroup,

    pub no_progress_bars: bool,
}

/// Plot `params.y_axis` against `params.x_axis`, exporting to the plot file
/// if one was given.
pub fn plotms(params: &PlotmsParams) -> Result<ScatterPlot, PlotmsError> {
    if !params.vis.exists() {
        return Err(PlotmsError::NoVis(params.vis.clone()));
    }
    // Don't read anything if the plot can't be written.
    if let Some(plotfile) = params.plotfile.as_deref() {
        PlotFormat::from_path(plotfile)?;
    }

    info!("Reading {}", params.vis.display());
    let reader = MsReader::new(&params.vis, params.data_group)?;
    let plot = scatter_plot(
        &reader,
        params.x_axis,
        params.y_axis,
        params.title.as_deref(),
        params.rest_freq,
        params.no_progress_bars,
    )?;

    if let Some(plotfile) = params.plotfile.as_deref() {
        export_scatter(&plot, plotfile)?;
    }
    Ok(plot)
}

fn progress_bar(len: usize, message: &'static str) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template("{msg:17}: [{wide_bar:.blue}] {pos:2}/{len:2} partitions ({elapsed_precise}<{eta_precise})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    ProgressBar::new(len as _)
        .with_style(style)
        .with_position(0)
        .with_message(message)
}

/// Everything from the first partition that applies to every layer.
struct FirstPartition {
    first_time: Option<f64>,
    freq_params: Option<FreqParams>,
}

fn read_partitions(
    reader: &dyn VisRead,
    tx: Sender<Partition>,
    error: &AtomicCell<bool>,
    progress: ProgressBar,
) -> Result<(), MsReadError> {
    for i in 0..reader.num_partitions() {
        // The deriving thread has failed; stop.
        if error.load() {
            return Ok(());
        }
        let p = match reader.read_partition(i) {
            Ok(p) => p,
            Err(e) => {
                error.store(true);
                return Err(e);
            }
        };
        trace!("Read partition {i} (spw {})", p.spw_id);
        if tx.send(p).is_err() {
            return Ok(());
        }
        progress.inc(1);
    }
    progress.finish();
    Ok(())
}

fn derive_partitions(
    rx: Receiver<Partition>,
    x_axis: Axis,
    y_axis: Axis,
    rest_freq: Option<f64>,
    error: &AtomicCell<bool>,
    progress: ProgressBar,
) -> Result<(Vec<ScatterLayer>, Option<FirstPartition>), DeriveError> {
    let mut layers = vec![];
    let mut first = None;
    for p in rx.iter() {
        if error.load() {
            return Ok((layers, first));
        }
        let first = first.get_or_insert_with(|| FirstPartition {
            first_time: p.raw_times().first().copied(),
            freq_params: if x_axis.needs_freq_params() || y_axis.needs_freq_params() {
                p.freq_params().map(|mut params| {
                    if let Some(hz) = rest_freq {
                        params.rest_freq = convert_freq(hz, FreqUnit::Hz, params.unit);
                    }
                    params
                })
            } else {
                None
            },
        });

        let table = plot_table(&p.dataset, x_axis, y_axis, first.freq_params.as_ref());
        let mut table = match table {
            Ok(t) => t,
            Err(e) => {
                error.store(true);
                return Err(e);
            }
        };
        if let Some(t) = first.first_time {
            time_in_hours(&mut table, t);
        }

        let name = if p.spw_name.is_empty() {
            format!("spw {}", p.spw_id)
        } else {
            p.spw_name.clone()
        };
        debug!("Plotting {name}: {} points", table.len());
        layers.push(ScatterLayer { name, table });
        progress.inc(1);
    }
    progress.finish();
    Ok((layers, first))
}

/// Read every partition on one thread while deriving the plotted values on
/// another. Plot errors aren't `Send`, so the threads only return read and
/// derive errors.
pub fn scatter_plot(
    reader: &dyn VisRead,
    x_axis: Axis,
    y_axis: Axis,
    title: Option<&str>,
    rest_freq: Option<f64>,
    no_progress_bars: bool,
) -> Result<ScatterPlot, PlotmsError> {
    let num_partitions = reader.num_partitions();
    if num_partitions == 0 {
        return Err(PlotmsError::NoPartitions);
    }

    let (tx, rx) = bounded(2);
    let error = AtomicCell::new(false);
    let multi_progress = MultiProgress::with_draw_target(if no_progress_bars {
        ProgressDrawTarget::hidden()
    } else {
        ProgressDrawTarget::stdout()
    });
    let read_progress = multi_progress.add(progress_bar(num_partitions, "Reading"));
    let derive_progress = multi_progress.add(progress_bar(num_partitions, "Deriving"));
    read_progress.tick();
    derive_progress.tick();

    let (read_result, derive_result) = scope(|s| {
        let read_handle = s.spawn(|| read_partitions(reader, tx, &error, read_progress));
        let derive_handle =
            s.spawn(|| derive_partitions(rx, x_axis, y_axis, rest_freq, &error, derive_progress));
        (
            read_handle
                .join()
                .unwrap_or_else(|e| std::panic::resume_unwind(e)),
            derive_handle
                .join()
                .unwrap_or_else(|e| std::panic::resume_unwind(e)),
        )
    });
    read_result?;
    let (layers, first) = derive_result?;
    let first = first.ok_or(PlotmsError::NoPartitions)?;

    let first_epoch = first.first_time.map(casacore_time_to_epoch);
    let frame = first.freq_params.as_ref().map(|f| f.frame);
    let title = match title {
        Some(t) => t.to_string(),
        None => format!(
            "{}: {} vs. {}",
            ms_name(&reader.meta().path),
            y_axis.label(),
            x_axis.label()
        ),
    };
    Ok(ScatterPlot {
        title,
        x_label: x_axis.label_with_unit(first_epoch, frame),
        y_label: y_axis.label_with_unit(first_epoch, frame),
        layers,
        uv_plot: is_uv_plot(x_axis, y_axis),
    })
}

fn ms_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
