//! Exporting plots to image files.

mod error;
#[cfg(test)]
mod tests;

pub use error::PlotError;

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::{axis::Axis, derive::PlotTable, raster::RasterData};

const SECONDS_PER_DAY: f64 = 86400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotFormat {
    Png,
    Svg,
}

impl PlotFormat {
    pub fn from_path(path: &Path) -> Result<PlotFormat, PlotError> {
        let ext = path
            .extension()
            .and_then(|os_str| os_str.to_str())
            .map(|s| s.to_lowercase());
        match ext.as_deref() {
            Some("png") => Ok(PlotFormat::Png),
            Some("svg") => Ok(PlotFormat::Svg),
            Some("pdf") => Err(PlotError::PdfUnsupported),
            _ => Err(PlotError::InvalidExtension(path.to_path_buf())),
        }
    }
}

/// The points of one spectral window.
#[derive(Debug, Clone)]
pub struct ScatterLayer {
    pub name: String,
    pub table: PlotTable,
}

#[derive(Debug, Clone)]
pub struct ScatterPlot {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub layers: Vec<ScatterLayer>,
    /// Also draw every point reflected through the origin.
    pub uv_plot: bool,
}

fn pad(lo: f64, hi: f64) -> (f64, f64) {
    if hi - lo < f64::EPSILON {
        (lo - 1.0, hi + 1.0)
    } else {
        let margin = 0.02 * (hi - lo);
        (lo - margin, hi + margin)
    }
}

impl ScatterPlot {
    /// The axis ranges covering every point, with a small margin. UV plots
    /// are centred on the origin.
    pub fn ranges(&self) -> Option<((f64, f64), (f64, f64))> {
        let ((x0, x1), (y0, y1)) = self
            .layers
            .iter()
            .filter_map(|l| l.table.ranges())
            .reduce(|((ax0, ax1), (ay0, ay1)), ((bx0, bx1), (by0, by1))| {
                ((ax0.min(bx0), ax1.max(bx1)), (ay0.min(by0), ay1.max(by1)))
            })?;
        if self.uv_plot {
            let x = x0.abs().max(x1.abs());
            let y = y0.abs().max(y1.abs());
            Some((pad(-x, x), pad(-y, y)))
        } else {
            Some((pad(x0, x1), pad(y0, y1)))
        }
    }
}

/// Replace casacore times (MJD seconds) in `table` with hours since 00:00
/// UTC of the day of `first_time`.
pub fn time_in_hours(table: &mut PlotTable, first_time: f64) {
    let midnight = (first_time / SECONDS_PER_DAY).floor() * SECONDS_PER_DAY;
    let to_hours = |t: f64| (t - midnight) / 3600.0;
    let (x_is_time, y_is_time) = (table.x_axis == Axis::Time, table.y_axis == Axis::Time);
    for row in table.rows.iter_mut() {
        if x_is_time {
            row.x = to_hours(row.x);
        }
        if y_is_time {
            row.y = to_hours(row.y);
        }
    }
}

/// Where the `n`th extra image goes, e.g. `raster_1.png` for `raster.png`.
pub fn extra_plot_path(path: &Path, n: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{stem}_{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{n}"),
    };
    path.with_file_name(file_name)
}

pub fn export_scatter(plot: &ScatterPlot, path: &Path) -> Result<(), PlotError> {
    let format = PlotFormat::from_path(path)?;
    if plot.layers.is_empty() {
        return Err(PlotError::NothingToPlot);
    }
    if plot.ranges().is_none() {
        warn!("Every point is flagged or invalid; the plot will be empty");
    }
    draw_scatter_file(plot, path, format)?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Write the planes `subplots` at a time: the first image goes to `path`,
/// the rest are numbered. Returns every file written.
pub fn export_raster(data: &RasterData, path: &Path) -> Result<Vec<PathBuf>, PlotError> {
    let format = PlotFormat::from_path(path)?;
    if data.planes.is_empty() {
        return Err(PlotError::NothingToPlot);
    }
    let (rows, cols) = data.subplots;
    let per_image = (rows * cols).max(1);

    let mut written = vec![];
    for (i, planes) in data.planes.chunks(per_image).enumerate() {
        let image_path = if i == 0 {
            path.to_path_buf()
        } else {
            extra_plot_path(path, i)
        };
        debug!("Drawing {} planes into {}", planes.len(), image_path.display());
        draw_raster_file(planes, (rows, cols), &image_path, format)?;
        info!("Wrote {}", image_path.display());
        written.push(image_path);
    }
    Ok(written)
}

#[cfg(not(feature = "plotting"))]
fn draw_scatter_file(_: &ScatterPlot, _: &Path, _: PlotFormat) -> Result<(), PlotError> {
    // Plotting is an optional feature, as its C dependencies can't always be
    // compiled.
    Err(PlotError::NoPlottingFeature)
}

#[cfg(not(feature = "plotting"))]
fn draw_raster_file(
    _: &[crate::raster::RasterPlane],
    _: (usize, usize),
    _: &Path,
    _: PlotFormat,
) -> Result<(), PlotError> {
    Err(PlotError::NoPlottingFeature)
}

#[cfg(feature = "plotting")]
use plotting::{draw_raster_file, draw_scatter_file};

#[cfg(feature = "plotting")]
pub(crate) mod plotting {
    use plotters::{coord::Shift, prelude::*, style::RGBAColor};
    use thiserror::Error;

    use super::*;
    use crate::raster::{plane_range, RasterPlane};

    /// The number of pixels of a scatter plot.
    const SCATTER_PIXELS: (u32, u32) = (800, 400);
    /// UV plots are square.
    const UV_PIXELS: (u32, u32) = (800, 800);
    /// The number of pixels of each raster plane.
    const PLANE_PIXELS: (u32, u32) = (640, 480);

    lazy_static::lazy_static! {
        /// One colour per spectral window, cycled.
        static ref LAYERS: [RGBAColor; 6] = [
            BLUE.mix(1.0),
            RED.mix(1.0),
            GREEN.mix(1.0),
            MAGENTA.mix(1.0),
            CYAN.mix(1.0),
            BLACK.mix(1.0),
        ];

        static ref FLAGGED: RGBColor = RGBColor(220, 220, 220);
    }

    /// Stops of the viridis colour map.
    const VIRIDIS: [(u8, u8, u8); 5] = [
        (68, 1, 84),
        (59, 82, 139),
        (33, 145, 140),
        (94, 201, 98),
        (253, 231, 37),
    ];

    /// The colour of `value` scaled between `lo` and `hi`. Values outside are
    /// clamped; NaNs are grey.
    pub(crate) fn colour_at(value: f64, lo: f64, hi: f64) -> RGBColor {
        if value.is_nan() {
            return *FLAGGED;
        }
        let t = if hi > lo {
            ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
        } else {
            0.5
        };
        let scaled = t * (VIRIDIS.len() - 1) as f64;
        let i = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
        let frac = scaled - i as f64;
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
        RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
    }

    pub(super) fn draw_scatter_file(
        plot: &ScatterPlot,
        path: &Path,
        format: PlotFormat,
    ) -> Result<(), PlotError> {
        let size = if plot.uv_plot {
            UV_PIXELS
        } else {
            SCATTER_PIXELS
        };
        match format {
            PlotFormat::Png => {
                let root = BitMapBackend::new(path, size).into_drawing_area();
                draw_scatter(&root, plot)?;
                root.present()
                    .map_err(|e| DrawError::Plotters(Box::new(e)))?;
            }
            PlotFormat::Svg => {
                let root = SVGBackend::new(path, size).into_drawing_area();
                draw_scatter(&root, plot)?;
                root.present()
                    .map_err(|e| DrawError::Plotters(Box::new(e)))?;
            }
        }
        Ok(())
    }

    pub(super) fn draw_raster_file(
        planes: &[RasterPlane],
        subplots: (usize, usize),
        path: &Path,
        format: PlotFormat,
    ) -> Result<(), PlotError> {
        let (rows, cols) = subplots;
        let size = (
            PLANE_PIXELS.0 * cols.max(1) as u32,
            PLANE_PIXELS.1 * rows.max(1) as u32,
        );
        match format {
            PlotFormat::Png => {
                let root = BitMapBackend::new(path, size).into_drawing_area();
                draw_raster(&root, planes, subplots)?;
                root.present()
                    .map_err(|e| DrawError::Plotters(Box::new(e)))?;
            }
            PlotFormat::Svg => {
                let root = SVGBackend::new(path, size).into_drawing_area();
                draw_raster(&root, planes, subplots)?;
                root.present()
                    .map_err(|e| DrawError::Plotters(Box::new(e)))?;
            }
        }
        Ok(())
    }

    fn draw_scatter<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        plot: &ScatterPlot,
    ) -> Result<(), DrawError> {
        root.fill(&WHITE)
            .map_err(|e| DrawError::Scatter(e.to_string()))?;
        let ((x0, x1), (y0, y1)) = plot.ranges().unwrap_or(((0.0, 1.0), (0.0, 1.0)));

        let mut cc = ChartBuilder::on(root)
            .caption(&plot.title, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(|e| DrawError::Scatter(e.to_string()))?;
        cc.configure_mesh()
            .light_line_style(&WHITE)
            .x_desc(plot.x_label.as_str())
            .y_desc(plot.y_label.as_str())
            .draw()
            .map_err(|e| DrawError::Scatter(e.to_string()))?;

        for (i, layer) in plot.layers.iter().enumerate() {
            let colour = LAYERS[i % LAYERS.len()];
            cc.draw_series(PointSeries::of_element(
                layer.table.points(),
                2,
                ShapeStyle::from(&colour).filled(),
                &|coord, size, style| EmptyElement::at(coord) + Circle::new((0, 0), size, style),
            ))
            .map_err(|e| DrawError::Scatter(e.to_string()))?
            .label(layer.name.as_str())
            .legend(move |(x, y)| Circle::new((x, y), 3, colour.filled()));

            if plot.uv_plot {
                let conjugate = colour.mix(0.4);
                cc.draw_series(PointSeries::of_element(
                    layer.table.conjugate().points().collect::<Vec<_>>(),
                    2,
                    ShapeStyle::from(&conjugate).filled(),
                    &|coord, size, style| {
                        EmptyElement::at(coord) + Circle::new((0, 0), size, style)
                    },
                ))
                .map_err(|e| DrawError::Scatter(e.to_string()))?;
            }
        }

        if plot.layers.len() > 1 {
            cc.configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(|e| DrawError::Scatter(e.to_string()))?;
        }
        Ok(())
    }

    fn draw_raster<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        planes: &[RasterPlane],
        subplots: (usize, usize),
    ) -> Result<(), DrawError> {
        root.fill(&WHITE)
            .map_err(|e| DrawError::Raster(e.to_string()))?;
        let areas = root.split_evenly(subplots);
        for (plane, area) in planes.iter().zip(areas.iter()) {
            draw_plane(area, plane)?;
        }
        Ok(())
    }

    /// The label of the cell containing `v`.
    fn label_of(labels: &[String], v: f64) -> String {
        if v < 0.0 {
            return String::new();
        }
        labels.get(v.floor() as usize).cloned().unwrap_or_default()
    }

    fn draw_plane<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        plane: &RasterPlane,
    ) -> Result<(), DrawError> {
        let (ny, nx) = plane.values.dim();
        let (lo, hi) = plane
            .color_limits
            .or_else(|| plane_range(&plane.values))
            .unwrap_or((0.0, 1.0));
        let caption = format!(
            "{} ({} {:.3} to {:.3})",
            plane.title, plane.vis_label, lo, hi
        );
        let x_formatter = |v: &f64| label_of(&plane.x_labels, *v);
        let y_formatter = |v: &f64| label_of(&plane.y_labels, *v);

        let mut cc = ChartBuilder::on(area)
            .caption(caption, ("sans-serif", 16))
            .margin(5)
            .x_label_area_size(40)
            .y_label_area_size(120)
            .build_cartesian_2d(0.0..nx as f64, 0.0..ny as f64)
            .map_err(|e| DrawError::Raster(e.to_string()))?;
        cc.configure_mesh()
            .disable_mesh()
            .x_desc(plane.x_axis.to_string())
            .y_desc(plane.y_axis.to_string())
            .x_labels(nx.min(8))
            .y_labels(ny.min(8))
            .x_label_formatter(&x_formatter)
            .y_label_formatter(&y_formatter)
            .draw()
            .map_err(|e| DrawError::Raster(e.to_string()))?;

        cc.draw_series(plane.values.indexed_iter().map(|((iy, ix), &v)| {
            let (x, y) = (ix as f64, iy as f64);
            Rectangle::new([(x, y), (x + 1.0, y + 1.0)], colour_at(v, lo, hi).filled())
        }))
        .map_err(|e| DrawError::Raster(e.to_string()))?;
        Ok(())
    }

    #[derive(Error, Debug)]
    pub enum DrawError {
        #[error("While drawing a scatter plot: {0}")]
        Scatter(String),

        #[error("While drawing a raster plot: {0}")]
        Raster(String),

        #[error("Error from the plotters library: {0}")]
        Plotters(Box<dyn std::error::Error>),
    }
}
