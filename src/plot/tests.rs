use approx::assert_abs_diff_eq;
use tempfile::tempdir;

use super::*;
use crate::{
    derive::PlotRow,
    raster::{RasterData, RasterPlane},
};

fn table(x_axis: Axis, y_axis: Axis, points: &[(f64, f64)]) -> PlotTable {
    PlotTable {
        x_axis,
        y_axis,
        dims: vec![],
        rows: points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| PlotRow {
                index: vec![i],
                x,
                y,
            })
            .collect(),
    }
}

#[test]
fn test_formats() {
    assert_eq!(PlotFormat::from_path(Path::new("a.png")).unwrap(), PlotFormat::Png);
    assert_eq!(PlotFormat::from_path(Path::new("a/b.SVG")).unwrap(), PlotFormat::Svg);
    assert!(matches!(
        PlotFormat::from_path(Path::new("a.pdf")),
        Err(PlotError::PdfUnsupported)
    ));
    assert!(matches!(
        PlotFormat::from_path(Path::new("a.jpg")),
        Err(PlotError::InvalidExtension(_))
    ));
    assert!(matches!(
        PlotFormat::from_path(Path::new("plot")),
        Err(PlotError::InvalidExtension(_))
    ));
}

#[test]
fn test_extra_plot_paths() {
    assert_eq!(
        extra_plot_path(Path::new("/tmp/raster.png"), 2),
        PathBuf::from("/tmp/raster_2.png")
    );
    assert_eq!(extra_plot_path(Path::new("raster"), 1), PathBuf::from("raster_1"));
}

#[test]
fn test_time_in_hours() {
    // 2012-11-19 06:00:00 and 07:30:00 UTC.
    let day = 56250.0 * 86400.0;
    let mut t = table(
        Axis::Time,
        Axis::Amp,
        &[(day + 6.0 * 3600.0, 1.0), (day + 7.5 * 3600.0, 2.0)],
    );
    time_in_hours(&mut t, day + 6.0 * 3600.0);
    assert_abs_diff_eq!(t.rows[0].x, 6.0, epsilon = 1e-9);
    assert_abs_diff_eq!(t.rows[1].x, 7.5, epsilon = 1e-9);
    assert_abs_diff_eq!(t.rows[1].y, 2.0);
}

#[test]
fn test_scatter_ranges() {
    let mut plot = ScatterPlot {
        title: "twhya".to_string(),
        x_label: "U (m)".to_string(),
        y_label: "V (m)".to_string(),
        layers: vec![
            ScatterLayer {
                name: "spw0".to_string(),
                table: table(Axis::U, Axis::V, &[(0.0, 1.0), (50.0, f64::NAN)]),
            },
            ScatterLayer {
                name: "spw1".to_string(),
                table: table(Axis::U, Axis::V, &[(-25.0, 100.0)]),
            },
        ],
        uv_plot: false,
    };
    let ((x0, x1), (y0, y1)) = plot.ranges().unwrap();
    assert_abs_diff_eq!(x0, -25.0 - 0.5);
    assert_abs_diff_eq!(x1, 0.0 + 0.5);
    assert_abs_diff_eq!(y0, 1.0 - 1.98, epsilon = 1e-9);
    assert_abs_diff_eq!(y1, 100.0 + 1.98, epsilon = 1e-9);

    // Centred on the origin, so the conjugates fit.
    plot.uv_plot = true;
    let ((x0, x1), (y0, y1)) = plot.ranges().unwrap();
    assert_abs_diff_eq!(x0, -x1);
    assert_abs_diff_eq!(x1, 25.0 + 1.0);
    assert_abs_diff_eq!(y0, -y1);

    plot.layers.truncate(1);
    plot.layers[0].table.rows[0].y = f64::NAN;
    assert!(plot.ranges().is_none());
}

#[test]
fn test_bad_exports() {
    let dir = tempdir().unwrap();
    let plot = ScatterPlot {
        title: String::new(),
        x_label: String::new(),
        y_label: String::new(),
        layers: vec![],
        uv_plot: false,
    };
    let path = dir.path().join("plot.pdf");
    assert!(matches!(export_scatter(&plot, &path), Err(PlotError::PdfUnsupported)));
    assert!(!path.exists());
    let path = dir.path().join("plot.png");
    assert!(matches!(export_scatter(&plot, &path), Err(PlotError::NothingToPlot)));
    assert!(!path.exists());

    let data = RasterData {
        planes: vec![RasterPlane {
            title: String::new(),
            x_axis: crate::ps::PsDim::Baseline,
            y_axis: crate::ps::PsDim::Time,
            x_labels: vec![],
            y_labels: vec![],
            values: ndarray::Array2::zeros((1, 1)),
            vis_label: "Amp".to_string(),
            color_limits: None,
        }],
        subplots: (1, 1),
    };
    let path = dir.path().join("raster.gif");
    assert!(matches!(
        export_raster(&data, &path),
        Err(PlotError::InvalidExtension(_))
    ));
    let empty = RasterData {
        planes: vec![],
        subplots: (1, 1),
    };
    assert!(matches!(
        export_raster(&empty, &dir.path().join("raster.svg")),
        Err(PlotError::NothingToPlot)
    ));
}

#[test]
#[cfg(feature = "plotting")]
fn test_colour_scale() {
    use plotters::style::RGBColor;

    use super::plotting::colour_at;

    assert_eq!(colour_at(0.0, 0.0, 1.0), RGBColor(68, 1, 84));
    assert_eq!(colour_at(1.0, 0.0, 1.0), RGBColor(253, 231, 37));
    assert_eq!(colour_at(0.5, 0.0, 1.0), RGBColor(33, 145, 140));
    // Clamped.
    assert_eq!(colour_at(-5.0, 0.0, 1.0), colour_at(0.0, 0.0, 1.0));
    assert_eq!(colour_at(f64::NAN, 0.0, 1.0), RGBColor(220, 220, 220));
}

fn raster_plane(title: &str, offset: f64) -> RasterPlane {
    RasterPlane {
        title: title.to_string(),
        x_axis: crate::ps::PsDim::Baseline,
        y_axis: crate::ps::PsDim::Time,
        x_labels: vec!["A0 & A1".to_string(), "A0 & A2".to_string(), "A1 & A2".to_string()],
        y_labels: vec!["07:36:57".to_string(), "07:37:03".to_string()],
        values: ndarray::Array2::from_shape_fn((2, 3), |(y, x)| offset + (3 * y + x) as f64),
        vis_label: "Amp".to_string(),
        color_limits: None,
    }
}

#[test]
#[cfg(feature = "plotting")]
fn test_export_raster_pages() {
    let dir = tempdir().unwrap();
    let mut planes = vec![
        raster_plane("XX", 0.0),
        raster_plane("XY", 10.0),
        raster_plane("YY", 20.0),
    ];
    // A flagged sample and fixed limits still draw.
    planes[1].values[(0, 0)] = f64::NAN;
    planes[2].color_limits = Some((0.0, 30.0));
    let data = RasterData {
        planes,
        subplots: (1, 2),
    };

    let path = dir.path().join("r.png");
    let written = export_raster(&data, &path).unwrap();
    assert_eq!(written, vec![path.clone(), dir.path().join("r_1.png")]);
    for p in &written {
        assert!(p.exists(), "{} wasn't written", p.display());
        assert!(std::fs::metadata(p).unwrap().len() > 0);
    }
    assert!(!dir.path().join("r_2.png").exists());
}

#[test]
#[cfg(feature = "plotting")]
fn test_export_uv_scatter() {
    let dir = tempdir().unwrap();
    let plot = ScatterPlot {
        title: "twhya.ms: V vs. U".to_string(),
        x_label: "U (m)".to_string(),
        y_label: "V (m)".to_string(),
        layers: vec![
            ScatterLayer {
                name: "spw0".to_string(),
                table: table(Axis::U, Axis::V, &[(10.0, 20.0), (-5.0, 3.0), (f64::NAN, 1.0)]),
            },
            ScatterLayer {
                name: "spw1".to_string(),
                table: table(Axis::U, Axis::V, &[(40.0, -12.0)]),
            },
        ],
        uv_plot: true,
    };
    // The conjugates are part of the plotted range.
    let ((x0, x1), (y0, y1)) = plot.ranges().unwrap();
    assert_abs_diff_eq!(x0, -41.6, epsilon = 1e-9);
    assert_abs_diff_eq!(x1, 41.6, epsilon = 1e-9);
    assert_abs_diff_eq!(y0, -20.8, epsilon = 1e-9);
    assert_abs_diff_eq!(y1, 20.8, epsilon = 1e-9);

    for name in ["uv.png", "uv.svg"] {
        let path = dir.path().join(name);
        export_scatter(&plot, &path).unwrap();
        assert!(path.exists(), "{name} wasn't written");
    }
    let svg = std::fs::read_to_string(dir.path().join("uv.svg")).unwrap();
    assert!(svg.contains("spw1"));
}

#[test]
#[cfg(not(feature = "plotting"))]
fn test_no_plotting() {
    let plot = ScatterPlot {
        title: String::new(),
        x_label: String::new(),
        y_label: String::new(),
        layers: vec![ScatterLayer {
            name: "spw0".to_string(),
            table: table(Axis::U, Axis::V, &[(0.0, 1.0)]),
        }],
        uv_plot: true,
    };
    assert!(matches!(
        export_scatter(&plot, Path::new("plot.png")),
        Err(PlotError::NoPlottingFeature)
    ));
}
