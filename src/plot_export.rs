//! Plot export to PNG (plotters bitmap) and SVG (plotters svg backend).

use color_eyre::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use crate::config::parse_hex;
use crate::labels::show_color;
use crate::plot::PlotData;

const EXPORT_SIZE: (u32, u32) = (960, 720);

/// Fallback colors for shows without a registered color.
const FALLBACK_COLORS: [RGBColor; 4] = [
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x8c, 0x56, 0x4b),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotExportFormat {
    Png,
    Svg,
}

impl PlotExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

/// `sepviz_<subset>_<disruption>.<ext>` with non-alphanumerics folded to `_`.
pub fn default_export_path(data: &PlotData, format: PlotExportFormat) -> PathBuf {
    let slug = |s: &str| {
        let mut out = String::new();
        for c in s.chars() {
            if c.is_ascii_alphanumeric() {
                out.push(c.to_ascii_lowercase());
            } else if !out.ends_with('_') {
                out.push('_');
            }
        }
        out.trim_matches('_').to_string()
    };
    PathBuf::from(format!(
        "sepviz_{}_{}.{}",
        slug(&data.key.subset),
        slug(&data.key.disruption),
        format.extension()
    ))
}

fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    parse_hex(hex).ok().map(|(r, g, b)| RGBColor(r, g, b))
}

fn draw_plot<DB>(root: DrawingArea<DB, Shift>, data: &PlotData, title: &str) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let bounds = data
        .bounds()
        .ok_or_else(|| color_eyre::eyre::eyre!("No data to export"))?
        .padded(0.05);

    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(bounds.x_min..bounds.x_max, bounds.y_min..bounds.y_max)?;

    chart
        .configure_mesh()
        .x_desc("UMAP1")
        .y_desc("UMAP2")
        .draw()?;

    let mut fallback = FALLBACK_COLORS.iter().cycle();
    for group in &data.groups {
        let color = show_color(&group.show)
            .and_then(parse_hex_color)
            .or_else(|| fallback.next().copied())
            .unwrap_or(BLACK);
        chart.draw_series(PointSeries::of_element(
            group.points.iter().copied(),
            3,
            color,
            &|c, s, st| EmptyElement::at(c) + Circle::new((0, 0), s, st.filled()),
        ))?;
    }

    root.present()?;
    Ok(())
}

pub fn write_plot_png(path: &Path, data: &PlotData, title: &str) -> Result<()> {
    if data.is_empty() {
        return Err(color_eyre::eyre::eyre!("No data to export"));
    }
    let root = BitMapBackend::new(path, EXPORT_SIZE).into_drawing_area();
    draw_plot(root, data, title)?;
    tracing::info!(path = %path.display(), "exported plot png");
    Ok(())
}

pub fn write_plot_svg(path: &Path, data: &PlotData, title: &str) -> Result<()> {
    if data.is_empty() {
        return Err(color_eyre::eyre::eyre!("No data to export"));
    }
    let root = SVGBackend::new(path, EXPORT_SIZE).into_drawing_area();
    draw_plot(root, data, title)?;
    tracing::info!(path = %path.display(), "exported plot svg");
    Ok(())
}

pub fn write_plot(
    path: &Path,
    data: &PlotData,
    title: &str,
    format: PlotExportFormat,
) -> Result<()> {
    match format {
        PlotExportFormat::Png => write_plot_png(path, data, title),
        PlotExportFormat::Svg => write_plot_svg(path, data, title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::PlotPoint;
    use crate::selection::CellKey;

    fn sample() -> PlotData {
        let point = |x: f64, y: f64, show: &str| PlotPoint {
            x,
            y,
            show: show.to_string(),
            tooltip: Vec::new(),
        };
        PlotData::from_points(
            CellKey::new("Emotion + Toxicity", "CS"),
            vec![point(0.0, 1.0, "South Park"), point(2.0, 3.0, "Seinfeld")],
        )
    }

    #[test]
    fn empty_plot_is_not_exported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("plot.png");
        let err = write_plot_png(&path, &PlotData::default(), "x").unwrap_err();
        assert!(err.to_string().contains("No data to export"));
        assert!(!path.exists());
    }

    #[test]
    fn export_file_name() {
        assert_eq!(
            default_export_path(&sample(), PlotExportFormat::Png),
            PathBuf::from("sepviz_emotion_toxicity_cs.png")
        );
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#0368c9"), Some(RGBColor(3, 0x68, 0xc9)));
        assert_eq!(parse_hex_color("0368c9"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(parse_hex_color("#\u{e9}1234"), None);
    }
}
