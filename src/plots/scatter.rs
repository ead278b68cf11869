//! Chain length vs. secondary structure scatter plot, coloured by solvation energy.

use super::{bounds, FONT};
use crate::error::Result;
use crate::summary::{protein_names, COL_CHAIN_LENGTH, COL_ENERGY, COL_FILENAME, COL_STRUCTURED};
use crate::utils::{float_column, read_table, required_float_column, str_column};
use plotters::prelude::*;
use std::path::Path;
use tracing::{debug, warn};

pub const DEFAULT_FIGURE_NAME: &str = "scatterplot_sizeVssVcharge.svg";

const FIGURE_SIZE: (u32, u32) = (1260, 1100);
const COLORBAR_WIDTH: u32 = 170;
const LABEL_FONT_SIZE: u32 = 16;
const TITLE_FONT_SIZE: u32 = 22;
const COLORBAR_STEPS: usize = 128;

/// One protein in the scatter plot.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub name: String,
    pub chain_length: f64,
    pub structured: f64,
    pub energy: Option<f64>,
}

/// Read the points out of a summary table in any of the formats `summary` writes.
pub fn read_scatter_points(table: &Path) -> Result<Vec<ScatterPoint>> {
    let df = read_table(table)?;
    let names = protein_names(&str_column(&df, COL_FILENAME, table)?);
    let chain_length = required_float_column(&df, COL_CHAIN_LENGTH, table)?;
    let structured = required_float_column(&df, COL_STRUCTURED, table)?;
    let energy = float_column(&df, COL_ENERGY, table)?;

    let points: Vec<ScatterPoint> = names
        .into_iter()
        .zip(chain_length)
        .zip(structured)
        .zip(energy)
        .map(|(((name, chain_length), structured), energy)| ScatterPoint {
            name,
            chain_length,
            structured,
            energy,
        })
        .collect();

    let missing = points.iter().filter(|p| p.energy.is_none()).count();
    if missing > 0 {
        warn!("{missing} row(s) of {} have no solvation energy", table.display());
    }
    Ok(points)
}

/// Colour for `energy` on a reversed viridis scale spanning `lo..hi`.
pub fn energy_color(energy: f64, lo: f64, hi: f64) -> RGBColor {
    let t = if hi > lo {
        ((energy - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.5
    };
    ViridisRGB.get_color_normalized(1.0 - t, 0.0, 1.0)
}

/// Draw the scatter plot with its colour bar into `output` as SVG.
pub fn plot_scatter(points: &[ScatterPoint], output: &Path) -> Result<()> {
    let root = SVGBackend::new(output, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let (plot_area, bar_area) = root.split_horizontally(FIGURE_SIZE.0 - COLORBAR_WIDTH);

    let (x_min, x_max) = bounds(points.iter().map(|p| &p.chain_length));
    let (y_min, y_max) = bounds(points.iter().map(|p| &p.structured));
    let (e_min, e_max) = bounds(points.iter().filter_map(|p| p.energy.as_ref()));
    let x_pad = (x_max - x_min) * 0.05;
    let y_pad = (y_max - y_min) * 0.05;
    debug!("Energy range {e_min}..{e_max} kJ/mol");

    let mut chart = ChartBuilder::on(&plot_area)
        .caption("Protein Chain Length vs % Structured", (FONT, TITLE_FONT_SIZE))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min - x_pad..x_max + x_pad, y_min - y_pad..y_max + y_pad)?;

    chart
        .configure_mesh()
        .x_desc("Chain Length (aa)")
        .y_desc("% Structured (alpha + beta)")
        .axis_desc_style((FONT, LABEL_FONT_SIZE))
        .draw()?;

    let missing_color = RGBColor(190, 190, 190);
    chart.draw_series(points.iter().map(|p| {
        let color = p
            .energy
            .map(|e| energy_color(e, e_min, e_max))
            .unwrap_or(missing_color);
        EmptyElement::at((p.chain_length, p.structured))
            + Circle::new((0, 0), 6, color.filled())
            + Text::new(
                p.name.clone(),
                (-10, 12),
                (FONT, LABEL_FONT_SIZE).into_font(),
            )
    }))?;

    let mut bar = ChartBuilder::on(&bar_area)
        .margin_top(60)
        .margin_bottom(70)
        .margin_right(20)
        .right_y_label_area_size(90)
        .build_cartesian_2d(0.0..1.0, e_min..e_max)?;

    bar.configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .disable_x_axis()
        .y_desc("Solvation energy (kJ/mol)")
        .axis_desc_style((FONT, LABEL_FONT_SIZE))
        .draw()?;

    let step = (e_max - e_min) / COLORBAR_STEPS as f64;
    bar.draw_series((0..COLORBAR_STEPS).map(|i| {
        let lo = e_min + step * i as f64;
        let hi = lo + step;
        Rectangle::new(
            [(0.0, lo), (1.0, hi)],
            energy_color((lo + hi) / 2.0, e_min, e_max).filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}
