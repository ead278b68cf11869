//! Charge and folding stability curves from propka-derived tables.
//!
//! Charge tables have `pH`, `unfolded` and `folded` columns, stability tables have `pH`
//! and `free_energy`. Figures are written beside the table they were drawn from.

use super::{bounds, FONT};
use crate::discovery::find_files_with_suffix;
use crate::error::{Error, Result};
use crate::utils::{protein_name_from_table, read_tsv, required_float_column};
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

pub const CHARGE_SUFFIX: &str = "_charge_values.tsv";
pub const STABILITY_SUFFIX: &str = "_stability_values.tsv";

const NEUTRAL_PH: f64 = 7.0;
const FIGURE_SIZE: (u32, u32) = (1000, 600);

/// Index of the first smallest value of `key` over `values`.
fn first_argmin<F>(values: &[f64], key: F) -> Option<usize>
where
    F: Fn(f64) -> f64,
{
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| {
            let k = key(v);
            match best {
                Some((_, bk)) if bk <= k => best,
                _ => Some((i, k)),
            }
        })
        .map(|(i, _)| i)
}

/// Net charge against pH for the folded and unfolded states of one protein.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeCurve {
    pub protein: String,
    pub ph: Vec<f64>,
    pub unfolded: Vec<f64>,
    pub folded: Vec<f64>,
}

impl ChargeCurve {
    pub fn from_table(path: &Path) -> Result<Self> {
        let df = read_tsv(path)?;
        Ok(Self {
            protein: protein_name_from_table(path),
            ph: required_float_column(&df, "pH", path)?,
            unfolded: required_float_column(&df, "unfolded", path)?,
            folded: required_float_column(&df, "folded", path)?,
        })
    }

    /// pH at which `charge` is closest to zero, the first one on ties.
    fn isoelectric_point(&self, charge: &[f64]) -> f64 {
        first_argmin(charge, f64::abs)
            .map(|i| self.ph[i])
            .unwrap_or(f64::NAN)
    }

    pub fn unfolded_pi(&self) -> f64 {
        self.isoelectric_point(&self.unfolded)
    }

    pub fn folded_pi(&self) -> f64 {
        self.isoelectric_point(&self.folded)
    }

    /// Unfolded and folded charge at the sampled pH nearest to 7.
    pub fn charge_at_neutral(&self) -> (f64, f64) {
        match first_argmin(&self.ph, |p| (p - NEUTRAL_PH).abs()) {
            Some(i) => (self.unfolded[i], self.folded[i]),
            None => (f64::NAN, f64::NAN),
        }
    }
}

/// Folding free energy against pH for one protein.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilityCurve {
    pub protein: String,
    pub ph: Vec<f64>,
    pub free_energy: Vec<f64>,
}

/// The pH values sharing the lowest folding free energy.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxStability {
    pub free_energy: f64,
    pub ph: Vec<f64>,
}

impl MaxStability {
    pub fn legend(&self) -> String {
        let (lo, hi) = self.ph_range();
        if lo == hi {
            format!("pH of max. stability: {lo:?}")
        } else {
            format!("pH range of max stability: {lo:?} - {hi:?}")
        }
    }

    pub fn ph_range(&self) -> (f64, f64) {
        self.ph
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| {
                (lo.min(p), hi.max(p))
            })
    }
}

impl StabilityCurve {
    pub fn from_table(path: &Path) -> Result<Self> {
        let df = read_tsv(path)?;
        Ok(Self {
            protein: protein_name_from_table(path),
            ph: required_float_column(&df, "pH", path)?,
            free_energy: required_float_column(&df, "free_energy", path)?,
        })
    }

    pub fn max_stability(&self) -> Option<MaxStability> {
        let i = first_argmin(&self.free_energy, |e| e)?;
        let minimum = self.free_energy[i];
        let ph = self
            .ph
            .iter()
            .zip(&self.free_energy)
            .filter(|&(_, &e)| e == minimum)
            .map(|(&p, _)| p)
            .collect();
        Some(MaxStability {
            free_energy: minimum,
            ph,
        })
    }
}

fn legend_line(color: RGBColor) -> impl Fn((i32, i32)) -> PathElement<(i32, i32)> {
    move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color)
}

/// Draw a charge curve into `output` as SVG.
pub fn plot_charge_curve(curve: &ChargeCurve, output: &Path) -> Result<()> {
    let root = SVGBackend::new(output, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_min, x_max) = bounds(&curve.ph);
    let (y_min, y_max) = bounds(curve.unfolded.iter().chain(&curve.folded));

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{}: Charge vs. pH", curve.protein), (FONT, 20))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("pH")
        .y_desc("Charge")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            curve.ph.iter().copied().zip(curve.folded.iter().copied()),
            BLUE.stroke_width(2),
        ))?
        .label("folded")
        .legend(legend_line(BLUE));
    chart
        .draw_series(LineSeries::new(
            curve.ph.iter().copied().zip(curve.unfolded.iter().copied()),
            RED.stroke_width(2),
        ))?
        .label("unfolded")
        .legend(legend_line(RED));

    let unfolded_pi = curve.unfolded_pi();
    let folded_pi = curve.folded_pi();
    let (charge7_unfolded, charge7_folded) = curve.charge_at_neutral();

    let markers = [
        (unfolded_pi, (8, 4), RED, format!("pI (unfolded)={unfolded_pi:?}")),
        (folded_pi, (8, 4), BLUE, format!("pI (folded)={folded_pi:?}")),
        (
            NEUTRAL_PH,
            (2, 3),
            RED,
            format!("charge (pH7, unfolded)={charge7_unfolded:.2}"),
        ),
        (
            NEUTRAL_PH,
            (2, 3),
            BLUE,
            format!("charge (pH7, folded)={charge7_folded:.2}"),
        ),
    ];
    for (x, (dash, gap), color, label) in markers {
        chart
            .draw_series(DashedLineSeries::new(
                vec![(x, y_min), (x, y_max)],
                dash,
                gap,
                color.stroke_width(1),
            ))?
            .label(label)
            .legend(legend_line(color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Draw a stability curve into `output` as SVG.
pub fn plot_stability_curve(curve: &StabilityCurve, output: &Path) -> Result<()> {
    let root = SVGBackend::new(output, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_min, x_max) = bounds(&curve.ph);
    let (y_min, y_max) = bounds(&curve.free_energy);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{}: Free energy of folding vs. pH", curve.protein),
            (FONT, 20),
        )
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("pH")
        .y_desc("Free energy of folding (kcal/mol)")
        .draw()?;

    chart.draw_series(LineSeries::new(
        curve.ph.iter().copied().zip(curve.free_energy.iter().copied()),
        GREEN.stroke_width(2),
    ))?;

    if let Some(max_stability) = curve.max_stability() {
        let (lo, hi) = max_stability.ph_range();
        let grey = RGBColor(128, 128, 128);
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(lo, y_min), (hi, y_max)],
                grey.mix(0.3).filled(),
            )))?
            .label(max_stability.legend())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], grey.mix(0.3).filled()));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// Figure path for a per-protein table: `<dir>/<protein>_<kind>_plot.svg`.
pub fn figure_path(table: &Path, protein: &str, kind: &str) -> PathBuf {
    let dir = table.parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!("{protein}_{kind}_plot.svg"))
}

/// Which curve families to draw.
#[derive(Debug, Clone, Copy)]
pub struct CurveOptions {
    pub charge: bool,
    pub stability: bool,
}

impl Default for CurveOptions {
    fn default() -> Self {
        Self {
            charge: true,
            stability: true,
        }
    }
}

fn plot_charge_table(table: &Path) -> Result<PathBuf> {
    let curve = ChargeCurve::from_table(table)?;
    let output = figure_path(table, &curve.protein, "charge");
    plot_charge_curve(&curve, &output)?;
    Ok(output)
}

fn plot_stability_table(table: &Path) -> Result<PathBuf> {
    let curve = StabilityCurve::from_table(table)?;
    let output = figure_path(table, &curve.protein, "stability");
    plot_stability_curve(&curve, &output)?;
    Ok(output)
}

/// Plot every charge and stability table below `root`, returning the figures written.
///
/// A table that cannot be read or drawn is logged and skipped.
pub fn plot_all_curves(root: &Path, opts: CurveOptions) -> Result<Vec<PathBuf>> {
    type Plotter = fn(&Path) -> Result<PathBuf>;
    let mut jobs: Vec<(PathBuf, Plotter)> = Vec::new();
    if opts.charge {
        for table in find_files_with_suffix(root, CHARGE_SUFFIX)? {
            jobs.push((table, plot_charge_table));
        }
    }
    if opts.stability {
        for table in find_files_with_suffix(root, STABILITY_SUFFIX)? {
            jobs.push((table, plot_stability_table));
        }
    }
    debug!("{} table(s) to plot below {}", jobs.len(), root.display());

    let mut written = Vec::new();
    for (table, plot) in jobs {
        match plot(&table) {
            Ok(figure) => {
                info!("Saved {}", figure.display());
                written.push(figure);
            }
            Err(e @ Error::EmptyTable { .. }) | Err(e @ Error::Column { .. }) => {
                error!("Skipping {}: {e}", table.display())
            }
            Err(e) => error!("Failed to plot {}: {e}", table.display()),
        }
    }
    Ok(written)
}
