//! SVG figures drawn with plotters.

pub mod curves;
pub mod scatter;

use std::path::{Path, PathBuf};

pub(crate) const FONT: &str = "sans-serif";

/// Smallest and largest finite value, widened when they coincide so the axis has a span.
pub(crate) fn bounds<'a, I>(values: I) -> (f64, f64)
where
    I: IntoIterator<Item = &'a f64>,
{
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        (0.0, 1.0)
    } else if lo == hi {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

/// Force an `.svg` extension on a requested figure path.
pub fn svg_path(path: &Path) -> PathBuf {
    path.with_extension("svg")
}
