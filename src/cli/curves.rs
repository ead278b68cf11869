use clap::Parser;
use sscharge::{plot_all_curves, CurveOptions, Result};
use std::path::PathBuf;
use tracing::{info, trace, warn};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Charge and folding stability curves for every protein")]
pub(crate) struct Args {
    /// Directory searched recursively for `*_charge_values.tsv` and `*_stability_values.tsv`
    #[arg(short, long)]
    input: PathBuf,

    /// Only draw charge curves
    #[arg(long, default_value_t = false)]
    charge_only: bool,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let opts = CurveOptions {
        charge: true,
        stability: !args.charge_only,
    };
    let written = plot_all_curves(&args.input.canonicalize()?, opts)?;
    if written.is_empty() {
        warn!("No curves were drawn below {}", args.input.display());
    } else {
        info!("Saved {} figure(s)", written.len());
    }
    Ok(())
}
