use clap::Parser;
use sscharge::{plot_scatter, read_scatter_points, svg_path, Result, DEFAULT_FIGURE_NAME};
use std::path::PathBuf;
use tracing::{info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Scatter plot of chain length vs. % structured, coloured by solvation energy")]
pub(crate) struct Args {
    /// Summary table written by the `summary` command, format taken from its extension
    #[arg(short, long)]
    input: PathBuf,

    /// Output SVG (defaults to a file next to the summary table)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    let points = read_scatter_points(&args.input)?;
    let output = match &args.output {
        Some(output) => svg_path(output),
        None => args
            .input
            .parent()
            .map(|dir| dir.join(DEFAULT_FIGURE_NAME))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FIGURE_NAME)),
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    plot_scatter(&points, &output)?;
    info!(
        "Chain length vs. secondary structure vs. charge scatterplot saved to {}",
        output.display()
    );
    Ok(())
}
