use clap::Parser;
use sscharge::{
    get_num_threads, prepare_output, process_pdb_files_parallel, summary_to_df, write_df_to_file,
    ApbsParams, DataFrameFileType, PymolAssigner, Result, SummaryContext, ToolPaths,
};
use std::path::PathBuf;
use tracing::{debug, info, trace, warn};

#[derive(Parser, Debug, Clone)]
#[command(
    version,
    about = "Secondary structure content and electrostatic solvation energy of every predicted structure"
)]
pub(crate) struct Args {
    /// Directory holding one sub-directory of predicted structures per protein
    #[arg(short, long)]
    input: PathBuf,

    /// Output file or directory (defaults to `ss_summary` next to the input directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Name of the output file when `--output` is a directory
    #[arg(short = 'f', long = "filename", default_value_t = String::from("ss_summary"))]
    filename: String,

    /// Output file type
    #[arg(short = 't', long, default_value_t = DataFrameFileType::Tsv)]
    output_format: DataFrameFileType,

    /// Number of worker threads (0 for half of the available cores)
    #[arg(short = 'j', long = "num-threads", default_value_t = 0)]
    num_threads: usize,

    /// pH used for protonation states
    #[arg(long, default_value_t = 7.0)]
    ph: f64,

    /// APBS grid points per dimension
    #[arg(long = "grid-dim", default_value_t = 289)]
    grid_dim: u32,

    /// APBS coarse and fine grid length in Å
    #[arg(long = "grid-length", default_value_t = 150.0)]
    grid_length: f64,

    /// PyMOL executable
    #[arg(long, env = "SSCHARGE_PYMOL", default_value = "pymol")]
    pymol: PathBuf,

    /// pdb2pqr executable
    #[arg(long, env = "SSCHARGE_PDB2PQR", default_value = "pdb2pqr")]
    pdb2pqr: PathBuf,

    /// APBS executable
    #[arg(long, env = "SSCHARGE_APBS", default_value = "apbs")]
    apbs: PathBuf,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    trace!("{args:?}");

    // Make sure `input` exists
    let input_dir = args.input.canonicalize()?;

    let tools = ToolPaths {
        pymol: args.pymol.clone(),
        pdb2pqr: args.pdb2pqr.clone(),
        apbs: args.apbs.clone(),
    };
    if !tools.check() {
        warn!("Some external tools are unavailable, affected structures will be skipped");
    }

    let assigner = PymolAssigner::new(&args.pymol);
    let ctx = SummaryContext {
        assigner: &assigner,
        tools,
        apbs: ApbsParams {
            grid_dim: args.grid_dim,
            grid_length: args.grid_length,
            ph: args.ph,
            ..Default::default()
        },
    };

    let results = process_pdb_files_parallel(&input_dir, &ctx, get_num_threads(args.num_threads))?;
    let mut df = summary_to_df(&results)?;
    debug!("Summarized {} structure(s)\n{}", df.height(), df);

    let output = match &args.output {
        Some(output) => prepare_output(output, &args.filename)?,
        None => input_dir
            .parent()
            .unwrap_or(input_dir.as_path())
            .join(&args.filename),
    };
    let output_file = write_df_to_file(&mut df, &output, args.output_format)?;
    info!(
        "Secondary structure percentages, chain lengths, and electrostatics saved to {}",
        output_file.display()
    );
    Ok(())
}
