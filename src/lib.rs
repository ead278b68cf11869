//! # sscharge
//!
//! Summaries of predicted protein structures for a structural-biology pipeline.
//!
//! The heavy lifting is done by external programs: PyMOL assigns secondary structure,
//! pdb2pqr assigns charges and radii, and APBS solves for the electrostatic solvation
//! energy. This crate finds the structures, drives those programs on a worker pool,
//! collects their output into tables and draws figures from the tables.

mod chains;
mod discovery;
mod electrostatics;
mod error;
mod plots;
mod residues;
mod secondary;
mod structure;
mod summary;
mod tools;
mod utils;

pub use discovery::{find_files_with_suffix, find_structure_files, is_structure_file};
pub use electrostatics::{
    extract_global_energy, parse_global_energy, run_apbs, run_pdb2pqr, write_apbs_input,
    ApbsParams,
};
pub use error::{Error, Result};
pub use plots::curves::{
    plot_all_curves, plot_charge_curve, plot_stability_curve, ChargeCurve, CurveOptions,
    MaxStability, StabilityCurve,
};
pub use plots::scatter::{
    energy_color, plot_scatter, read_scatter_points, ScatterPoint, DEFAULT_FIGURE_NAME,
};
pub use plots::svg_path;
pub use secondary::{
    parse_pymol_records, PymolAssigner, SecondaryStructureAssigner, SecondaryStructureContent,
    SsCode,
};
pub use structure::{chain_length, load_model, read_structure};
pub use summary::{
    group_by_protein, prepare_output, process_pdb_files_parallel, process_single_pdb,
    protein_electrostatics, structure_metrics, summary_to_df, ApbsFiles, ProteinElectrostatics,
    StructureMetrics, StructureSummary, SummaryContext,
};
pub use tools::{is_available, ToolPaths};
pub use utils::{get_num_threads, natural_cmp, write_df_to_file, DataFrameFileType};
