//! Per-structure secondary structure and electrostatics summary.

use crate::discovery::find_structure_files;
use crate::electrostatics::{
    extract_global_energy, run_apbs, run_pdb2pqr, write_apbs_input, ApbsParams,
};
use crate::error::{Error, Result};
use crate::secondary::{SecondaryStructureAssigner, SecondaryStructureContent};
use crate::structure::{chain_length, log_pdb_warnings, log_sequences, read_structure};
use crate::tools::ToolPaths;
use crate::utils::{natural_cmp, protein_name_from_structure};
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub const COL_FILENAME: &str = "filename";
pub const COL_ALPHA: &str = "alpha";
pub const COL_BETA: &str = "beta";
pub const COL_STRUCTURED: &str = "%structured";
pub const COL_CHAIN_LENGTH: &str = "chain_length";
pub const COL_ENERGY: &str = "solvation_electrostatic_energy_kJ/mol";

/// Everything a worker needs to process one structure.
pub struct SummaryContext<'a> {
    pub assigner: &'a dyn SecondaryStructureAssigner,
    pub tools: ToolPaths,
    pub apbs: ApbsParams,
}

/// One row of the summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureSummary {
    /// Structure path relative to the input root
    pub filename: String,
    pub content: SecondaryStructureContent,
    pub chain_length: usize,
    pub pqr: PathBuf,
    pub apbs_input: PathBuf,
    /// Solvation energy as printed with six decimals, if APBS produced one
    pub energy: Option<String>,
}

/// Paths of the electrostatics intermediates for one protein.
#[derive(Debug, Clone, PartialEq)]
pub struct ApbsFiles {
    pub folder: PathBuf,
    pub pqr: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ApbsFiles {
    pub fn new(root: &Path, protein: &str) -> Self {
        let folder = root.join(protein).join("apbs");
        Self {
            pqr: folder.join(format!("{protein}.pqr")),
            input: folder.join(format!("{protein}_apbs_input.in")),
            output: folder.join(format!("{protein}_apbs.out")),
            folder,
        }
    }
}

/// Secondary structure content and chain length of one structure.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureMetrics {
    /// Structure path relative to the input root
    pub filename: String,
    pub content: SecondaryStructureContent,
    pub chain_length: usize,
}

/// Solvation electrostatics shared by every model of one protein.
#[derive(Debug, Clone, PartialEq)]
pub struct ProteinElectrostatics {
    pub files: ApbsFiles,
    pub energy: Option<String>,
}

impl StructureSummary {
    fn new(metrics: StructureMetrics, electrostatics: &ProteinElectrostatics) -> Self {
        Self {
            filename: metrics.filename,
            content: metrics.content,
            chain_length: metrics.chain_length,
            pqr: electrostatics.files.pqr.clone(),
            apbs_input: electrostatics.files.input.clone(),
            energy: electrostatics.energy.clone(),
        }
    }
}

/// Assign secondary structure and count residues of one structure.
pub fn structure_metrics(
    file_path: &Path,
    root: &Path,
    ctx: &SummaryContext,
) -> Result<StructureMetrics> {
    let codes = ctx.assigner.assign(file_path)?;
    let content = SecondaryStructureContent::from_codes(&codes);

    // Modified residues keep their CA here, as they do in the PyMOL selection
    let (pdb, pdb_warnings) = read_structure(file_path)?;
    log_pdb_warnings(file_path, &pdb_warnings);
    log_sequences(file_path, &pdb);
    let chain_length = chain_length(&pdb);

    let filename = file_path
        .strip_prefix(root)
        .unwrap_or(file_path)
        .to_string_lossy()
        .to_string();

    Ok(StructureMetrics {
        filename,
        content,
        chain_length,
    })
}

/// Run pdb2pqr and APBS for the protein `file_path` belongs to and read back the energy.
///
/// Nothing is recomputed when the APBS output of the protein already exists.
pub fn protein_electrostatics(
    file_path: &Path,
    root: &Path,
    ctx: &SummaryContext,
) -> Result<ProteinElectrostatics> {
    let protein = protein_name_from_structure(file_path);
    let files = ApbsFiles::new(root, &protein);
    std::fs::create_dir_all(&files.folder)?;

    if files.output.exists() {
        info!(
            "Poisson-Boltzmann electrostatics calculation for {protein} already exists, skipping."
        );
    } else {
        info!("Calculating electrostatics for {protein}.");
        run_pdb2pqr(&ctx.tools.pdb2pqr, file_path, &files.pqr, ctx.apbs.ph)?;
        write_apbs_input(&files.pqr, &files.input, &ctx.apbs)?;
        run_apbs(&ctx.tools.apbs, &files.input, &files.output)?;
    }

    let energy = extract_global_energy(&files.output)?;
    if energy.is_none() {
        warn!(
            "No global net electrostatic energy in {}",
            files.output.display()
        );
    }
    Ok(ProteinElectrostatics { files, energy })
}

/// Compute secondary structure, chain length and solvation energy of one structure.
///
/// Electrostatics are not recomputed when the APBS output of the protein already exists.
pub fn process_single_pdb(
    file_path: &Path,
    root: &Path,
    ctx: &SummaryContext,
) -> Result<StructureSummary> {
    let metrics = structure_metrics(file_path, root, ctx)?;
    let electrostatics = protein_electrostatics(file_path, root, ctx)?;
    Ok(StructureSummary::new(metrics, &electrostatics))
}

/// Structure files grouped by protein, models of each protein in natural order.
pub fn group_by_protein(files: &[PathBuf]) -> BTreeMap<String, Vec<PathBuf>> {
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        groups
            .entry(protein_name_from_structure(file))
            .or_default()
            .push(file.to_owned());
    }
    for models in groups.values_mut() {
        models.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
    }
    groups
}

/// Process all models of one protein.
///
/// Electrostatics run once, on the first model, before any model is summarised, so models
/// never race on the shared APBS folder. If they fail, the whole protein is skipped.
fn process_protein(
    protein: &str,
    models: &[PathBuf],
    root: &Path,
    ctx: &SummaryContext,
) -> Vec<StructureSummary> {
    let Some(first) = models.first() else {
        return Vec::new();
    };
    let electrostatics = match protein_electrostatics(first, root, ctx) {
        Ok(electrostatics) => electrostatics,
        Err(e) => {
            error!("Skipping {protein} ({} model(s)): {e}", models.len());
            return Vec::new();
        }
    };

    models
        .par_iter()
        .filter_map(|file| match structure_metrics(file, root, ctx) {
            Ok(metrics) => Some(StructureSummary::new(metrics, &electrostatics)),
            Err(e) => {
                error!("Skipping {}: {e}", file.display());
                None
            }
        })
        .collect()
}

/// Process every structure below `root` on a pool of `num_threads` workers.
///
/// Structures that fail are logged and left out of the result.
pub fn process_pdb_files_parallel(
    root: &Path,
    ctx: &SummaryContext,
    num_threads: usize,
) -> Result<Vec<StructureSummary>> {
    let files = find_structure_files(root)?;
    let groups = group_by_protein(&files);
    info!(
        "Found {} structure file(s) of {} protein(s) below {}",
        files.len(),
        groups.len(),
        root.display()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()?;
    debug!("Using {} thread(s)", pool.current_num_threads());

    let results: Vec<StructureSummary> = pool.install(|| {
        groups
            .par_iter()
            .flat_map(|(protein, models)| process_protein(protein, models, root, ctx))
            .collect()
    });

    Ok(results)
}

/// Arrange summaries into the output table, naturally sorted by file name.
pub fn summary_to_df(results: &[StructureSummary]) -> Result<DataFrame> {
    let mut sorted: Vec<&StructureSummary> = results.iter().collect();
    sorted.sort_by(|a, b| natural_cmp(&a.filename, &b.filename));

    let df = df!(
        COL_FILENAME => sorted.iter().map(|x| x.filename.to_owned()).collect::<Vec<String>>(),
        COL_ALPHA => sorted.iter().map(|x| x.content.helix).collect::<Vec<f64>>(),
        COL_BETA => sorted.iter().map(|x| x.content.sheet).collect::<Vec<f64>>(),
        COL_STRUCTURED => sorted.iter().map(|x| x.content.structured()).collect::<Vec<f64>>(),
        COL_CHAIN_LENGTH => sorted.iter().map(|x| x.chain_length as u32).collect::<Vec<u32>>(),
        COL_ENERGY => sorted.iter().map(|x| x.energy.to_owned()).collect::<Vec<Option<String>>>(),
    )?;
    Ok(df)
}

/// Protein names of the summary rows: the first component of each file name.
pub fn protein_names(filenames: &[String]) -> Vec<String> {
    filenames
        .iter()
        .map(|f| f.split('/').next().unwrap_or_default().to_string())
        .collect()
}

/// Make sure the output folder of a summary exists and return the file to write.
pub fn prepare_output(output: &Path, default_name: &str) -> Result<PathBuf> {
    if output.as_os_str().is_empty() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "empty output path",
        )));
    }
    if output.is_dir() {
        return Ok(output.join(default_name));
    }
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)?,
        _ => {}
    }
    Ok(output.to_path_buf())
}
