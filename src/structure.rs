//! Loading predicted structures and the residue counts derived from them.

use crate::chains::ChainExt;
use crate::error::{Error, Result};
use crate::residues::ResidueExt;
use pdbtbx::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, error, warn};

/// Open an atomic data file with [`pdbtbx::ReadOptions`], keeping every residue.
pub fn read_structure(input_file: &Path) -> Result<(PDB, Vec<PDBError>)> {
    let path = input_file.to_string_lossy().to_string();
    ReadOptions::default()
        .set_only_atomic_coords(true)
        .set_level(StrictnessLevel::Loose)
        .read(&path)
        .map_err(|errors| Error::Structure {
            path: input_file.to_path_buf(),
            message: errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        })
}

/// Open an atomic data file and remove non-protein residues.
pub fn load_model(input_file: &Path) -> Result<(PDB, Vec<PDBError>)> {
    let (mut pdb, errors) = read_structure(input_file)?;
    pdb.remove_residues_by(|res| res.resn().is_none());
    Ok((pdb, errors))
}

/// Log parser warnings at a level matching their severity.
pub fn log_pdb_warnings(file: &Path, warnings: &[PDBError]) {
    warnings.iter().for_each(|e| match e.level() {
        ErrorLevel::BreakingError | ErrorLevel::InvalidatingError => {
            error!("{}: {e}", file.display())
        }
        _ => warn!("{}: {e}", file.display()),
    });
}

/// Number of distinct residue numbers carrying an alpha carbon in the first model.
///
/// Chains are not distinguished, so residues sharing a number across chains count once.
/// Every residue with a CA counts, modified ones included, as long as `pdb` comes from
/// [`read_structure`].
pub fn chain_length(pdb: &PDB) -> usize {
    let Some(model) = pdb.models().next() else {
        return 0;
    };
    model
        .residues()
        .filter(|res| res.has_ca())
        .map(|res| {
            let (serial, insertion) = res.id();
            (serial, insertion.map(str::to_string))
        })
        .collect::<HashSet<_>>()
        .len()
}

/// Log the one-letter sequence of every chain.
pub fn log_sequences(file: &Path, pdb: &PDB) {
    for chain in pdb.chains() {
        debug!(
            "{} >{}\n{}",
            file.display(),
            chain.id(),
            chain.pdb_seq().join("")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn mini_pdb() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-data/mini.pdb")
    }

    #[test]
    fn loads_protein_residues_only() {
        let (pdb, _) = load_model(&mini_pdb()).unwrap();
        assert_eq!(pdb.chain_count(), 2);
        assert!(pdb
            .residues()
            .all(|r| r.name() != Some("HOH") && r.name() != Some("SEP")));

        let seqs: Vec<String> = pdb.chains().map(|c| c.pdb_seq().join("")).collect();
        assert_eq!(seqs, vec!["AGK", "SV"]);
    }

    #[test]
    fn chain_length_counts_residue_numbers() {
        let (pdb, _) = read_structure(&mini_pdb()).unwrap();
        // Chain B reuses residue numbers 1 and 2, SEP 4 has a CA, the water does not
        assert_eq!(chain_length(&pdb), 4);

        let (protein_only, _) = load_model(&mini_pdb()).unwrap();
        assert_eq!(chain_length(&protein_only), 3);
    }

    #[test]
    fn modified_residues_stay_out_of_sequences() {
        let (pdb, _) = read_structure(&mini_pdb()).unwrap();
        assert!(pdb.residues().any(|r| r.name() == Some("SEP")));
        let seqs: Vec<String> = pdb.chains().map(|c| c.pdb_seq().join("")).collect();
        assert_eq!(seqs, vec!["AGK", "SV"]);
    }

    #[test]
    fn unreadable_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.pdb");
        assert!(matches!(read_structure(&path), Err(Error::Structure { .. })));
        assert!(matches!(load_model(&path), Err(Error::Structure { .. })));
    }
}
