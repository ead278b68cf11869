//! Secondary structure content, with the per-residue classification delegated to PyMOL.

use crate::error::{Error, Result};
use crate::tools::run_capture;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Marker printed in front of every CA record so the lines can be picked out of PyMOL's output.
const RECORD_TAG: &str = "SSREC";

/// Secondary structure assigned to one alpha carbon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SsCode {
    Helix,
    Sheet,
    Loop,
}

impl SsCode {
    /// Map a PyMOL `ss` code; anything but `H` and `S` is a loop.
    pub fn from_pymol(code: &str) -> Self {
        match code {
            "H" => SsCode::Helix,
            "S" => SsCode::Sheet,
            _ => SsCode::Loop,
        }
    }
}

/// Something that can classify the CA atoms of a structure file.
pub trait SecondaryStructureAssigner: Sync {
    fn assign(&self, pdb_file: &Path) -> Result<Vec<SsCode>>;
}

/// Runs PyMOL headless and reads back its secondary structure assignment.
#[derive(Debug, Clone)]
pub struct PymolAssigner {
    pub program: PathBuf,
}

impl PymolAssigner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn script() -> String {
        format!("iterate name CA, print('{RECORD_TAG}', resi, ss or 'L')")
    }
}

impl SecondaryStructureAssigner for PymolAssigner {
    fn assign(&self, pdb_file: &Path) -> Result<Vec<SsCode>> {
        let script = Self::script();
        let args: [&OsStr; 4] = [
            OsStr::new("-cq"),
            pdb_file.as_os_str(),
            OsStr::new("-d"),
            OsStr::new(&script),
        ];
        let stdout = run_capture(&self.program, args)?;
        parse_pymol_records(&stdout).map_err(|message| Error::ToolOutput {
            program: self.program.display().to_string(),
            message,
        })
    }
}

/// Parse the tagged `resi ss` lines printed by [`PymolAssigner`].
pub fn parse_pymol_records(stdout: &str) -> std::result::Result<Vec<SsCode>, String> {
    stdout
        .lines()
        .filter_map(|line| line.trim().strip_prefix(RECORD_TAG))
        .map(|rest| {
            trace!("PyMOL record:{rest}");
            let mut fields = rest.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some(_resi), Some(ss)) => Ok(SsCode::from_pymol(ss)),
                (Some(_resi), None) => Ok(SsCode::Loop),
                _ => Err(format!("malformed record '{rest}'")),
            }
        })
        .collect()
}

/// Percentages of helix and sheet among the classified residues.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SecondaryStructureContent {
    pub helix: f64,
    pub sheet: f64,
}

impl SecondaryStructureContent {
    pub fn from_codes(codes: &[SsCode]) -> Self {
        if codes.is_empty() {
            return Self::default();
        }
        let total = codes.len() as f64;
        let count = |wanted| codes.iter().filter(|&&c| c == wanted).count() as f64;
        Self {
            helix: 100.0 * count(SsCode::Helix) / total,
            sheet: 100.0 * count(SsCode::Sheet) / total,
        }
    }

    /// Helix plus sheet.
    pub fn structured(&self) -> f64 {
        self.helix + self.sheet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_lines_only() {
        let stdout = " PyMOL(TM) banner\nSSREC 1 L\nSSREC 2 H\nSSREC 3 H\nSSREC 4 S\nSSREC 5\n";
        let codes = parse_pymol_records(stdout).unwrap();
        assert_eq!(
            codes,
            vec![
                SsCode::Loop,
                SsCode::Helix,
                SsCode::Helix,
                SsCode::Sheet,
                SsCode::Loop
            ]
        );
    }

    #[test]
    fn malformed_record_is_rejected() {
        assert!(parse_pymol_records("SSREC\n").is_err());
    }

    #[test]
    fn content_percentages() {
        let codes = [
            SsCode::Helix,
            SsCode::Helix,
            SsCode::Sheet,
            SsCode::Loop,
        ];
        let content = SecondaryStructureContent::from_codes(&codes);
        assert_eq!(content.helix, 50.0);
        assert_eq!(content.sheet, 25.0);
        assert_eq!(content.structured(), 75.0);
    }

    #[test]
    fn no_residues_means_no_structure() {
        let content = SecondaryStructureContent::from_codes(&[]);
        assert_eq!(content, SecondaryStructureContent::default());
        assert_eq!(content.structured(), 0.0);
    }

    #[cfg(unix)]
    #[test]
    fn pymol_runs_headless_with_iterate_script() {
        let dir = tempfile::tempdir().unwrap();
        let argv = dir.path().join("argv.txt");
        let pymol = crate::tools::fake_tool(
            dir.path(),
            "pymol",
            &format!(
                "printf '%s\\n' \"$@\" > '{}'\necho ' PyMOL(TM) Molecular Graphics System'\necho 'SSREC 1 H'\necho 'SSREC 2 L'\necho 'SSREC 3 S'",
                argv.display()
            ),
        );
        let pdb = dir.path().join("protA/relaxed_model_1.pdb");

        let codes = PymolAssigner::new(&pymol).assign(&pdb).unwrap();
        assert_eq!(codes, vec![SsCode::Helix, SsCode::Loop, SsCode::Sheet]);

        let recorded = std::fs::read_to_string(&argv).unwrap();
        let pdb_arg = pdb.display().to_string();
        assert_eq!(
            recorded.lines().collect::<Vec<_>>(),
            vec![
                "-cq",
                pdb_arg.as_str(),
                "-d",
                "iterate name CA, print('SSREC', resi, ss or 'L')",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn pymol_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let pymol = crate::tools::fake_tool(dir.path(), "pymol", "echo 'SSREC 1 H'\nexit 2");
        let res = PymolAssigner::new(&pymol).assign(Path::new("x.pdb"));
        assert!(matches!(res, Err(Error::ToolFailed { .. })));
    }

    #[test]
    fn pymol_codes() {
        assert_eq!(SsCode::from_pymol("H"), SsCode::Helix);
        assert_eq!(SsCode::from_pymol("S"), SsCode::Sheet);
        assert_eq!(SsCode::from_pymol("L"), SsCode::Loop);
        assert_eq!(SsCode::from_pymol(""), SsCode::Loop);
    }
}
