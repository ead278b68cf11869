//! Solvation electrostatics through pdb2pqr and APBS.
//!
//! pdb2pqr assigns PARSE radii and charges with propka protonation states, APBS then
//! solves the linearized Poisson-Boltzmann equation twice (solvated and vacuum) and prints
//! the difference, which is the electrostatic solvation energy.

use crate::error::Result;
use crate::tools::{run_capture, run_to_file};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::trace;

/// Line of APBS output carrying the requested energy.
const ENERGY_MARKER: &str = "Global net ELEC energy";

/// Parameters for the two `mg-auto` runs written into the APBS input file.
#[derive(Debug, Clone, PartialEq)]
pub struct ApbsParams {
    /// Grid points per dimension
    pub grid_dim: u32,
    /// Coarse and fine grid edge length in Å
    pub grid_length: f64,
    /// Solute dielectric
    pub pdie: f64,
    /// Solvent dielectric for the solvated run
    pub sdie: f64,
    /// Surface sphere density
    pub sdens: f64,
    /// Solvent probe radius
    pub srad: f64,
    /// Spline window
    pub swin: f64,
    /// Temperature in K
    pub temp: f64,
    /// pH used by propka when pdb2pqr assigns titration states
    pub ph: f64,
}

impl Default for ApbsParams {
    fn default() -> Self {
        Self {
            grid_dim: 289,
            grid_length: 150.0,
            pdie: 2.0,
            sdie: 78.54,
            sdens: 10.0,
            srad: 1.4,
            swin: 0.3,
            temp: 298.15,
            ph: 7.0,
        }
    }
}

impl ApbsParams {
    fn elec_block(&self, out: &mut String, name: &str, bcfl: &str, sdie: &str, dx_path: &str) {
        let dim = self.grid_dim;
        let len = self.grid_length;
        // Writing into a String cannot fail
        let _ = write!(
            out,
            "elec name {name}\n  mg-auto\n  chgm spl2\n  dime {dim} {dim} {dim}\n  cglen {len:?} {len:?} {len:?}\n  fglen {len:?} {len:?} {len:?}\n  cgcent mol 1\n  fgcent mol 1\n  mol 1\n  lpbe\n  bcfl {bcfl}\n  pdie {:?}\n  sdie {sdie}\n  sdens {:?}\n  srad {:?}\n  swin {:?}\n  srfm smol\n  temp {:?}\n  calcenergy total\n  calcforce no\n  write pot dx {dx_path}\nend\n",
            self.pdie, self.sdens, self.srad, self.swin, self.temp,
        );
    }

    /// Render the APBS input for the molecule in `pqr`.
    pub fn render_input(&self, pqr: &str) -> String {
        let mut out = format!("read\n  mol pqr {pqr}\nend\n");
        self.elec_block(
            &mut out,
            "solvated",
            "mdh",
            &format!("{:?}", self.sdie),
            &format!("{pqr}_solv"),
        );
        self.elec_block(&mut out, "vacuum", "sdh", "1", &format!("{pqr}_vac"));
        out.push_str("print elecEnergy solvated - vacuum end\nquit\n");
        out
    }
}

/// Assign charges and radii with pdb2pqr, writing `output_pqr`.
pub fn run_pdb2pqr(program: &Path, pdb_file: &Path, output_pqr: &Path, ph: f64) -> Result<()> {
    let args = [
        "--ff=PARSE".to_string(),
        "--whitespace".to_string(),
        "--titration-state-method=propka".to_string(),
        format!("--with-ph={ph}"),
        pdb_file.to_string_lossy().to_string(),
        output_pqr.to_string_lossy().to_string(),
    ];
    let stdout = run_capture(program, &args)?;
    trace!("pdb2pqr stdout:\n{stdout}");
    Ok(())
}

/// Write the APBS input file for `output_pqr`.
pub fn write_apbs_input(output_pqr: &Path, output_apbs_in: &Path, params: &ApbsParams) -> Result<()> {
    fs::write(
        output_apbs_in,
        params.render_input(&output_pqr.to_string_lossy()),
    )?;
    Ok(())
}

/// Run APBS on `output_apbs_in`, storing its standard output in `apbs_out`.
pub fn run_apbs(program: &Path, output_apbs_in: &Path, apbs_out: &Path) -> Result<()> {
    run_to_file(program, [output_apbs_in.as_os_str()], apbs_out)
}

/// Pull the global net electrostatic energy out of APBS output text.
///
/// The value is reformatted with six decimals. `None` when no energy line is present
/// or its value is not a number.
pub fn parse_global_energy(text: &str) -> Option<String> {
    let line = text.lines().find(|line| line.contains(ENERGY_MARKER))?;
    let value = line.split('=').nth(1)?.split_whitespace().next()?;
    let energy: f64 = value.parse().ok()?;
    Some(format!("{energy:.6}"))
}

/// Read `apbs_out` and extract the global net electrostatic energy.
pub fn extract_global_energy(apbs_out: &Path) -> Result<Option<String>> {
    let text = fs::read_to_string(apbs_out)?;
    Ok(parse_global_energy(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED_INPUT: &str = "read
  mol pqr /w/p/apbs/p.pqr
end
elec name solvated
  mg-auto
  chgm spl2
  dime 289 289 289
  cglen 150.0 150.0 150.0
  fglen 150.0 150.0 150.0
  cgcent mol 1
  fgcent mol 1
  mol 1
  lpbe
  bcfl mdh
  pdie 2.0
  sdie 78.54
  sdens 10.0
  srad 1.4
  swin 0.3
  srfm smol
  temp 298.15
  calcenergy total
  calcforce no
  write pot dx /w/p/apbs/p.pqr_solv
end
elec name vacuum
  mg-auto
  chgm spl2
  dime 289 289 289
  cglen 150.0 150.0 150.0
  fglen 150.0 150.0 150.0
  cgcent mol 1
  fgcent mol 1
  mol 1
  lpbe
  bcfl sdh
  pdie 2.0
  sdie 1
  sdens 10.0
  srad 1.4
  swin 0.3
  srfm smol
  temp 298.15
  calcenergy total
  calcforce no
  write pot dx /w/p/apbs/p.pqr_vac
end
print elecEnergy solvated - vacuum end
quit
";

    #[test]
    fn default_input_file() {
        let rendered = ApbsParams::default().render_input("/w/p/apbs/p.pqr");
        assert_eq!(rendered, EXPECTED_INPUT);
    }

    #[test]
    fn input_file_reflects_grid_overrides() {
        let params = ApbsParams {
            grid_dim: 161,
            grid_length: 96.5,
            ..Default::default()
        };
        let rendered = params.render_input("x.pqr");
        assert!(rendered.contains("  dime 161 161 161\n"));
        assert!(rendered.contains("  fglen 96.5 96.5 96.5\n"));
    }

    #[test]
    fn energy_from_apbs_output() {
        let text = "\
  Local net energy (PE 0) = -1.234E+03 kJ/mol
print energy 1 (solvated) - 2 (vacuum) end
  Global net ELEC energy = -2.716089183463E+03 kJ/mol
  Global net ELEC energy = 1.0 kJ/mol
";
        assert_eq!(parse_global_energy(text).as_deref(), Some("-2716.089183"));
    }

    #[test]
    fn missing_or_bad_energy() {
        assert_eq!(parse_global_energy("nothing here\n"), None);
        assert_eq!(parse_global_energy("Global net ELEC energy = nan? kJ\n"), None);
        assert_eq!(parse_global_energy("Global net ELEC energy\n"), None);
    }

    #[test]
    fn energy_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("p_apbs.out");
        std::fs::write(&out, "  Global net ELEC energy = 4.5E+01 kJ/mol\n").unwrap();
        assert_eq!(extract_global_energy(&out).unwrap().as_deref(), Some("45.000000"));
        assert!(extract_global_energy(&dir.path().join("absent.out")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn pdb2pqr_command_line() {
        let dir = tempfile::tempdir().unwrap();
        let argv = dir.path().join("argv.txt");
        let pdb2pqr = crate::tools::fake_tool(
            dir.path(),
            "pdb2pqr",
            &format!("printf '%s\\n' \"$@\" > '{}'", argv.display()),
        );
        let pdb = dir.path().join("relaxed_model_1.pdb");
        let pqr = dir.path().join("apbs/protA.pqr");

        run_pdb2pqr(&pdb2pqr, &pdb, &pqr, ApbsParams::default().ph).unwrap();

        let recorded = std::fs::read_to_string(&argv).unwrap();
        let (pdb_arg, pqr_arg) = (pdb.display().to_string(), pqr.display().to_string());
        assert_eq!(
            recorded.lines().collect::<Vec<_>>(),
            vec![
                "--ff=PARSE",
                "--whitespace",
                "--titration-state-method=propka",
                "--with-ph=7",
                pdb_arg.as_str(),
                pqr_arg.as_str(),
            ]
        );

        run_pdb2pqr(&pdb2pqr, &pdb, &pqr, 6.5).unwrap();
        let recorded = std::fs::read_to_string(&argv).unwrap();
        assert_eq!(recorded.lines().nth(3), Some("--with-ph=6.5"));
    }

    #[cfg(unix)]
    #[test]
    fn apbs_reads_input_and_fills_output() {
        let dir = tempfile::tempdir().unwrap();
        let apbs = crate::tools::fake_tool(
            dir.path(),
            "apbs",
            "echo \"input $1\"\necho '  Global net ELEC energy = -2.5E+01 kJ/mol'",
        );
        let input = dir.path().join("protA_apbs_input.in");
        let out = dir.path().join("protA_apbs.out");

        run_apbs(&apbs, &input, &out).unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        assert!(text.starts_with(&format!("input {}\n", input.display())));
        assert_eq!(extract_global_energy(&out).unwrap().as_deref(), Some("-25.000000"));
    }

    #[test]
    fn writes_input_next_to_pqr() {
        let dir = tempfile::tempdir().unwrap();
        let pqr = dir.path().join("p.pqr");
        let input = dir.path().join("p_apbs_input.in");
        write_apbs_input(&pqr, &input, &ApbsParams::default()).unwrap();
        let text = std::fs::read_to_string(&input).unwrap();
        assert!(text.starts_with(&format!("read\n  mol pqr {}\nend\n", pqr.display())));
        assert!(text.ends_with("quit\n"));
    }
}
