//! Thin wrappers for launching the external scientific programs.

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, trace, warn};

/// Locations of the external executables.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub pymol: PathBuf,
    pub pdb2pqr: PathBuf,
    pub apbs: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            pymol: PathBuf::from("pymol"),
            pdb2pqr: PathBuf::from("pdb2pqr"),
            apbs: PathBuf::from("apbs"),
        }
    }
}

impl ToolPaths {
    /// Try every tool and warn about the ones that cannot be launched.
    pub fn check(&self) -> bool {
        [&self.pymol, &self.pdb2pqr, &self.apbs]
            .into_iter()
            .map(|tool| {
                let ok = is_available(tool);
                if !ok {
                    warn!("{} could not be launched, check PATH", tool.display());
                }
                ok
            })
            .fold(true, |acc, ok| acc && ok)
    }
}

/// Whether `program` can be started at all.
pub fn is_available(program: &Path) -> bool {
    Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

fn program_name(program: &Path) -> String {
    program.display().to_string()
}

fn launch(program: &Path, command: &mut Command) -> Result<Output> {
    trace!("Running {command:?}");
    command.output().map_err(|source| Error::ToolLaunch {
        program: program_name(program),
        source,
    })
}

/// Run `program` to completion and return its standard output.
///
/// A non-zero exit status is an error; standard error is logged at debug level.
pub fn run_capture<I, S>(program: &Path, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = launch(program, Command::new(program).args(args).stdin(Stdio::null()))?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        debug!("{} stderr:\n{}", program.display(), stderr.trim_end());
    }
    if !output.status.success() {
        return Err(Error::ToolFailed {
            program: program_name(program),
            status: output.status,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn partial_path(stdout_file: &Path) -> PathBuf {
    let mut name = stdout_file.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Run `program` with its standard output redirected into `stdout_file`.
///
/// Output is collected in `<stdout_file>.tmp` and only moved into place when the program
/// exits successfully, so a failed run never leaves `stdout_file` behind.
pub fn run_to_file<I, S>(program: &Path, args: I, stdout_file: &Path) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let partial = partial_path(stdout_file);
    let file = File::create(&partial)?;
    let result = launch(
        program,
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(file)),
    )
    .and_then(|output| {
        if output.status.success() {
            Ok(())
        } else {
            Err(Error::ToolFailed {
                program: program_name(program),
                status: output.status,
            })
        }
    });

    match result {
        Ok(()) => {
            fs::rename(&partial, stdout_file)?;
            Ok(())
        }
        Err(e) => {
            if let Err(rm) = fs::remove_file(&partial) {
                debug!("Could not remove {}: {rm}", partial.display());
            }
            Err(e)
        }
    }
}

/// Write an executable shell script standing in for an external program.
#[cfg(all(test, unix))]
pub(crate) fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_fails_to_launch() {
        let program = Path::new("definitely-not-a-real-program-8c1f");
        assert!(!is_available(program));
        assert!(matches!(
            run_capture(program, ["--help"]),
            Err(Error::ToolLaunch { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn captures_and_redirects_stdout() {
        let echo = Path::new("echo");
        assert_eq!(run_capture(echo, ["hello"]).unwrap(), "hello\n");

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        run_to_file(echo, ["Global", "net"], &out).unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "Global net\n");
    }

    #[cfg(unix)]
    #[test]
    fn failing_status_is_an_error() {
        assert!(matches!(
            run_capture(Path::new("false"), Vec::<&str>::new()),
            Err(Error::ToolFailed { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn failed_redirect_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(dir.path(), "apbs", "echo partial output\nexit 1");
        let out = dir.path().join("p_apbs.out");

        let res = run_to_file(&tool, ["p_apbs_input.in"], &out);
        assert!(matches!(res, Err(Error::ToolFailed { .. })));
        assert!(!out.exists());
        assert!(!dir.path().join("p_apbs.out.tmp").exists());

        let missing = run_to_file(Path::new("missing-apbs-8c1f"), ["x"], &out);
        assert!(matches!(missing, Err(Error::ToolLaunch { .. })));
        assert!(!out.exists());
        assert!(!dir.path().join("p_apbs.out.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn successful_redirect_replaces_stale_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("p_apbs.out");
        fs::write(&out, "stale\n").unwrap();
        run_to_file(Path::new("echo"), ["fresh"], &out).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "fresh\n");
        assert!(!dir.path().join("p_apbs.out.tmp").exists());
    }
}
