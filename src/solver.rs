//! # Orbit solver adapter
//!
//! Runs the external orbit-determination program on an observation file and reports
//! where its element report was written.
//!
//! The jackknife only sees the [`OrbitSolver`] trait, so tests and alternative solvers
//! plug in without a real executable. [`FindOrb`] drives the `find_orb` command line
//! program (`fo`):
//!
//! * the child runs inside its own working directory (no process-wide `chdir`),
//! * any stale report in that directory is removed before the launch,
//! * a wall-clock timeout kills a hung solver and waits for it to exit,
//! * the exit status is only logged: `find_orb` reports failures through its output,
//!   and the report reader decides whether the resample converged.
//!
//! ## Configuration
//! -----------------
//! | Variable                 | Meaning                                  | Default        |
//! |--------------------------|------------------------------------------|----------------|
//! | `ORBJACK_SOLVER`         | solver executable                        | `fo`           |
//! | `ORBJACK_SOLVER_DIR`     | working directory of the solver          | current dir    |
//! | `ORBJACK_SOLVER_TIMEOUT` | timeout in seconds                       | `300`          |
use std::{process::Stdio, time::Duration};

use camino::{Utf8Path, Utf8PathBuf};
use tokio::{io::AsyncReadExt, process::Command};

use crate::{
    constants::{DEFAULT_SOLVER_OUTPUT, DEFAULT_SOLVER_TIMEOUT_SECS},
    orbjack_errors::OrbJackError,
};

/// An orbit determination program.
pub trait OrbitSolver {
    /// Fit an orbit to the observations in `observation_file`.
    ///
    /// Return
    /// ----------
    /// * The path of the report to read. The file may be missing or unusable if the fit
    ///   did not converge; that is for the report reader to decide.
    /// * [`OrbJackError::ExternalProcess`] or [`OrbJackError::SolverTimeout`] when the
    ///   program could not run to completion.
    fn invoke(&self, observation_file: &Utf8Path) -> Result<Utf8PathBuf, OrbJackError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "solver"
    }
}

/// The `find_orb` command line solver.
#[derive(Debug, Clone, PartialEq)]
pub struct FindOrb {
    executable: Utf8PathBuf,
    working_dir: Option<Utf8PathBuf>,
    output_name: String,
    timeout: Duration,
    extra_args: Vec<String>,
}

impl Default for FindOrb {
    fn default() -> Self {
        FindOrb::new("fo")
    }
}

impl FindOrb {
    pub fn new(executable: impl Into<Utf8PathBuf>) -> Self {
        FindOrb {
            executable: executable.into(),
            working_dir: None,
            output_name: DEFAULT_SOLVER_OUTPUT.to_string(),
            timeout: Duration::from_secs(DEFAULT_SOLVER_TIMEOUT_SECS),
            extra_args: Vec::new(),
        }
    }

    /// Build from the `ORBJACK_SOLVER*` environment variables.
    ///
    /// An unparsable `ORBJACK_SOLVER_TIMEOUT` is an [`OrbJackError::InvalidJackknifeParameter`].
    pub fn from_env() -> Result<Self, OrbJackError> {
        let mut solver = match std::env::var("ORBJACK_SOLVER") {
            Ok(exe) if !exe.trim().is_empty() => FindOrb::new(exe.trim()),
            _ => FindOrb::default(),
        };
        if let Ok(dir) = std::env::var("ORBJACK_SOLVER_DIR") {
            if !dir.trim().is_empty() {
                solver = solver.with_working_dir(dir.trim());
            }
        }
        if let Ok(secs) = std::env::var("ORBJACK_SOLVER_TIMEOUT") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                OrbJackError::InvalidJackknifeParameter(format!(
                    "ORBJACK_SOLVER_TIMEOUT must be a whole number of seconds, got '{secs}'"
                ))
            })?;
            solver = solver.with_timeout(Duration::from_secs(secs));
        }
        Ok(solver)
    }

    pub fn with_working_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Name of the report file the solver writes in its working directory.
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments passed after the observation file.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn executable(&self) -> &Utf8Path {
        &self.executable
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Where the report is expected after a run.
    pub fn output_path(&self) -> Utf8PathBuf {
        match &self.working_dir {
            Some(dir) => dir.join(&self.output_name),
            None => Utf8PathBuf::from(&self.output_name),
        }
    }

    async fn run(&self, observation_file: &Utf8Path) -> Result<(), OrbJackError> {
        // the child's working directory changes, relative inputs must not
        let observation_file = match observation_file.canonicalize_utf8() {
            Ok(path) => path,
            Err(_) => observation_file.to_path_buf(),
        };

        let mut command = Command::new(self.executable.as_std_path());
        command
            .arg(observation_file.as_str())
            .args(&self.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir.as_std_path());
        }

        let mut child = command.spawn().map_err(|err| {
            OrbJackError::ExternalProcess(format!("cannot start '{}': {err}", self.executable))
        })?;

        let stderr_pipe = child.stderr.take();
        let collect_stderr = async move {
            let mut stderr = Vec::new();
            if let Some(mut pipe) = stderr_pipe {
                if let Err(err) = pipe.read_to_end(&mut stderr).await {
                    tracing::trace!("cannot read solver stderr: {err}");
                }
            }
            stderr
        };

        let waited = tokio::time::timeout(self.timeout, async {
            tokio::join!(child.wait(), collect_stderr)
        })
        .await;

        match waited {
            Ok((Ok(status), stderr)) => {
                if !status.success() {
                    let stderr = String::from_utf8_lossy(&stderr);
                    tracing::debug!(
                        solver = %self.executable,
                        status = %status,
                        stderr = %stderr.trim(),
                        "solver exited with a failure status"
                    );
                }
                Ok(())
            }
            Ok((Err(err), _)) => Err(OrbJackError::ExternalProcess(format!(
                "waiting for '{}' failed: {err}",
                self.executable
            ))),
            Err(_) => {
                // kill() also reaps the child
                if let Err(err) = child.kill().await {
                    tracing::warn!(solver = %self.executable, "cannot kill timed out solver: {err}");
                }
                Err(OrbJackError::SolverTimeout {
                    seconds: self.timeout.as_secs_f64(),
                })
            }
        }
    }
}

impl OrbitSolver for FindOrb {
    fn invoke(&self, observation_file: &Utf8Path) -> Result<Utf8PathBuf, OrbJackError> {
        let output = self.output_path();
        match std::fs::remove_file(&output) {
            Ok(()) => tracing::trace!(path = %output, "removed stale solver output"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run(observation_file))?;
        Ok(output)
    }

    fn name(&self) -> &str {
        self.executable.as_str()
    }
}

#[cfg(test)]
mod solver_test {
    use super::*;

    #[test]
    fn test_builder_and_output_path() {
        let solver = FindOrb::new("/opt/find_orb/fo")
            .with_working_dir("/tmp/run")
            .with_output_name("out.txt")
            .with_timeout(Duration::from_secs(5))
            .with_args(["-c"]);
        assert_eq!(solver.output_path(), Utf8PathBuf::from("/tmp/run/out.txt"));
        assert_eq!(solver.timeout(), Duration::from_secs(5));
        assert_eq!(solver.name(), "/opt/find_orb/fo");

        let default = FindOrb::default();
        assert_eq!(default.output_path(), Utf8PathBuf::from(DEFAULT_SOLVER_OUTPUT));
        assert_eq!(default.timeout(), Duration::from_secs(DEFAULT_SOLVER_TIMEOUT_SECS));
    }

    #[test]
    fn test_missing_executable_is_external_process_error() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let solver = FindOrb::new("/nonexistent/orbjack-solver").with_working_dir(&dir);
        let err = solver.invoke(&dir.join("obs.txt")).unwrap_err();
        assert!(matches!(err, OrbJackError::ExternalProcess(_)));
        assert!(err.is_recoverable_per_resample());
    }

    #[cfg(unix)]
    #[test]
    fn test_stale_output_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.join(DEFAULT_SOLVER_OUTPUT), "stale").unwrap();

        let solver = FindOrb::new("true").with_working_dir(&dir);
        let output = solver.invoke(&dir.join("obs.txt")).unwrap();
        assert_eq!(output, dir.join(DEFAULT_SOLVER_OUTPUT));
        assert!(!output.exists());
    }
}
