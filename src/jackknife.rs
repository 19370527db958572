//! # Jackknife error estimation
//!
//! Estimate the uncertainty of the fitted orbital elements by leave-one-out resampling:
//! every observation is removed in turn, the orbit solver is run on the reduced set, and
//! the spread of the resulting element vectors gives one standard deviation per element.
//!
//! ## Pipeline
//! -----------------
//! For an observation set of size `N`:
//!
//! 1. **Load** – the ordered observations (see [`Jackknife::run_file`]).
//! 2. **Resample** – for each `i in 0..N`, write the set without observation `i`
//!    into a scratch file, invoke the [`OrbitSolver`], read its report.
//!    A resample that fails to converge (unreadable report, solver crash or timeout) is
//!    logged and skipped; any other error aborts the run.
//! 3. **Best fit** – by default the solver is run once on the complete set
//!    ([`BestFitSource::FullSet`]); [`BestFitSource::LastResample`] uses the last
//!    converged leave-one-out vector instead. A full-set fit that does not converge
//!    falls back to the last resample, the converged resamples are kept.
//! 4. **Aggregate** – population standard deviation, per element, over the converged
//!    resamples.
//!
//! Every step completes before the next starts: the solver reads and writes fixed file
//! names in its working directory, so runs must never overlap.
//!
//! ## Example
//! -----------------
//! ```rust,no_run
//! use camino::Utf8Path;
//! use orbjack::jackknife::{Jackknife, JackknifeParams};
//! use orbjack::solver::FindOrb;
//!
//! let solver = FindOrb::new("/opt/find_orb/fo").with_working_dir("/opt/find_orb");
//! let params = JackknifeParams::builder()
//!     .min_successful_resamples(5)
//!     .build()
//!     .unwrap();
//!
//! let result = Jackknife::new(&solver, params)
//!     .run_file(Utf8Path::new("2023AB1.obs"))
//!     .unwrap();
//! if let Some(result) = result {
//!     println!("{}", result);
//! }
//! ```
use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use crate::{
    astrometry::{record_reader::read_observation_file, record_writer::write_observation_set, Observation},
    constants::DEFAULT_MIN_SUCCESSFUL_RESAMPLES,
    elements::{
        solver_output::{read_solver_output, SolverOutputSchema},
        ElementArray, ElementErrors, OrbitalElementVector,
    },
    orbjack_errors::OrbJackError,
    progress::ResampleProgress,
    solver::OrbitSolver,
};

/// Which fit is reported as the best estimate of the orbit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BestFitSource {
    /// One extra solver run on the complete observation set.
    #[default]
    FullSet,
    /// The last converged leave-one-out vector, no extra run.
    LastResample,
}

/// Configuration of a jackknife run.
///
/// Build it with [`JackknifeParams::builder`] to get validation.
#[derive(Debug, Clone)]
pub struct JackknifeParams {
    /// Fewer converged resamples than this is an [`OrbJackError::InsufficientResamples`].
    pub min_successful_resamples: usize,
    pub best_fit: BestFitSource,
    /// Where leave-one-out files are written; a fresh temporary directory when `None`.
    pub scratch_dir: Option<Utf8PathBuf>,
    /// Keep the leave-one-out files after the run.
    pub keep_scratch_files: bool,
    /// Layout of the solver report.
    pub schema: SolverOutputSchema,
}

impl Default for JackknifeParams {
    fn default() -> Self {
        JackknifeParams {
            min_successful_resamples: DEFAULT_MIN_SUCCESSFUL_RESAMPLES,
            best_fit: BestFitSource::default(),
            scratch_dir: None,
            keep_scratch_files: false,
            schema: SolverOutputSchema::default(),
        }
    }
}

impl JackknifeParams {
    pub fn builder() -> JackknifeParamsBuilder {
        JackknifeParamsBuilder::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct JackknifeParamsBuilder {
    params: JackknifeParams,
}

impl JackknifeParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: JackknifeParams::default(),
        }
    }

    pub fn min_successful_resamples(mut self, v: usize) -> Self {
        self.params.min_successful_resamples = v;
        self
    }
    pub fn best_fit(mut self, v: BestFitSource) -> Self {
        self.params.best_fit = v;
        self
    }
    pub fn scratch_dir(mut self, v: impl Into<Utf8PathBuf>) -> Self {
        self.params.scratch_dir = Some(v.into());
        self
    }
    pub fn keep_scratch_files(mut self, v: bool) -> Self {
        self.params.keep_scratch_files = v;
        self
    }
    pub fn schema(mut self, v: SolverOutputSchema) -> Self {
        self.params.schema = v;
        self
    }

    /// Validate and produce the parameters.
    ///
    /// Validation rules
    /// -----------------
    /// * `min_successful_resamples ≥ 1`.
    /// * `scratch_dir`, when given, must be an existing directory.
    /// * `schema.required` must not be empty.
    pub fn build(self) -> Result<JackknifeParams, OrbJackError> {
        let p = &self.params;
        if p.min_successful_resamples == 0 {
            return Err(OrbJackError::InvalidJackknifeParameter(
                "min_successful_resamples must be at least 1".into(),
            ));
        }
        if let Some(dir) = &p.scratch_dir {
            if !dir.is_dir() {
                return Err(OrbJackError::InvalidJackknifeParameter(format!(
                    "scratch_dir '{dir}' is not a directory"
                )));
            }
        }
        if p.schema.required.is_empty() {
            return Err(OrbJackError::InvalidJackknifeParameter(format!(
                "solver output schema '{}' has no required field",
                p.schema.version
            )));
        }
        Ok(self.params)
    }
}

/// Outcome of a jackknife run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResamplingResult {
    pub best_fit: OrbitalElementVector,
    /// Where `best_fit` actually comes from: [`BestFitSource::LastResample`] when asked
    /// for, or when the full-set fit did not converge.
    pub best_fit_source: BestFitSource,
    /// Population standard deviation of each element over the converged resamples.
    pub errors: ElementErrors,
    /// `(removed observation index, fitted vector)` for each converged resample.
    pub resamples: Vec<(usize, OrbitalElementVector)>,
    /// Removed observation indices whose resample did not converge.
    pub failed: Vec<usize>,
}

impl ResamplingResult {
    pub fn successful_resamples(&self) -> usize {
        self.resamples.len()
    }

    /// `(best_fit - reference) / errors`, per element.
    ///
    /// An element with a zero error gives an infinite distance, or NaN if it also
    /// matches the reference exactly.
    pub fn sigma_distance(&self, reference: &OrbitalElementVector) -> ElementArray {
        self.best_fit
            .difference(reference)
            .component_div(&self.errors.0)
    }
}

impl fmt::Display for ResamplingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.best_fit)?;
        writeln!(
            f,
            "Jackknife errors ({} converged, {} failed)",
            self.resamples.len(),
            self.failed.len()
        )?;
        write!(f, "{}", self.errors)?;
        if f.alternate() {
            for (removed, elements) in &self.resamples {
                writeln!(
                    f,
                    "  without #{removed:<4} a = {:.8} AU, e = {:.8}, i = {:.6} deg",
                    elements.semi_major_axis, elements.eccentricity, elements.inclination
                )?;
            }
        }
        Ok(())
    }
}

/// Population standard deviation per component (Welford's update).
pub fn population_std(samples: &[ElementArray]) -> ElementArray {
    if samples.is_empty() {
        return ElementArray::zeros();
    }
    let mut mean = ElementArray::zeros();
    let mut m2 = ElementArray::zeros();
    for (k, x) in samples.iter().enumerate() {
        let delta = x - mean;
        mean += delta / (k + 1) as f64;
        m2 += delta.component_mul(&(x - mean));
    }
    (m2 / samples.len() as f64).map(|v| v.max(0.0).sqrt())
}

enum Scratch {
    Temporary(TempDir),
    Fixed(Utf8PathBuf),
}

impl Scratch {
    fn open(params: &JackknifeParams) -> Result<Self, OrbJackError> {
        match &params.scratch_dir {
            Some(dir) => Ok(Scratch::Fixed(dir.clone())),
            None => Ok(Scratch::Temporary(
                tempfile::Builder::new().prefix("orbjack-").tempdir()?,
            )),
        }
    }

    fn file(&self, name: &str) -> Result<Utf8PathBuf, OrbJackError> {
        match self {
            Scratch::Fixed(dir) => Ok(dir.join(name)),
            Scratch::Temporary(dir) => Utf8PathBuf::from_path_buf(dir.path().join(name))
                .map_err(|p| {
                    OrbJackError::Format(format!("non UTF-8 scratch path: {}", p.display()))
                }),
        }
    }

    fn release(self, keep: bool) {
        if let Scratch::Temporary(dir) = self {
            if keep {
                let kept = dir.keep();
                tracing::info!(path = %kept.display(), "scratch files kept");
            }
        }
    }
}

/// Leave-one-out resampling driver.
pub struct Jackknife<'a, S: OrbitSolver + ?Sized> {
    solver: &'a S,
    params: JackknifeParams,
}

impl<'a, S: OrbitSolver + ?Sized> Jackknife<'a, S> {
    pub fn new(solver: &'a S, params: JackknifeParams) -> Self {
        Jackknife { solver, params }
    }

    pub fn params(&self) -> &JackknifeParams {
        &self.params
    }

    /// Load an observation file and run the jackknife on it.
    pub fn run_file(&self, path: &Utf8Path) -> Result<Option<ResamplingResult>, OrbJackError> {
        let observations = read_observation_file(path)?;
        tracing::info!(path = %path, observations = observations.len(), "observation set loaded");
        self.run(&observations)
    }

    /// Run the jackknife on an ordered observation set.
    ///
    /// Arguments
    /// -----------------
    /// * `observations`: the complete set, in file order.
    ///
    /// Return
    /// ----------
    /// * `Ok(None)` for fewer than two observations: nothing to resample.
    /// * `Ok(Some(result))` when at least `min_successful_resamples` resamples converged.
    /// * [`OrbJackError::InsufficientResamples`] otherwise.
    /// * Any I/O error on the scratch files, and any solver error that is not
    ///   [recoverable per resample](OrbJackError::is_recoverable_per_resample).
    pub fn run(
        &self,
        observations: &[Observation],
    ) -> Result<Option<ResamplingResult>, OrbJackError> {
        let n = observations.len();
        if n < 2 {
            tracing::info!(observations = n, "fewer than 2 observations, jackknife skipped");
            return Ok(None);
        }

        let scratch = Scratch::open(&self.params)?;
        let outcome = self.resample_all(observations, &scratch);
        scratch.release(self.params.keep_scratch_files);
        outcome.map(Some)
    }

    fn resample_all(
        &self,
        observations: &[Observation],
        scratch: &Scratch,
    ) -> Result<ResamplingResult, OrbJackError> {
        let n = observations.len();
        let mut resamples = Vec::with_capacity(n);
        let mut failed = Vec::new();
        let mut progress = ResampleProgress::new(n);

        for removed in 0..n {
            let subset: Vec<Observation> = observations
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != removed)
                .map(|(_, obs)| obs.clone())
                .collect();

            let file = scratch.file(&format!("resample_{removed:04}.obs"))?;
            match self.fit(&subset, &file) {
                Ok(elements) => resamples.push((removed, elements)),
                Err(err) if err.is_recoverable_per_resample() => {
                    tracing::warn!(
                        removed,
                        solver = self.solver.name(),
                        "resample skipped: {err}"
                    );
                    failed.push(removed);
                }
                Err(err) => return Err(err),
            }
            progress.advance();
        }
        progress.finish();

        if resamples.len() < self.params.min_successful_resamples {
            return Err(OrbJackError::InsufficientResamples {
                required: self.params.min_successful_resamples,
                obtained: resamples.len(),
            });
        }

        let last_resample = resamples
            .last()
            .map(|(_, elements)| elements.clone())
            .ok_or(OrbJackError::InsufficientResamples {
                required: self.params.min_successful_resamples,
                obtained: 0,
            })?;
        let (best_fit, best_fit_source) = match self.params.best_fit {
            BestFitSource::FullSet => {
                match self.fit(observations, &scratch.file("full_set.obs")?) {
                    Ok(elements) => (elements, BestFitSource::FullSet),
                    Err(err) if err.is_recoverable_per_resample() => {
                        tracing::warn!(
                            solver = self.solver.name(),
                            "full-set fit failed, best fit taken from the last resample: {err}"
                        );
                        (last_resample, BestFitSource::LastResample)
                    }
                    Err(err) => return Err(err),
                }
            }
            BestFitSource::LastResample => (last_resample, BestFitSource::LastResample),
        };

        let vectors: Vec<ElementArray> = resamples.iter().map(|(_, e)| e.to_array()).collect();
        let errors = ElementErrors(population_std(&vectors));
        tracing::info!(
            converged = resamples.len(),
            failed = failed.len(),
            "jackknife finished"
        );

        Ok(ResamplingResult {
            best_fit,
            best_fit_source,
            errors,
            resamples,
            failed,
        })
    }

    /// Write, solve, read. The observation file is removed afterwards unless kept.
    fn fit(
        &self,
        observations: &[Observation],
        file: &Utf8Path,
    ) -> Result<OrbitalElementVector, OrbJackError> {
        write_observation_set(observations, file)?;
        let outcome = self
            .solver
            .invoke(file)
            .and_then(|report| read_solver_output(&report, &self.params.schema));
        if !self.params.keep_scratch_files {
            if let Err(err) = std::fs::remove_file(file) {
                tracing::debug!(path = %file, "cannot remove scratch file: {err}");
            }
        }
        outcome
    }
}
