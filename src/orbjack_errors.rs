use thiserror::Error;

use crate::{astrometry::record_reader::ParseRecordError, elements::solver_output::SolverOutputError};

#[derive(Error, Debug)]
pub enum OrbJackError {
    #[error("Invalid fixed-column format: {0}")]
    Format(String),

    #[error("Error while reading an astrometry record: {0}")]
    ParsingRecord(ParseRecordError),

    #[error("Solver produced no usable orbit: {0}")]
    SolverOutput(SolverOutputError),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("External solver process failed: {0}")]
    ExternalProcess(String),

    #[error("External solver did not terminate within {seconds} s")]
    SolverTimeout { seconds: f64 },

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("HTTP reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Unexpected JPL Horizons response: {0}")]
    HorizonsResponse(String),

    #[error("Invalid jackknife parameter: {0}")]
    InvalidJackknifeParameter(String),

    #[error("Only {obtained} resamples converged, at least {required} are required")]
    InsufficientResamples { required: usize, obtained: usize },
}

impl From<ParseRecordError> for OrbJackError {
    fn from(err: ParseRecordError) -> Self {
        OrbJackError::ParsingRecord(err)
    }
}

impl From<SolverOutputError> for OrbJackError {
    fn from(err: SolverOutputError) -> Self {
        OrbJackError::SolverOutput(err)
    }
}

impl OrbJackError {
    /// Whether this error only invalidates the current resample.
    ///
    /// Non-convergence and solver process failures are absorbed by the jackknife loop;
    /// everything else aborts the run.
    pub fn is_recoverable_per_resample(&self) -> bool {
        matches!(
            self,
            OrbJackError::SolverOutput(_)
                | OrbJackError::ExternalProcess(_)
                | OrbJackError::SolverTimeout { .. }
        )
    }
}

impl PartialEq for OrbJackError {
    fn eq(&self, other: &Self) -> bool {
        use OrbJackError::*;
        match (self, other) {
            (Format(a), Format(b)) => a == b,
            (ParsingRecord(a), ParsingRecord(b)) => a == b,
            (SolverOutput(a), SolverOutput(b)) => a == b,
            (MissingField(a), MissingField(b)) => a == b,
            (ExternalProcess(a), ExternalProcess(b)) => a == b,
            (SolverTimeout { seconds: a }, SolverTimeout { seconds: b }) => a == b,

            // payloads are not comparable, same variant is enough
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (ReqwestError(_), ReqwestError(_)) => true,

            (HorizonsResponse(a), HorizonsResponse(b)) => a == b,
            (InvalidJackknifeParameter(a), InvalidJackknifeParameter(b)) => a == b,
            (
                InsufficientResamples {
                    required: r1,
                    obtained: o1,
                },
                InsufficientResamples {
                    required: r2,
                    obtained: o2,
                },
            ) => r1 == r2 && o1 == o2,

            _ => false,
        }
    }
}
