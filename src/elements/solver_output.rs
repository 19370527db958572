//! # Solver output reader
//!
//! Extract an [`OrbitalElementVector`] from the orbit solver's textual report
//! (`elements.txt` for `find_orb`).
//!
//! The report has no machine-readable structure: every element sits at a fixed
//! whitespace-separated token of a fixed physical line. Those positions are kept in one
//! versioned table, [`SolverOutputSchema`], so a change of the solver's report layout is a
//! change of data, not of code.
//!
//! ## Example
//! -----------------
//! ```text
//! line 5   n   0.21234567 +/- 0.00123   Peri.  123.45678901 +/- 0.1 ...
//! line 6   a   2.34567890 +/- 0.0123    Node    12.34567890 +/- 0.1 ...
//! line 7   e   0.12345670 +/- 0.00123   Incl.    5.67890123 +/- 0.1 ...
//! line 8   P   3.59/1311.62d +/- 0.02   H 17.5  G  0.15   U  7.8
//! line 9   q   2.05612345 +/- 0.01  Q 2.63523435 +/- 0.02
//! ```
//!
//! A token such as `3.59/1311.62d` is read through its leading numeric part (`3.59`).
//!
//! ## Errors
//! -----------------
//! Every failure is a [`SolverOutputError`]. The jackknife treats them as a non-converged
//! resample: the run is logged and skipped.
use camino::Utf8Path;
use thiserror::Error;

use crate::{
    elements::{ElementField, OrbitalElementVector},
    orbjack_errors::OrbJackError,
};

/// Reasons the solver output could not be turned into an element vector.
///
/// Line numbers are 1-indexed physical lines, token indices are 0-indexed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverOutputError {
    #[error("Solver output not found: {0}")]
    MissingOutput(String),
    #[error("Solver output {path} is not readable text: {reason}")]
    Unreadable { path: String, reason: String },
    #[error("Solver output has no line {0}")]
    MissingLine(usize),
    #[error("Solver output line {line} has no token {token}")]
    MissingToken { line: usize, token: usize },
    #[error("Solver output line {line}, token {token}: '{value}' is not a number")]
    InvalidNumber {
        line: usize,
        token: usize,
        value: String,
    },
}

/// Where one element lives in the report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldLocation {
    pub field: ElementField,
    /// 1-indexed physical line.
    pub line: usize,
    /// 0-indexed whitespace-separated token.
    pub token: usize,
    /// Expected first token of the line. Only checked for optional fields, whose
    /// line may hold something else in older report variants.
    pub anchor: Option<&'static str>,
}

impl FieldLocation {
    const fn at(field: ElementField, line: usize, token: usize) -> Self {
        FieldLocation {
            field,
            line,
            token,
            anchor: None,
        }
    }

    const fn anchored(field: ElementField, line: usize, token: usize, anchor: &'static str) -> Self {
        FieldLocation {
            field,
            line,
            token,
            anchor: Some(anchor),
        }
    }
}

/// A versioned description of a solver report layout.
#[derive(Debug, Clone, Copy)]
pub struct SolverOutputSchema {
    pub version: &'static str,
    /// All must be present, otherwise the resample failed.
    pub required: &'static [FieldLocation],
    /// Read when present and anchored as expected.
    pub optional: &'static [FieldLocation],
}

const FIND_ORB_REQUIRED: [FieldLocation; 8] = [
    FieldLocation::at(ElementField::ArgumentOfPerihelion, 5, 5),
    FieldLocation::at(ElementField::SemiMajorAxis, 6, 1),
    FieldLocation::at(ElementField::AscendingNode, 6, 5),
    FieldLocation::at(ElementField::Eccentricity, 7, 1),
    FieldLocation::at(ElementField::Inclination, 7, 5),
    FieldLocation::at(ElementField::Period, 8, 1),
    FieldLocation::at(ElementField::PerihelionDistance, 9, 1),
    FieldLocation::at(ElementField::AphelionDistance, 9, 5),
];

const FIND_ORB_OPTIONAL: [FieldLocation; 2] = [
    FieldLocation::anchored(ElementField::Epoch, 3, 7, "Epoch"),
    FieldLocation::anchored(ElementField::MeanAnomaly, 4, 1, "M"),
];

impl SolverOutputSchema {
    /// `find_orb` `elements.txt`, with `+/-` uncertainty tokens after each value.
    pub const FIND_ORB_V1: SolverOutputSchema = SolverOutputSchema {
        version: "find_orb-elements-v1",
        required: &FIND_ORB_REQUIRED,
        optional: &FIND_ORB_OPTIONAL,
    };
}

impl Default for SolverOutputSchema {
    fn default() -> Self {
        Self::FIND_ORB_V1
    }
}

/// Leading numeric part of a token: `"3.59/1311.62d"` gives `"3.59"`.
fn numeric_prefix(token: &str) -> &str {
    let end = token
        .char_indices()
        .find(|&(i, c)| {
            !(c.is_ascii_digit()
                || c == '.'
                || ((c == '-' || c == '+') && (i == 0 || matches!(token.as_bytes()[i - 1], b'e' | b'E')))
                || ((c == 'e' || c == 'E') && i > 0))
        })
        .map_or(token.len(), |(i, _)| i);
    &token[..end]
}

fn token_at<S: AsRef<str>>(
    lines: &[S],
    location: &FieldLocation,
) -> Result<String, SolverOutputError> {
    let line = lines
        .get(location.line - 1)
        .ok_or(SolverOutputError::MissingLine(location.line))?
        .as_ref();
    line.split_whitespace()
        .nth(location.token)
        .map(str::to_string)
        .ok_or(SolverOutputError::MissingToken {
            line: location.line,
            token: location.token,
        })
}

fn read_value<S: AsRef<str>>(
    lines: &[S],
    location: &FieldLocation,
) -> Result<f64, SolverOutputError> {
    let token = token_at(lines, location)?;
    numeric_prefix(&token)
        .parse::<f64>()
        .map_err(|_| SolverOutputError::InvalidNumber {
            line: location.line,
            token: location.token,
            value: token.clone(),
        })
}

fn anchor_matches<S: AsRef<str>>(lines: &[S], location: &FieldLocation) -> bool {
    match location.anchor {
        None => true,
        Some(anchor) => lines
            .get(location.line - 1)
            .and_then(|line| line.as_ref().split_whitespace().next())
            == Some(anchor),
    }
}

/// Parse a solver report with an explicit layout.
///
/// Arguments
/// -----------------
/// * `lines`: the report, one entry per physical line.
/// * `schema`: positions of each element.
///
/// Return
/// ----------
/// * The element vector. Optional fields that are absent, unanchored or unreadable are `None`.
/// * The first [`SolverOutputError`] met on a required field.
pub fn parse_with_schema<S: AsRef<str>>(
    lines: &[S],
    schema: &SolverOutputSchema,
) -> Result<OrbitalElementVector, SolverOutputError> {
    let mut elements = OrbitalElementVector::default();
    for location in schema.required {
        elements.set(location.field, read_value(lines, location)?);
    }
    for location in schema.optional {
        if !anchor_matches(lines, location) {
            continue;
        }
        match read_value(lines, location) {
            Ok(value) => elements.set(location.field, value),
            Err(err) => tracing::debug!(
                schema = schema.version,
                field = location.field.label(),
                "optional element not read: {err}"
            ),
        }
    }
    Ok(elements)
}

/// Parse a `find_orb` report with [`SolverOutputSchema::FIND_ORB_V1`].
pub fn parse_solver_output<S: AsRef<str>>(
    lines: &[S],
) -> Result<OrbitalElementVector, SolverOutputError> {
    parse_with_schema(lines, &SolverOutputSchema::FIND_ORB_V1)
}

/// Read and parse the report written by the solver.
///
/// A missing file is reported as [`SolverOutputError::MissingOutput`], a file that is
/// not UTF-8 text (crashed or half-written run) as [`SolverOutputError::Unreadable`].
/// Both mean the solver did not produce a result, which the jackknife handles like any
/// other non-converged fit. Other I/O errors are passed on.
pub fn read_solver_output(
    path: &Utf8Path,
    schema: &SolverOutputSchema,
) -> Result<OrbitalElementVector, OrbJackError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(SolverOutputError::MissingOutput(path.to_string()).into())
        }
        Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
            return Err(SolverOutputError::Unreadable {
                path: path.to_string(),
                reason: err.to_string(),
            }
            .into())
        }
        Err(err) => return Err(err.into()),
    };
    let lines: Vec<&str> = content.lines().collect();
    Ok(parse_with_schema(&lines, schema)?)
}
