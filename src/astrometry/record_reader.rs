//! # Fixed-column observation record reader
//!
//! Parse observation files produced by [`record_writer`](crate::astrometry::record_writer)
//! back into [`Observation`] values. This is the *Load* step of the jackknife and the
//! inverse used to check that a written file holds exactly what was rendered.
//!
//! ## Overview
//! -----------------
//! * [`ParseRecordError`] describes line-level failures.
//! * [`parse_record`] converts one record into an [`Observation`].
//! * [`read_observation_file`] reads a whole file, skipping the two header lines and
//!   blank lines, and **preserving the record order**.
//!
//! ## Field Layout
//! -----------------
//! * `0..12` – designation
//! * `15..31` – date `YYYY MM DD.DDDDD`
//! * `32..43` – right ascension `HH MM SS.SS`
//! * `44..56` – declination `±DD MM SS.SS`
//! * `77..80` – observatory code
//! * `81..86`, `87..92` – optional RA / Dec errors
//!
//! ## Error Handling
//! -----------------
//! Failures are wrapped into [`OrbJackError::ParsingRecord`]. A malformed record aborts
//! the read of the whole file: the file is either the caller's own output or corrupted.
use thiserror::Error;

use camino::Utf8Path;

use crate::{
    astrometry::{Designation, Observation, ObservationSet, ObservatoryCode},
    constants::{columns, HEADER_LEGEND, HEADER_RULER},
    orbjack_errors::OrbJackError,
    time::ObsDate,
};

/// Line-level parsing errors for fixed-column observation records.
///
/// Variants
/// -----------------
/// * `TooShortLine` – The line does not reach 80 characters; payload is the line length.
/// * `NotAscii` – The line holds non-ASCII characters, column offsets would be meaningless.
/// * `InvalidDesignation` – Designation field `line[0..12]` rejected.
/// * `InvalidDate` – Date field `line[15..31]` rejected.
/// * `InvalidRA` – Right ascension field `line[32..43]` rejected.
/// * `InvalidDec` – Declination field `line[44..56]` rejected.
/// * `InvalidObsCode` – Observatory code `line[77..80]` rejected.
/// * `InvalidError` – An error field (`line[81..86]` or `line[87..92]`) is not a number.
#[derive(Error, Debug, PartialEq)]
pub enum ParseRecordError {
    #[error("The line is too short ({0} characters)")]
    TooShortLine(usize),
    #[error("The line contains non-ASCII characters")]
    NotAscii,
    #[error("Invalid designation: {0}")]
    InvalidDesignation(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Error parsing RA: {0}")]
    InvalidRA(String),
    #[error("Invalid Dec value: {0}")]
    InvalidDec(String),
    #[error("Invalid observatory code: {0}")]
    InvalidObsCode(String),
    #[error("Invalid astrometric error field: {0}")]
    InvalidError(String),
}

/// Whether `line` is one of the two fixed header lines.
pub fn is_header_line(line: &str) -> bool {
    let line = line.trim_end();
    line == HEADER_RULER || line == HEADER_LEGEND
}

fn optional_error_field(
    line: &str,
    range: std::ops::Range<usize>,
) -> Result<Option<f64>, ParseRecordError> {
    // trailing blanks may have been stripped, clamp the field to the line
    let len = line.len();
    let field = line[range.start.min(len)..range.end.min(len)].trim();
    if field.is_empty() {
        return Ok(None);
    }
    field
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ParseRecordError::InvalidError(field.to_string()))
}

/// Parse a single fixed-column record into an [`Observation`].
///
/// Arguments
/// -----------------
/// * `line` – One record, with or without trailing blanks.
///
/// Return
/// ----------
/// * The parsed [`Observation`] or an [`OrbJackError::ParsingRecord`] on failure.
///
/// See also
/// ------------
/// * [`render_observation`](crate::astrometry::record_writer::render_observation) – The inverse operation.
pub fn parse_record(line: &str) -> Result<Observation, OrbJackError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if !line.is_ascii() {
        return Err(ParseRecordError::NotAscii.into());
    }
    if line.len() < columns::SHORT_RECORD_LEN {
        return Err(ParseRecordError::TooShortLine(line.len()).into());
    }

    let designation = Designation::new(line[columns::DESIGNATION].trim_end()).map_err(|_| {
        ParseRecordError::InvalidDesignation(line[columns::DESIGNATION].to_string())
    })?;

    let date = ObsDate::from_record_field(&line[columns::DATE])
        .map_err(|_| ParseRecordError::InvalidDate(line[columns::DATE].trim().to_string()))?;

    let observatory = ObservatoryCode::parse(&line[columns::OBS_CODE])
        .map_err(|_| ParseRecordError::InvalidObsCode(line[columns::OBS_CODE].to_string()))?;

    let ra_field = &line[columns::RA];
    let dec_field = &line[columns::DEC];
    let observation =
        Observation::from_sexagesimal(designation, date, ra_field, dec_field, observatory).map_err(
            |_| {
                if crate::conversion::hms_to_degrees(ra_field).is_err() {
                    ParseRecordError::InvalidRA(ra_field.trim().to_string())
                } else {
                    ParseRecordError::InvalidDec(dec_field.trim().to_string())
                }
            },
        )?;

    let ra_error = optional_error_field(line, columns::RA_ERROR)?;
    let dec_error = optional_error_field(line, columns::DEC_ERROR)?;

    observation.with_errors(ra_error, dec_error).map_err(|_| {
        ParseRecordError::InvalidError(line[columns::SHORT_RECORD_LEN..].trim().to_string()).into()
    })
}

/// Parse the content of an observation file, keeping the record order.
pub fn parse_observation_lines<'a, I>(lines: I) -> Result<ObservationSet, OrbJackError>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .filter(|line| !line.trim().is_empty() && !is_header_line(line))
        .map(parse_record)
        .collect()
}

/// Read a full observation file.
///
/// Arguments
/// -----------------
/// * `path` – Observation file, as written by
///   [`write_observation_set`](crate::astrometry::record_writer::write_observation_set).
///
/// Return
/// ----------
/// * The observations in file order, or the first read / parse error.
pub fn read_observation_file(path: &Utf8Path) -> Result<ObservationSet, OrbJackError> {
    let content = std::fs::read_to_string(path)?;
    parse_observation_lines(content.lines())
}
