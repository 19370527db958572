//! # Constants and type definitions for orbjack
//!
//! This module centralizes the **unit aliases**, the **fixed-column layout** of the
//! astrometry record format, and the **default policies** used throughout the crate.
//!
//! ## Overview
//!
//! - Unit aliases for angles and uncertainties
//! - The two literal header lines written at the top of every observation file
//! - Column offsets of each field inside a rendered observation record
//! - Defaults for the observatory code and the resampling floor

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;

/// Angle in hours of right ascension (1 h = 15°)
pub type Hour = f64;

/// Angle in arcseconds
pub type ArcSec = f64;

// -------------------------------------------------------------------------------------------------
// Unit conversions
// -------------------------------------------------------------------------------------------------

/// Degrees of arc per hour of right ascension
pub const DEG_PER_HOUR: f64 = 15.0;

/// Arcseconds in one degree
pub const ARCSEC_PER_DEG: f64 = 3600.0;

/// Number of seconds in a day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Days in a Julian year, used to express orbital periods in years
pub const DAYS_PER_YEAR: f64 = 365.25;

// -------------------------------------------------------------------------------------------------
// Fixed-column astrometry format
// -------------------------------------------------------------------------------------------------

/// Column ruler, first header line of an observation file (80 characters).
pub const HEADER_RULER: &str =
    "123456789|123456789|123456789|123456789|123456789|123456789|123456789|123456789|";

/// Field legend, second header line of an observation file.
pub const HEADER_LEGEND: &str =
    "<-ObjDesig->*nnYYYY MM DD.DDDDD HH MM SS.SSSsdd mm ss.ss<blanks >MM.MMBz<ref>COD";

/// Number of header lines preceding the observation records.
pub const HEADER_LINES: usize = 2;

/// Width of the designation field.
pub const DESIGNATION_WIDTH: usize = 12;

/// Width of the observatory code field.
pub const OBS_CODE_WIDTH: usize = 3;

/// Width of each optional astrometric error field.
pub const ERROR_FIELD_WIDTH: usize = 5;

/// Literal blank run between the declination and the observatory code.
pub const BLANK_RUN: &str = "                     ";

/// Column ranges of a rendered observation record (0-based, end exclusive).
pub mod columns {
    use std::ops::Range;

    pub const DESIGNATION: Range<usize> = 0..12;
    pub const DATE: Range<usize> = 15..31;
    pub const RA: Range<usize> = 32..43;
    pub const DEC: Range<usize> = 44..56;
    pub const OBS_CODE: Range<usize> = 77..80;
    pub const RA_ERROR: Range<usize> = 81..86;
    pub const DEC_ERROR: Range<usize> = 87..92;

    /// Length of a record without error fields.
    pub const SHORT_RECORD_LEN: usize = 80;

    /// Length of a record carrying the error fields.
    pub const LONG_RECORD_LEN: usize = 92;
}

// -------------------------------------------------------------------------------------------------
// Defaults
// -------------------------------------------------------------------------------------------------

/// Observatory code used when the data source does not provide one (Durham).
pub const DEFAULT_OBS_CODE: u16 = 995;

/// Minimum number of converged resamples needed to report an error estimate.
pub const DEFAULT_MIN_SUCCESSFUL_RESAMPLES: usize = 3;

/// File name written by the orbit solver in its working directory.
pub const DEFAULT_SOLVER_OUTPUT: &str = "elements.txt";

/// Seconds to wait for the orbit solver before killing it.
pub const DEFAULT_SOLVER_TIMEOUT_SECS: u64 = 300;
