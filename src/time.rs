use std::{fmt, str::FromStr, sync::LazyLock};

use hifitime::{Duration, Epoch};
use regex::Regex;

use crate::{constants::SECONDS_PER_DAY, conversion::round_half_even, orbjack_errors::OrbJackError};

/// Largest year the 4-digit date field can hold.
const MAX_YEAR: i32 = 9999;

/// `YYYY-MM-DD HH:MM[:SS[.fff]]`, as exported from the observing spreadsheet (`T` also accepted).
static ISO_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})[ T](\d{1,2}):(\d{2})(?::(\d{2}(?:\.\d*)?))?$")
        .expect("static regex")
});

/// `YYYY-Mon-DD HH:MM[:SS[.fff]]`, the JPL Horizons `Date__(UT)__HR:MN` column.
static HORIZONS_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-([A-Za-z]{3})-(\d{1,2}) (\d{1,2}):(\d{2})(?::(\d{2}(?:\.\d*)?))?$")
        .expect("static regex")
});

/// Observation epoch in the astrometry format: year, month and fractional day (UTC).
#[derive(Debug, Clone, Copy, PartialEq)]
///
/// Every constructor validates the date, so its rendering always fits the 16-character
/// `YYYY MM DD.DDDDD` field.
pub struct ObsDate {
    year: i32,
    month: u8,
    /// Day of month with the time of day as fraction, rounded to 5 decimals.
    day: f64,
}

impl ObsDate {
    /// Build an [`ObsDate`] from a year, a month and a fractional day.
    ///
    /// The day is rounded half-to-even at 5 decimals.
    ///
    /// Return
    /// ----------
    /// * The date, or [`OrbJackError::Format`] if the year does not fit 4 digits or the
    ///   date does not exist.
    pub fn new(year: i32, month: u8, day: f64) -> Result<Self, OrbJackError> {
        let date = ObsDate {
            year,
            month,
            day: round_half_even(day, 5),
        };
        date.to_epoch()?;
        Ok(date)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    /// Day of month, the time of day as fraction.
    pub fn day(&self) -> f64 {
        self.day
    }

    /// Build an [`ObsDate`] from calendar fields and a time of day.
    ///
    /// The time of day becomes a day fraction rounded half-to-even at 5 decimals.
    /// A fraction that rounds up to `1.00000` rolls over to the next calendar day.
    ///
    /// Arguments
    /// -----------------
    /// * `year`, `month`, `day`: calendar date (UTC).
    /// * `hour`, `minute`, `second`: time of day; `second` may carry a fraction.
    ///
    /// Return
    /// ----------
    /// * The date, or [`OrbJackError::Format`] if the calendar date or time does not exist.
    pub fn from_calendar(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: f64,
    ) -> Result<Self, OrbJackError> {
        if !(0..=MAX_YEAR).contains(&year) {
            return Err(OrbJackError::Format(format!("year {year} does not fit 4 digits")));
        }
        if hour > 23 || minute > 59 || !(0.0..61.0).contains(&second) {
            return Err(OrbJackError::Format(format!(
                "invalid time of day {hour:02}:{minute:02}:{second}"
            )));
        }
        let midnight = Epoch::maybe_from_gregorian_utc(year, month, day, 0, 0, 0, 0)
            .map_err(|e| OrbJackError::Format(format!("invalid date {year}-{month}-{day}: {e}")))?;

        let seconds_of_day = hour as f64 * 3600.0 + minute as f64 * 60.0 + second;
        let fraction = round_half_even(seconds_of_day / SECONDS_PER_DAY, 5);

        if fraction >= 1.0 {
            let (y, m, d, ..) = (midnight + Duration::from_days(1.0)).to_gregorian_utc();
            return Ok(ObsDate {
                year: y,
                month: m,
                day: round_half_even(d as f64 + (fraction - 1.0), 5),
            });
        }

        Ok(ObsDate {
            year,
            month,
            day: round_half_even(day as f64 + fraction, 5),
        })
    }

    /// Parse a spreadsheet timestamp such as `"2023-01-12 20:15:30.5"`.
    pub fn from_iso_timestamp(text: &str) -> Result<Self, OrbJackError> {
        let caps = ISO_TIMESTAMP
            .captures(text.trim())
            .ok_or_else(|| OrbJackError::Format(format!("unrecognised timestamp '{text}'")))?;
        let month: u8 = parse_capture(&caps, 2, text)?;
        Self::from_captures(&caps, month, text)
    }

    /// Parse a JPL Horizons timestamp such as `"2023-Jan-12 08:17"`.
    pub fn from_horizons_timestamp(text: &str) -> Result<Self, OrbJackError> {
        let caps = HORIZONS_TIMESTAMP
            .captures(text.trim())
            .ok_or_else(|| OrbJackError::Format(format!("unrecognised timestamp '{text}'")))?;
        let month = month_to_number(&caps[2])?;
        Self::from_captures(&caps, month, text)
    }

    fn from_captures(caps: &regex::Captures, month: u8, text: &str) -> Result<Self, OrbJackError> {
        let year: i32 = parse_capture(caps, 1, text)?;
        let day: u8 = parse_capture(caps, 3, text)?;
        let hour: u8 = parse_capture(caps, 4, text)?;
        let minute: u8 = parse_capture(caps, 5, text)?;
        let second: f64 = match caps.get(6) {
            Some(_) => parse_capture(caps, 6, text)?,
            None => 0.0,
        };
        Self::from_calendar(year, month, day, hour, minute, second)
    }

    /// Parse the fixed `"YYYY MM DD.DDDDD"` field of an astrometry record.
    pub fn from_record_field(field: &str) -> Result<Self, OrbJackError> {
        let parts: Vec<&str> = field.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(OrbJackError::Format(format!(
                "expected 'YYYY MM DD.DDDDD', got '{field}'"
            )));
        }
        let year = i32::from_str(parts[0])
            .map_err(|_| OrbJackError::Format(format!("invalid year in '{field}'")))?;
        let month = u8::from_str(parts[1])
            .map_err(|_| OrbJackError::Format(format!("invalid month in '{field}'")))?;
        let day = f64::from_str(parts[2])
            .map_err(|_| OrbJackError::Format(format!("invalid day in '{field}'")))?;

        Self::new(year, month, day)
    }

    /// The epoch as a hifitime [`Epoch`] (UTC).
    pub fn to_epoch(&self) -> Result<Epoch, OrbJackError> {
        if !(0..=MAX_YEAR).contains(&self.year) {
            return Err(OrbJackError::Format(format!(
                "year {} does not fit 4 digits",
                self.year
            )));
        }
        if !(1.0..32.0).contains(&self.day) {
            return Err(OrbJackError::Format(format!("invalid day {}", self.day)));
        }
        let midnight =
            Epoch::maybe_from_gregorian_utc(self.year, self.month, self.day.trunc() as u8, 0, 0, 0, 0)
                .map_err(|e| OrbJackError::Format(format!("invalid date {self}: {e}")))?;
        Ok(midnight + Duration::from_days(self.day.fract()))
    }

    /// Modified Julian Date (UTC) of the epoch.
    pub fn to_mjd_utc(&self) -> Result<f64, OrbJackError> {
        Ok(self.to_epoch()?.to_mjd_utc_days())
    }
}

impl fmt::Display for ObsDate {
    /// Fixed 16-character rendering `YYYY MM DD.DDDDD`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04} {:02} {:08.5}", self.year, self.month, self.day)
    }
}

fn parse_capture<T: FromStr>(caps: &regex::Captures, idx: usize, text: &str) -> Result<T, OrbJackError> {
    caps.get(idx)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| OrbJackError::Format(format!("invalid timestamp component in '{text}'")))
}

/// Convert a three-letter month abbreviation (any case) to its number.
pub fn month_to_number(month: &str) -> Result<u8, OrbJackError> {
    let number = match month.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => {
            return Err(OrbJackError::Format(format!(
                "unknown month abbreviation '{month}'"
            )))
        }
    };
    Ok(number)
}
