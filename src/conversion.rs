//! # Sexagesimal codec
//!
//! Conversions between decimal angles and their fixed-width sexagesimal renderings:
//!
//! * declination: `"±DD MM SS.SS"` (degrees, arcminutes, arcseconds),
//! * right ascension: `"HH MM SS.SS"` (hours, minutes, seconds of time).
//!
//! Seconds are rounded **half-to-even** at two decimals. A rounding that reaches
//! `60.00` carries into the minutes, and 60 minutes carry into the leading field.
//! Right ascension is normalised into `[0°, 360°)` first, so `360.0°` renders as
//! `"00 00 00.00"` and a carry up to 24 h wraps back to `00`.
//!
//! Parsing works on fixed offsets (`WW?MM?SS.SS...` with `?` a space or a colon),
//! an optional leading sign shifting every offset by one.
use crate::{
    constants::{Degree, Hour, DEG_PER_HOUR},
    orbjack_errors::OrbJackError,
};

/// Shortest accepted unsigned sexagesimal text: `"DD MM SS"`.
const MIN_SEXAGESIMAL_WIDTH: usize = 8;

/// Round `value` to `decimals` places, ties going to the even neighbour.
pub(crate) fn round_half_even(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// A base-60 angle split into its leading field, minutes and seconds.
///
/// The leading field is degrees for a declination and hours for a right ascension;
/// the struct itself is unit agnostic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sexagesimal {
    pub negative: bool,
    pub whole: u32,
    pub minutes: u32,
    pub seconds: f64,
}

impl Sexagesimal {
    /// Split a decimal value, rounding the seconds to 2 decimals with carry.
    ///
    /// `value` must be finite: NaN and infinities have no base-60 form and saturate the
    /// integer fields. Use [`Sexagesimal::try_from_decimal`] for unchecked input.
    pub fn from_decimal(value: f64) -> Self {
        let negative = value < 0.0;
        let abs = value.abs();

        let whole = abs.trunc();
        let frac_minutes = (abs - whole) * 60.0;
        let minutes = frac_minutes.trunc();

        Sexagesimal {
            negative,
            whole: whole as u32,
            minutes: minutes as u32,
            seconds: (frac_minutes - minutes) * 60.0,
        }
        .rounded()
    }

    /// Checked [`Sexagesimal::from_decimal`].
    ///
    /// Return
    /// ----------
    /// * [`OrbJackError::Format`] for a NaN or infinite value, or one whose leading field
    ///   does not fit two digits.
    pub fn try_from_decimal(value: f64) -> Result<Self, OrbJackError> {
        if !value.is_finite() || value.abs() >= 100.0 {
            return Err(OrbJackError::Format(format!(
                "{value} has no two-digit sexagesimal form"
            )));
        }
        let split = Self::from_decimal(value);
        if split.whole > 99 {
            return Err(OrbJackError::Format(format!(
                "{value} has no two-digit sexagesimal form"
            )));
        }
        Ok(split)
    }

    /// Round the seconds to 2 decimals and propagate a carry into minutes and the leading field.
    pub fn rounded(&self) -> Self {
        let mut seconds = round_half_even(self.seconds, 2);
        let mut minutes = self.minutes;
        let mut whole = self.whole;

        if seconds >= 60.0 {
            seconds -= 60.0;
            minutes += 1;
        }
        if minutes >= 60 {
            minutes -= 60;
            whole += 1;
        }

        Sexagesimal {
            negative: self.negative,
            whole,
            minutes,
            seconds,
        }
    }

    pub fn to_decimal(&self) -> f64 {
        let sign = if self.negative { -1.0 } else { 1.0 };
        sign * (self.whole as f64 + self.minutes as f64 / 60.0 + self.seconds / 3600.0)
    }

    /// `"WW MM SS.SS"`, the sign is not rendered.
    pub fn fmt_unsigned(&self) -> String {
        format!("{:02} {:02} {:05.2}", self.whole, self.minutes, self.seconds)
    }

    /// `"±WW MM SS.SS"` with an explicit sign.
    pub fn fmt_signed(&self) -> String {
        let sign = if self.negative { '-' } else { '+' };
        format!("{sign}{}", self.fmt_unsigned())
    }

    /// Parse a fixed-offset sexagesimal text.
    ///
    /// Arguments
    /// -----------------
    /// * `text`: the angle, e.g. `"-00 30 14.2"` or `"22:52:23.37"`; surrounding blanks are ignored.
    /// * `allow_negative`: whether a leading `'-'` is accepted (declinations) or rejected (right ascensions).
    ///
    /// Return
    /// ----------
    /// * The parsed [`Sexagesimal`], or [`OrbJackError::Format`] if the text is shorter than
    ///   the minimum width, has unexpected separators, or holds out-of-range minutes/seconds.
    pub fn parse(text: &str, allow_negative: bool) -> Result<Self, OrbJackError> {
        let trimmed = text.trim();
        let (negative, body) = match trimmed.as_bytes().first() {
            Some(b'-') if allow_negative => (true, &trimmed[1..]),
            Some(b'-') => {
                return Err(OrbJackError::Format(format!(
                    "unexpected negative sign in '{text}'"
                )))
            }
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        if body.len() < MIN_SEXAGESIMAL_WIDTH || !body.is_ascii() {
            return Err(OrbJackError::Format(format!(
                "sexagesimal text too short: '{text}'"
            )));
        }

        let bytes = body.as_bytes();
        if !is_separator(bytes[2]) || !is_separator(bytes[5]) {
            return Err(OrbJackError::Format(format!(
                "unexpected separators in '{text}'"
            )));
        }

        let whole = parse_digits(&body[0..2], text)?;
        let minutes = parse_digits(&body[3..5], text)?;
        let seconds_field = &body[6..];
        if !seconds_field
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.')
        {
            return Err(OrbJackError::Format(format!("invalid seconds in '{text}'")));
        }
        let seconds: f64 = seconds_field
            .parse()
            .map_err(|_| OrbJackError::Format(format!("invalid seconds in '{text}'")))?;

        if minutes >= 60 || seconds >= 60.0 {
            return Err(OrbJackError::Format(format!(
                "minutes or seconds out of range in '{text}'"
            )));
        }

        Ok(Sexagesimal {
            negative,
            whole,
            minutes,
            seconds,
        })
    }
}

fn is_separator(b: u8) -> bool {
    b == b' ' || b == b':'
}

fn parse_digits(field: &str, text: &str) -> Result<u32, OrbJackError> {
    if !field.chars().all(|c| c.is_ascii_digit()) {
        return Err(OrbJackError::Format(format!(
            "invalid field '{field}' in '{text}'"
        )));
    }
    field
        .parse()
        .map_err(|_| OrbJackError::Format(format!("invalid field '{field}' in '{text}'")))
}

/// Render a declination in degrees as `"±DD MM SS.SS"`.
///
/// The sign is `'+'` for values `>= 0` and `'-'` otherwise. The 12-character width holds
/// for finite values in `(-100°, 100°)`; [`crate::astrometry::Observation`] only accepts
/// declinations in `[-90°, 90°]`.
pub fn degrees_to_dms(value: Degree) -> String {
    Sexagesimal::from_decimal(value).fmt_signed()
}

/// Parse a `"±DD MM SS.SS"` declination (sign optional) into degrees.
pub fn dms_to_degrees(text: &str) -> Result<Degree, OrbJackError> {
    Ok(Sexagesimal::parse(text, true)?.to_decimal())
}

/// Split a right ascension in degrees into hours/minutes/seconds, wrapping into `[0h, 24h)`.
///
/// `value` must be finite, see [`Sexagesimal::from_decimal`].
pub fn ra_degrees_to_sexagesimal(value: Degree) -> Sexagesimal {
    let hours: Hour = value.rem_euclid(360.0) / DEG_PER_HOUR;
    wrap_hours(Sexagesimal::from_decimal(hours))
}

/// Bring a rounded hour angle back into `[0h, 24h)`.
pub(crate) fn wrap_hours(mut hms: Sexagesimal) -> Sexagesimal {
    if hms.whole >= 24 {
        hms.whole %= 24;
    }
    hms
}

/// Render a right ascension in degrees as `"HH MM SS.SS"`.
///
/// Any finite value renders in 11 characters; NaN and infinities are not angles.
pub fn degrees_to_hms(value: Degree) -> String {
    ra_degrees_to_sexagesimal(value).fmt_unsigned()
}

/// Parse a `"HH MM SS.SS"` right ascension into degrees.
pub fn hms_to_degrees(text: &str) -> Result<Degree, OrbJackError> {
    let hms = Sexagesimal::parse(text, false)?;
    if hms.whole >= 24 {
        return Err(OrbJackError::Format(format!(
            "right ascension hours out of range in '{text}'"
        )));
    }
    Ok(hms.to_decimal() * DEG_PER_HOUR)
}
