//! # Astrometric observations
//!
//! The data model of one astrometric measurement of a minor planet, as written to
//! the fixed-column observation file handed to the orbit solver.
//!
//! Every field of an [`Observation`] is validated at construction so that rendering
//! never fails and always lands on the documented column offsets:
//!
//! * [`Designation`] – exactly 12 characters once padded,
//! * [`ObsDate`] – `YYYY MM DD.DDDDD`,
//! * right ascension – sexagesimal hours in `[0h, 24h)`,
//! * declination – signed sexagesimal degrees in `[-90°, +90°]`,
//! * optional RA/Dec errors – non-negative arcseconds that fit in 5 characters,
//! * [`ObservatoryCode`] – 3 characters.
//!
//! Modules
//! -----------------
//! * [`record_writer`] – renders observations and whole observation files.
//! * [`record_reader`] – reads a rendered observation file back.
use std::fmt;

use crate::{
    constants::{ArcSec, Degree, DESIGNATION_WIDTH, ERROR_FIELD_WIDTH, OBS_CODE_WIDTH},
    conversion::{ra_degrees_to_sexagesimal, round_half_even, wrap_hours, Sexagesimal},
    orbjack_errors::OrbJackError,
    time::ObsDate,
};

pub mod record_reader;
pub mod record_writer;

/// Ordered, temporally sorted observations of one object.
pub type ObservationSet = Vec<Observation>;

/// Minor planet designation, space-padded to 12 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Designation(String);

impl Designation {
    /// Pad `name` on the right to 12 characters.
    ///
    /// Names longer than 12 characters or holding non-printable / non-ASCII characters are
    /// rejected with [`OrbJackError::Format`].
    pub fn new(name: &str) -> Result<Self, OrbJackError> {
        if !name.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
            return Err(OrbJackError::Format(format!(
                "designation '{name}' must be printable ASCII"
            )));
        }
        if name.len() > DESIGNATION_WIDTH {
            return Err(OrbJackError::Format(format!(
                "designation '{name}' is longer than {DESIGNATION_WIDTH} characters"
            )));
        }
        Ok(Designation(format!("{name:<DESIGNATION_WIDTH$}")))
    }

    /// The padded 12-character field.
    pub fn as_field(&self) -> &str {
        &self.0
    }

    /// The designation without its padding.
    pub fn name(&self) -> &str {
        self.0.trim_end()
    }
}

impl fmt::Display for Designation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Three-character observatory (site) code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObservatoryCode(String);

impl ObservatoryCode {
    /// Parse a code as found in a data source.
    ///
    /// Numeric codes are zero-padded (`"7"` → `"007"`); spreadsheet exports that turn
    /// the code into a float (`"995.0"`) are accepted. Alphanumeric codes must be exactly
    /// 3 characters (`"G96"`, `"C51"`).
    pub fn parse(text: &str) -> Result<Self, OrbJackError> {
        let trimmed = text.trim();
        if let Ok(number) = trimmed.parse::<f64>() {
            if number.fract() == 0.0 && (0.0..1000.0).contains(&number) {
                return Ok(ObservatoryCode(format!("{:03}", number as u16)));
            }
        }
        if trimmed.len() == OBS_CODE_WIDTH && trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Ok(ObservatoryCode(trimmed.to_string()));
        }
        Err(OrbJackError::Format(format!(
            "invalid observatory code '{text}'"
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<u16> for ObservatoryCode {
    type Error = OrbJackError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        if code >= 1000 {
            return Err(OrbJackError::Format(format!(
                "observatory code {code} does not fit in {OBS_CODE_WIDTH} digits"
            )));
        }
        Ok(ObservatoryCode(format!("{code:03}")))
    }
}

impl fmt::Display for ObservatoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render an astrometric error (arcseconds) into exactly 5 characters.
///
/// The value is rounded to 3 decimals, then printed with as many decimals as fit
/// (`0.500`, `12.35`, `123.5`); integers are zero-padded on the left (`01234`).
///
/// Return
/// ----------
/// * `None` for negative, non-finite, or too large (≥ 99999.5) values.
pub fn format_error_field(value: ArcSec) -> Option<String> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let rounded = round_half_even(value, 3);
    for decimals in [3, 2, 1] {
        let text = format!("{rounded:.decimals$}");
        if text.len() == ERROR_FIELD_WIDTH {
            return Some(text);
        }
    }
    let text = format!("{rounded:.0}");
    (text.len() <= ERROR_FIELD_WIDTH).then(|| format!("{text:0>ERROR_FIELD_WIDTH$}"))
}

/// One astrometric position of a minor planet.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    designation: Designation,
    date: ObsDate,
    ra: Sexagesimal,
    dec: Sexagesimal,
    ra_error: Option<ArcSec>,
    dec_error: Option<ArcSec>,
    observatory: ObservatoryCode,
}

impl Observation {
    /// Build an observation from decimal right ascension and declination.
    ///
    /// Arguments
    /// -----------------
    /// * `designation`: object designation.
    /// * `date`: observation epoch.
    /// * `ra`: right ascension in degrees, wrapped into `[0°, 360°)`.
    /// * `dec`: declination in degrees, must lie in `[-90°, 90°]`.
    /// * `observatory`: site code.
    ///
    /// Return
    /// ----------
    /// * The observation, or [`OrbJackError::Format`] for a non-finite angle or a declination out of range.
    pub fn from_degrees(
        designation: Designation,
        date: ObsDate,
        ra: Degree,
        dec: Degree,
        observatory: ObservatoryCode,
    ) -> Result<Self, OrbJackError> {
        if !ra.is_finite() || !dec.is_finite() || dec.abs() > 90.0 {
            return Err(OrbJackError::Format(format!(
                "invalid coordinates ra={ra}, dec={dec}"
            )));
        }
        Ok(Observation {
            designation,
            date,
            ra: ra_degrees_to_sexagesimal(ra),
            dec: Sexagesimal::try_from_decimal(dec)?,
            ra_error: None,
            dec_error: None,
            observatory,
        })
    }

    /// Build an observation from sexagesimal texts (`"HH MM SS.SS"`, `"±DD MM SS.SS"`).
    ///
    /// A declination without a leading sign is taken as positive. Seconds given with
    /// more than two decimals are rounded (with carry) so that the fields stay fixed-width.
    pub fn from_sexagesimal(
        designation: Designation,
        date: ObsDate,
        ra: &str,
        dec: &str,
        observatory: ObservatoryCode,
    ) -> Result<Self, OrbJackError> {
        let ra_hms = Sexagesimal::parse(ra, false)?;
        if ra_hms.whole >= 24 {
            return Err(OrbJackError::Format(format!(
                "right ascension hours out of range in '{ra}'"
            )));
        }
        let dec_dms = Sexagesimal::parse(dec, true)?;
        if dec_dms.to_decimal().abs() > 90.0 {
            return Err(OrbJackError::Format(format!(
                "declination out of range in '{dec}'"
            )));
        }

        Ok(Observation {
            designation,
            date,
            ra: wrap_hours(ra_hms.rounded()),
            dec: dec_dms.rounded(),
            ra_error: None,
            dec_error: None,
            observatory,
        })
    }

    /// Attach the astrometric errors (arcseconds).
    ///
    /// Return
    /// ----------
    /// * [`OrbJackError::Format`] if an error cannot be rendered in 5 characters.
    pub fn with_errors(
        mut self,
        ra_error: Option<ArcSec>,
        dec_error: Option<ArcSec>,
    ) -> Result<Self, OrbJackError> {
        for value in [ra_error, dec_error].into_iter().flatten() {
            if format_error_field(value).is_none() {
                return Err(OrbJackError::Format(format!(
                    "astrometric error {value} cannot be written in {ERROR_FIELD_WIDTH} characters"
                )));
            }
        }
        self.ra_error = ra_error;
        self.dec_error = dec_error;
        Ok(self)
    }

    pub fn designation(&self) -> &Designation {
        &self.designation
    }

    pub fn date(&self) -> &ObsDate {
        &self.date
    }

    /// Right ascension as rendered (hours, minutes, seconds).
    pub fn ra(&self) -> &Sexagesimal {
        &self.ra
    }

    /// Declination as rendered (signed degrees, arcminutes, arcseconds).
    pub fn dec(&self) -> &Sexagesimal {
        &self.dec
    }

    pub fn ra_degrees(&self) -> Degree {
        self.ra.to_decimal() * crate::constants::DEG_PER_HOUR
    }

    pub fn dec_degrees(&self) -> Degree {
        self.dec.to_decimal()
    }

    pub fn ra_error(&self) -> Option<ArcSec> {
        self.ra_error
    }

    pub fn dec_error(&self) -> Option<ArcSec> {
        self.dec_error
    }

    pub fn observatory(&self) -> &ObservatoryCode {
        &self.observatory
    }
}

#[cfg(test)]
mod astrometry_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn date() -> ObsDate {
        ObsDate::new(2023, 1, 12.5).unwrap()
    }

    #[test]
    fn test_designation_padding() {
        let desig = Designation::new("2023 AB1").unwrap();
        assert_eq!(desig.as_field(), "2023 AB1    ");
        assert_eq!(desig.name(), "2023 AB1");
        assert_eq!(desig.to_string(), "2023 AB1");
        assert!(Designation::new("a designation too long").is_err());
        assert!(Designation::new("bad\tname").is_err());
        assert_eq!(Designation::new("").unwrap().as_field().len(), 12);
    }

    #[test]
    fn test_observatory_code() {
        assert_eq!(ObservatoryCode::parse("995").unwrap().as_str(), "995");
        assert_eq!(ObservatoryCode::parse("995.0").unwrap().as_str(), "995");
        assert_eq!(ObservatoryCode::parse(" 7 ").unwrap().as_str(), "007");
        assert_eq!(ObservatoryCode::parse("G96").unwrap().as_str(), "G96");
        assert!(ObservatoryCode::parse("G9").is_err());
        assert!(ObservatoryCode::parse("1234").is_err());
        assert_eq!(ObservatoryCode::try_from(995).unwrap().as_str(), "995");
        assert!(ObservatoryCode::try_from(1000).is_err());
    }

    #[test]
    fn test_format_error_field() {
        assert_eq!(format_error_field(0.5).as_deref(), Some("0.500"));
        assert_eq!(format_error_field(1.2345).as_deref(), Some("1.234"));
        assert_eq!(format_error_field(12.3).as_deref(), Some("12.30"));
        assert_eq!(format_error_field(123.456).as_deref(), Some("123.5"));
        assert_eq!(format_error_field(99.996).as_deref(), Some("100.0"));
        assert_eq!(format_error_field(1234.0).as_deref(), Some("01234"));
        assert_eq!(format_error_field(-0.1), None);
        assert_eq!(format_error_field(f64::NAN), None);
        assert_eq!(format_error_field(123456.0), None);
    }

    #[test]
    fn test_from_degrees() {
        let obs = Observation::from_degrees(
            Designation::new("2023 AB1").unwrap(),
            date(),
            343.097375,
            -0.5,
            ObservatoryCode::try_from(995).unwrap(),
        )
        .unwrap();
        assert_eq!(obs.ra().fmt_unsigned(), "22 52 23.37");
        assert_eq!(obs.dec().fmt_signed(), "-00 30 00.00");
        assert_abs_diff_eq!(obs.ra_degrees(), 343.097375, epsilon = 1.0 / 3600.0);
        assert_abs_diff_eq!(obs.dec_degrees(), -0.5, epsilon = 1e-12);

        let err = Observation::from_degrees(
            Designation::new("2023 AB1").unwrap(),
            date(),
            10.0,
            95.0,
            ObservatoryCode::try_from(995).unwrap(),
        );
        assert!(matches!(err, Err(OrbJackError::Format(_))));

        for (ra, dec) in [(f64::NAN, 0.0), (10.0, f64::NAN), (f64::INFINITY, 0.0)] {
            let err = Observation::from_degrees(
                Designation::new("2023 AB1").unwrap(),
                date(),
                ra,
                dec,
                ObservatoryCode::try_from(995).unwrap(),
            );
            assert!(matches!(err, Err(OrbJackError::Format(_))));
        }
    }

    #[test]
    fn test_from_sexagesimal_implicit_sign() {
        let obs = Observation::from_sexagesimal(
            Designation::new("2023 AB1").unwrap(),
            date(),
            "05:12:33.4567",
            "12:03:59.999",
            ObservatoryCode::try_from(995).unwrap(),
        )
        .unwrap();
        assert_eq!(obs.ra().fmt_unsigned(), "05 12 33.46");
        // seconds carry into minutes
        assert_eq!(obs.dec().fmt_signed(), "+12 04 00.00");
    }

    #[test]
    fn test_with_errors() {
        let obs = Observation::from_degrees(
            Designation::new("2023 AB1").unwrap(),
            date(),
            10.0,
            10.0,
            ObservatoryCode::try_from(995).unwrap(),
        )
        .unwrap();
        assert!(obs.clone().with_errors(Some(-1.0), None).is_err());
        let obs = obs.with_errors(Some(0.5), None).unwrap();
        assert_eq!(obs.ra_error(), Some(0.5));
        assert_eq!(obs.dec_error(), None);
    }
}
