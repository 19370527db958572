//! # JPL Horizons source
//!
//! Fetch reference data from the [JPL Horizons API](https://ssd.jpl.nasa.gov/api/horizons.api):
//!
//! * an **observer ephemeris** (`EPHEM_TYPE=OBSERVER`, `QUANTITIES=1`, angles in degrees),
//!   turned into [`TabularRows`] with the columns `datetime_str`, `RA` and `DEC`, then into
//!   observations ([`ephemeris_to_observations`]). Synthetic observations are used to check
//!   the solver chain against a known orbit.
//! * heliocentric **osculating elements** (`EPHEM_TYPE=ELEMENTS`) to compare with the
//!   fitted orbit ([`get_jpl_elements`]).
//!
//! Both responses are plain text with the table between the `$$SOE` and `$$EOE` markers,
//! in CSV form (`CSV_FORMAT=YES`). The header line sits just above `$$SOE`, framed by
//! lines of `*`.
use std::sync::LazyLock;

use camino::Utf8Path;
use itertools::Itertools;
use regex::Regex;

use crate::{
    astrometry::{record_writer::write_observation_set, Designation, Observation, ObservationSet, ObservatoryCode},
    constants::DAYS_PER_YEAR,
    elements::OrbitalElementVector,
    orbjack_errors::OrbJackError,
    sources::{collect_observations, Row, TabularRows},
    time::ObsDate,
};

pub const HORIZONS_API_URL: &str = "https://ssd.jpl.nasa.gov/api/horizons.api";

/// Header line and data block of a Horizons CSV table.
static TABLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*+\r?\n([^\n]*)\r?\n\*+\r?\n\$\$SOE\r?\n(?s:(.*?))\$\$EOE")
        .expect("static regex")
});

/// Observer ephemeris query.
#[derive(Debug, Clone, PartialEq)]
pub struct EphemerisRequest {
    /// Horizons target, e.g. `"2023 AB1"` or `"DES=2023 AB1;"`.
    pub target: String,
    pub observatory: ObservatoryCode,
    /// `YYYY-MM-DD[ HH:MM]`
    pub start: String,
    pub stop: String,
    /// Horizons step size, e.g. `"1d"` or `"3h"`.
    pub step: String,
}

impl EphemerisRequest {
    pub fn new(
        target: impl Into<String>,
        observatory: ObservatoryCode,
        start: impl Into<String>,
        stop: impl Into<String>,
        step: impl Into<String>,
    ) -> Self {
        EphemerisRequest {
            target: target.into(),
            observatory,
            start: start.into(),
            stop: stop.into(),
            step: step.into(),
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("format", "text".into()),
            ("COMMAND", quoted(&self.target)),
            ("OBJ_DATA", "'NO'".into()),
            ("MAKE_EPHEM", "'YES'".into()),
            ("EPHEM_TYPE", "'OBSERVER'".into()),
            ("CENTER", quoted(&format!("{}@399", self.observatory))),
            ("START_TIME", quoted(&self.start)),
            ("STOP_TIME", quoted(&self.stop)),
            ("STEP_SIZE", quoted(&self.step)),
            ("QUANTITIES", "'1'".into()),
            ("ANG_FORMAT", "'DEG'".into()),
            ("CSV_FORMAT", "'YES'".into()),
        ]
    }
}

fn quoted(value: &str) -> String {
    format!("'{value}'")
}

async fn fetch(query: &[(&'static str, String)]) -> Result<String, OrbJackError> {
    let response = reqwest::Client::new()
        .get(HORIZONS_API_URL)
        .query(query)
        .send()
        .await?
        .error_for_status()?;
    Ok(response.text().await?)
}

fn fetch_blocking(query: &[(&'static str, String)]) -> Result<String, OrbJackError> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(fetch(query))
}

fn response_excerpt(response: &str) -> String {
    response.lines().take(12).join("\n")
}

/// Split a Horizons text response into its CSV header line and data block.
fn extract_table(response: &str) -> Result<(&str, &str), OrbJackError> {
    let caps = TABLE_REGEX.captures(response).ok_or_else(|| {
        OrbJackError::HorizonsResponse(format!(
            "no $$SOE/$$EOE table found:\n{}",
            response_excerpt(response)
        ))
    })?;
    match (caps.get(1), caps.get(2)) {
        (Some(header), Some(data)) => Ok((header.as_str(), data.as_str())),
        _ => Err(OrbJackError::HorizonsResponse(
            "incomplete $$SOE/$$EOE table".into(),
        )),
    }
}

/// Observer-table column names, normalised to `datetime_str`, `RA` and `DEC`.
fn normalise_observer_header(header: &str) -> String {
    header
        .split(',')
        .map(|name| {
            let name = name.trim();
            if name.starts_with("Date") {
                "datetime_str"
            } else if name.starts_with("R.A.") {
                "RA"
            } else if name.starts_with("DEC") {
                "DEC"
            } else {
                name
            }
        })
        .join(",")
}

/// Turn an observer ephemeris response into rows.
pub fn parse_ephemeris_response(response: &str) -> Result<TabularRows, OrbJackError> {
    let (header, data) = extract_table(response)?;
    let table = format!("{}\n{}", normalise_observer_header(header), data);
    TabularRows::from_reader(table.as_bytes())
}

/// Request an observer ephemeris.
///
/// Arguments
/// -----------------
/// * `request`: target, observatory and time span.
///
/// Return
/// ----------
/// * One row per epoch, with the columns `datetime_str`, `RA` and `DEC` (degrees).
/// * [`OrbJackError::ReqwestError`] on transport failure, [`OrbJackError::HorizonsResponse`]
///   when the response holds no table (unknown target, bad time span, ...).
pub fn get_jpl_ephemeris(request: &EphemerisRequest) -> Result<TabularRows, OrbJackError> {
    let response = fetch_blocking(&request.query())?;
    let rows = parse_ephemeris_response(&response)?;
    tracing::info!(object = %request.target, rows = rows.len(), "Horizons ephemeris received");
    Ok(rows)
}

/// Convert one ephemeris row; `Ok(None)` when its timestamp cannot be read.
pub fn observation_from_ephemeris_row(
    row: Row<'_>,
    designation: &Designation,
    observatory: &ObservatoryCode,
) -> Result<Option<Observation>, OrbJackError> {
    let Some(date) = row
        .get("datetime_str")
        .and_then(|text| ObsDate::from_horizons_timestamp(text).ok())
    else {
        return Ok(None);
    };
    let degrees = |column: &str| -> Result<f64, OrbJackError> {
        let text = row.require(column)?;
        text.parse()
            .map_err(|_| OrbJackError::Format(format!("invalid {column} value '{text}'")))
    };
    let observation = Observation::from_degrees(
        designation.clone(),
        date,
        degrees("RA")?,
        degrees("DEC")?,
        observatory.clone(),
    )?;
    Ok(Some(observation))
}

/// Observations from the first `rows_to_read` ephemeris rows (`0` reads them all).
pub fn ephemeris_to_observations(
    rows: &TabularRows,
    designation: &Designation,
    observatory: &ObservatoryCode,
    rows_to_read: usize,
) -> Result<ObservationSet, OrbJackError> {
    let mut rows = rows.clone();
    rows.truncate(rows_to_read);
    collect_observations(&rows, |row| {
        observation_from_ephemeris_row(row, designation, observatory)
    })
}

/// Write an ephemeris as an observation file.
pub fn write_ephemeris_observations(
    rows: &TabularRows,
    designation: &Designation,
    observatory: &ObservatoryCode,
    rows_to_read: usize,
    destination: &Utf8Path,
) -> Result<ObservationSet, OrbJackError> {
    let observations = ephemeris_to_observations(rows, designation, observatory, rows_to_read)?;
    write_observation_set(&observations, destination)?;
    Ok(observations)
}

/// One row of a Horizons `ELEMENTS` table (`OUT_UNITS=AU-D`).
#[derive(Debug, serde::Deserialize, PartialEq)]
struct ElementsRecord {
    #[serde(rename = "JDTDB")]
    jd: f64,
    #[serde(rename = "EC")]
    eccentricity: f64,
    #[serde(rename = "QR")]
    perihelion_distance: f64,
    #[serde(rename = "IN")]
    inclination: f64,
    #[serde(rename = "OM")]
    ascending_node: f64,
    #[serde(rename = "W")]
    argument_of_perihelion: f64,
    #[serde(rename = "MA")]
    mean_anomaly: f64,
    #[serde(rename = "A")]
    semi_major_axis: f64,
    #[serde(rename = "AD")]
    aphelion_distance: f64,
    #[serde(rename = "PR")]
    period_days: f64,
}

impl From<ElementsRecord> for OrbitalElementVector {
    fn from(record: ElementsRecord) -> Self {
        OrbitalElementVector {
            argument_of_perihelion: record.argument_of_perihelion,
            semi_major_axis: record.semi_major_axis,
            ascending_node: record.ascending_node,
            eccentricity: record.eccentricity,
            inclination: record.inclination,
            period: record.period_days / DAYS_PER_YEAR,
            perihelion_distance: record.perihelion_distance,
            aphelion_distance: record.aphelion_distance,
            epoch: Some(record.jd),
            mean_anomaly: Some(record.mean_anomaly),
        }
    }
}

/// First element set of an `ELEMENTS` response.
pub fn parse_elements_response(response: &str) -> Result<OrbitalElementVector, OrbJackError> {
    let (header, data) = extract_table(response)?;
    let table = format!("{header}\n{data}");
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(table.as_bytes());
    let record: ElementsRecord = reader
        .deserialize()
        .next()
        .ok_or_else(|| OrbJackError::HorizonsResponse("empty elements table".into()))??;
    Ok(record.into())
}

/// Osculating elements of `target` at `epoch_jd` (TDB), relative to `center`.
///
/// Arguments
/// -----------------
/// * `target`: Horizons target.
/// * `center`: reference body, `"500@10"` for the Sun.
/// * `epoch_jd`: Julian date of osculation.
///
/// Return
/// ----------
/// * Elements with the period converted from days to years.
pub fn get_jpl_elements(
    target: &str,
    center: &str,
    epoch_jd: f64,
) -> Result<OrbitalElementVector, OrbJackError> {
    let query = vec![
        ("format", "text".to_string()),
        ("COMMAND", quoted(target)),
        ("OBJ_DATA", "'NO'".into()),
        ("MAKE_EPHEM", "'YES'".into()),
        ("EPHEM_TYPE", "'ELEMENTS'".into()),
        ("CENTER", quoted(center)),
        ("TLIST", quoted(&epoch_jd.to_string())),
        ("TLIST_TYPE", "'JD'".into()),
        ("OUT_UNITS", "'AU-D'".into()),
        ("REF_PLANE", "'ECLIPTIC'".into()),
        ("CSV_FORMAT", "'YES'".into()),
    ];
    parse_elements_response(&fetch_blocking(&query)?)
}

#[cfg(test)]
mod horizons_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    const OBSERVER_RESPONSE: &str = "\
API VERSION: 1.2
API SOURCE: NASA/JPL Horizons API

*******************************************************************************
Target body name: 2023 AB1                        {source: JPL#12}
*******************************************************************************
 Date__(UT)__HR:MN, , , R.A._____(ICRF), DEC______(ICRF),
*******************************************************************************
$$SOE
 2023-Jan-12 00:00, , , 343.09737500, -0.50000000,
 2023-Jan-12 08:17, , , 343.20000000,  0.25000000,
 2023-Feb-30 00:00, , , 343.30000000,  0.30000000,
 2023-Jan-13 00:00, , , 343.40000000,  0.35000000,
$$EOE
*******************************************************************************
";

    const ELEMENTS_RESPONSE: &str = "\
*******************************************************************************
            JDTDB,            Calendar Date (TDB),                     EC,                     QR,                     IN,                     OM,                      W,                     Tp,                      N,                     MA,                     TA,                      A,                     AD,                     PR,
*******************************************************************************
$$SOE
2460000.500000000, A.D. 2023-Feb-25 00:00:00.0000,  1.234567000000000E-01,  2.056123450000000E+00,  5.678901230000000E+00,  1.234567890000000E+01,  1.234567890100000E+02,  2460006.623450000,  2.748000000000000E-01,  1.234567890100000E+02,  1.300000000000000E+02,  2.345678900000000E+00,  2.635234350000000E+00,  1.311620000000000E+03,
$$EOE
";

    #[test]
    fn test_parse_ephemeris_response() {
        let rows = parse_ephemeris_response(OBSERVER_RESPONSE).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.has_column("datetime_str"));
        let first = rows.rows().next().unwrap();
        assert_eq!(first.get("datetime_str"), Some("2023-Jan-12 00:00"));
        assert_eq!(first.get("RA"), Some("343.09737500"));
        assert_eq!(first.get("DEC"), Some("-0.50000000"));
    }

    #[test]
    fn test_ephemeris_to_observations() {
        let rows = parse_ephemeris_response(OBSERVER_RESPONSE).unwrap();
        let designation = Designation::new("2023 AB1").unwrap();
        let code = ObservatoryCode::try_from(995).unwrap();

        // the impossible date is skipped
        let all = ephemeris_to_observations(&rows, &designation, &code, 0).unwrap();
        assert_eq!(all.len(), 3);
        // 08:17 is 0.34514 of a day, minutes weighted by 60 s
        assert_abs_diff_eq!(all[1].date().day(), 12.34514, epsilon = 1e-9);
        assert_abs_diff_eq!(all[0].ra_degrees(), 343.097375, epsilon = 1e-6);

        let two = ephemeris_to_observations(&rows, &designation, &code, 2).unwrap();
        assert_eq!(two.len(), 2);
    }

    #[test]
    fn test_parse_elements_response() {
        let elements = parse_elements_response(ELEMENTS_RESPONSE).unwrap();
        assert_eq!(elements.eccentricity, 0.1234567);
        assert_eq!(elements.semi_major_axis, 2.3456789);
        assert_eq!(elements.aphelion_distance, 2.63523435);
        assert_eq!(elements.epoch, Some(2460000.5));
        assert_abs_diff_eq!(elements.period, 1311.62 / 365.25, epsilon = 1e-12);
    }

    #[test]
    fn test_response_without_table() {
        let err = parse_ephemeris_response("No ephemeris for target \"2099 ZZ\"").unwrap_err();
        assert!(matches!(err, OrbJackError::HorizonsResponse(_)));
    }

    #[test]
    #[ignore = "requires network access to JPL Horizons"]
    fn test_get_jpl_ephemeris_online() {
        let request = EphemerisRequest::new(
            "Ceres;",
            ObservatoryCode::try_from(500).unwrap(),
            "2023-01-01",
            "2023-01-05",
            "1d",
        );
        let rows = get_jpl_ephemeris(&request).unwrap();
        assert_eq!(rows.len(), 5);
    }
}
