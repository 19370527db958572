//! Observing spreadsheet (exported as CSV) to observation file.
//!
//! Expected columns, renamable through [`SpreadsheetColumns`]:
//!
//! | Column         | Content                                          |
//! |----------------|--------------------------------------------------|
//! | `Date + Time`  | `YYYY-MM-DD HH:MM:SS[.fff]` (UTC)                |
//! | `RA`           | `HH MM SS.SS` (`:` separators accepted)          |
//! | `Dec`          | `±DD MM SS.SS`, sign optional                    |
//! | `RA err (as)`  | optional, arcseconds                             |
//! | `Dec err (as)` | optional, arcseconds                             |
//! | `Observatory`  | optional, falls back to the caller's default     |
use camino::Utf8Path;

use crate::{
    astrometry::{record_writer::write_observation_set, Designation, Observation, ObservationSet, ObservatoryCode},
    orbjack_errors::OrbJackError,
    sources::{collect_observations, Row, TabularRows},
    time::ObsDate,
};

/// Column names of the observing spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadsheetColumns {
    pub timestamp: String,
    pub ra: String,
    pub dec: String,
    pub ra_error: String,
    pub dec_error: String,
    pub observatory: String,
}

impl Default for SpreadsheetColumns {
    fn default() -> Self {
        SpreadsheetColumns {
            timestamp: "Date + Time".into(),
            ra: "RA".into(),
            dec: "Dec".into(),
            ra_error: "RA err (as)".into(),
            dec_error: "Dec err (as)".into(),
            observatory: "Observatory".into(),
        }
    }
}

fn optional_arcsec(row: &Row<'_>, column: &str) -> Result<Option<f64>, OrbJackError> {
    row.get(column)
        .map(|text| {
            text.parse::<f64>().map_err(|_| {
                OrbJackError::Format(format!("invalid value '{text}' in column '{column}'"))
            })
        })
        .transpose()
}

/// Convert one spreadsheet row.
///
/// Arguments
/// -----------------
/// * `row`: the spreadsheet row.
/// * `designation`: object designation, the same for every row.
/// * `columns`: column names.
/// * `default_code`: observatory used when the row has none.
///
/// Return
/// ----------
/// * `Ok(None)` when the timestamp cell is empty or unparsable: the row is skipped.
/// * [`OrbJackError::MissingField`] when RA or Dec is missing.
/// * [`OrbJackError::Format`] for malformed coordinates, errors or observatory code.
pub fn observation_from_row(
    row: Row<'_>,
    designation: &Designation,
    columns: &SpreadsheetColumns,
    default_code: &ObservatoryCode,
) -> Result<Option<Observation>, OrbJackError> {
    let Some(timestamp) = row.get(&columns.timestamp) else {
        return Ok(None);
    };
    let date = match ObsDate::from_iso_timestamp(timestamp) {
        Ok(date) => date,
        Err(err) => {
            tracing::debug!(timestamp, "unparsable timestamp: {err}");
            return Ok(None);
        }
    };

    let ra = row.require(&columns.ra)?;
    let dec = row.require(&columns.dec)?;

    let observatory = match row.get(&columns.observatory) {
        Some(code) => ObservatoryCode::parse(code)?,
        None => default_code.clone(),
    };

    let observation = Observation::from_sexagesimal(designation.clone(), date, ra, dec, observatory)?
        .with_errors(
            optional_arcsec(&row, &columns.ra_error)?,
            optional_arcsec(&row, &columns.dec_error)?,
        )?;
    Ok(Some(observation))
}

/// Convert every usable row of a spreadsheet table.
pub fn observations_from_rows(
    rows: &TabularRows,
    designation: &Designation,
    columns: &SpreadsheetColumns,
    default_code: &ObservatoryCode,
) -> Result<ObservationSet, OrbJackError> {
    collect_observations(rows, |row| {
        observation_from_row(row, designation, columns, default_code)
    })
}

/// Read a spreadsheet CSV export and write the observation file for the solver.
///
/// Return
/// ----------
/// * The observations written, in spreadsheet order.
pub fn spreadsheet_to_observation_file(
    csv_path: &Utf8Path,
    designation: &Designation,
    default_code: &ObservatoryCode,
    destination: &Utf8Path,
) -> Result<ObservationSet, OrbJackError> {
    let rows = TabularRows::from_csv_path(csv_path)?;
    let observations = observations_from_rows(
        &rows,
        designation,
        &SpreadsheetColumns::default(),
        default_code,
    )?;
    tracing::info!(
        source = %csv_path,
        rows = rows.len(),
        observations = observations.len(),
        "spreadsheet converted"
    );
    write_observation_set(&observations, destination)?;
    Ok(observations)
}

#[cfg(test)]
mod spreadsheet_test {
    use super::*;
    use crate::astrometry::record_writer::render_observation;

    const SHEET: &str = "\
Date + Time,RA,Dec,RA err (as),Dec err (as),Observatory
2023-01-12 12:00:00,22 52 23.37,-00 30 00.00,0.5,0.4,G96
nan,22 52 23.37,-00 30 00.00,0.5,0.4,G96
2023-01-13 06:00:00,22 53 00.12,00 29 10.5,,,
2023-01-14 18:00,22:54:01.5,+01:02:03.456,1.25,0.8,
";

    fn convert(sheet: &str) -> Result<ObservationSet, OrbJackError> {
        let rows = TabularRows::from_reader(sheet.as_bytes()).unwrap();
        observations_from_rows(
            &rows,
            &Designation::new("2023 AB1").unwrap(),
            &SpreadsheetColumns::default(),
            &ObservatoryCode::try_from(995).unwrap(),
        )
    }

    #[test]
    fn test_rows_without_timestamp_are_skipped() {
        let observations = convert(SHEET).unwrap();
        assert_eq!(observations.len(), 3);
        assert_eq!(observations[0].date().day(), 12.5);
        assert_eq!(observations[1].date().day(), 13.25);
    }

    #[test]
    fn test_rendered_rows() {
        let observations = convert(SHEET).unwrap();
        assert_eq!(
            render_observation(&observations[0]),
            "2023 AB1       2023 01 12.50000 22 52 23.37 -00 30 00.00                     G96 0.500 0.400"
        );
        // implicit '+' sign, default observatory, no errors
        assert_eq!(
            render_observation(&observations[1]),
            "2023 AB1       2023 01 13.25000 22 53 00.12 +00 29 10.50                     995"
        );
        assert_eq!(
            render_observation(&observations[2]),
            "2023 AB1       2023 01 14.75000 22 54 01.50 +01 02 03.46                     995 1.250 0.800"
        );
    }

    #[test]
    fn test_missing_coordinates() {
        let sheet = "Date + Time,RA,Dec\n2023-01-12 12:00:00,,+01 00 00.00\n";
        assert_eq!(
            convert(sheet),
            Err(OrbJackError::MissingField("RA".into()))
        );
    }

    #[test]
    fn test_invalid_error_value() {
        let sheet = "Date + Time,RA,Dec,RA err (as)\n2023-01-12 12:00:00,01 00 00.00,+01 00 00.00,abc\n";
        assert!(matches!(convert(sheet), Err(OrbJackError::Format(_))));
    }

    #[test]
    fn test_spreadsheet_to_observation_file() {
        let dir = tempfile::tempdir().unwrap();
        let dir = camino::Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let csv_path = dir.join("2023 AB1 Data.csv");
        std::fs::write(&csv_path, SHEET).unwrap();

        let destination = dir.join("2023AB1_data.txt");
        let written = spreadsheet_to_observation_file(
            &csv_path,
            &Designation::new("2023 AB1").unwrap(),
            &ObservatoryCode::try_from(995).unwrap(),
            &destination,
        )
        .unwrap();
        let content = std::fs::read_to_string(&destination).unwrap();
        assert_eq!(content.lines().count(), written.len() + 2);
    }
}
