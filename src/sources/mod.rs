//! # Observation sources
//!
//! Data sources yield **rows addressable by column name**: a spreadsheet exported to
//! CSV ([`spreadsheet`]) or an ephemeris table downloaded from JPL Horizons
//! ([`horizons`]). Both go through [`TabularRows`], and each source maps a [`Row`] to an
//! [`Observation`].
//!
//! Conversion is row-tolerant: a row without a usable timestamp is skipped with a
//! warning instead of failing the whole set (see [`collect_observations`]).
use std::io::Read;

use camino::Utf8Path;

use crate::{
    astrometry::{Observation, ObservationSet},
    orbjack_errors::OrbJackError,
};

pub mod horizons;
pub mod spreadsheet;

/// CSV-like table: one header record and the data records.
#[derive(Debug, Clone, Default)]
pub struct TabularRows {
    headers: csv::StringRecord,
    records: Vec<csv::StringRecord>,
}

impl TabularRows {
    /// Read a table from a CSV reader with a header line.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, OrbJackError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let records = csv_reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(TabularRows { headers, records })
    }

    pub fn from_csv_path(path: &Utf8Path) -> Result<Self, OrbJackError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.records.iter().map(move |record| Row {
            headers: &self.headers,
            record,
        })
    }

    /// Keep only the first `count` rows; `0` keeps them all.
    pub fn truncate(&mut self, count: usize) {
        if count > 0 {
            self.records.truncate(count);
        }
    }
}

/// One record of a [`TabularRows`].
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    headers: &'a csv::StringRecord,
    record: &'a csv::StringRecord,
}

impl<'a> Row<'a> {
    /// The cell of `column`, or `None` if the column does not exist or the cell is
    /// empty or `nan` (how spreadsheet exports spell a missing value).
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let index = self.headers.iter().position(|h| h == column)?;
        let value = self.record.get(index)?.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("nan") {
            None
        } else {
            Some(value)
        }
    }

    /// Like [`Row::get`], with [`OrbJackError::MissingField`] when absent.
    pub fn require(&self, column: &str) -> Result<&'a str, OrbJackError> {
        self.get(column)
            .ok_or_else(|| OrbJackError::MissingField(column.to_string()))
    }
}

/// Convert every row, in order, keeping the rows that produced an observation.
///
/// `convert` returns `Ok(None)` for a row to skip (no usable timestamp). Its errors are
/// fatal and returned as is.
pub fn collect_observations<F>(rows: &TabularRows, mut convert: F) -> Result<ObservationSet, OrbJackError>
where
    F: FnMut(Row<'_>) -> Result<Option<Observation>, OrbJackError>,
{
    let mut observations = Vec::with_capacity(rows.len());
    for (index, row) in rows.rows().enumerate() {
        match convert(row)? {
            Some(obs) => observations.push(obs),
            None => tracing::warn!(row = index, "row skipped: no usable timestamp"),
        }
    }
    Ok(observations)
}

#[cfg(test)]
mod sources_test {
    use super::*;

    const TABLE: &str = "\
name,value,other
a, 1 ,x
b,nan,
c,,NaN
";

    #[test]
    fn test_row_access() {
        let rows = TabularRows::from_reader(TABLE.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.has_column("value"));
        assert!(!rows.has_column("missing"));

        let all: Vec<Row> = rows.rows().collect();
        assert_eq!(all[0].get("value"), Some("1"));
        assert_eq!(all[1].get("value"), None);
        assert_eq!(all[2].get("value"), None);
        assert_eq!(all[2].get("other"), None);
        assert_eq!(all[0].get("missing"), None);
        assert_eq!(
            all[1].require("value"),
            Err(OrbJackError::MissingField("value".into()))
        );
    }

    #[test]
    fn test_truncate() {
        let mut rows = TabularRows::from_reader(TABLE.as_bytes()).unwrap();
        rows.truncate(0);
        assert_eq!(rows.len(), 3);
        rows.truncate(2);
        assert_eq!(rows.len(), 2);
        rows.truncate(10);
        assert_eq!(rows.len(), 2);
    }
}
