//! # Fixed-column observation record writer
//!
//! Renders [`Observation`]s into the column-exact astrometry format read by the orbit
//! solver, and writes whole observation files (two header lines + one record per line).
//!
//! ## Record layout
//! -----------------
//! ```text
//! 0         1         2         3         4         5         6         7         8         9
//! 0123456789012345678901234567890123456789012345678901234567890123456789012345678901234567890
//! 2023 AB1       2023 01 12.50000 22 52 23.37 -00 30 00.00                     995 0.500 0.400
//! ```
//!
//! * `0..12` – designation (space padded)
//! * `12..15` – 3 blanks
//! * `15..31` – date `YYYY MM DD.DDDDD`, then one blank
//! * `32..43` – right ascension `HH MM SS.SS`, then one blank
//! * `44..56` – declination `±DD MM SS.SS`
//! * `56..77` – 21 blanks
//! * `77..80` – observatory code
//! * `81..86`, `87..92` – optional RA / Dec errors (arcsec), each preceded by one blank
//!
//! A record is 80 characters without errors and 92 with them. When only one of the
//! two errors is known, the other is written as 5 blanks so both stay on their columns.
use std::io::{self, BufWriter, Write};

use camino::Utf8Path;

use crate::{
    astrometry::{format_error_field, Observation},
    constants::{BLANK_RUN, ERROR_FIELD_WIDTH, HEADER_LEGEND, HEADER_RULER},
    orbjack_errors::OrbJackError,
};

/// Render one observation as a fixed-column record (no trailing newline).
pub fn render_observation(obs: &Observation) -> String {
    let mut line = format!(
        "{}   {} {} {}{}{}",
        obs.designation().as_field(),
        obs.date(),
        obs.ra().fmt_unsigned(),
        obs.dec().fmt_signed(),
        BLANK_RUN,
        obs.observatory()
    );

    if obs.ra_error().is_some() || obs.dec_error().is_some() {
        for error in [obs.ra_error(), obs.dec_error()] {
            let field = error
                .and_then(format_error_field)
                .unwrap_or_else(|| " ".repeat(ERROR_FIELD_WIDTH));
            line.push(' ');
            line.push_str(&field);
        }
    }
    line
}

/// The two header lines followed by one record per observation.
pub fn observation_file_lines(observations: &[Observation]) -> Vec<String> {
    let mut lines = Vec::with_capacity(observations.len() + 2);
    lines.push(HEADER_RULER.to_string());
    lines.push(HEADER_LEGEND.to_string());
    lines.extend(observations.iter().map(render_observation));
    lines
}

/// Write an observation file to any writer.
pub fn write_observations<W: Write>(observations: &[Observation], writer: W) -> io::Result<()> {
    let mut writer = BufWriter::new(writer);
    for line in observation_file_lines(observations) {
        writeln!(writer, "{line}")?;
    }
    writer.flush()
}

/// Create (or overwrite) the observation file at `destination`.
///
/// Arguments
/// -----------------
/// * `observations`: records to write, in order.
/// * `destination`: path of the file handed to the solver.
///
/// Return
/// ----------
/// * [`OrbJackError::IoError`] if the file cannot be created or written; this is always fatal.
///
/// See also
/// ------------
/// * [`render_observation`] – layout of each record.
/// * [`crate::sources::collect_observations`] – row conversion that skips rows without a usable timestamp.
pub fn write_observation_set(
    observations: &[Observation],
    destination: &Utf8Path,
) -> Result<(), OrbJackError> {
    let file = std::fs::File::create(destination)?;
    write_observations(observations, file)?;
    tracing::debug!(
        path = %destination,
        records = observations.len(),
        "observation file written"
    );
    Ok(())
}
