//! Plain-text hand-off of an element vector.
//!
//! One element per line, `". <label>: <value>"`, labels from [`ElementField::label`].
//! Values are written with Rust's shortest round-trip float formatting, so a read
//! back gives the exact same `f64`.
use std::{fmt::Write as _, io::Write as _};

use camino::Utf8Path;

use crate::{
    elements::{ElementField, OrbitalElementVector},
    orbjack_errors::OrbJackError,
};

/// Render the key-value text of `elements` (absent optional fields are omitted).
pub fn elements_to_text(elements: &OrbitalElementVector) -> String {
    let mut text = String::new();
    for field in ElementField::ALL {
        if let Some(value) = elements.get(field) {
            // writing into a String cannot fail
            let _ = writeln!(text, ". {}: {value}", field.label());
        }
    }
    text
}

/// Parse text produced by [`elements_to_text`].
///
/// Lines not starting with `". "` and unknown labels are ignored. A missing core
/// element is a [`OrbJackError::MissingField`].
pub fn elements_from_text(text: &str) -> Result<OrbitalElementVector, OrbJackError> {
    let mut elements = OrbitalElementVector::default();
    let mut seen = Vec::with_capacity(ElementField::ALL.len());

    for line in text.lines() {
        let Some(entry) = line.strip_prefix(". ") else {
            continue;
        };
        let Some((label, value)) = entry.split_once(':') else {
            continue;
        };
        let Some(field) = ElementField::ALL
            .into_iter()
            .find(|f| f.label() == label.trim())
        else {
            continue;
        };
        let value = value.trim().parse::<f64>().map_err(|_| {
            OrbJackError::Format(format!("invalid value for '{}': {}", field.label(), value.trim()))
        })?;
        elements.set(field, value);
        seen.push(field);
    }

    if let Some(missing) = ElementField::CORE.iter().find(|f| !seen.contains(f)) {
        return Err(OrbJackError::MissingField(missing.label().to_string()));
    }
    Ok(elements)
}

/// Write the element file at `destination`.
pub fn write_elements_file(
    elements: &OrbitalElementVector,
    destination: &Utf8Path,
) -> Result<(), OrbJackError> {
    let mut file = std::fs::File::create(destination)?;
    file.write_all(elements_to_text(elements).as_bytes())?;
    Ok(())
}

/// Read an element file written by [`write_elements_file`].
pub fn read_elements_file(path: &Utf8Path) -> Result<OrbitalElementVector, OrbJackError> {
    elements_from_text(&std::fs::read_to_string(path)?)
}
