//! # Orbital element vectors
//!
//! The fitted orbit as reported by the solver: eight scalar elements, plus the
//! epoch of osculation and the mean anomaly when the solver output provides them.
//!
//! ## Units
//!
//! - Angles (ω, Ω, i, M): **degrees**
//! - Distances (a, q, Q): **AU**
//! - Period: **years**
//! - Epoch: **Julian Date (TT)**
//!
//! The eight core elements map onto an [`ElementArray`] (`nalgebra::SVector<f64, 8>`)
//! in the order of [`ElementField::CORE`]; the resampling statistics work on that form.
//!
//! Modules
//! -----------------
//! * [`solver_output`] – positional parsing of the solver's textual report.
//! * [`persistence`] – `". Label: value"` hand-off file.
use std::fmt;

use nalgebra::SVector;

pub mod persistence;
pub mod solver_output;

/// Number of core orbital elements.
pub const ELEMENT_COUNT: usize = 8;

/// The eight core elements as a column vector, ordered like [`ElementField::CORE`].
pub type ElementArray = SVector<f64, ELEMENT_COUNT>;

/// Name of one orbital element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementField {
    ArgumentOfPerihelion,
    SemiMajorAxis,
    AscendingNode,
    Eccentricity,
    Inclination,
    Period,
    PerihelionDistance,
    AphelionDistance,
    Epoch,
    MeanAnomaly,
}

impl ElementField {
    /// Core elements, in vector order.
    pub const CORE: [ElementField; ELEMENT_COUNT] = [
        ElementField::ArgumentOfPerihelion,
        ElementField::SemiMajorAxis,
        ElementField::AscendingNode,
        ElementField::Eccentricity,
        ElementField::Inclination,
        ElementField::Period,
        ElementField::PerihelionDistance,
        ElementField::AphelionDistance,
    ];

    /// Every element, core first.
    pub const ALL: [ElementField; ELEMENT_COUNT + 2] = [
        ElementField::ArgumentOfPerihelion,
        ElementField::SemiMajorAxis,
        ElementField::AscendingNode,
        ElementField::Eccentricity,
        ElementField::Inclination,
        ElementField::Period,
        ElementField::PerihelionDistance,
        ElementField::AphelionDistance,
        ElementField::Epoch,
        ElementField::MeanAnomaly,
    ];

    /// Human-readable label, also used as key in the persistence file.
    pub fn label(&self) -> &'static str {
        match self {
            ElementField::ArgumentOfPerihelion => "Argument of perihelion",
            ElementField::SemiMajorAxis => "Semi-major axis",
            ElementField::AscendingNode => "Longitude of ascending node",
            ElementField::Eccentricity => "Eccentricity",
            ElementField::Inclination => "Inclination",
            ElementField::Period => "Orbital period",
            ElementField::PerihelionDistance => "Perihelion distance",
            ElementField::AphelionDistance => "Aphelion distance",
            ElementField::Epoch => "Epoch",
            ElementField::MeanAnomaly => "Mean anomaly",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ElementField::ArgumentOfPerihelion
            | ElementField::AscendingNode
            | ElementField::Inclination
            | ElementField::MeanAnomaly => "deg",
            ElementField::SemiMajorAxis
            | ElementField::PerihelionDistance
            | ElementField::AphelionDistance => "AU",
            ElementField::Period => "yr",
            ElementField::Eccentricity => "",
            ElementField::Epoch => "JD",
        }
    }

    /// Position in [`ElementArray`], `None` for epoch and mean anomaly.
    pub fn core_index(&self) -> Option<usize> {
        Self::CORE.iter().position(|f| f == self)
    }
}

/// A fitted orbit.
///
/// Units
/// -----
/// * `argument_of_perihelion`, `ascending_node`, `inclination`, `mean_anomaly`: degrees.
/// * `semi_major_axis`, `perihelion_distance`, `aphelion_distance`: AU.
/// * `eccentricity`: unitless, in `[0, 1)` for bound orbits.
/// * `period`: years.
/// * `epoch`: Julian Date (TT) of osculation.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalElementVector {
    pub argument_of_perihelion: f64,
    pub semi_major_axis: f64,
    pub ascending_node: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub period: f64,
    pub perihelion_distance: f64,
    pub aphelion_distance: f64,
    pub epoch: Option<f64>,
    pub mean_anomaly: Option<f64>,
}

impl OrbitalElementVector {
    /// Core elements as an [`ElementArray`].
    pub fn to_array(&self) -> ElementArray {
        ElementArray::from([
            self.argument_of_perihelion,
            self.semi_major_axis,
            self.ascending_node,
            self.eccentricity,
            self.inclination,
            self.period,
            self.perihelion_distance,
            self.aphelion_distance,
        ])
    }

    /// Build a vector from its core elements; epoch and mean anomaly are left unset.
    pub fn from_array(values: &ElementArray) -> Self {
        OrbitalElementVector {
            argument_of_perihelion: values[0],
            semi_major_axis: values[1],
            ascending_node: values[2],
            eccentricity: values[3],
            inclination: values[4],
            period: values[5],
            perihelion_distance: values[6],
            aphelion_distance: values[7],
            epoch: None,
            mean_anomaly: None,
        }
    }

    pub fn get(&self, field: ElementField) -> Option<f64> {
        match field {
            ElementField::Epoch => self.epoch,
            ElementField::MeanAnomaly => self.mean_anomaly,
            core => core.core_index().map(|i| self.to_array()[i]),
        }
    }

    pub(crate) fn set(&mut self, field: ElementField, value: f64) {
        match field {
            ElementField::ArgumentOfPerihelion => self.argument_of_perihelion = value,
            ElementField::SemiMajorAxis => self.semi_major_axis = value,
            ElementField::AscendingNode => self.ascending_node = value,
            ElementField::Eccentricity => self.eccentricity = value,
            ElementField::Inclination => self.inclination = value,
            ElementField::Period => self.period = value,
            ElementField::PerihelionDistance => self.perihelion_distance = value,
            ElementField::AphelionDistance => self.aphelion_distance = value,
            ElementField::Epoch => self.epoch = Some(value),
            ElementField::MeanAnomaly => self.mean_anomaly = Some(value),
        }
    }

    /// Component-wise `self - reference` over the core elements.
    pub fn difference(&self, reference: &OrbitalElementVector) -> ElementArray {
        self.to_array() - reference.to_array()
    }
}

impl Default for OrbitalElementVector {
    fn default() -> Self {
        Self::from_array(&ElementArray::zeros())
    }
}

impl fmt::Display for OrbitalElementVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.epoch {
            Some(epoch) => writeln!(f, "Orbital elements @ epoch (JD): {epoch:.6}")?,
            None => writeln!(f, "Orbital elements")?,
        }
        writeln!(f, "-------------------------------------------")?;
        for field in ElementField::ALL {
            if let Some(value) = self.get(field) {
                if field == ElementField::Epoch {
                    continue;
                }
                writeln!(f, "  {:<28} = {value:.8} {}", field.label(), field.unit())?;
            }
        }
        Ok(())
    }
}

/// Per-element standard deviations of a resampling run (same units as the elements).
#[derive(Debug, Clone, PartialEq)]
pub struct ElementErrors(pub ElementArray);

impl ElementErrors {
    pub fn get(&self, field: ElementField) -> Option<f64> {
        field.core_index().map(|i| self.0[i])
    }

    pub fn as_slice(&self) -> &[f64] {
        self.0.as_slice()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }
}

impl fmt::Display for ElementErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (field, sigma) in ElementField::CORE.iter().zip(self.0.iter()) {
            writeln!(f, "  σ {:<26} = {sigma:.8} {}", field.label(), field.unit())?;
        }
        Ok(())
    }
}
