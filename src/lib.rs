pub mod astrometry;
pub mod constants;
pub mod conversion;
pub mod elements;
pub mod jackknife;
pub mod orbjack_errors;
mod progress;
pub mod solver;
pub mod sources;
pub mod time;

pub use astrometry::{Designation, Observation, ObservationSet, ObservatoryCode};
pub use elements::{ElementErrors, ElementField, OrbitalElementVector};
pub use jackknife::{BestFitSource, Jackknife, JackknifeParams, ResamplingResult};
pub use orbjack_errors::OrbJackError;
pub use solver::{FindOrb, OrbitSolver};
pub use time::ObsDate;
