#![allow(dead_code)]

use std::cell::RefCell;

use approx::assert_relative_eq;
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use orbjack::{
    astrometry::record_reader::read_observation_file, Designation, ObsDate, Observation,
    ObservatoryCode, OrbJackError, OrbitSolver, OrbitalElementVector,
};

/// A `find_orb` style report, with the semi-major axis left as `{a}`.
pub const REPORT_TEMPLATE: &str = "\
Orbital elements: 2023 AB1
   Perihelion 2023 Mar 3.123456 TT = 2:57:46 (JD 2460006.623450)
Epoch 2023 Feb 25.0 TT = JDT 2460000.5                  Earth MOID: 0.0123  Ju: 2.4
M 123.45678901 +/- 0.123        (J2000 ecliptic)            P                 Q
n   0.21234567 +/- 0.00123   Peri.  123.45678901 +/- 0.1      0.12345678   -0.98765432
a   {a} +/- 0.0123    Node    12.34567890 +/- 0.1     0.98765432    0.12345678
e   0.12345670 +/- 0.00123   Incl.    5.67890123 +/- 0.1      0.01234567    0.12345678
P   3.59/1311.62d +/- 0.02   H 17.5  G  0.15   U  7.8
q   2.05612345 +/- 0.01  Q 2.63523435 +/- 0.02
";

pub fn report(semi_major_axis: f64) -> String {
    REPORT_TEMPLATE.replace("{a}", &format!("{semi_major_axis:.8}"))
}

pub fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    (dir, path)
}

/// `n` observations of 2023 AB1, one per night.
pub fn observations(n: usize) -> Vec<Observation> {
    (0..n)
        .map(|i| {
            Observation::from_degrees(
                Designation::new("2023 AB1").unwrap(),
                ObsDate::from_calendar(2023, 1, 12 + i as u8, 20, 15, 30.5).unwrap(),
                343.097375 + 0.3 * i as f64,
                -0.5 + 0.1 * i as f64,
                ObservatoryCode::try_from(995).unwrap(),
            )
            .unwrap()
            .with_errors(Some(0.5), Some(0.4))
            .unwrap()
        })
        .collect()
}

/// How a [`StubSolver`] derives its semi-major axis from the observations it gets.
pub enum StubFit {
    /// Always the same value.
    Constant(f64),
    /// Mean right ascension of the input, in degrees.
    MeanRa,
}

/// In-process solver: reads the observation file, writes a `find_orb` report.
///
/// The number of lines of every observation file it was given is recorded.
pub struct StubSolver {
    fit: StubFit,
    dir: TempDir,
    pub line_counts: RefCell<Vec<usize>>,
}

impl StubSolver {
    pub fn new(fit: StubFit) -> Self {
        StubSolver {
            fit,
            dir: tempfile::tempdir().unwrap(),
            line_counts: RefCell::new(Vec::new()),
        }
    }
}

impl OrbitSolver for StubSolver {
    fn invoke(&self, observation_file: &Utf8Path) -> Result<Utf8PathBuf, OrbJackError> {
        let content = std::fs::read_to_string(observation_file)?;
        self.line_counts.borrow_mut().push(content.lines().count());

        let observations = read_observation_file(observation_file)?;
        let a = match self.fit {
            StubFit::Constant(a) => a,
            StubFit::MeanRa => {
                observations.iter().map(|o| o.ra_degrees()).sum::<f64>() / observations.len() as f64
            }
        };
        let output = Utf8PathBuf::from_path_buf(self.dir.path().join("elements.txt")).unwrap();
        std::fs::write(&output, report(a))?;
        Ok(output)
    }

    fn name(&self) -> &str {
        "stub"
    }
}

pub fn assert_elements_close(
    actual: &OrbitalElementVector,
    expected: &OrbitalElementVector,
    epsilon: f64,
) {
    let (a, e) = (actual.to_array(), expected.to_array());
    for i in 0..a.len() {
        assert_relative_eq!(a[i], e[i], epsilon = epsilon);
    }
    assert_eq!(actual.epoch, expected.epoch);
    assert_eq!(actual.mean_anomaly, expected.mean_anomaly);
}
