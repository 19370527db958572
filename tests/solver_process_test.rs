#![cfg(unix)]

use std::{os::unix::fs::PermissionsExt, time::Duration};

use camino::{Utf8Path, Utf8PathBuf};

use orbjack::{
    astrometry::record_writer::write_observation_set,
    elements::solver_output::{read_solver_output, SolverOutputSchema},
    FindOrb, Jackknife, JackknifeParams, OrbJackError, OrbitSolver,
};

mod common;
use common::{observations, report, utf8_tempdir};

/// Write an executable shell script standing in for `find_orb`.
fn script(dir: &Utf8Path, name: &str, body: &str) -> Utf8PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Shell body of a fake solver: the semi-major axis it reports is the line count of its input.
fn counting_body() -> String {
    let template = report(0.0).replace("0.00000000", "$n");
    format!("n=$(wc -l < \"$1\" | tr -d ' ')\ncat > elements.txt <<EOF\n{template}EOF")
}

fn counting_solver(dir: &Utf8Path) -> Utf8PathBuf {
    script(dir, "fake_fo.sh", &counting_body())
}

#[test]
fn test_solver_runs_in_its_working_directory() {
    let (_bin_guard, bin) = utf8_tempdir();
    let (_work_guard, work) = utf8_tempdir();
    let (_data_guard, data) = utf8_tempdir();

    let obs_file = data.join("obs.txt");
    write_observation_set(&observations(4), &obs_file).unwrap();

    let solver = FindOrb::new(counting_solver(&bin)).with_working_dir(&work);
    let output = solver.invoke(&obs_file).unwrap();
    assert_eq!(output, work.join("elements.txt"));

    let elements = read_solver_output(&output, &SolverOutputSchema::default()).unwrap();
    assert_eq!(elements.semi_major_axis, 6.0);
    assert_eq!(elements.epoch, Some(2460000.5));
}

#[test]
fn test_exit_code_is_not_an_error() {
    let (_guard, dir) = utf8_tempdir();
    let solver = FindOrb::new(script(&dir, "failing.sh", "exit 3")).with_working_dir(&dir);
    let output = solver.invoke(&dir.join("obs.txt")).unwrap();

    // no report: the reader flags the non-converged fit
    let err = read_solver_output(&output, &SolverOutputSchema::default()).unwrap_err();
    assert!(err.is_recoverable_per_resample());
}

#[test]
fn test_hanging_solver_times_out() {
    let (_guard, dir) = utf8_tempdir();
    let solver = FindOrb::new(script(&dir, "hang.sh", "exec sleep 30"))
        .with_working_dir(&dir)
        .with_timeout(Duration::from_secs(1));

    let started = std::time::Instant::now();
    let err = solver.invoke(&dir.join("obs.txt")).unwrap_err();
    assert_eq!(err, OrbJackError::SolverTimeout { seconds: 1.0 });
    assert!(started.elapsed() < Duration::from_secs(20));
}

#[test]
fn test_sub_second_timeout_is_reported() {
    let (_guard, dir) = utf8_tempdir();
    let solver = FindOrb::new(script(&dir, "hang.sh", "exec sleep 30"))
        .with_working_dir(&dir)
        .with_timeout(Duration::from_millis(500));

    let err = solver.invoke(&dir.join("obs.txt")).unwrap_err();
    assert_eq!(err, OrbJackError::SolverTimeout { seconds: 0.5 });
    assert_eq!(err.to_string(), "External solver did not terminate within 0.5 s");
}

#[test]
fn test_jackknife_skips_a_hanging_resample() {
    let (_bin_guard, bin) = utf8_tempdir();
    let (_work_guard, work) = utf8_tempdir();
    // hangs on the resample without the observation of January 13
    let body = format!(
        "if ! grep -q '2023 01 13\\.' \"$1\"; then exec sleep 30; fi\n{}",
        counting_body()
    );
    let solver = FindOrb::new(script(&bin, "picky_fo.sh", &body))
        .with_working_dir(&work)
        .with_timeout(Duration::from_secs(1));

    let result = Jackknife::new(&solver, JackknifeParams::default())
        .run(&observations(5))
        .unwrap()
        .unwrap();

    assert_eq!(result.failed, vec![1]);
    assert_eq!(result.successful_resamples(), 4);
    assert!(result.resamples.iter().all(|(removed, _)| *removed != 1));
    assert_eq!(result.best_fit.semi_major_axis, 7.0);
    assert!(result.errors.is_zero());
}

#[test]
fn test_jackknife_with_a_missing_solver() {
    let (_guard, dir) = utf8_tempdir();
    let solver = FindOrb::new(dir.join("no_such_fo")).with_working_dir(&dir);

    // every launch fails, each one is skipped rather than aborting the run
    let err = Jackknife::new(&solver, JackknifeParams::default())
        .run(&observations(4))
        .unwrap_err();
    assert_eq!(
        err,
        OrbJackError::InsufficientResamples {
            required: 3,
            obtained: 0
        }
    );
}

#[test]
fn test_jackknife_with_external_solver() {
    let (_bin_guard, bin) = utf8_tempdir();
    let (_work_guard, work) = utf8_tempdir();
    let solver = FindOrb::new(counting_solver(&bin)).with_working_dir(&work);

    let result = Jackknife::new(&solver, JackknifeParams::default())
        .run(&observations(5))
        .unwrap()
        .unwrap();

    // 4 records + 2 header lines per resample, 7 lines for the full set
    assert_eq!(result.successful_resamples(), 5);
    assert_eq!(result.best_fit.semi_major_axis, 7.0);
    assert!(result.errors.is_zero());
}
