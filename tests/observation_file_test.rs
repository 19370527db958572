use approx::assert_abs_diff_eq;
use camino::Utf8Path;

use orbjack::{
    astrometry::{
        record_reader::read_observation_file,
        record_writer::{render_observation, write_observation_set},
    },
    constants::{columns, HEADER_LEGEND, HEADER_RULER},
    jackknife::{Jackknife, JackknifeParams},
    sources::spreadsheet::spreadsheet_to_observation_file,
    Designation, ObservatoryCode,
};

mod common;
use common::{observations, utf8_tempdir, StubFit, StubSolver};

#[test]
fn test_five_observations_give_seven_lines() {
    let (_guard, dir) = utf8_tempdir();
    let path = dir.join("2023AB1_data.txt");
    let obs = observations(5);
    assert_eq!(obs[0].designation().as_field(), "2023 AB1    ");

    write_observation_set(&obs, &path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0], HEADER_RULER);
    assert_eq!(lines[1], HEADER_LEGEND);
    for line in &lines[2..] {
        assert_eq!(line.len(), columns::LONG_RECORD_LEN);
    }
}

#[test]
fn test_leave_one_out_file_has_six_lines() {
    let (_guard, dir) = utf8_tempdir();
    let solver = StubSolver::new(StubFit::Constant(2.5));
    let params = JackknifeParams::builder()
        .scratch_dir(&dir)
        .keep_scratch_files(true)
        .build()
        .unwrap();

    Jackknife::new(&solver, params)
        .run(&observations(5))
        .unwrap()
        .unwrap();

    // five resamples then the full set
    assert_eq!(*solver.line_counts.borrow(), vec![6, 6, 6, 6, 6, 7]);

    let without_2 = read_observation_file(&dir.join("resample_0002.obs")).unwrap();
    let all = observations(5);
    assert_eq!(without_2.len(), 4);
    assert_eq!(without_2[1], all[1]);
    assert_eq!(without_2[2], all[3]);
}

#[test]
fn test_written_file_reads_back() {
    let (_guard, dir) = utf8_tempdir();
    let path = dir.join("round_trip.txt");
    let obs = observations(4);
    write_observation_set(&obs, &path).unwrap();

    let back = read_observation_file(&path).unwrap();
    assert_eq!(back.len(), obs.len());
    for (read, written) in back.iter().zip(&obs) {
        assert_eq!(render_observation(read), render_observation(written));
        assert_abs_diff_eq!(read.ra_degrees(), written.ra_degrees(), epsilon = 1e-12);
        assert_abs_diff_eq!(read.dec_degrees(), written.dec_degrees(), epsilon = 1e-12);
    }
}

#[test]
fn test_spreadsheet_data_file() {
    let (_guard, dir) = utf8_tempdir();
    let destination = dir.join("2023AB1_data.txt");
    let written = spreadsheet_to_observation_file(
        Utf8Path::new("tests/data/2023 AB1 Data.csv"),
        &Designation::new("2023 AB1").unwrap(),
        &ObservatoryCode::try_from(995).unwrap(),
        &destination,
    )
    .unwrap();
    assert_eq!(written.len(), 5);

    let content = std::fs::read_to_string(&destination).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(
        lines[2],
        "2023 AB1       2023 01 12.84410 22 52 23.37 -00 30 00.00                     995 0.512 0.431"
    );
    assert_eq!(
        lines[5],
        "2023 AB1       2023 01 14.85431 22 54 58.04 -00 12 30.90                     G96 0.610 0.550"
    );
    assert_eq!(
        lines[6],
        "2023 AB1       2023 01 16.83247 22 57 31.66 +00 04 12.10                     995 1.200 0.950"
    );
}
