//! Convert an observing spreadsheet (CSV export) and estimate the orbit errors.
//!
//! ```text
//! ORBJACK_SOLVER=/opt/find_orb/fo ORBJACK_SOLVER_DIR=/opt/find_orb RUST_LOG=orbjack=info \
//!     cargo run --example jackknife_from_csv -- "2023 AB1 Data.csv" "2023 AB1" [obs_code]
//! ```
use camino::Utf8PathBuf;
use tracing_subscriber::EnvFilter;

use orbjack::{
    elements::persistence::write_elements_file,
    sources::spreadsheet::spreadsheet_to_observation_file,
    Designation, FindOrb, Jackknife, JackknifeParams, ObservatoryCode, OrbJackError,
};

fn main() -> Result<(), OrbJackError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(csv_path), Some(name)) = (args.next(), args.next()) else {
        eprintln!("usage: jackknife_from_csv <spreadsheet.csv> <designation> [obs_code]");
        std::process::exit(2);
    };
    let default_code = match args.next() {
        Some(code) => ObservatoryCode::parse(&code)?,
        None => ObservatoryCode::try_from(995)?,
    };

    let designation = Designation::new(&name)?;
    let stem = name.replace(' ', "");
    let observation_file = Utf8PathBuf::from(format!("{stem}_data.txt"));
    let observations = spreadsheet_to_observation_file(
        &Utf8PathBuf::from(csv_path),
        &designation,
        &default_code,
        &observation_file,
    )?;

    let solver = FindOrb::from_env()?;
    let params = JackknifeParams::builder().build()?;
    match Jackknife::new(&solver, params).run(&observations)? {
        Some(result) => {
            println!("{result:#}");
            let elements_file = Utf8PathBuf::from(format!("{stem}_elements.txt"));
            write_elements_file(&result.best_fit, &elements_file)?;
            println!("best fit written to {elements_file}");
        }
        None => println!("not enough observations for a jackknife"),
    }
    Ok(())
}
