//! FHIR date/time CLI executable
//!
//! See the cli module documentation for detailed usage information.

use atrius_fhir_datetime::cli::{Args, run_cli};
use clap::Parser;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    run_cli(args)?;
    Ok(())
}
