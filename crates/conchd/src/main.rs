//! `conchd` binary entry point.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match conchd::run_server() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(io::stderr(), "conchd: {error}");
            ExitCode::FAILURE
        }
    }
}
