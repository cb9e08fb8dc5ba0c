//! prsplit - break a large branch into dependency-ordered partitions

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = prsplit::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
