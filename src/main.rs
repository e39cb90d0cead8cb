//! Pochita - Appointment scheduling for a veterinary clinic

use std::process::ExitCode;

use pochita::cli::Reported;

fn main() -> ExitCode {
    match pochita::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !e.is::<Reported>() {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}
