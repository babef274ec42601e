mod platform;

use std::process::ExitCode;

fn main() -> ExitCode {
    match platform::run_app() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("jokes_app: {err}");
            ExitCode::FAILURE
        }
    }
}
