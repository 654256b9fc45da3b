use std::process::ExitCode;

fn main() -> ExitCode {
    match livewired::run_host() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("livewired: {error}");
            ExitCode::FAILURE
        }
    }
}
