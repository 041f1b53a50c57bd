use std::process::ExitCode;

fn main() -> ExitCode {
    ndaflow_cli::run()
}
