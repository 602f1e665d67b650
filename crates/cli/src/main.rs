use std::process::ExitCode;

fn main() -> ExitCode {
    ideaflow_cli::run()
}
