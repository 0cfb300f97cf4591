use std::process::ExitCode;

fn main() -> ExitCode {
    pysh::run_cli()
}
