use std::process::ExitCode;

fn main() -> ExitCode {
    docsight_lib::run()
}
