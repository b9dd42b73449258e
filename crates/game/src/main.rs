use std::process::ExitCode;

mod app;

fn main() -> ExitCode {
    match app::bootstrap::build_app() {
        Ok(wiring) => app::bootstrap::run(wiring),
        Err(code) => code,
    }
}
