use std::process::ExitCode;

mod bootstrap;
mod loop_runner;
mod terminal;

pub(crate) fn run() -> ExitCode {
    match bootstrap::build_app() {
        Ok(app) => loop_runner::run(app),
        Err(err) => {
            tracing::error!(error = %err, "startup_failed");
            eprintln!("haunt: {err}");
            ExitCode::FAILURE
        }
    }
}
