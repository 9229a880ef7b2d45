use std::io;
use std::process::ExitCode;

use haunt_engine::{load_map, MapError, Session, SessionError};
use thiserror::Error;
use tracing::{error, info};

use super::bootstrap::AppWiring;
use super::terminal::{KeyCommands, TerminalSurface};

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("failed to prepare terminal: {0}")]
    Terminal(#[source] io::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = play(app) {
        error!(error = %err, "startup_failed");
        eprintln!("haunt: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn play(app: AppWiring) -> Result<(), RunError> {
    let grid = load_map(&app.map_path)?;
    let surface = TerminalSurface::enter().map_err(RunError::Terminal)?;
    let session = Session::start(grid, surface, &app.config)?;

    let flow = session.run_input(KeyCommands);
    info!(?flow, "input_loop_finished");

    if let Some(mut surface) = session.shutdown() {
        surface.restore();
    }
    Ok(())
}
