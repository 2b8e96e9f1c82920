use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shift_board::application::config::{BoardConfig, LoggingConfig};
use shift_board::application::controller::LoadState;
use shift_board::App;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match BoardConfig::load_default().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("shift-board: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.logging);

    let mut app = App::start(&config).await;
    app.wait_for_load().await;

    {
        let board = app.board();
        let board = board.lock().await;
        match board.state() {
            LoadState::Ready => info!(count = board.shifts().len(), "shift board ready"),
            LoadState::Failed(message) => error!(%message, "shift board failed to load"),
            LoadState::Loading => {}
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }

    app.shutdown().await;
    ExitCode::SUCCESS
}

fn init_logging(config: &LoggingConfig) {
    // RUST_LOG があればそちらを優先
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
