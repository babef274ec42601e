use std::io::{self, Write};

use jokes_engine::{
    FetchError, JokesEngine, ProgressEvents, ReqwestJokeFetcher, ScreenStateWatch,
    UnhandledFailure,
};
use jokes_logging::{jokes_info, jokes_warn};
use log::LevelFilter;
use thiserror::Error;

use super::command::Command;
use super::config::AppConfig;
use super::render::{render, render_progress};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Search(#[from] UnhandledFailure),
    #[error("random jokes unavailable: {0}")]
    Random(#[from] FetchError),
    #[error("runtime error: {0}")]
    Io(#[from] io::Error),
    #[error("renderer stopped: {0}")]
    Renderer(#[from] tokio::task::JoinError),
}

pub fn run_app() -> Result<(), AppError> {
    let config = AppConfig::from_env();
    jokes_logging::initialize(config.log_destination, LevelFilter::Info);
    for entry in &config.ignored {
        jokes_warn!("ignoring {}", entry);
    }

    let command = Command::parse(std::env::args().skip(1))?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(command, config))
}

async fn run(command: Command, config: AppConfig) -> Result<(), AppError> {
    jokes_info!("using joke server {}", config.fetch.base_url);
    let random_count = config.engine.random_count;
    let (engine, progress) =
        JokesEngine::with_fetcher(ReqwestJokeFetcher::new(config.fetch), config.engine);
    let renderer = tokio::spawn(render_loop(engine.subscribe(), progress, io::stdout()));

    let outcome = match command {
        Command::Search(query) => engine.search(query).await.map_err(AppError::from),
        Command::Random(count) => engine
            .retrieve_random(count.unwrap_or(random_count))
            .await
            .map_err(AppError::from),
    };

    // Closing the store ends the render loop once everything is printed.
    drop(engine);
    renderer.await?;
    outcome
}

async fn render_loop<W: Write>(
    mut states: ScreenStateWatch,
    mut progress: ProgressEvents,
    mut out: W,
) {
    let mut states_open = true;
    let mut progress_open = true;
    while states_open || progress_open {
        // Progress first, so a queued "show" never prints after the states it preceded.
        tokio::select! {
            biased;
            signal = progress.recv(), if progress_open => match signal {
                Some(signal) => {
                    let line = render_progress(signal);
                    if !line.is_empty() {
                        let _ = writeln!(out, "{line}");
                    }
                }
                None => progress_open = false,
            },
            changed = states.changed(), if states_open => match changed {
                Ok(()) => {
                    let lines = states
                        .borrow_and_update()
                        .as_ref()
                        .map(render)
                        .unwrap_or_default();
                    for line in lines {
                        let _ = writeln!(out, "{line}");
                    }
                }
                Err(_) => states_open = false,
            },
        }
    }
}
