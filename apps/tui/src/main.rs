mod app;
mod cli;
mod event;
mod terminal;
mod ui;

use app::App;
use clap::Parser;
use cli::CliArgs;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use perf_dashboard_tui::api::{HttpBackend, StatsBackend};
use perf_dashboard_tui::config::init_app_config;
use perf_dashboard_tui::navigate::Route;
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    color_eyre::install()?;

    let args = CliArgs::parse();
    args.apply_env_overrides();

    let config = init_app_config().map_err(|e| eyre!("{e}"))?;
    let headless = args.headless || !is_terminal();
    init_tracing(headless, args.debug, &config.log_file)?;

    let backend: Arc<dyn StatsBackend> = Arc::new(
        HttpBackend::new(&config.base_url, config.request_timeout).map_err(|e| eyre!("{e}"))?,
    );
    let route = match Route::parse(&args.page) {
        Ok(route) => route,
        Err(e) => {
            eprintln!("{}", CliArgs::help_text());
            return Err(eyre!("{e}"));
        }
    };
    info!(url = %route.to_url(), base_url = %config.base_url, headless, "starting dashboard");

    let mut app = App::new(backend, config, &route);

    if headless {
        return event::run_headless(&mut app, args.json).await;
    }

    // Setup terminal
    let mut terminal = terminal::setup()?;

    // Fetches keep running on the runtime workers while the loop polls input
    let result = tokio::task::block_in_place(|| event::run(&mut terminal, &mut app));

    // Restore terminal
    terminal::cleanup(true, true);

    result
}

/// Headless runs log to stderr. The terminal UI owns the screen, so it
/// logs to a file instead.
fn init_tracing(headless: bool, debug: bool, log_file: &Path) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));

    if headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        let file = File::create(log_file)
            .map_err(|e| eyre!("Failed to open log file {}: {e}", log_file.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

// Check if we're running in a terminal
fn is_terminal() -> bool {
    atty::is(atty::Stream::Stdout)
}
