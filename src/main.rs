use std::io::{self, IsTerminal};
use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use feedtail::cli::Cli;
use feedtail::domain::StateMap;
use feedtail::services::PollService;
use feedtail::shutdown::{install_interrupt_handler, Shutdown};
use feedtail::sources::RssAtomFetcher;
use feedtail::storage::open_store;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let urls = cli.gather_urls((!interactive).then(|| stdin.lock()))?;

    if urls.is_empty() && interactive {
        Cli::command().print_help()?;
        return Ok(());
    }

    let cache = cli.cache.clone();
    let timeout = Duration::from_secs(cli.timeout);
    let config = cli.into_config(urls)?;

    let mut service = PollService::new(&config, RssAtomFetcher::with_timeout(timeout));
    let mut states = StateMap::new();

    if let Some(path) = &cache {
        let store = open_store(path)
            .with_context(|| format!("cannot open state file {}", path.display()))?;
        states = store
            .load()
            .with_context(|| format!("cannot read state file {}", path.display()))?;
        debug!("loaded state for {} feeds from {}", states.len(), path.display());
        service = service.with_store(store);
    }

    let shutdown = Shutdown::new();
    if let Err(e) = install_interrupt_handler(shutdown.clone()) {
        warn!("cannot install interrupt handler: {}", e);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    service.with_shutdown(shutdown).run(&mut out, states)?;

    Ok(())
}

/// Logs go to stderr; stdout carries feed output only. `RUST_LOG` wins
/// over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "warn,feedtail=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
