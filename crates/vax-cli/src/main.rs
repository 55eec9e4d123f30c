use std::io;

use anyhow::Context;
use clap::Parser;
use tracing::Level;
use vax_core::{DurableStore, InMemoryStore, Scheduler, SchedulerConfig};

mod cli;
mod commands;

use cli::Cli;
use commands::Shell;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => SchedulerConfig::load(path)?,
        None => SchedulerConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    let input = io::stdin().lock();
    let output = io::stdout().lock();
    match &config.data_dir {
        Some(dir) => {
            let store = DurableStore::open(dir, config.durable())
                .with_context(|| format!("cannot open data directory {}", dir.display()))?;
            let mut shell = Shell::new(Scheduler::from_config(store, &config)?);
            commands::run(&mut shell, input, output, cli.format)
        }
        None => {
            let mut shell = Shell::new(Scheduler::from_config(InMemoryStore::new(), &config)?);
            commands::run(&mut shell, input, output, cli.format)
        }
    }
}
