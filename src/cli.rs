use std::path::{Path, PathBuf};

mod components;
mod derive;
mod gate;
mod report;
mod terminal;
mod validate;

use anyhow::Context;
use clap::ArgAction;
use components::Components;
use compreq::{Config, Engine};
use derive::Derive;
use report::Report;
use tracing::instrument;
use validate::Validate;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file
    ///
    /// A missing file means the default rules and naming convention.
    #[arg(short, long, default_value = ".compreq.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.command.run(&self.config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Derive a requirements instance from a template and a profile
    Derive(Derive),

    /// Re-validate a previously generated instance
    Validate(Validate),

    /// Summarise an instance's validation issues
    Report(Report),

    /// List the built-in component kinds
    Components(Components),
}

impl Command {
    fn run(self, config: &Path) -> anyhow::Result<()> {
        match self {
            Self::Derive(command) => command.run(&load_engine(config)?)?,
            Self::Validate(command) => command.run(&load_engine(config)?)?,
            Self::Report(command) => command.run(&load_engine(config)?)?,
            Self::Components(command) => command.run()?,
        }
        Ok(())
    }
}

#[instrument(level = "debug")]
fn load_engine(path: &Path) -> anyhow::Result<Engine> {
    let config = Config::load_or_default(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    Engine::new(&config).context("configuration contains an invalid rule")
}
