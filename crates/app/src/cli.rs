use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Listing search and cache service")]
pub struct Cli {
    #[arg(long, default_value = "all")]
    pub mode: Mode,
    /// Skip embedded schema migrations at startup.
    #[arg(long, default_value_t = false)]
    pub skip_migrations: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    All,
    Api,
    Worker,
}

impl Mode {
    pub fn run_api(self) -> bool {
        matches!(self, Mode::All | Mode::Api)
    }

    pub fn run_worker(self) -> bool {
        matches!(self, Mode::All | Mode::Worker)
    }
}
