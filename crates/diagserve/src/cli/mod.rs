//! cli subcommands for diagserve.

mod serve;

pub use serve::ServeCommand;

use clap::{Parser, Subcommand};

/// diagserve - diagnosis key publication server
#[derive(Parser, Debug)]
#[command(name = "diagserve")]
#[command(about = "Diagnosis key publication server", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// top-level commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// run the publication server
    Serve(ServeCommand),
}
