//! diagserve - diagnosis key publication server.
//!
//! ingests exposure notification diagnosis keys from health authority
//! clients and distributes the complete keyset to devices from a
//! CDN-friendly, cache-backed read path.

use clap::Parser;
use color_eyre::eyre::Result;
use diagserve::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(cmd) => cmd.run().await,
    }
}
