//! coursegeo CLI: geocode university course listings.
//!
//! Fetches the public course list, attaches latitude/longitude to every
//! institution via a Nominatim-compatible service, and writes CSV + xlsx.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
