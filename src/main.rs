//! Command-line entry point for the GPAS uploader.
//!
//! Validates an upload CSV, converts BAMs where needed, removes host reads
//! and prints the resulting validation report or submission document.

use anyhow::Result;
use clap::Parser;
use gpas_uploader::cli::{run_cli, Cli};
use log::info;

fn main() -> Result<()> {
    // Initialize logging (RUST_LOG controls the level)
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting with arguments: {:?}", cli);

    if !run_cli(cli)? {
        std::process::exit(1);
    }
    Ok(())
}
