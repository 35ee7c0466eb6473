/*
MIT License

Copyright (c) 2025 Ameyanagi

All rights reserved.
*/

//! Main executable for mpdf-rs

use clap::Parser;
use mpdf_rs::cli::{self, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    log::debug!("mpdf-rs v{}", mpdf_rs::VERSION);
    cli::run(&cli)
}
