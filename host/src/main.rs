// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

mod cli;
mod config;
mod daemon;
mod identity;
mod logger;
mod storage;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = cli.resolve_config()?;
    let _logger_guard = logger::init(&config);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(daemon::run(&config))
}
