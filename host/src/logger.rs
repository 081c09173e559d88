// Copyright 2024 Storage Host Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tracing` setup: a filtered stderr subscriber, plus an optional rolling
//! file appender when the config names a log directory.

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Non-blocking file-appender guard; dropping it flushes and stops the
/// background writer thread, so the caller must hold it for the process
/// lifetime.
pub struct LoggerGuard(#[allow(dead_code)] Option<tracing_appender::non_blocking::WorkerGuard>);

pub fn init(config: &Config) -> LoggerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone()));

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "host.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let writer = non_blocking.and(std::io::stderr);
            tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).init();
            LoggerGuard(Some(guard))
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            LoggerGuard(None)
        }
    }
}
