//! Logging setup: console output always, an optional rotated file sink when
//! `--log-dir` is given. Grounded in `recisdb-proxy/src/logging.rs`, trimmed
//! for a batch CLI tool (one grab per invocation) rather than a long-lived
//! server: file logging is opt-in instead of mandatory, and there is no
//! periodic retention sweep since each process exits after one grab.

use std::io;
use std::path::Path;

use chrono::Local;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the global tracing subscriber. `verbosity` follows the CLI's
/// repeated `-v` convention: 0 = info, 1 = debug, ≥2 = trace.
pub fn init_logging(log_dir: Option<&Path>, verbosity: u8) -> Result<(), Box<dyn std::error::Error>> {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = fmt::layer()
        .with_writer(io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_timer(LocalTimeTimer);

    let registry = tracing_subscriber::registry().with(env_filter).with(console_layer);

    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir)?;
        let file_appender = tracing_appender::rolling::daily(dir, "ttxepg.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // Leaked for the process lifetime: a batch CLI run has no
        // graceful-shutdown path to drop the guard on.
        std::mem::forget(guard);

        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_target(true)
            .with_level(true)
            .with_ansi(false)
            .with_timer(LocalTimeTimer);

        registry
            .with(file_layer)
            .try_init()
            .map_err(|e| format!("failed to set default subscriber: {e}"))?;
    } else {
        registry
            .try_init()
            .map_err(|e| format!("failed to set default subscriber: {e}"))?;
    }

    tracing_log::LogTracer::init().map_err(|e| format!("failed to initialize LogTracer: {e}"))?;

    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct LocalTimeTimer;

impl fmt::time::FormatTime for LocalTimeTimer {
    fn format_time(&self, w: &mut fmt::format::Writer) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.6f"))
    }
}
