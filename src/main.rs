//! appmon - per-application foreground time limiter.
//!
//! Usage:
//!   appmon [--source fixed|x11] [--interval-secs 1]   # Run the daemon
//!   appmon-ctl get-timers                              # Talk to it

use appmon_lib::config::AppPaths;
use appmon_lib::constants::{DEFAULT_SAMPLE_INTERVAL_SECS, SHUTDOWN_TIMEOUT};
use appmon_lib::daemon::{self, DaemonOptions, SourceKind};
use appmon_lib::notify::DesktopNotifier;
use appmon_lib::shutdown::{ShutdownOutcome, TerminationSignal};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "appmon")]
#[command(about = "Alert when an application has been in the foreground too long")]
struct Args {
    /// Limits file (default: <config dir>/appmon/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Control socket path (default: <config dir>/appmon/appmon.sock)
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Sampling period in seconds
    #[arg(long, default_value_t = DEFAULT_SAMPLE_INTERVAL_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: u64,

    /// Where the focused application is read from
    #[arg(long, value_enum, default_value_t = SourceKind::Fixed)]
    source: SourceKind,

    /// Upper bound on the shutdown wait, in seconds
    #[arg(long, default_value_t = SHUTDOWN_TIMEOUT.as_secs())]
    shutdown_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let paths = match AppPaths::with_overrides(args.config, args.socket) {
        Ok(paths) => paths,
        Err(e) => {
            error!("appmon initialization failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let signal = match TerminationSignal::install() {
        Ok(signal) => signal,
        Err(e) => {
            error!("Failed to install signal handlers: {e}");
            return ExitCode::FAILURE;
        }
    };

    let options = DaemonOptions {
        paths,
        sample_interval: Duration::from_secs(args.interval_secs),
        shutdown_timeout: Duration::from_secs(args.shutdown_timeout_secs),
        source: args.source.build(),
        alerts: Arc::new(DesktopNotifier::default()),
    };

    let running = match daemon::start(options) {
        Ok(running) => running,
        Err(e) => {
            error!("appmon failed to start: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("appmon running, control socket at {}", running.socket_path().display());

    if running.run_until(signal.recv()).await == ShutdownOutcome::TimedOut {
        // Do not let runtime teardown wait on tasks that ignored cancellation.
        std::process::exit(0);
    }
    ExitCode::SUCCESS
}
