//! Startup wiring: config, monitor, control server and shutdown coordinator.

use crate::commands::CommandDispatcher;
use crate::config::{self, AppPaths, YamlConfigStore};
use crate::error::AppError;
use crate::ipc::{CommandHandler, ControlServer};
use crate::monitor::{Monitor, MonitorConfig};
use crate::notify::AlertSink;
use crate::platform::{ActiveAppSource, FixedSource};
use crate::shutdown::{ShutdownCoordinator, ShutdownOutcome};
use log::{error, info};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Which active-app source the daemon samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceKind {
    /// Always reports `firefox`
    #[default]
    Fixed,
    /// Focused window via X11 (Linux only)
    X11,
}

impl SourceKind {
    pub fn build(self) -> Arc<dyn ActiveAppSource> {
        match self {
            Self::Fixed => Arc::new(FixedSource::default()),
            Self::X11 => x11_source(),
        }
    }
}

#[cfg(target_os = "linux")]
fn x11_source() -> Arc<dyn ActiveAppSource> {
    Arc::new(crate::platform::X11Source::new())
}

#[cfg(not(target_os = "linux"))]
fn x11_source() -> Arc<dyn ActiveAppSource> {
    log::warn!("X11 source is only available on Linux, using the fixed source");
    Arc::new(FixedSource::default())
}

pub struct DaemonOptions {
    pub paths: AppPaths,
    pub sample_interval: Duration,
    pub shutdown_timeout: Duration,
    pub source: Arc<dyn ActiveAppSource>,
    pub alerts: Arc<dyn AlertSink>,
}

/// A started daemon: both tasks are running and the socket is bound (unless
/// binding failed, in which case only the sampler runs).
pub struct RunningDaemon {
    monitor: Arc<Monitor>,
    coordinator: ShutdownCoordinator,
    paths: AppPaths,
}

impl RunningDaemon {
    pub fn monitor(&self) -> &Arc<Monitor> {
        &self.monitor
    }

    pub fn socket_path(&self) -> &Path {
        &self.paths.socket
    }

    /// Run until `signal` resolves, then perform the shutdown sequence.
    pub async fn run_until<F>(self, signal: F) -> ShutdownOutcome
    where
        F: Future<Output = ()>,
    {
        self.coordinator.run(signal).await
    }
}

/// Load the config and start the sampler and control server tasks.
pub fn start(options: DaemonOptions) -> Result<RunningDaemon, AppError> {
    let DaemonOptions {
        paths,
        sample_interval,
        shutdown_timeout,
        source,
        alerts,
    } = options;

    paths.ensure_dirs()?;
    let store = Arc::new(YamlConfigStore::new(&paths.config_file));
    let config = config::load_or_default(store.as_ref());
    info!(
        "Loaded {} limits from {}",
        config.apps.len(),
        store.path().display()
    );

    let monitor = Arc::new(Monitor::new(
        &config.apps,
        source,
        alerts,
        MonitorConfig { sample_interval },
    ));
    let dispatcher: Arc<dyn CommandHandler> =
        Arc::new(CommandDispatcher::new(Arc::clone(&monitor), store, config));
    let mut coordinator = ShutdownCoordinator::new(&paths.socket, shutdown_timeout);

    let sampler = {
        let monitor = Arc::clone(&monitor);
        let shutdown = coordinator.sampler_token();
        tokio::spawn(async move { monitor.run(shutdown).await })
    };
    coordinator.track("sampler", sampler);

    // Bound here so clients can connect as soon as `start` returns.
    match ControlServer::bind(&paths.socket) {
        Ok(server) => {
            let server = tokio::spawn(server.serve(dispatcher, coordinator.server_token()));
            coordinator.track("control server", server);
        }
        Err(e) => error!("Control server not started: {e}"),
    }

    Ok(RunningDaemon {
        monitor,
        coordinator,
        paths,
    })
}
