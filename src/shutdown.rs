use crate::ipc::server::remove_socket_file;
use log::{debug, info, warn};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every tracked task finished within the timeout.
    Completed,
    /// The timeout elapsed first; unfinished tasks were left to process exit.
    TimedOut,
}

/// SIGINT or SIGTERM, whichever arrives first.
pub struct TerminationSignal {
    sigint: Signal,
    sigterm: Signal,
}

impl TerminationSignal {
    /// Install the handlers up front so a signal arriving during startup is not lost.
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    pub async fn recv(mut self) {
        tokio::select! {
            _ = self.sigint.recv() => info!("Received SIGINT"),
            _ = self.sigterm.recv() => info!("Received SIGTERM"),
        }
    }
}

/// Owns the cancellation tokens and task handles of the long-running tasks and
/// tears them down once.
pub struct ShutdownCoordinator {
    sampler: CancellationToken,
    server: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    socket_path: PathBuf,
    timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(socket_path: &Path, timeout: Duration) -> Self {
        Self {
            sampler: CancellationToken::new(),
            server: CancellationToken::new(),
            tasks: Vec::new(),
            socket_path: socket_path.to_path_buf(),
            timeout,
        }
    }

    pub fn sampler_token(&self) -> CancellationToken {
        self.sampler.clone()
    }

    pub fn server_token(&self) -> CancellationToken {
        self.server.clone()
    }

    pub fn track(&mut self, name: &'static str, handle: JoinHandle<()>) {
        self.tasks.push((name, handle));
    }

    /// Wait for `signal`, then shut down.
    pub async fn run<F>(self, signal: F) -> ShutdownOutcome
    where
        F: Future<Output = ()>,
    {
        signal.await;
        info!("Shutdown requested, stopping...");
        self.shutdown().await
    }

    /// Stop accepting, stop sampling, wait (bounded) for both, remove the socket file.
    pub async fn shutdown(self) -> ShutdownOutcome {
        let Self {
            sampler,
            server,
            tasks,
            socket_path,
            timeout,
        } = self;

        server.cancel();
        sampler.cancel();

        let join_all = async move {
            for (name, handle) in tasks {
                match handle.await {
                    Ok(()) => debug!("{name} task stopped"),
                    Err(e) => warn!("{name} task ended abnormally: {e}"),
                }
            }
        };

        let outcome = if time::timeout(timeout, join_all).await.is_ok() {
            info!("All tasks stopped");
            ShutdownOutcome::Completed
        } else {
            warn!(
                "Timed out after {}s waiting for tasks, exiting anyway",
                timeout.as_secs()
            );
            ShutdownOutcome::TimedOut
        };

        remove_socket_file(&socket_path);
        info!("Daemon exited");
        outcome
    }
}
