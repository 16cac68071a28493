//! Shared fixtures for integration tests.

#![allow(dead_code, reason = "not every test binary uses every fixture")]

use appmon_lib::config::AppPaths;
use appmon_lib::daemon::DaemonOptions;
use appmon_lib::notify::AlertSink;
use appmon_lib::platform::{ActiveApp, FixedSource};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct RecordingSink {
    alerts: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().expect("RecordingSink mutex poisoned").clone()
    }
}

impl AlertSink for RecordingSink {
    fn notify(&self, app_key: &str) {
        self.alerts
            .lock()
            .expect("RecordingSink mutex poisoned")
            .push(app_key.to_string());
    }
}

/// Daemon options rooted in `dir`, sampling a fixed `focused` app once a second.
pub fn daemon_options(dir: &Path, focused: &str) -> (DaemonOptions, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let options = DaemonOptions {
        paths: AppPaths::in_dir(dir),
        sample_interval: Duration::from_secs(1),
        shutdown_timeout: Duration::from_secs(5),
        source: Arc::new(FixedSource::new(ActiveApp::new(focused, 42))),
        alerts: Arc::clone(&sink) as Arc<dyn AlertSink>,
    };
    (options, sink)
}
