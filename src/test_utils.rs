//! Shared test utilities for appmon.
//!
//! Fakes for the monitor's collaborators, used across test modules.

#![cfg(test)]

use crate::config::AppLimit;
use crate::monitor::{Monitor, MonitorConfig};
use crate::notify::AlertSink;
use crate::platform::{ActiveApp, ActiveAppSource};
use std::sync::{Arc, Mutex};

/// Alert sink that remembers every key it was asked to notify about.
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

/// Active-app source whose answer can be changed between ticks.
pub struct SwitchableSource {
    current: Mutex<ActiveApp>,
}

impl SwitchableSource {
    pub fn new(key: &str) -> Self {
        Self {
            current: Mutex::new(ActiveApp::new(key, 1)),
        }
    }

    pub fn set(&self, key: &str) {
        *self.current.lock().expect("SwitchableSource mutex poisoned") = ActiveApp::new(key, 1);
    }
}

impl ActiveAppSource for SwitchableSource {
    fn current(&self) -> ActiveApp {
        self.current
            .lock()
            .expect("SwitchableSource mutex poisoned")
            .clone()
    }
}

/// Build a monitor over `limits` with a switchable source focused on `focused`.
pub fn setup_monitor(
    limits: &[AppLimit],
    focused: &str,
) -> (Arc<Monitor>, Arc<SwitchableSource>, Arc<RecordingSink>) {
    let source = Arc::new(SwitchableSource::new(focused));
    let sink = Arc::new(RecordingSink::default());
    let monitor = Monitor::new(
        limits,
        Arc::clone(&source) as Arc<dyn ActiveAppSource>,
        Arc::clone(&sink) as Arc<dyn AlertSink>,
        MonitorConfig::default(),
    );
    (Arc::new(monitor), source, sink)
}
