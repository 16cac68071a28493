use crate::constants::NOTIFICATION_TITLE;
use log::debug;
use std::process::{Command, Stdio};
use std::thread;

/// Receives threshold crossings. Delivery is best-effort; nothing is reported back.
pub trait AlertSink: Send + Sync {
    fn notify(&self, app_key: &str);
}

/// Shows a desktop notification through `notify-send`.
pub struct DesktopNotifier {
    program: String,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new("notify-send")
    }
}

impl DesktopNotifier {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

pub fn alert_message(app_key: &str) -> String {
    format!("You use {app_key} too long, take a rest!")
}

impl AlertSink for DesktopNotifier {
    fn notify(&self, app_key: &str) {
        let spawned = Command::new(&self.program)
            .arg(NOTIFICATION_TITLE)
            .arg(alert_message(app_key))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                // Reap off-thread so the caller (which holds the monitor lock) never waits.
                thread::spawn(move || {
                    let _ = child.wait();
                });
            }
            Err(e) => debug!("Failed to run {}: {e}", self.program),
        }
    }
}
