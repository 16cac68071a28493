pub mod types;

pub use types::{ActiveApp, ActiveAppSource};

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "linux")]
pub use linux::X11Source;

/// Placeholder source that always reports the same application.
///
/// Stands in for a real focused-window query on platforms (and setups) that do
/// not have one.
pub struct FixedSource {
    app: ActiveApp,
}

impl FixedSource {
    pub fn new(app: ActiveApp) -> Self {
        Self { app }
    }
}

impl Default for FixedSource {
    fn default() -> Self {
        Self::new(ActiveApp::new("firefox", 1))
    }
}

impl ActiveAppSource for FixedSource {
    fn current(&self) -> ActiveApp {
        self.app.clone()
    }
}
