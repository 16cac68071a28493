/// The application holding input focus at the moment of a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveApp {
    /// System-level key, matched against `AppLimit::system_name`
    pub key: String,
    pub pid: u32,
}

impl ActiveApp {
    pub fn new(key: &str, pid: u32) -> Self {
        Self {
            key: key.to_string(),
            pid,
        }
    }

    /// Reported when nothing is focused; an empty key never carries a limit.
    pub fn unknown() -> Self {
        Self::default()
    }
}

pub trait ActiveAppSource: Send + Sync {
    fn current(&self) -> ActiveApp;
}
