// src/constants.rs

use std::time::Duration;

/// Seconds in one minute; limits are configured in minutes, counters run in seconds.
pub const SECS_PER_MINUTE: u64 = 60;

/// Default sampling period in seconds
pub const DEFAULT_SAMPLE_INTERVAL_SECS: u64 = 1;

/// Upper bound on how long shutdown waits for the sampler and the control server
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause before retrying after a transient accept failure
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Maximum size of a single control request
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// How long a connection may take to deliver its request
pub const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum application key length
pub const MAX_APP_KEY_LEN: usize = 256;

pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const SOCKET_FILE_NAME: &str = "appmon.sock";

/// Title used for desktop alerts
pub const NOTIFICATION_TITLE: &str = "AppMon";
