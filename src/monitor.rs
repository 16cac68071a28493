use crate::config::AppLimit;
use crate::constants::{DEFAULT_SAMPLE_INTERVAL_SECS, SECS_PER_MINUTE};
use crate::notify::AlertSink;
use crate::platform::ActiveAppSource;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub struct MonitorConfig {
    /// Sampling period, truncated to whole seconds (minimum one second)
    pub sample_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(DEFAULT_SAMPLE_INTERVAL_SECS),
        }
    }
}

/// What a single sampling step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The focused app has no positive limit; nothing changed.
    Unmonitored,
    /// The focused app's counter advanced to `elapsed_secs`.
    Counted { elapsed_secs: u64 },
    /// The limit was reached; the alert fired and the counter is back at zero.
    Alerted,
}

#[derive(Default)]
struct MonitorState {
    /// Minutes per application key
    limits: HashMap<String, i64>,
    /// Accumulated foreground seconds per application key
    timers: HashMap<String, u64>,
}

/// Foreground-time accounting for all configured applications.
///
/// Limits and counters share one lock, so a tick, a `set_limit` and a
/// `get_timers` never observe each other half-done.
pub struct Monitor {
    config: MonitorConfig,
    state: Mutex<MonitorState>,
    source: Arc<dyn ActiveAppSource>,
    alerts: Arc<dyn AlertSink>,
}

impl Monitor {
    pub fn new(
        limits: &[AppLimit],
        source: Arc<dyn ActiveAppSource>,
        alerts: Arc<dyn AlertSink>,
        config: MonitorConfig,
    ) -> Self {
        let limits = limits
            .iter()
            .map(|app| (app.system_name.clone(), app.limit))
            .collect();

        Self {
            config,
            state: Mutex::new(MonitorState {
                limits,
                timers: HashMap::new(),
            }),
            source,
            alerts,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, MonitorState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Monitor: state mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// The configured period truncated to whole seconds, never below one second.
    pub fn sample_interval(&self) -> Duration {
        let secs = self
            .config
            .sample_interval
            .as_secs()
            .max(DEFAULT_SAMPLE_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    /// Run one sampling step.
    pub fn tick(&self) -> TickOutcome {
        let app = self.source.current();
        let tick_secs = self.sample_interval().as_secs();

        let mut state = self.lock_state();
        let Some(limit_minutes) = state.limits.get(&app.key).copied().filter(|&limit| limit > 0)
        else {
            return TickOutcome::Unmonitored;
        };
        let threshold_secs = u64::try_from(limit_minutes)
            .unwrap_or(u64::MAX)
            .saturating_mul(SECS_PER_MINUTE);

        let counter = state.timers.entry(app.key.clone()).or_insert(0);
        *counter = counter.saturating_add(tick_secs);

        if *counter >= threshold_secs {
            // Fire-and-forget: the sink reports nothing back and cannot stop the loop.
            self.alerts.notify(&app.key);
            *counter = 0;
            info!(
                "{} reached its {limit_minutes} minute limit (pid {})",
                app.key, app.pid
            );
            return TickOutcome::Alerted;
        }

        TickOutcome::Counted {
            elapsed_secs: *counter,
        }
    }

    /// Sample once per interval until `shutdown` is cancelled.
    ///
    /// The first sample happens one full interval after start. Ticks that fall
    /// behind are skipped rather than replayed.
    pub async fn run(&self, shutdown: CancellationToken) {
        let period = self.sample_interval();
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Monitor started, sampling every {}s", period.as_secs());
        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }
        info!("Monitor stopped");
    }

    /// Snapshot of the accumulated seconds per application.
    pub fn get_timers(&self) -> HashMap<String, u64> {
        self.lock_state().timers.clone()
    }

    /// Install or replace a limit. The application's counter always restarts at zero.
    pub fn set_limit(&self, key: &str, minutes: i64) {
        let mut state = self.lock_state();
        state.limits.insert(key.to_string(), minutes);
        state.timers.insert(key.to_string(), 0);
    }

    pub fn limit_for(&self, key: &str) -> Option<i64> {
        self.lock_state().limits.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_monitor;
    use std::thread;

    fn limits(entries: &[(&str, i64)]) -> Vec<AppLimit> {
        entries
            .iter()
            .map(|(key, limit)| AppLimit::new(key, key, *limit))
            .collect()
    }

    #[test]
    fn test_one_alert_after_full_limit() {
        let (monitor, _source, sink) = setup_monitor(&limits(&[("firefox", 1)]), "firefox");

        for _ in 0..59 {
            assert!(matches!(monitor.tick(), TickOutcome::Counted { .. }));
        }
        assert!(sink.alerts().is_empty());
        assert_eq!(monitor.get_timers().get("firefox"), Some(&59));

        assert_eq!(monitor.tick(), TickOutcome::Alerted);
        assert_eq!(sink.alerts(), vec!["firefox".to_string()]);
        assert_eq!(monitor.get_timers().get("firefox"), Some(&0));
    }

    #[test]
    fn test_counter_grows_one_per_tick() {
        let (monitor, _source, _sink) = setup_monitor(&limits(&[("firefox", 5)]), "firefox");

        for expected in 1..=10 {
            assert_eq!(
                monitor.tick(),
                TickOutcome::Counted {
                    elapsed_secs: expected
                }
            );
        }
    }

    #[test]
    fn test_next_alert_needs_another_full_limit() {
        let (monitor, _source, sink) = setup_monitor(&limits(&[("firefox", 1)]), "firefox");

        for _ in 0..60 {
            monitor.tick();
        }
        assert_eq!(sink.alerts().len(), 1);

        for _ in 0..59 {
            monitor.tick();
        }
        assert_eq!(sink.alerts().len(), 1);

        monitor.tick();
        assert_eq!(sink.alerts().len(), 2);
    }

    #[test]
    fn test_unmonitored_apps_are_not_counted() {
        let (monitor, source, sink) = setup_monitor(
            &limits(&[("firefox", 1), ("code", 0), ("slack", -3)]),
            "unknown",
        );

        assert_eq!(monitor.tick(), TickOutcome::Unmonitored);
        source.set("code");
        assert_eq!(monitor.tick(), TickOutcome::Unmonitored);
        source.set("slack");
        assert_eq!(monitor.tick(), TickOutcome::Unmonitored);

        assert!(monitor.get_timers().is_empty());
        assert!(sink.alerts().is_empty());
    }

    #[test]
    fn test_background_app_counter_is_frozen() {
        let (monitor, source, _sink) =
            setup_monitor(&limits(&[("firefox", 10), ("code", 10)]), "firefox");

        for _ in 0..5 {
            monitor.tick();
        }
        source.set("code");
        for _ in 0..3 {
            monitor.tick();
        }

        let timers = monitor.get_timers();
        assert_eq!(timers.get("firefox"), Some(&5));
        assert_eq!(timers.get("code"), Some(&3));
    }

    #[test]
    fn test_set_limit_resets_counter() {
        let (monitor, _source, sink) = setup_monitor(&limits(&[("firefox", 1)]), "firefox");

        for _ in 0..45 {
            monitor.tick();
        }
        monitor.set_limit("firefox", 1);
        assert_eq!(monitor.get_timers().get("firefox"), Some(&0));

        // A fresh window: 59 more ticks must not alert.
        for _ in 0..59 {
            monitor.tick();
        }
        assert!(sink.alerts().is_empty());
        monitor.tick();
        assert_eq!(sink.alerts().len(), 1);
    }

    #[test]
    fn test_set_limit_enables_new_app() {
        let (monitor, _source, _sink) = setup_monitor(&[], "code");

        assert_eq!(monitor.tick(), TickOutcome::Unmonitored);
        monitor.set_limit("code", 30);
        assert_eq!(monitor.limit_for("code"), Some(30));
        assert_eq!(
            monitor.tick(),
            TickOutcome::Counted { elapsed_secs: 1 }
        );
    }

    #[test]
    fn test_set_limit_to_zero_stops_counting() {
        let (monitor, _source, _sink) = setup_monitor(&limits(&[("firefox", 1)]), "firefox");

        monitor.tick();
        monitor.set_limit("firefox", 0);
        assert_eq!(monitor.tick(), TickOutcome::Unmonitored);
        assert_eq!(monitor.get_timers().get("firefox"), Some(&0));
    }

    #[test]
    fn test_get_timers_returns_independent_copy() {
        let (monitor, _source, _sink) = setup_monitor(&limits(&[("firefox", 10)]), "firefox");
        monitor.tick();

        let mut snapshot = monitor.get_timers();
        snapshot.insert("firefox".to_string(), 999);
        snapshot.insert("intruder".to_string(), 1);

        let fresh = monitor.get_timers();
        assert_eq!(fresh.get("firefox"), Some(&1));
        assert!(!fresh.contains_key("intruder"));

        monitor.tick();
        assert_eq!(snapshot.get("firefox"), Some(&999));
    }

    #[test]
    fn test_longer_interval_counts_whole_seconds() {
        let source = Arc::new(crate::test_utils::SwitchableSource::new("firefox"));
        let sink = Arc::new(crate::test_utils::RecordingSink::default());
        let monitor = Monitor::new(
            &limits(&[("firefox", 1)]),
            source,
            Arc::clone(&sink) as Arc<dyn AlertSink>,
            MonitorConfig {
                sample_interval: Duration::from_secs(20),
            },
        );

        assert_eq!(monitor.tick(), TickOutcome::Counted { elapsed_secs: 20 });
        assert_eq!(monitor.tick(), TickOutcome::Counted { elapsed_secs: 40 });
        assert_eq!(monitor.tick(), TickOutcome::Alerted);
        assert_eq!(sink.alerts().len(), 1);
    }

    #[test]
    fn test_fractional_interval_is_truncated() {
        let monitor = Monitor::new(
            &limits(&[("firefox", 5)]),
            Arc::new(crate::test_utils::SwitchableSource::new("firefox")),
            Arc::new(crate::test_utils::RecordingSink::default()),
            MonitorConfig {
                sample_interval: Duration::from_millis(1_500),
            },
        );
        assert_eq!(monitor.sample_interval(), Duration::from_secs(1));
        assert_eq!(monitor.tick(), TickOutcome::Counted { elapsed_secs: 1 });

        let too_short = Monitor::new(
            &[],
            Arc::new(crate::test_utils::SwitchableSource::new("firefox")),
            Arc::new(crate::test_utils::RecordingSink::default()),
            MonitorConfig {
                sample_interval: Duration::from_millis(200),
            },
        );
        assert_eq!(too_short.sample_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_concurrent_access_never_sees_partial_updates() {
        let (monitor, _source, _sink) = setup_monitor(&limits(&[("firefox", 1)]), "firefox");

        let ticker = {
            let monitor = Arc::clone(&monitor);
            thread::spawn(move || {
                for _ in 0..5_000 {
                    monitor.tick();
                }
            })
        };
        let mutator = {
            let monitor = Arc::clone(&monitor);
            thread::spawn(move || {
                for i in 0..5_000 {
                    if i % 7 == 0 {
                        monitor.set_limit("firefox", 1);
                    }
                    let timers = monitor.get_timers();
                    let value = timers.get("firefox").copied().unwrap_or(0);
                    assert!(value < 60, "counter escaped its window: {value}");
                }
            })
        };

        ticker.join().unwrap();
        mutator.join().unwrap();
        assert_eq!(monitor.limit_for("firefox"), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_samples_until_cancelled() {
        let (monitor, _source, sink) = setup_monitor(&limits(&[("firefox", 1)]), "firefox");
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn({
            let monitor = Arc::clone(&monitor);
            let shutdown = shutdown.clone();
            async move { monitor.run(shutdown).await }
        });

        // No sample before the first full period.
        tokio::task::yield_now().await;
        assert!(monitor.get_timers().is_empty());

        time::sleep(Duration::from_millis(30_500)).await;
        assert_eq!(monitor.get_timers().get("firefox"), Some(&30));

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(sink.alerts().len(), 1);
        assert_eq!(monitor.get_timers().get("firefox"), Some(&0));

        shutdown.cancel();
        handle.await.unwrap();

        let frozen = monitor.get_timers();
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(monitor.get_timers(), frozen);
    }
}
