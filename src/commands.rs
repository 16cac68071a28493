// src/commands.rs
//
// Control-channel command handlers over the monitor and the config store.

use crate::config::{AppConfig, AppLimit, ConfigStore};
use crate::error::AppError;
use crate::ipc::{Command, CommandHandler, Request, Response};
use crate::monitor::Monitor;
use crate::validation::{display_name, validate_app_key, validate_limit_minutes};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct CommandDispatcher {
    monitor: Arc<Monitor>,
    store: Arc<dyn ConfigStore>,
    /// Last loaded or saved config; the list `getLimits` reports.
    config: Mutex<AppConfig>,
}

impl CommandDispatcher {
    pub fn new(monitor: Arc<Monitor>, store: Arc<dyn ConfigStore>, config: AppConfig) -> Self {
        Self {
            monitor,
            store,
            config: Mutex::new(config),
        }
    }

    fn lock_config(&self) -> MutexGuard<'_, AppConfig> {
        match self.config.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("CommandDispatcher: config mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn get_limits(&self) -> Result<Response, AppError> {
        let limits = serde_json::to_value(&self.lock_config().apps)?;
        Ok(Response::with_data("limits", limits))
    }

    fn set_limit(&self, request: &Request) -> Result<Response, AppError> {
        let key = validate_app_key(request.app.as_deref())?;
        let limit = validate_limit_minutes(request.limit)?;
        let name = display_name(request.name.as_deref(), key);

        // Config before monitor; the monitor never takes the config lock.
        let mut config = self.lock_config();
        config.upsert(AppLimit::new(name, key, limit));
        self.monitor.set_limit(key, limit);

        // Best effort: the running daemon already uses the new limit.
        if let Err(e) = self.store.save(&config) {
            warn!("Failed to persist limit for {key}: {e}");
        }

        info!("Limit for {key} set to {limit} minutes");
        Ok(Response::ok())
    }

    fn get_timers(&self) -> Result<Response, AppError> {
        let timers: BTreeMap<String, u64> = self.monitor.get_timers().into_iter().collect();
        Ok(Response::with_data("timers", serde_json::to_value(timers)?))
    }
}

impl CommandHandler for CommandDispatcher {
    fn handle(&self, request: Request) -> Response {
        let result = match request.command() {
            Some(Command::GetLimits) => self.get_limits(),
            Some(Command::SetLimit) => self.set_limit(&request),
            Some(Command::GetTimers) => self.get_timers(),
            None => {
                debug!("Unknown control command {:?}", request.cmd);
                return Response::failure();
            }
        };

        result.unwrap_or_else(|e| {
            debug!("Control command {} failed: {e}", request.cmd);
            Response::failure()
        })
    }
}
