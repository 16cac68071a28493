use crate::constants::MAX_APP_KEY_LEN;
use crate::error::AppError;

/// Validate an application key (the system-level name the active-app source reports).
/// Returns the trimmed key if valid.
pub fn validate_app_key(key: Option<&str>) -> Result<&str, AppError> {
    let err = |reason: &str| AppError::InvalidInput {
        field: "app",
        reason: reason.into(),
    };

    let key = key.ok_or_else(|| err("is required"))?.trim();
    if key.is_empty() {
        return Err(err("cannot be empty"));
    }
    if key.len() > MAX_APP_KEY_LEN {
        return Err(AppError::InvalidInput {
            field: "app",
            reason: format!("cannot exceed {MAX_APP_KEY_LEN} bytes"),
        });
    }
    Ok(key)
}

/// Validate a limit in minutes. Any integer is accepted; zero or negative
/// values mean "not monitored".
pub fn validate_limit_minutes(limit: Option<i64>) -> Result<i64, AppError> {
    limit.ok_or_else(|| AppError::InvalidInput {
        field: "limit",
        reason: "is required".into(),
    })
}

/// Resolve the display label for a limit entry, falling back to the key.
pub fn display_name<'a>(name: Option<&'a str>, key: &'a str) -> &'a str {
    name.map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(key)
}
