//! Runtime configuration.
//!
//! # Responsibility
//! - Collect settings for logging, storage, ordering, save-state timing
//!   and report export in one value.
//! - Load overrides from `ROLLCALL_*` environment variables.
//!
//! # Invariants
//! - Unparsable environment values fall back to defaults with a warning;
//!   they never abort loading.
//! - `validate` is the only place that rejects a configuration.

use crate::engine::SortOrder;
use crate::logging::{default_log_level, normalize_level, normalize_log_dir};
use crate::report::ReportOptions;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_LOG_LEVEL: &str = "ROLLCALL_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ROLLCALL_LOG_DIR";
pub const ENV_DB_PATH: &str = "ROLLCALL_DB";
pub const ENV_SORT_ORDER: &str = "ROLLCALL_SORT";
pub const ENV_SAVED_CLEAR_MS: &str = "ROLLCALL_SAVED_CLEAR_MS";
pub const ENV_ROWS_PER_PAGE: &str = "ROLLCALL_ROWS_PER_PAGE";
pub const ENV_UTC_OFFSET_MINUTES: &str = "ROLLCALL_UTC_OFFSET_MINUTES";

const DEFAULT_SAVED_CLEAR_MS: i64 = 2_000;

/// Core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub log_level: String,
    /// File logging is disabled when `None`.
    pub log_dir: Option<String>,
    /// In-memory database when `None`.
    pub db_path: Option<PathBuf>,
    pub sort_order: SortOrder,
    /// How long a `Saved` marker stays visible.
    pub saved_clear_after_ms: i64,
    pub rows_per_page: usize,
    pub utc_offset_minutes: i32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let report = ReportOptions::default();
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            db_path: None,
            sort_order: SortOrder::default(),
            saved_clear_after_ms: DEFAULT_SAVED_CLEAR_MS,
            rows_per_page: report.rows_per_page,
            utc_offset_minutes: report.utc_offset_minutes,
        }
    }
}

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    InvalidLogDir(String),
    InvalidValue { key: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::InvalidLogDir(message) => write!(f, "{message}"),
            Self::InvalidValue { key, message } => write!(f, "invalid {key}: {message}"),
        }
    }
}

impl Error for ConfigError {}

impl CoreConfig {
    /// Defaults overridden by process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup(key)` values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let sort_order = match lookup(ENV_SORT_ORDER) {
            Some(raw) => SortOrder::parse(&raw).unwrap_or_else(|| {
                warn!("event=config_load module=config status=fallback key={ENV_SORT_ORDER}");
                defaults.sort_order
            }),
            None => defaults.sort_order,
        };

        Self {
            log_level: lookup(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: lookup(ENV_LOG_DIR).filter(|dir| !dir.trim().is_empty()),
            db_path: lookup(ENV_DB_PATH)
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            sort_order,
            saved_clear_after_ms: parse_or(
                &lookup,
                ENV_SAVED_CLEAR_MS,
                defaults.saved_clear_after_ms,
            ),
            rows_per_page: parse_or(&lookup, ENV_ROWS_PER_PAGE, defaults.rows_per_page),
            utc_offset_minutes: parse_or(
                &lookup,
                ENV_UTC_OFFSET_MINUTES,
                defaults.utc_offset_minutes,
            ),
        }
    }

    /// Checks every field that has a constrained range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level)
            .map_err(|err| ConfigError::InvalidLogLevel(err.to_string()))?;
        if let Some(dir) = &self.log_dir {
            normalize_log_dir(dir).map_err(|err| ConfigError::InvalidLogDir(err.to_string()))?;
        }
        if self.saved_clear_after_ms < 0 {
            return Err(ConfigError::InvalidValue {
                key: ENV_SAVED_CLEAR_MS,
                message: "must not be negative".to_string(),
            });
        }
        if self.rows_per_page == 0 {
            return Err(ConfigError::InvalidValue {
                key: ENV_ROWS_PER_PAGE,
                message: "must be at least 1".to_string(),
            });
        }
        if self.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::InvalidValue {
                key: ENV_UTC_OFFSET_MINUTES,
                message: "must be within +/-23:59".to_string(),
            });
        }
        Ok(())
    }

    /// Export settings derived from this configuration.
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            rows_per_page: self.rows_per_page,
            utc_offset_minutes: self.utc_offset_minutes,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(err) => {
            warn!("event=config_load module=config status=fallback key={key} error={err}");
            info!("event=config_load module=config status=default key={key} value={default}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_ROWS_PER_PAGE, ENV_SAVED_CLEAR_MS};
    use crate::engine::SortOrder;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_validate() {
        let config = CoreConfig::default();
        config.validate().expect("defaults should be valid");
        assert_eq!(config.sort_order, SortOrder::Name);
        assert_eq!(config.saved_clear_after_ms, 2_000);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn lookup_overrides_and_falls_back_on_garbage() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            ("ROLLCALL_SORT", "roster"),
            ("ROLLCALL_ROWS_PER_PAGE", "25"),
            ("ROLLCALL_SAVED_CLEAR_MS", "soon"),
            ("ROLLCALL_DB", "/tmp/rollcall.sqlite3"),
        ]));
        assert_eq!(config.sort_order, SortOrder::Roster);
        assert_eq!(config.rows_per_page, 25);
        assert_eq!(config.saved_clear_after_ms, 2_000);
        assert_eq!(
            config.db_path.as_deref(),
            Some(std::path::Path::new("/tmp/rollcall.sqlite3"))
        );
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let config = CoreConfig {
            rows_per_page: 0,
            ..CoreConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == ENV_ROWS_PER_PAGE
        ));

        let config = CoreConfig {
            saved_clear_after_ms: -1,
            ..CoreConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == ENV_SAVED_CLEAR_MS
        ));

        let config = CoreConfig {
            log_dir: Some("relative/logs".to_string()),
            ..CoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLogDir(_))));
    }
}
