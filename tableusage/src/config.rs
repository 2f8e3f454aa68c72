use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::source::TimeWindow;
use crate::usage::AggregateOptions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings of a usage run. Every field has a default, so `{}` is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UsageConfig {
    pub dialect: Dialect,
    /// Length of the trailing window [`UsageConfig::window_ending`] builds.
    pub window_days: u32,
    /// Limit for the schema fetch and for draining the query history, each.
    pub fetch_timeout_secs: Option<u64>,
    pub workers: usize,
    pub batch_size: usize,
    pub count_columns: bool,
    pub include_failed_queries: bool,
    pub use_session_context: bool,
}

impl Default for UsageConfig {
    fn default() -> Self {
        let options = AggregateOptions::default();
        Self {
            dialect: Dialect::default(),
            window_days: 5,
            fetch_timeout_secs: None,
            workers: options.workers,
            batch_size: options.batch_size,
            count_columns: options.count_columns,
            include_failed_queries: options.include_failed_queries,
            use_session_context: options.use_session_context,
        }
    }
}

impl UsageConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_fetch_timeout(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = Some(secs);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_days == 0 {
            return Err(Error::Config("window_days must be at least 1".to_string()));
        }
        if self.workers == 0 {
            return Err(Error::Config("workers must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            count_columns: self.count_columns,
            include_failed_queries: self.include_failed_queries,
            use_session_context: self.use_session_context,
            workers: self.workers,
            batch_size: self.batch_size,
        }
    }

    /// The `window_days` days up to the end of the day after `now`.
    pub fn window_ending(&self, now: DateTime<Utc>) -> Result<TimeWindow> {
        Ok(TimeWindow::trailing_days(now, self.window_days)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults() -> Result<()> {
        let config = UsageConfig::from_json_str("{}")?;
        assert_eq!(config, UsageConfig::default());
        assert_eq!(config.dialect, Dialect::Snowflake);
        assert_eq!(config.window_days, 5);
        assert_eq!(config.fetch_timeout(), None);
        assert_eq!(config.aggregate_options(), AggregateOptions::default());
        Ok(())
    }

    #[test]
    fn from_path() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"{{"dialect": "postgres", "window_days": 7, "fetch_timeout_secs": 30, "workers": 4}}"#
        )?;
        let config = UsageConfig::from_path(file.path())?;
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.fetch_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.aggregate_options().workers, 4);
        assert!(config.count_columns);

        let now = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
        let window = config.window_ending(now)?;
        assert_eq!(
            window.since(),
            Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
        );
        Ok(())
    }

    #[test]
    fn invalid() {
        assert!(matches!(
            UsageConfig::from_json_str(r#"{"dialect": "oracle"}"#),
            Err(Error::Json(_))
        ));
        assert!(matches!(
            UsageConfig::from_json_str(r#"{"windows_days": 3}"#),
            Err(Error::Json(_))
        ));
        assert!(matches!(
            UsageConfig::from_json_str(r#"{"workers": 0}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            UsageConfig::from_path("/nonexistent/usage.json"),
            Err(Error::IO(_))
        ));
    }
}
