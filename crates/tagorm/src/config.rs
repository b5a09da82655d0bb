use crate::monitor::TracingSqlHook;
use std::time::Duration;
use tracing::Level;

/// Configuration for a [`Db`](crate::Db) handle.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Whether statements are logged through `tracing` before execution.
    pub logging_enabled: bool,
    /// Level of the per-statement log event.
    pub log_level: Level,
    /// Truncate logged SQL to at most this many bytes, cut back to a char
    /// boundary. `None` logs the full text.
    pub max_sql_length: Option<usize>,
    /// Whether argument values are logged alongside the SQL.
    pub log_args: bool,
    /// Statements slower than this are logged again at `WARN`.
    pub slow_query_threshold: Option<Duration>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            logging_enabled: true,
            log_level: Level::DEBUG,
            max_sql_length: Some(200),
            log_args: true,
            slow_query_threshold: None,
        }
    }
}

impl DbConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn statement logging off entirely.
    pub fn no_logging(mut self) -> Self {
        self.logging_enabled = false;
        self
    }

    pub fn log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Log SQL without truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Keep argument values out of the logs.
    pub fn hide_args(mut self) -> Self {
        self.log_args = false;
        self
    }

    pub fn slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// The logging hook described by this configuration, if logging is enabled.
    pub(crate) fn tracing_hook(&self) -> Option<TracingSqlHook> {
        self.logging_enabled.then(|| TracingSqlHook {
            level: self.log_level,
            max_sql_length: self.max_sql_length,
            log_args: self.log_args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_log_at_debug_with_args() {
        let config = DbConfig::default();
        let hook = config.tracing_hook().unwrap();
        assert_eq!(hook.level, Level::DEBUG);
        assert_eq!(hook.max_sql_length, Some(200));
        assert!(hook.log_args);
        assert!(config.slow_query_threshold.is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = DbConfig::new()
            .log_level(Level::INFO)
            .no_truncate()
            .hide_args()
            .slow_query_threshold(Duration::from_millis(50));
        let hook = config.tracing_hook().unwrap();
        assert_eq!(hook.level, Level::INFO);
        assert_eq!(hook.max_sql_length, None);
        assert!(!hook.log_args);
        assert_eq!(config.slow_query_threshold, Some(Duration::from_millis(50)));

        assert!(DbConfig::new().no_logging().tracing_hook().is_none());
    }

    #[test]
    fn sql_length_counts_bytes() {
        // "é" takes two bytes.
        let hook = DbConfig::new().max_sql_length(3).tracing_hook().unwrap();
        assert_eq!(hook.truncate_sql("héllo"), "hé...");
        let hook = DbConfig::new().max_sql_length(2).tracing_hook().unwrap();
        assert_eq!(hook.truncate_sql("héllo"), "h...");
    }
}
