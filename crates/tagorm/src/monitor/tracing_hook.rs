use super::truncate_sql_bytes;
use super::types::{HookAction, QueryContext, QueryHook, QueryResult};
use std::time::Duration;
use tracing::Level;

/// A `tracing`-based hook that emits every statement before it runs.
///
/// Events go to target `tagorm.sql` with fields `query_type`, `table`,
/// `param_count`, `sql` and (unless disabled) `args`. Failures are reported
/// again after execution at `WARN`.
#[derive(Debug, Clone)]
pub struct TracingSqlHook {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Whether argument values are included in the event.
    pub log_args: bool,
}

impl Default for TracingSqlHook {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
            log_args: true,
        }
    }
}

impl TracingSqlHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Leave argument values out of the emitted events.
    pub fn hide_args(mut self) -> Self {
        self.log_args = false;
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    fn emit(&self, ctx: &QueryContext<'_>, sql: &str) {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let table = ctx.table.unwrap_or("-");
        if self.log_args {
            emit_at_level!(
                self.level,
                target: "tagorm.sql",
                query_type = ?ctx.query_type,
                table,
                param_count = ctx.param_count(),
                sql = %sql,
                args = ?ctx.args,
            );
        } else {
            emit_at_level!(
                self.level,
                target: "tagorm.sql",
                query_type = ?ctx.query_type,
                table,
                param_count = ctx.param_count(),
                sql = %sql,
            );
        }
    }
}

impl QueryHook for TracingSqlHook {
    fn before_query(&self, ctx: &QueryContext<'_>) -> HookAction {
        let sql = self.truncate_sql(ctx.sql);
        self.emit(ctx, &sql);
        HookAction::Continue
    }

    fn after_query(&self, ctx: &QueryContext<'_>, duration: Duration, result: &QueryResult) {
        if let QueryResult::Error(message) = result {
            tracing::warn!(
                target: "tagorm.sql",
                query_type = ?ctx.query_type,
                sql = %self.truncate_sql(ctx.sql),
                ?duration,
                error = %message,
                "query failed"
            );
        }
    }
}
