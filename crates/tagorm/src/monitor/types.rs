use crate::value::Value;
use std::fmt;
use std::time::Duration;

/// The kind of statement being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Upsert,
    Update,
    Delete,
    /// Anything else (DDL, raw statements, transaction control)
    Other,
}

impl QueryType {
    /// Detect the statement kind from its leading keyword.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = sql.trim_start();
        let keyword = trimmed
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or("");
        if keyword.eq_ignore_ascii_case("select") {
            QueryType::Select
        } else if keyword.eq_ignore_ascii_case("insert") {
            if trimmed
                .to_ascii_lowercase()
                .contains(" on duplicate key update ")
            {
                QueryType::Upsert
            } else {
                QueryType::Insert
            }
        } else if keyword.eq_ignore_ascii_case("update") {
            QueryType::Update
        } else if keyword.eq_ignore_ascii_case("delete") {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }
}

/// What a hook sees of a query about to run.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a> {
    /// SQL text handed to the executor.
    pub sql: &'a str,
    /// Arguments in placeholder order.
    pub args: &'a [Value],
    pub query_type: QueryType,
    /// Table the statement was generated for; `None` for raw SQL.
    pub table: Option<&'a str>,
}

impl<'a> QueryContext<'a> {
    pub fn new(sql: &'a str, args: &'a [Value]) -> Self {
        Self {
            sql,
            args,
            query_type: QueryType::from_sql(sql),
            table: None,
        }
    }

    pub fn with_table(mut self, table: &'a str) -> Self {
        self.table = Some(table);
        self
    }

    pub fn with_query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = query_type;
        self
    }

    pub fn param_count(&self) -> usize {
        self.args.len()
    }
}

/// Maximum length for error messages in `QueryResult::Error`.
const MAX_ERROR_LEN: usize = 512;

/// Outcome of a query, as reported to [`QueryHook::after_query`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Query returned rows.
    Rows(usize),
    /// Statement affected rows.
    Affected(u64),
    /// Query failed (message truncated to 512 bytes).
    Error(String),
}

impl QueryResult {
    /// Create an error result, truncating the message.
    pub fn error(msg: String) -> Self {
        if msg.len() > MAX_ERROR_LEN {
            Self::Error(format!("{}...", super::truncate_sql_bytes(&msg, MAX_ERROR_LEN)))
        } else {
            Self::Error(msg)
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Affected(n) => write!(f, "{n} affected"),
            QueryResult::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Action to take after a hook inspected a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// Run the query.
    Continue,
    /// Do not run the query; the caller gets [`OrmError::Aborted`](crate::OrmError::Aborted).
    Abort(String),
}

/// Observes every statement tagorm runs.
///
/// `before_query` sees the final SQL and arguments before they reach the
/// executor; `after_query` sees the outcome.
pub trait QueryHook: Send + Sync {
    fn before_query(&self, ctx: &QueryContext<'_>) -> HookAction {
        let _ = ctx;
        HookAction::Continue
    }

    fn after_query(&self, _ctx: &QueryContext<'_>, _duration: Duration, _result: &QueryResult) {}
}
