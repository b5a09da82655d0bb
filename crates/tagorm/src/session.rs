//! Executor-bound operations shared by [`Db`](crate::Db) and [`Tx`](crate::Tx).

use crate::client::{ExecResult, Executor};
use crate::collection::ResultCollection;
use crate::error::{OrmError, OrmResult};
use crate::monitor::{CompositeHook, HookAction, QueryContext, QueryHook, QueryResult, QueryType};
use crate::query::{self, Query};
use crate::record::{Columns, Record};
use crate::registry::TypeRegistry;
use crate::row::Row;
use crate::table::Table;
use crate::value::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// State shared by every session of one `Db` handle.
pub(crate) struct SessionState {
    pub(crate) registry: Arc<TypeRegistry>,
    pub(crate) hook: CompositeHook,
    pub(crate) slow_query_threshold: Option<Duration>,
}

/// An executor paired with the handle's registry and hooks.
///
/// Obtained from [`Db::session`](crate::Db::session) or
/// [`Tx::session`](crate::Tx::session); cheap to copy.
pub struct Session<'a, E> {
    executor: &'a E,
    state: &'a SessionState,
}

impl<E> Clone for Session<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Session<'_, E> {}

impl<'a, E: Executor> Session<'a, E> {
    pub(crate) fn new(executor: &'a E, state: &'a SessionState) -> Self {
        Self { executor, state }
    }

    pub fn executor(&self) -> &'a E {
        self.executor
    }

    pub fn registry(&self) -> &'a TypeRegistry {
        &self.state.registry
    }

    /// Bind operations to a table.
    pub fn table(&self, name: impl Into<String>) -> Table<'a, E> {
        Table::new(*self, name.into())
    }

    /// Run raw SQL that returns no rows.
    pub async fn exec(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        let ctx = QueryContext::new(sql, args);
        self.run_execute(ctx).await
    }

    /// Run a raw query and return its rows.
    pub async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        let ctx = QueryContext::new(sql, args);
        self.run_query(ctx).await
    }

    /// Insert `record` into `T::TABLE`.
    pub async fn insert<T: Record>(&self, record: &T) -> OrmResult<ExecResult> {
        self.table(T::TABLE).insert(record).await
    }

    /// Update the row whose primary key matches `record`.
    ///
    /// Every non-key column is written. Fails with `InvalidArgument` when `T`
    /// has no `#[orm(id)]` field or has only key fields.
    pub async fn update<T: Record>(&self, record: &T) -> OrmResult<ExecResult> {
        let info = self.registry().field_info::<T>()?;

        let mut names = Vec::with_capacity(info.len());
        let mut values = Vec::with_capacity(info.len());
        let mut where_clause = String::new();
        let mut where_args = Vec::new();
        for field in info.fields() {
            if field.is_primary_key() {
                if !where_clause.is_empty() {
                    where_clause.push_str(" and ");
                }
                where_clause.push_str(field.column());
                where_clause.push_str(" = ?");
                where_args.push(field.get(record)?);
            } else {
                names.push(field.column().to_string());
                values.push(field.get(record)?);
            }
        }

        let type_name = std::any::type_name::<T>();
        if where_args.is_empty() {
            return Err(OrmError::invalid_argument(format!(
                "{type_name} has no primary key; use Table::update with an explicit where clause"
            )));
        }
        if names.is_empty() {
            return Err(OrmError::invalid_argument(format!(
                "{type_name} has no columns outside its primary key"
            )));
        }

        let columns = Columns {
            names: names.into(),
            values,
        };
        self.table(T::TABLE)
            .update_columns(columns, &where_clause, &where_args)
            .await
    }

    /// Insert `record`, or overwrite the existing row with the same unique key.
    pub async fn save<T: Record>(&self, record: &T) -> OrmResult<ExecResult> {
        self.table(T::TABLE).upsert(record).await
    }

    /// Select rows of `C::Record::TABLE` into `out`.
    pub async fn select<C: ResultCollection>(
        &self,
        out: &mut C,
        where_clause: &str,
        args: &[Value],
    ) -> OrmResult<()> {
        self.table(<C::Record as Record>::TABLE)
            .select(out, where_clause, args)
            .await
    }

    /// Populate `record` from the first matching row of `T::TABLE`.
    pub async fn select_one<T: Record + Clone>(
        &self,
        record: &mut T,
        where_clause: &str,
        args: &[Value],
    ) -> OrmResult<()> {
        self.table(T::TABLE)
            .select_one(record, where_clause, args)
            .await
    }

    /// Delete rows of `T::TABLE`.
    pub async fn delete<T: Record>(&self, where_clause: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.table(T::TABLE).delete(where_clause, args).await
    }

    pub(crate) async fn execute_query(
        &self,
        query: &Query,
        table: &str,
        query_type: QueryType,
    ) -> OrmResult<ExecResult> {
        let ctx = QueryContext::new(&query.sql, &query.args)
            .with_table(table)
            .with_query_type(query_type);
        self.run_execute(ctx).await
    }

    pub(crate) async fn fetch_query(&self, query: &Query, table: &str) -> OrmResult<Vec<Row>> {
        let ctx = QueryContext::new(&query.sql, &query.args)
            .with_table(table)
            .with_query_type(QueryType::Select);
        self.run_query(ctx).await
    }

    async fn run_execute(&self, ctx: QueryContext<'_>) -> OrmResult<ExecResult> {
        self.before(&ctx)?;
        let started = Instant::now();
        let result = self.executor.execute(ctx.sql, ctx.args).await;
        let outcome = match &result {
            Ok(r) => QueryResult::Affected(r.rows_affected),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.after(&ctx, started.elapsed(), &outcome);
        result
    }

    async fn run_query(&self, ctx: QueryContext<'_>) -> OrmResult<Vec<Row>> {
        self.before(&ctx)?;
        let started = Instant::now();
        let result = self.executor.query(ctx.sql, ctx.args).await;
        let outcome = match &result {
            Ok(rows) => QueryResult::Rows(rows.len()),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.after(&ctx, started.elapsed(), &outcome);
        result
    }

    fn before(&self, ctx: &QueryContext<'_>) -> OrmResult<()> {
        match self.state.hook.before_query(ctx) {
            HookAction::Continue => Ok(()),
            HookAction::Abort(reason) => Err(OrmError::Aborted(reason)),
        }
    }

    fn after(&self, ctx: &QueryContext<'_>, duration: Duration, outcome: &QueryResult) {
        if let Some(threshold) = self.state.slow_query_threshold
            && duration >= threshold
        {
            tracing::warn!(
                target: "tagorm.sql",
                query_type = ?ctx.query_type,
                table = ctx.table.unwrap_or("-"),
                sql = %ctx.sql,
                ?duration,
                "slow query"
            );
        }
        self.state.hook.after_query(ctx, duration, outcome);
    }
}

pub(crate) fn build_state(
    registry: Arc<TypeRegistry>,
    hook: CompositeHook,
    slow_query_threshold: Option<Duration>,
) -> SessionState {
    SessionState {
        registry,
        hook,
        slow_query_threshold,
    }
}

/// Build the select for a record type; shared by `select` and `select_one`.
pub(crate) fn select_query<T: Record>(
    registry: &TypeRegistry,
    table: &str,
    where_clause: &str,
    args: &[Value],
) -> OrmResult<(Arc<crate::record::FieldInfo<T>>, Query)> {
    let info = registry.field_info::<T>()?;
    let query = query::select(table, info.columns(), where_clause, args)?;
    Ok((info, query))
}
