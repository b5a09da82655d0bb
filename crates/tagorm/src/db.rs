//! The [`Db`] handle.

use crate::client::{Connection, ExecResult, Executor};
use crate::collection::ResultCollection;
use crate::config::DbConfig;
use crate::error::OrmResult;
use crate::monitor::{CompositeHook, QueryHook};
use crate::record::Record;
use crate::registry::TypeRegistry;
use crate::row::Row;
use crate::session::{Session, SessionState, build_state};
use crate::table::Table;
use crate::transaction::Tx;
use crate::value::Value;
use std::sync::Arc;

/// An executor together with a record registry and query hooks.
///
/// Record-typed operations resolve the table from [`Record::TABLE`]; use
/// [`table`](Self::table) to address a table by name.
///
/// ```ignore
/// let db = Db::new(SqliteExecutor::open_in_memory()?);
/// db.insert(&User { id: 1, name: "ann".into() }).await?;
///
/// let mut users: Vec<User> = Vec::new();
/// db.select(&mut users, "name = ?", &args!["ann"]).await?;
/// ```
pub struct Db<E> {
    executor: E,
    state: SessionState,
}

#[derive(Clone, Copy)]
enum BatchOp {
    Insert,
    Update,
    Save,
}

impl<E: Executor> Db<E> {
    /// Wrap `executor` with the default configuration.
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, DbConfig::default())
    }

    pub fn with_config(executor: E, config: DbConfig) -> Self {
        let mut hook = CompositeHook::new();
        if let Some(tracing_hook) = config.tracing_hook() {
            hook = hook.add(tracing_hook);
        }
        Self {
            executor,
            state: build_state(
                Arc::new(TypeRegistry::new()),
                hook,
                config.slow_query_threshold,
            ),
        }
    }

    /// Install an additional hook, run after the ones already installed.
    pub fn with_hook<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.state.hook = std::mem::take(&mut self.state.hook).add(hook);
        self
    }

    /// Share a registry with other handles.
    pub fn with_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.state.registry = registry;
        self
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.state.registry
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    pub fn session(&self) -> Session<'_, E> {
        Session::new(&self.executor, &self.state)
    }

    pub fn table(&self, name: impl Into<String>) -> Table<'_, E> {
        self.session().table(name)
    }

    /// Run raw SQL through the hooks and the executor.
    pub async fn exec(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.session().exec(sql, args).await
    }

    pub async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        self.session().query(sql, args).await
    }

    pub async fn insert<T: Record>(&self, record: &T) -> OrmResult<ExecResult> {
        self.session().insert(record).await
    }

    /// Update by primary key. See [`Session::update`].
    pub async fn update<T: Record>(&self, record: &T) -> OrmResult<ExecResult> {
        self.session().update(record).await
    }

    /// Upsert `record`.
    pub async fn save<T: Record>(&self, record: &T) -> OrmResult<ExecResult> {
        self.session().save(record).await
    }

    pub async fn select<C: ResultCollection>(
        &self,
        out: &mut C,
        where_clause: &str,
        args: &[Value],
    ) -> OrmResult<()> {
        self.session().select(out, where_clause, args).await
    }

    pub async fn select_one<T: Record + Clone>(
        &self,
        record: &mut T,
        where_clause: &str,
        args: &[Value],
    ) -> OrmResult<()> {
        self.session().select_one(record, where_clause, args).await
    }

    pub async fn delete<T: Record>(&self, where_clause: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.session().delete::<T>(where_clause, args).await
    }
}

impl<E: Connection> Db<E> {
    /// Open a transaction.
    pub async fn begin(&self) -> OrmResult<Tx<'_, E::Transaction<'_>>> {
        let inner = self.executor.begin().await?;
        Ok(Tx::new(inner, &self.state))
    }

    /// Insert every record in one transaction.
    ///
    /// The first failure rolls the whole batch back. Returns the total number
    /// of affected rows.
    pub async fn multi_insert<T: Record>(&self, records: &[T]) -> OrmResult<u64> {
        self.run_batch(BatchOp::Insert, records).await
    }

    /// Update every record by primary key in one transaction.
    pub async fn multi_update<T: Record>(&self, records: &[T]) -> OrmResult<u64> {
        self.run_batch(BatchOp::Update, records).await
    }

    /// Upsert every record in one transaction.
    pub async fn multi_save<T: Record>(&self, records: &[T]) -> OrmResult<u64> {
        self.run_batch(BatchOp::Save, records).await
    }

    async fn run_batch<T: Record>(&self, op: BatchOp, records: &[T]) -> OrmResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let tx = self.begin().await?;
        let result = async {
            let mut affected = 0;
            for record in records {
                let done = match op {
                    BatchOp::Insert => tx.insert(record).await?,
                    BatchOp::Update => tx.update(record).await?,
                    BatchOp::Save => tx.save(record).await?,
                };
                affected += done.rows_affected;
            }
            Ok(affected)
        };
        let result = crate::transaction::__tx_body(result).await;
        tx.finish(result).await
    }
}
