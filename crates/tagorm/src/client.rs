//! Executor traits: the seam between statement generation and a database driver.
//!
//! tagorm never talks to a database itself. It hands SQL text with `?`
//! placeholders and an ordered argument list to an [`Executor`] and maps what
//! comes back. Errors from the executor are returned to the caller unchanged.

use crate::error::OrmResult;
use crate::row::Row;
use crate::value::Value;
use std::future::Future;

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Number of rows inserted, updated or deleted.
    pub rows_affected: u64,
    /// Id generated by the last insert, if the backend reports one.
    pub last_insert_id: Option<i64>,
}

impl ExecResult {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
        }
    }

    pub fn with_last_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = Some(id);
        self
    }
}

/// Runs parameterized SQL.
///
/// Implemented by connections and by open transactions, so the same table
/// operations work inside and outside a transaction.
pub trait Executor: Send + Sync {
    /// Execute a statement and report the affected row count.
    fn execute(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = OrmResult<ExecResult>> + Send;

    /// Execute a query and return all rows, in the order the backend produced them.
    fn query(&self, sql: &str, args: &[Value]) -> impl Future<Output = OrmResult<Vec<Row>>> + Send;
}

/// An executor that can open a transaction.
pub trait Connection: Executor {
    type Transaction<'c>: TransactionExecutor
    where
        Self: 'c;

    /// Begin a transaction.
    fn begin(&self) -> impl Future<Output = OrmResult<Self::Transaction<'_>>> + Send;
}

/// An open transaction.
///
/// Dropping a transaction without calling [`commit`](Self::commit) must not
/// commit it.
pub trait TransactionExecutor: Executor + Sized {
    fn commit(self) -> impl Future<Output = OrmResult<()>> + Send;

    fn rollback(self) -> impl Future<Output = OrmResult<()>> + Send;
}
