//! Transactions: [`Tx`] and the [`transaction!`] macro.
//!
//! A `Tx` is opened with [`Db::begin`](crate::Db::begin) and offers the same
//! record operations as the `Db` handle, routed through the open transaction.
//! Dropping a `Tx` without committing leaves the decision to the executor,
//! which must not commit.
//!
//! # Example
//!
//! ```ignore
//! use tagorm::{args, OrmResult};
//!
//! # async fn demo(db: &tagorm::Db<tagorm::sqlite::SqliteExecutor>) -> OrmResult<()> {
//! tagorm::transaction!(db, tx, {
//!     tx.insert(&order).await?;
//!     tx.table("stock")
//!         .update(&NamedFields::new().set("reserved", true), "sku = ?", &args![order.sku])
//!         .await?;
//!     Ok(())
//! })?;
//! # Ok(()) }
//! ```

use crate::client::{ExecResult, TransactionExecutor};
use crate::collection::ResultCollection;
use crate::error::{OrmError, OrmResult};
use crate::record::Record;
use crate::row::Row;
use crate::session::{Session, SessionState};
use crate::table::Table;
use crate::value::Value;
use std::future::Future;

/// Runs the given block inside a transaction opened on `$db`.
///
/// - Begins a transaction via `$db.begin().await`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)` and returns the block's error.
///
/// The block must evaluate to `tagorm::OrmResult<T>`; `?` inside it leaves the
/// block, not the enclosing function.
#[macro_export]
macro_rules! transaction {
    ($db:expr, $tx:ident, $body:block) => {{
        match ($db).begin().await {
            Ok($tx) => {
                let __tagorm_tx_result = $crate::__tx_body(async { $body }).await;
                $tx.finish(__tagorm_tx_result).await
            }
            Err(error) => Err(error),
        }
    }};
}

#[doc(hidden)]
pub async fn __tx_body<T, F>(body: F) -> OrmResult<T>
where
    F: Future<Output = OrmResult<T>>,
{
    body.await
}

/// An open transaction bound to a `Db` handle's registry and hooks.
pub struct Tx<'a, X> {
    inner: X,
    state: &'a SessionState,
}

impl<'a, X: TransactionExecutor> Tx<'a, X> {
    pub(crate) fn new(inner: X, state: &'a SessionState) -> Self {
        Self { inner, state }
    }

    pub fn session(&self) -> Session<'_, X> {
        Session::new(&self.inner, self.state)
    }

    pub fn table(&self, name: impl Into<String>) -> Table<'_, X> {
        self.session().table(name)
    }

    pub async fn exec(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.session().exec(sql, args).await
    }

    pub async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        self.session().query(sql, args).await
    }

    pub async fn insert<T: Record>(&self, record: &T) -> OrmResult<ExecResult> {
        self.session().insert(record).await
    }

    pub async fn update<T: Record>(&self, record: &T) -> OrmResult<ExecResult> {
        self.session().update(record).await
    }

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

    pub async fn commit(self) -> OrmResult<()> {
        self.inner.commit().await
    }

    pub async fn rollback(self) -> OrmResult<()> {
        self.inner.rollback().await
    }

    /// Commit if `result` is `Ok`, otherwise roll back and return its error.
    ///
    /// A failed rollback is reported as [`OrmError::RollbackFailed`] carrying
    /// both errors.
    pub async fn finish<T>(self, result: OrmResult<T>) -> OrmResult<T> {
        match result {
            Ok(value) => {
                self.inner.commit().await?;
                Ok(value)
            }
            Err(error) => {
                tracing::warn!(target: "tagorm.tx", %error, "rolling back transaction");
                match self.inner.rollback().await {
                    Ok(()) => Err(error),
                    Err(rollback) => Err(OrmError::RollbackFailed {
                        error: Box::new(error),
                        rollback: Box::new(rollback),
                    }),
                }
            }
        }
    }
}
