//! SQLite executor backed by `rusqlite`.
//!
//! The connection sits behind an async mutex. An open [`SqliteTransaction`]
//! holds that mutex until it commits, rolls back or is dropped, so other
//! statements on the same executor wait for it.
//!
//! SQLite has no `on duplicate key update`; upserts through this executor
//! fail with the driver's syntax error.

use crate::client::{Connection, ExecResult, Executor, TransactionExecutor};
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use rusqlite::types::{ToSqlOutput, Value as SqlValue};
use rusqlite::{ToSql, params_from_iter};
use std::path::Path;
use std::sync::{Arc, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A shared SQLite connection.
#[derive(Clone)]
pub struct SqliteExecutor {
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteExecutor {
    pub fn new(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> OrmResult<Self> {
        Ok(Self::new(rusqlite::Connection::open(path)?))
    }

    pub fn open_in_memory() -> OrmResult<Self> {
        Ok(Self::new(rusqlite::Connection::open_in_memory()?))
    }

    /// Run a batch of `;`-separated statements without arguments.
    pub async fn execute_batch(&self, sql: &str) -> OrmResult<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

impl Executor for SqliteExecutor {
    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        let conn = self.conn.lock().await;
        execute_on(&conn, sql, args)
    }

    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        let conn = self.conn.lock().await;
        query_on(&conn, sql, args)
    }
}

impl Connection for SqliteExecutor {
    type Transaction<'c> = SqliteTransaction;

    async fn begin(&self) -> OrmResult<Self::Transaction<'_>> {
        let conn = self.conn.clone().lock_owned().await;
        conn.execute_batch("BEGIN")?;
        Ok(SqliteTransaction {
            conn: std::sync::Mutex::new(Some(conn)),
        })
    }
}

/// An open SQLite transaction. Rolled back on drop unless committed.
pub struct SqliteTransaction {
    conn: std::sync::Mutex<Option<OwnedMutexGuard<rusqlite::Connection>>>,
}

impl SqliteTransaction {
    fn with_conn<R>(&self, f: impl FnOnce(&rusqlite::Connection) -> OrmResult<R>) -> OrmResult<R> {
        let guard = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_deref() {
            Some(conn) => f(conn),
            None => Err(OrmError::Other("transaction already finished".into())),
        }
    }

    fn take(&mut self) -> OrmResult<OwnedMutexGuard<rusqlite::Connection>> {
        self.conn
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| OrmError::Other("transaction already finished".into()))
    }
}

impl Executor for SqliteTransaction {
    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        self.with_conn(|conn| execute_on(conn, sql, args))
    }

    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        self.with_conn(|conn| query_on(conn, sql, args))
    }
}

impl TransactionExecutor for SqliteTransaction {
    async fn commit(mut self) -> OrmResult<()> {
        let conn = self.take()?;
        if let Err(err) = conn.execute_batch("COMMIT") {
            // A failed COMMIT can leave the transaction open.
            if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                tracing::warn!(
                    target: "tagorm.tx",
                    error = %rollback,
                    commit_error = %err,
                    "rollback after failed commit failed"
                );
            }
            return Err(err.into());
        }
        Ok(())
    }

    async fn rollback(mut self) -> OrmResult<()> {
        let conn = self.take()?;
        conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        let Some(conn) = self.conn.get_mut().unwrap_or_else(PoisonError::into_inner).take() else {
            return;
        };
        if let Err(err) = conn.execute_batch("ROLLBACK") {
            tracing::warn!(target: "tagorm.tx", error = %err, "rollback on drop failed");
        }
    }
}

fn execute_on(conn: &rusqlite::Connection, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
    let affected = conn.execute(sql, params_from_iter(args.iter()))?;
    Ok(ExecResult::new(affected as u64).with_last_insert_id(conn.last_insert_rowid()))
}

fn query_on(conn: &rusqlite::Connection, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Arc<[String]> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();

    let mut rows = stmt.query(params_from_iter(args.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            let value: SqlValue = row.get(idx)?;
            values.push(from_sql_value(value));
        }
        out.push(Row::new(columns.clone(), values));
    }
    Ok(out)
}

fn from_sql_value(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(v) => Value::Int(v),
        SqlValue::Real(v) => Value::Float(v),
        SqlValue::Text(v) => Value::Text(v),
        SqlValue::Blob(v) => Value::Bytes(v),
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            Value::Null => SqlValue::Null,
            Value::Bool(v) => SqlValue::Integer(i64::from(*v)),
            Value::Int(v) => SqlValue::Integer(*v),
            Value::Float(v) => SqlValue::Real(*v),
            Value::Text(v) => return Ok(ToSqlOutput::from(v.as_str())),
            Value::Bytes(v) => return Ok(ToSqlOutput::from(v.as_slice())),
            Value::Json(v) => SqlValue::Text(v.to_string()),
            Value::Date(v) => SqlValue::Text(v.format("%Y-%m-%d").to_string()),
            Value::DateTime(v) => SqlValue::Text(v.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            Value::Timestamp(v) => SqlValue::Text(v.to_rfc3339()),
            Value::Uuid(v) => SqlValue::Text(v.to_string()),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rows_carry_column_names_and_values() {
        let exec = SqliteExecutor::open_in_memory().unwrap();
        exec.execute_batch("create table t (id integer, name text, score real, raw blob)")
            .await
            .unwrap();
        let done = exec
            .execute(
                "insert into t(id,name,score,raw) values (?,?,?,?)",
                &[
                    Value::Int(1),
                    Value::Text("a".into()),
                    Value::Float(1.5),
                    Value::Bytes(vec![1, 2]),
                ],
            )
            .await
            .unwrap();
        assert_eq!(done.rows_affected, 1);
        assert_eq!(done.last_insert_id, Some(1));

        let rows = exec.query("select id,name,score,raw from t", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns(), ["id", "name", "score", "raw"]);
        assert_eq!(
            rows[0].values(),
            [
                Value::Int(1),
                Value::Text("a".into()),
                Value::Float(1.5),
                Value::Bytes(vec![1, 2])
            ]
        );
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let exec = SqliteExecutor::open_in_memory().unwrap();
        exec.execute_batch("create table t (id integer)").await.unwrap();
        {
            let tx = exec.begin().await.unwrap();
            tx.execute("insert into t(id) values (?)", &[Value::Int(1)])
                .await
                .unwrap();
        }
        let rows = exec.query("select id from t", &[]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn failed_commit_rolls_back_and_releases_the_connection() {
        let exec = SqliteExecutor::open_in_memory().unwrap();
        exec.execute_batch(
            "pragma foreign_keys = on;
             create table parent (id integer primary key);
             create table child (
                 id integer primary key,
                 parent_id integer references parent(id) deferrable initially deferred
             );",
        )
        .await
        .unwrap();

        let tx = exec.begin().await.unwrap();
        tx.execute(
            "insert into child(id, parent_id) values (?, ?)",
            &[Value::Int(1), Value::Int(99)],
        )
        .await
        .unwrap();
        let err = tx.commit().await.unwrap_err();
        assert!(err.as_driver_error().is_some(), "{err}");

        // The connection is free again and the orphan row is gone.
        let rows = exec.query("select id from child", &[]).await.unwrap();
        assert!(rows.is_empty());
        let tx = exec.begin().await.unwrap();
        tx.execute("insert into parent(id) values (?)", &[Value::Int(99)])
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn bool_and_uuid_arguments_are_stored_as_integer_and_text() {
        let exec = SqliteExecutor::open_in_memory().unwrap();
        let id = uuid::Uuid::new_v4();
        let rows = exec
            .query("select ?, ?", &[Value::Bool(true), Value::Uuid(id)])
            .await
            .unwrap();
        assert_eq!(
            rows[0].values(),
            [Value::Int(1), Value::Text(id.to_string())]
        );
    }
}
