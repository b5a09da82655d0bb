//! # tagorm
//!
//! A lightweight record mapper: typed structs in, parameterized SQL out.
//!
//! ## Features
//!
//! - **Derived mapping**: `#[derive(Record)]` describes a struct's columns once;
//!   the description is cached per type in a [`TypeRegistry`]
//! - **Plain SQL**: statements use `?` placeholders and caller-written `WHERE`
//!   clauses; nothing is hidden behind a query DSL
//! - **Executor-agnostic**: any driver implementing [`Executor`] works, and a
//!   SQLite executor ships behind the `sqlite` feature
//! - **Batches in transactions**: `multi_insert`, `multi_update` and
//!   `multi_save` commit all records or none
//! - **Query hooks**: every statement passes through [`QueryHook`]s before it
//!   runs, with `tracing` logging installed by default
//!
//! ## Example
//!
//! ```ignore
//! use tagorm::{args, Db, NamedFields, Record};
//! use tagorm::sqlite::SqliteExecutor;
//!
//! #[derive(Debug, Default, Clone, Record)]
//! #[orm(table = "users")]
//! struct User {
//!     #[orm(id)]
//!     id: i64,
//!     name: String,
//! }
//!
//! let db = Db::new(SqliteExecutor::open_in_memory()?);
//! db.insert(&User { id: 1, name: "ann".into() }).await?;
//!
//! let mut user = User::default();
//! db.select_one(&mut user, "id = ?", &args![1]).await?;
//!
//! // Explicit columns, no record type involved.
//! db.table("users")
//!     .update(&NamedFields::new().set("name", "bob"), "id = ?", &args![1])
//!     .await?;
//!
//! db.multi_insert(&[
//!     User { id: 2, name: "cy".into() },
//!     User { id: 3, name: "di".into() },
//! ])
//! .await?;
//! ```

extern crate self as tagorm;

pub mod client;
pub mod collection;
pub mod config;
pub mod db;
pub mod error;
pub mod ident;
pub mod monitor;
pub mod prelude;
pub mod query;
pub mod record;
pub mod registry;
pub mod row;
pub mod session;
pub mod table;
pub mod transaction;
pub mod value;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use client::{Connection, ExecResult, Executor, TransactionExecutor};
pub use collection::ResultCollection;
pub use config::DbConfig;
pub use db::Db;
pub use error::{DriverError, OrmError, OrmResult};
pub use monitor::{
    CompositeHook, HookAction, NoopHook, QueryContext, QueryHook, QueryResult, QueryType,
    TracingSqlHook,
};
pub use query::Query;
pub use record::{
    ColumnSource, Columns, DynRecord, FieldInfo, FieldInfoBuilder, FieldMapping, NamedFields,
    Record,
};
pub use registry::TypeRegistry;
pub use row::Row;
pub use session::Session;
pub use table::Table;
pub use transaction::Tx;
pub use value::{FromValue, Json, ToValue, Value, ValueError};

#[doc(hidden)]
pub use transaction::__tx_body;

#[cfg(feature = "derive")]
pub use tagorm_derive::Record;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteExecutor, SqliteTransaction};
