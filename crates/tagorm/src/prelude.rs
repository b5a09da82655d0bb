//! Convenient imports for typical `tagorm` usage.
//!
//! ```ignore
//! use tagorm::prelude::*;
//! ```

pub use crate::{
    Db, ExecResult, Executor, FromValue, Json, NamedFields, OrmError, OrmResult, Record,
    ResultCollection, ToValue, Tx, Value, args, transaction,
};

#[cfg(feature = "sqlite")]
pub use crate::SqliteExecutor;
