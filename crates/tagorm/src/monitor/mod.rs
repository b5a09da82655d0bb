//! Query hooks: observing and vetoing SQL before it reaches the executor.
//!
//! Every statement tagorm generates passes through the [`QueryHook`] installed
//! on the [`Db`](crate::Db) handle before execution, together with its
//! arguments. The default hook is [`TracingSqlHook`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tagorm::monitor::{HookAction, QueryContext, QueryHook};
//!
//! struct NoDeletes;
//!
//! impl QueryHook for NoDeletes {
//!     fn before_query(&self, ctx: &QueryContext<'_>) -> HookAction {
//!         match ctx.query_type {
//!             QueryType::Delete => HookAction::Abort("deletes are disabled".into()),
//!             _ => HookAction::Continue,
//!         }
//!     }
//! }
//!
//! let db = Db::new(executor).with_hook(NoDeletes);
//! ```

mod hooks;
mod tracing_hook;
mod types;


pub use hooks::{CompositeHook, NoopHook};
pub use tracing_hook::TracingSqlHook;
pub use types::{HookAction, QueryContext, QueryHook, QueryResult, QueryType};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
