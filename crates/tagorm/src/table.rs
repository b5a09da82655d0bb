//! Operations bound to a single table name.

use crate::client::{ExecResult, Executor};
use crate::collection::ResultCollection;
use crate::error::{OrmError, OrmResult};
use crate::monitor::QueryType;
use crate::query;
use crate::record::{ColumnSource, Columns, Record};
use crate::session::{Session, select_query};
use crate::value::Value;

/// A table name bound to a session.
///
/// Writes take a [`ColumnSource`]: either a `&NamedFields` list or any
/// `&T where T: Record`. Reads decode into record types through the shared
/// [`TypeRegistry`](crate::TypeRegistry).
///
/// ```rust,ignore
/// let users = db.table("users");
/// users.insert(&user).await?;
/// users
///     .update(&NamedFields::new().set("name", "bob"), "id = ?", &args![7])
///     .await?;
/// ```
pub struct Table<'a, E> {
    session: Session<'a, E>,
    name: String,
}

impl<'a, E: Executor> Table<'a, E> {
    pub(crate) fn new(session: Session<'a, E>, name: String) -> Self {
        Self { session, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `insert into <table>(<cols>) values (?,...)`
    pub async fn insert<'s>(&self, source: impl Into<ColumnSource<'s>>) -> OrmResult<ExecResult> {
        let columns = source.into().resolve(self.session.registry())?;
        let query = query::insert(&self.name, columns)?;
        self.session
            .execute_query(&query, &self.name, QueryType::Insert)
            .await
    }

    /// `update <table> set <col> = ?,... where <where_clause>`
    ///
    /// A blank `where_clause` updates every row.
    pub async fn update<'s>(
        &self,
        source: impl Into<ColumnSource<'s>>,
        where_clause: &str,
        args: &[Value],
    ) -> OrmResult<ExecResult> {
        let columns = source.into().resolve(self.session.registry())?;
        self.update_columns(columns, where_clause, args).await
    }

    pub(crate) async fn update_columns(
        &self,
        columns: Columns,
        where_clause: &str,
        args: &[Value],
    ) -> OrmResult<ExecResult> {
        let query = query::update(&self.name, columns, where_clause, args)?;
        self.session
            .execute_query(&query, &self.name, QueryType::Update)
            .await
    }

    /// Insert, or overwrite every column on a unique-key conflict.
    pub async fn upsert<'s>(&self, source: impl Into<ColumnSource<'s>>) -> OrmResult<ExecResult> {
        let columns = source.into().resolve(self.session.registry())?;
        let query = query::upsert(&self.name, columns)?;
        self.session
            .execute_query(&query, &self.name, QueryType::Upsert)
            .await
    }

    /// Append every matching row to `out`.
    ///
    /// Rows are decoded before anything is appended, so a decode failure
    /// leaves `out` untouched. An `Option` destination is allocated even when
    /// no rows match.
    pub async fn select<C: ResultCollection>(
        &self,
        out: &mut C,
        where_clause: &str,
        args: &[Value],
    ) -> OrmResult<()> {
        let (info, query) =
            select_query::<C::Record>(self.session.registry(), &self.name, where_clause, args)?;
        let rows = self.session.fetch_query(&query, &self.name).await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = <C::Record as Default>::default();
            info.scan(row, &mut record)?;
            records.push(record);
        }

        out.prepare(records.len());
        for record in records {
            out.push_record(record);
        }
        Ok(())
    }

    /// Populate `record` from the first matching row.
    ///
    /// Returns [`OrmError::NotFound`] when nothing matches. On any error,
    /// including a column that fails to decode, `record` is left as it was.
    pub async fn select_one<T: Record + Clone>(
        &self,
        record: &mut T,
        where_clause: &str,
        args: &[Value],
    ) -> OrmResult<()> {
        let (info, query) = select_query::<T>(self.session.registry(), &self.name, where_clause, args)?;
        let rows = self.session.fetch_query(&query, &self.name).await?;
        match rows.into_iter().next() {
            Some(row) => info.scan_into(row, record),
            None => Err(OrmError::not_found(format!(
                "no row in '{}' matched the query",
                self.name
            ))),
        }
    }

    /// `delete from <table>[ where <where_clause>]`
    pub async fn delete(&self, where_clause: &str, args: &[Value]) -> OrmResult<ExecResult> {
        let query = query::delete(&self.name, where_clause, args)?;
        self.session
            .execute_query(&query, &self.name, QueryType::Delete)
            .await
    }
}
