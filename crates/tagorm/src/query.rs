//! SQL text generation for the CRUD statements.
//!
//! Every builder returns a fresh [`Query`]: the SQL text with `?` positional
//! placeholders plus the arguments in placeholder order.
//!
//! | operation | SQL                                                          | args             |
//! |-----------|--------------------------------------------------------------|------------------|
//! | insert    | `insert into t(a,b) values (?,?)`                            | values           |
//! | update    | `update t set a = ?,b = ? where <where>`                     | values, where    |
//! | upsert    | `insert into t(a,b) values (?,?) on duplicate key update a = ?,b = ?` | values twice |
//! | select    | `select a,b from t where <where>`                            | where            |
//! | delete    | `delete from t where <where>`                                | where            |
//!
//! `<where>` is caller-written SQL appended verbatim after ` where `; an empty
//! (or blank) clause omits the keyword and the statement applies to every row.

use crate::error::{OrmError, OrmResult};
use crate::ident::{validate_column, validate_table};
use crate::record::Columns;
use crate::value::Value;
use std::fmt;

/// SQL text plus its ordered arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Query {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    /// Number of `?` placeholders in the SQL text.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)?;
        if !self.args.is_empty() {
            f.write_str(" [")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

fn check_columns(table: &str, columns: &Columns) -> OrmResult<()> {
    validate_table(table)?;
    if columns.is_empty() {
        return Err(OrmError::invalid_argument(format!(
            "statement on '{table}' needs at least one column"
        )));
    }
    if columns.names.len() != columns.values.len() {
        return Err(OrmError::invalid_argument(format!(
            "{} columns but {} values",
            columns.names.len(),
            columns.values.len()
        )));
    }
    for name in columns.names.iter() {
        validate_column(name)?;
    }
    Ok(())
}

fn push_placeholders(sql: &mut String, n: usize) {
    for i in 0..n {
        if i > 0 {
            sql.push(',');
        }
        sql.push('?');
    }
}

fn push_assignments(sql: &mut String, names: &[String]) {
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        sql.push_str(name);
        sql.push_str(" = ?");
    }
}

fn push_where(sql: &mut String, where_clause: &str) {
    let where_clause = where_clause.trim();
    if !where_clause.is_empty() {
        sql.push_str(" where ");
        sql.push_str(where_clause);
    }
}

fn insert_prefix(table: &str, columns: &Columns) -> String {
    let mut sql = String::with_capacity(32 + table.len() + columns.len() * 12);
    sql.push_str("insert into ");
    sql.push_str(table);
    sql.push('(');
    sql.push_str(&columns.names.join(","));
    sql.push_str(") values (");
    push_placeholders(&mut sql, columns.len());
    sql.push(')');
    sql
}

/// `insert into <table>(<cols>) values (<?,...>)`
pub fn insert(table: &str, columns: Columns) -> OrmResult<Query> {
    check_columns(table, &columns)?;
    let sql = insert_prefix(table, &columns);
    Ok(Query::new(sql, columns.values))
}

/// `update <table> set <col> = ?,...[ where <where>]`; SET args precede WHERE args.
pub fn update(
    table: &str,
    columns: Columns,
    where_clause: &str,
    where_args: &[Value],
) -> OrmResult<Query> {
    check_columns(table, &columns)?;
    let mut sql = String::with_capacity(16 + table.len() + columns.len() * 12 + where_clause.len());
    sql.push_str("update ");
    sql.push_str(table);
    sql.push_str(" set ");
    push_assignments(&mut sql, &columns.names);
    push_where(&mut sql, where_clause);

    let mut args = columns.values;
    args.extend_from_slice(where_args);
    Ok(Query::new(sql, args))
}

/// Insert, or update every column when the row's unique key already exists.
///
/// Uses the `on duplicate key update` form; the values are bound twice, once
/// for each half of the statement.
pub fn upsert(table: &str, columns: Columns) -> OrmResult<Query> {
    check_columns(table, &columns)?;
    let mut sql = insert_prefix(table, &columns);
    sql.push_str(" on duplicate key update ");
    push_assignments(&mut sql, &columns.names);

    let mut args = Vec::with_capacity(columns.values.len() * 2);
    args.extend_from_slice(&columns.values);
    args.extend(columns.values);
    Ok(Query::new(sql, args))
}

/// `select <cols> from <table>[ where <where>]`
pub fn select(
    table: &str,
    columns: &[String],
    where_clause: &str,
    where_args: &[Value],
) -> OrmResult<Query> {
    validate_table(table)?;
    if columns.is_empty() {
        return Err(OrmError::invalid_argument(format!(
            "select from '{table}' needs at least one column"
        )));
    }
    for name in columns {
        validate_column(name)?;
    }
    let mut sql = String::with_capacity(16 + table.len() + columns.len() * 8 + where_clause.len());
    sql.push_str("select ");
    sql.push_str(&columns.join(","));
    sql.push_str(" from ");
    sql.push_str(table);
    push_where(&mut sql, where_clause);
    Ok(Query::new(sql, where_args.to_vec()))
}

/// `delete from <table>[ where <where>]`
pub fn delete(table: &str, where_clause: &str, where_args: &[Value]) -> OrmResult<Query> {
    validate_table(table)?;
    let mut sql = String::with_capacity(16 + table.len() + where_clause.len());
    sql.push_str("delete from ");
    sql.push_str(table);
    push_where(&mut sql, where_clause);
    Ok(Query::new(sql, where_args.to_vec()))
}

#[cfg(test)]
mod tests;
