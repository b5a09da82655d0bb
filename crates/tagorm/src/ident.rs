//! SQL identifier validation for table and column names.
//!
//! Table and column names are spliced into generated SQL, so they are checked
//! before any text is built:
//!
//! - column: `[A-Za-z_][A-Za-z0-9_]*`
//! - table: one or more column-style parts joined by `.` (`db.users`)

use crate::error::{OrmError, OrmResult};

pub(crate) fn is_valid_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check a column name.
pub fn validate_column(name: &str) -> OrmResult<()> {
    if name.is_empty() {
        return Err(OrmError::invalid_argument("column name cannot be empty"));
    }
    if !is_valid_ident(name) {
        return Err(OrmError::invalid_argument(format!(
            "invalid column name '{name}' (expected [A-Za-z_][A-Za-z0-9_]*)"
        )));
    }
    Ok(())
}

/// Check a table name, optionally qualified with a schema/database prefix.
pub fn validate_table(name: &str) -> OrmResult<()> {
    if name.is_empty() {
        return Err(OrmError::invalid_argument("table name cannot be empty"));
    }
    if !name.split('.').all(is_valid_ident) {
        return Err(OrmError::invalid_argument(format!(
            "invalid table name '{name}' (expected [A-Za-z_][A-Za-z0-9_]* parts separated by '.')"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_accepts_simple_names() {
        assert!(validate_column("id").is_ok());
        assert!(validate_column("_created_at2").is_ok());
    }

    #[test]
    fn column_rejects_unsafe() {
        assert!(validate_column("").is_err());
        assert!(validate_column("1id").is_err());
        assert!(validate_column("name; drop table users").is_err());
        assert!(validate_column("users.id").is_err());
    }

    #[test]
    fn table_accepts_qualified() {
        assert!(validate_table("users").is_ok());
        assert!(validate_table("shop.users").is_ok());
    }

    #[test]
    fn table_rejects_unsafe() {
        assert!(validate_table("").is_err());
        assert!(validate_table("shop..users").is_err());
        assert!(validate_table("users.").is_err());
        assert!(validate_table("users u").is_err());
    }
}
