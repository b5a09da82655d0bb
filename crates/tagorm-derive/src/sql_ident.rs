use proc_macro2::Span;
use syn::{Error, Result};

pub(crate) fn is_valid_sql_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn parse_sql_ident_with_span(s: &str, span: Span, what: &str) -> Result<String> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::new(span, format!("{what} must not be empty")));
    }
    if !is_valid_sql_ident(s) {
        return Err(Error::new(
            span,
            format!("{what} must be a valid SQL identifier (expected [A-Za-z_][A-Za-z0-9_]*)"),
        ));
    }
    Ok(s.to_string())
}

/// Like [`parse_sql_ident_with_span`], but accepts `schema.table`.
pub(crate) fn parse_table_name(s: &str, span: Span) -> Result<String> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::new(span, "table name must not be empty"));
    }
    if !s.split('.').all(is_valid_sql_ident) {
        return Err(Error::new(
            span,
            format!("table name '{s}' must be a SQL identifier, optionally schema-qualified"),
        ));
    }
    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_sql_ident() {
        assert!(is_valid_sql_ident("user_id"));
        assert!(is_valid_sql_ident("_x1"));
        assert!(!is_valid_sql_ident("1x"));
        assert!(!is_valid_sql_ident("user id"));
        assert!(!is_valid_sql_ident(""));
    }

    #[test]
    fn test_parse_table_name() {
        let span = Span::call_site();
        assert_eq!(parse_table_name("users", span).unwrap(), "users");
        assert_eq!(parse_table_name(" app.users ", span).unwrap(), "app.users");
        assert!(parse_table_name("app..users", span).is_err());
        assert!(parse_table_name("", span).is_err());
        assert!(parse_sql_ident_with_span("a.b", span, "column").is_err());
    }
}
