//! Attribute parsing for the Record derive macro.
//!
//! Handles struct-level `#[orm(table = "...")]` and field-level
//! `#[orm(id, column = "...", skip)]`.

use syn::parse::{Parse, ParseStream};
use syn::{DeriveInput, Error, LitStr, Result, Token};

/// Parsed field-level attributes.
#[derive(Default)]
pub(super) struct FieldAttr {
    pub is_id: bool,
    pub skip: bool,
    pub column: Option<LitStr>,
}

impl Parse for FieldAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            if ident == "id" {
                attr.is_id = true;
            } else if ident == "skip" {
                attr.skip = true;
            } else if ident == "column" {
                let _: Token![=] = input.parse()?;
                attr.column = Some(input.parse()?);
            } else {
                return Err(Error::new(
                    ident.span(),
                    format!("unknown orm field attribute `{ident}` (expected id, column or skip)"),
                ));
            }

            if input.is_empty() {
                break;
            }
            let _: Token![,] = input.parse()?;
        }

        Ok(attr)
    }
}

/// Merge every `#[orm(...)]` on a field.
pub(super) fn get_field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut merged = FieldAttr::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let parsed: FieldAttr = attr.parse_args()?;
        merged.is_id |= parsed.is_id;
        merged.skip |= parsed.skip;
        if parsed.column.is_some() {
            merged.column = parsed.column;
        }
    }

    if merged.skip && (merged.is_id || merged.column.is_some()) {
        return Err(Error::new_spanned(
            field,
            "a skipped field cannot also be an id or carry a column name",
        ));
    }
    Ok(merged)
}

/// Extract the table name from struct-level `#[orm(table = "...")]`, if present.
pub(super) fn get_table_name(input: &DeriveInput) -> Result<Option<LitStr>> {
    let mut table = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let nested: syn::MetaNameValue = attr.parse_args()?;
        if !nested.path.is_ident("table") {
            return Err(Error::new_spanned(
                &nested.path,
                "unknown orm struct attribute (expected table = \"...\")",
            ));
        }
        match &nested.value {
            syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(lit),
                ..
            }) => table = Some(lit.clone()),
            other => {
                return Err(Error::new_spanned(other, "table must be a string literal"));
            }
        }
    }
    Ok(table)
}
