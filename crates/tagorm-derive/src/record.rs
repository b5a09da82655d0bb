//! Record derive macro implementation.
//!
//! Generates `impl tagorm::Record` with the table name and a `describe()` that
//! builds the field descriptor from getter/setter function pointers.

mod attrs;

use crate::sql_ident::{parse_sql_ident_with_span, parse_table_name};
use attrs::{get_field_attr, get_table_name};
use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use std::collections::HashSet;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Error, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let table = match get_table_name(&input)? {
        Some(lit) => parse_table_name(&lit.value(), lit.span())?,
        None => name.unraw().to_string().to_snake_case(),
    };

    let mut seen = HashSet::new();
    let mut mappings = Vec::with_capacity(fields.len());
    for field in fields {
        let attr = get_field_attr(field)?;
        if attr.skip {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };

        let column = match &attr.column {
            Some(lit) => parse_sql_ident_with_span(&lit.value(), lit.span(), "column")?,
            None => ident.unraw().to_string().to_snake_case(),
        };
        if !seen.insert(column.clone()) {
            return Err(Error::new_spanned(
                field,
                format!("column '{column}' is mapped more than once"),
            ));
        }

        let primary_key = attr.is_id.then(|| quote! { .primary_key() });
        mappings.push(quote! {
            .field(
                #column,
                |r: &Self| tagorm::ToValue::to_value(&r.#ident),
                |r: &mut Self, v: tagorm::Value| {
                    r.#ident = tagorm::FromValue::from_value(v)?;
                    ::core::result::Result::Ok(())
                },
            )
            #primary_key
        });
    }

    if mappings.is_empty() {
        return Err(Error::new_spanned(
            &input,
            "Record needs at least one mapped field",
        ));
    }

    Ok(quote! {
        impl #impl_generics tagorm::Record for #name #ty_generics #where_clause {
            const TABLE: &'static str = #table;

            fn describe() -> tagorm::OrmResult<tagorm::FieldInfo<Self>> {
                tagorm::FieldInfo::<Self>::builder()
                    #(#mappings)*
                    .build()
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand_to_string(input: DeriveInput) -> String {
        expand(input).unwrap().to_string()
    }

    #[test]
    fn test_table_defaults_to_snake_case_type_name() {
        let out = expand_to_string(parse_quote! {
            struct OrderLine {
                id: i64,
            }
        });
        assert!(out.contains("\"order_line\""), "{out}");
    }

    #[test]
    fn test_explicit_table_and_columns() {
        let out = expand_to_string(parse_quote! {
            #[orm(table = "app.users")]
            struct User {
                #[orm(id, column = "user_id")]
                id: i64,
                #[orm(column = "display_name")]
                name: String,
                #[orm(skip)]
                cache: Vec<u8>,
            }
        });
        assert!(out.contains("\"app.users\""), "{out}");
        assert!(out.contains("\"user_id\""), "{out}");
        assert!(out.contains("\"display_name\""), "{out}");
        assert!(!out.contains("cache"), "{out}");
        assert_eq!(out.matches("primary_key").count(), 1, "{out}");
    }

    #[test]
    fn test_raw_identifiers_are_unrawed() {
        let out = expand_to_string(parse_quote! {
            struct Item {
                r#type: String,
            }
        });
        assert!(out.contains("\"type\""), "{out}");
    }

    #[test]
    fn test_rejects_non_struct_shapes() {
        let err = expand(parse_quote! {
            enum Kind { A, B }
        })
        .unwrap_err();
        assert!(err.to_string().contains("only be derived for structs"));

        let err = expand(parse_quote! {
            struct Pair(i64, String);
        })
        .unwrap_err();
        assert!(err.to_string().contains("named fields"));

        assert!(expand(parse_quote! { struct Unit; }).is_err());
    }

    #[test]
    fn test_rejects_invalid_mappings() {
        let duplicate = expand(parse_quote! {
            struct User {
                name: String,
                #[orm(column = "name")]
                nickname: String,
            }
        });
        assert!(duplicate.unwrap_err().to_string().contains("more than once"));

        let invalid = expand(parse_quote! {
            struct User {
                #[orm(column = "first name")]
                name: String,
            }
        });
        assert!(invalid.is_err());

        let empty = expand(parse_quote! {
            struct User {
                #[orm(skip)]
                name: String,
            }
        });
        assert!(empty.unwrap_err().to_string().contains("at least one"));

        let unknown = expand(parse_quote! {
            struct User {
                #[orm(primary)]
                id: i64,
            }
        });
        assert!(unknown.unwrap_err().to_string().contains("unknown orm field attribute"));
    }
}
