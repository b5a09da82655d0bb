//! Derive macros for tagorm
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod record;
mod sql_ident;

/// Derive the `Record` trait for a struct.
///
/// # Example
///
/// ```ignore
/// use tagorm::Record;
///
/// #[derive(Default, Record)]
/// #[orm(table = "users")]
/// struct User {
///     #[orm(id)]
///     id: i64,
///     #[orm(column = "display_name")]
///     name: String,
///     #[orm(skip)]
///     cached_avatar: Option<Vec<u8>>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Table name (default: the type name in snake_case)
/// - `#[orm(id)]` - Mark field as part of the primary key
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(skip)]` - Leave the field out of the mapping
///
/// Mapped fields must implement `ToValue` and `FromValue`. Columns keep the
/// field declaration order. `Db::select_one` also needs the type to be `Clone`.
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
