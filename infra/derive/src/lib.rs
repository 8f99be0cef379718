#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Attribute macros used across the Beacon workspace.
//!
//! * [`beacon_error`] turns a plain enum into a `thiserror` error with context support.
//! * [`api_model`] and [`api_handler`] keep HTTP DTOs and handlers consistent and
//!   wire them into the `OpenAPI` document when the `server` feature is enabled
//!   in the consuming crate.
//!
//! Examples are `ignore`d here because a proc-macro crate cannot use its own
//! macros in doctests.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Defines a workspace error enum.
///
/// # Generated items
///
/// * `#[derive(Debug, thiserror::Error)]` unless already present.
/// * `<Name>Ext` trait with `.context(..)` for `Result<T, Name>` and for
///   `Result<T, Source>` of every variant that wraps a source error.
/// * `From<Source>` for every variant with a `source` field (or a field marked
///   `#[source]` / `#[from]`).
/// * `From<&'static str>` and `From<String>` when an `Internal` variant exists.
/// * A module-local `format_context` helper for `#[error(..)]` strings.
///
/// # Requirements
///
/// * Only enums with named-field variants are accepted.
/// * A variant with a source must also carry `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[beacon_derive::beacon_error]
/// pub enum HubError {
///     #[error("Hub closed{}: {message}", format_context(.context))]
///     Closed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
///
///     #[error("Internal hub error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn beacon_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}

/// Defines an API data model.
///
/// Adds `Debug`, `Serialize` and `Deserialize` when missing, derives
/// `utoipa::ToSchema` behind the consumer's `server` feature, and applies
/// `#[serde(rename_all = "camelCase", deny_unknown_fields)]` unless told otherwise.
///
/// # Arguments
///
/// * `rename_all = "snake_case"` overrides the rename policy.
/// * `deny_unknown_fields = false` disables strict field checking.
///
/// ```rust,ignore
/// #[beacon_derive::api_model]
/// pub struct JobStatusResponse {
///     pub id: String,
///     pub progress: u8,
/// }
/// ```
#[proc_macro_attribute]
pub fn api_model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::api::expand_model(attr.into(), input).into()
}

/// Registers an Axum handler with the `OpenAPI` document.
///
/// Arguments are forwarded verbatim to `utoipa::path` when the consumer's
/// `server` feature is enabled.
///
/// ```rust,ignore
/// #[beacon_derive::api_handler(
///     get,
///     path = "/health",
///     responses((status = OK, body = HealthResponse)),
///     tag = "System"
/// )]
/// pub async fn health_handler() -> impl IntoResponse { /* ... */ }
/// ```
#[proc_macro_attribute]
pub fn api_handler(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::api::expand_handler(args.into(), input).into()
}
