#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Attribute macros shared by every crate of the workspace: error enums, API models and
//! handlers, and vertical slice handles.
//!
//! Examples are `ignore`d because they only compile inside consuming crates.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Defines a request/response model for the HTTP API.
///
/// * **Derives**: `Debug`, `Serialize`, `Deserialize` and `utoipa::ToSchema` when missing.
/// * **Serde policy**: `rename_all = "camelCase"` and `deny_unknown_fields` unless overridden.
///
/// ```rust,ignore
/// #[fhub_derive::api_model(deny_unknown_fields = false)]
/// pub struct PreAlertRequest {
///     pub tracking_number: String,
///     pub shipper: Option<String>,
/// }
/// ```
#[proc_macro_attribute]
pub fn api_model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::api::expand_api_model(attr.into(), input).into()
}

/// Registers an Axum handler with `utoipa::path`.
///
/// Accepts the usual `utoipa::path` arguments (`post`, `path = "..."`, `responses(...)`, ...).
///
/// ```rust,ignore
/// #[fhub_derive::api_handler(
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
    macros::api::expand_api_handler(args.into(), input).into()
}

/// Turns an enum with named-field variants into a workspace error type.
///
/// # Generated items
///
/// * `#[derive(Debug, thiserror::Error)]` when missing.
/// * `code(&self) -> &'static str`: the snake-cased variant name (`NotFound` -> `not_found`).
/// * `<Name>Ext` with `.context(..)` for `Result<T, Name>` and for every `Result<T, Source>`.
/// * `From<Source>` for variants holding a `source` (or `#[source]`/`#[from]`) field.
/// * `From<&'static str>` and `From<String>` when an `Internal` variant exists.
///
/// Variants carrying a source must also carry `context: Option<Cow<'static, str>>`.
///
/// ```rust,ignore
/// #[fhub_derive::fhub_error]
/// pub enum StoreError {
///     #[error("Backend error{}: {message}", format_context(.context))]
///     Backend { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
///     #[error("Internal store error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn fhub_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}

/// Defines a vertical slice handle.
///
/// The annotated struct becomes `<Name>Inner`; `<Name>` wraps it in an `Arc`, derefs to it,
/// and implements `FeatureSlice` so it can be registered in the API state.
///
/// ```rust,ignore
/// #[fhub_derive::fhub_slice]
/// pub struct Customers {
///     customers: Arc<dyn CustomerRepository>,
/// }
///
/// let slice = Customers::new(CustomersInner { customers });
/// ```
#[proc_macro_attribute]
pub fn fhub_slice(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::slice::expand_slice(input).into()
}
