use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, ItemFn, ItemStruct, Lit, LitStr, Meta, MetaNameValue, Token};

use super::derived_traits;

const DEFAULT_RENAME: &str = "camelCase";

#[derive(Default)]
struct ModelArgs {
    rename_all: Option<LitStr>,
    deny_unknown_fields: Option<bool>,
}

/// Serde settings the struct already declares itself.
#[derive(Default)]
struct ExistingSerde {
    rename_all: Option<LitStr>,
    deny_unknown_fields: bool,
}

pub fn expand_model(args: TokenStream, input: ItemStruct) -> TokenStream {
    match model_attributes(args, &input) {
        Ok(attrs) => quote! {
            #attrs
            #input
        },
        Err(err) => err.to_compile_error(),
    }
}

pub fn expand_handler(args: TokenStream, input: ItemFn) -> TokenStream {
    let ItemFn { attrs, vis, sig, block } = input;

    quote! {
        #(#attrs)*
        #[allow(clippy::unused_async)]
        #[cfg_attr(feature = "server", ::utoipa::path(#args))]
        #vis #sig #block
    }
}

fn model_attributes(args: TokenStream, input: &ItemStruct) -> syn::Result<TokenStream> {
    let args = parse_model_args(args)?;
    let existing = existing_serde(&input.attrs)?;
    let derives = derived_traits(&input.attrs);

    let mut wanted = Vec::new();
    if !derives.contains("Debug") {
        wanted.push(quote! { Debug });
    }
    if !derives.contains("Serialize") {
        wanted.push(quote! { ::serde::Serialize });
    }
    if !derives.contains("Deserialize") {
        wanted.push(quote! { ::serde::Deserialize });
    }
    let derive_attr = if wanted.is_empty() { quote! {} } else { quote! { #[derive(#(#wanted),*)] } };

    let schema_attr = if derives.contains("ToSchema") {
        quote! {}
    } else {
        quote! { #[cfg_attr(feature = "server", derive(::utoipa::ToSchema))] }
    };

    let rename = args.rename_all.unwrap_or_else(|| LitStr::new(DEFAULT_RENAME, Span::call_site()));
    let rename_attr = match &existing.rename_all {
        Some(current) if current.value() != rename.value() => {
            return Err(syn::Error::new_spanned(
                current,
                "conflicting serde rename_all; align it with api_model(rename_all = \"...\")",
            ));
        },
        Some(_) => quote! {},
        None => quote! { #[serde(rename_all = #rename)] },
    };

    let deny = args.deny_unknown_fields.unwrap_or(true);
    let deny_attr = match (existing.deny_unknown_fields, deny) {
        (true, false) => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "deny_unknown_fields is already set via serde; remove it before disabling",
            ));
        },
        (false, true) => quote! { #[serde(deny_unknown_fields)] },
        _ => quote! {},
    };

    Ok(quote! {
        #derive_attr
        #schema_attr
        #rename_attr
        #deny_attr
    })
}

fn parse_model_args(args: TokenStream) -> syn::Result<ModelArgs> {
    let metas = Punctuated::<Meta, Token![,]>::parse_terminated.parse2(args)?;
    let mut parsed = ModelArgs::default();

    for meta in metas {
        let Meta::NameValue(nv) = meta else {
            return Err(syn::Error::new_spanned(
                meta,
                "expected name-value arguments like `rename_all = \"...\"`",
            ));
        };

        if nv.path.is_ident("rename_all") {
            if parsed.rename_all.is_some() {
                return Err(syn::Error::new_spanned(&nv, "duplicate argument"));
            }
            parsed.rename_all = Some(literal_str(&nv)?);
        } else if nv.path.is_ident("deny_unknown_fields") {
            if parsed.deny_unknown_fields.is_some() {
                return Err(syn::Error::new_spanned(&nv, "duplicate argument"));
            }
            parsed.deny_unknown_fields = Some(literal_bool(&nv)?);
        } else {
            return Err(syn::Error::new_spanned(
                &nv.path,
                "unsupported argument; expected rename_all or deny_unknown_fields",
            ));
        }
    }

    Ok(parsed)
}

fn literal_str(nv: &MetaNameValue) -> syn::Result<LitStr> {
    match &nv.value {
        Expr::Lit(expr) => match &expr.lit {
            Lit::Str(lit) => Ok(lit.clone()),
            _ => Err(syn::Error::new_spanned(&nv.value, "expected a string literal")),
        },
        _ => Err(syn::Error::new_spanned(&nv.value, "expected a string literal")),
    }
}

fn literal_bool(nv: &MetaNameValue) -> syn::Result<bool> {
    match &nv.value {
        Expr::Lit(expr) => match &expr.lit {
            Lit::Bool(lit) => Ok(lit.value),
            _ => Err(syn::Error::new_spanned(&nv.value, "expected a boolean literal")),
        },
        _ => Err(syn::Error::new_spanned(&nv.value, "expected a boolean literal")),
    }
}

fn existing_serde(attrs: &[Attribute]) -> syn::Result<ExistingSerde> {
    let mut found = ExistingSerde::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                found.rename_all = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("deny_unknown_fields") {
                found.deny_unknown_fields = true;
            } else if meta.input.peek(Token![=]) {
                let _: Expr = meta.value()?.parse()?;
            }
            Ok(())
        })?;
    }

    Ok(found)
}
