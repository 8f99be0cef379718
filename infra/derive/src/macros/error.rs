use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Field, Fields, FieldsNamed, Ident, Type, Variant};

use super::derived_traits;

/// What the expansion needs to know about one variant.
struct ErrorVariant<'a> {
    ident: &'a Ident,
    source: Option<(&'a Ident, &'a Type)>,
    has_context: bool,
    cfg: Vec<&'a Attribute>,
}

impl ErrorVariant<'_> {
    fn is_internal(&self) -> bool {
        self.ident == "Internal"
    }
}

pub fn expand(input: DeriveInput) -> TokenStream {
    let Data::Enum(data) = &input.data else {
        return syn::Error::new_spanned(&input.ident, "beacon_error can only be applied to enums")
            .to_compile_error();
    };

    let mut variants = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        match inspect_variant(variant) {
            Ok(v) => variants.push(v),
            Err(err) => return err.to_compile_error(),
        }
    }

    let name = &input.ident;
    let ext = format_ident!("{}Ext", name);

    let derives = missing_derives(&input);
    let ext_trait = context_trait(name, &ext, &variants);
    let source_impls = variants.iter().filter_map(|v| source_conversions(name, &ext, v));
    let internal_impls = internal_conversions(name, &variants);

    quote! {
        #[allow(non_shorthand_field_patterns)]
        #derives
        #input

        #ext_trait
        #(#source_impls)*
        #internal_impls

        #[allow(dead_code)]
        fn format_context(context: &Option<::std::borrow::Cow<'static, str>>) -> ::std::borrow::Cow<'static, str> {
            match context {
                Some(c) => ::std::borrow::Cow::Owned(format!(" ({c})")),
                None => ::std::borrow::Cow::Borrowed(""),
            }
        }
    }
}

fn inspect_variant(variant: &Variant) -> Result<ErrorVariant<'_>, syn::Error> {
    let Fields::Named(fields) = &variant.fields else {
        return Err(syn::Error::new_spanned(
            variant,
            "beacon_error variants must use named fields",
        ));
    };

    let has_context = context_field(fields)?.is_some();
    let source = source_field(fields).and_then(|f| f.ident.as_ref().map(|ident| (ident, &f.ty)));

    if source.is_some() && !has_context {
        return Err(syn::Error::new_spanned(
            &variant.ident,
            "variants with a source need `context: Option<Cow<'static, str>>`",
        ));
    }

    Ok(ErrorVariant {
        ident: &variant.ident,
        source,
        has_context,
        cfg: variant.attrs.iter().filter(|a| a.path().is_ident("cfg")).collect(),
    })
}

fn context_field(fields: &FieldsNamed) -> Result<Option<&Field>, syn::Error> {
    let Some(field) = fields.named.iter().find(|f| f.ident.as_ref().is_some_and(|i| i == "context"))
    else {
        return Ok(None);
    };

    if is_optional_cow_str(&field.ty) {
        Ok(Some(field))
    } else {
        Err(syn::Error::new_spanned(&field.ty, "context field must be Option<Cow<'static, str>>"))
    }
}

fn source_field(fields: &FieldsNamed) -> Option<&Field> {
    fields.named.iter().find(|f| {
        f.ident.as_ref().is_some_and(|i| i == "source")
            || f.attrs.iter().any(|a| a.path().is_ident("source") || a.path().is_ident("from"))
    })
}

fn missing_derives(input: &DeriveInput) -> TokenStream {
    let present = derived_traits(&input.attrs);
    let mut wanted = Vec::new();
    if !present.contains("Debug") {
        wanted.push(quote! { Debug });
    }
    if !present.contains("Error") {
        wanted.push(quote! { ::thiserror::Error });
    }

    if wanted.is_empty() { quote! {} } else { quote! { #[derive(#(#wanted),*)] } }
}

fn context_trait(name: &Ident, ext: &Ident, variants: &[ErrorVariant<'_>]) -> TokenStream {
    let arms = variants.iter().filter(|v| v.has_context).map(|v| {
        let ident = v.ident;
        let cfg = &v.cfg;
        quote! { #(#cfg)* #name::#ident { context: slot, .. } => *slot = Some(context.into()), }
    });

    quote! {
        pub trait #ext<T> {
            fn context(self, context: impl Into<::std::borrow::Cow<'static, str>>) -> ::std::result::Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #ext<T> for ::std::result::Result<T, #name> {
            #[inline]
            fn context(self, context: impl Into<::std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|mut err| {
                    match &mut err {
                        #(#arms)*
                        _ => {}
                    }
                    err
                })
            }
        }
    }
}

fn source_conversions(name: &Ident, ext: &Ident, v: &ErrorVariant<'_>) -> Option<TokenStream> {
    if v.is_internal() {
        return None;
    }
    let (field, ty) = v.source?;
    let ident = v.ident;
    let cfg = &v.cfg;

    Some(quote! {
        #(#cfg)*
        #[automatically_derived]
        impl From<#ty> for #name {
            #[inline]
            fn from(#field: #ty) -> Self {
                Self::#ident { #field, context: None }
            }
        }

        #(#cfg)*
        impl<T> #ext<T> for ::std::result::Result<T, #ty> {
            #[inline]
            fn context(self, context: impl Into<::std::borrow::Cow<'static, str>>) -> ::std::result::Result<T, #name> {
                self.map_err(|#field| #name::#ident { #field, context: Some(context.into()) })
            }
        }
    })
}

fn internal_conversions(name: &Ident, variants: &[ErrorVariant<'_>]) -> TokenStream {
    let Some(internal) = variants.iter().find(|v| v.is_internal()) else {
        return quote! {};
    };
    let cfg = &internal.cfg;

    quote! {
        #(#cfg)*
        impl From<&'static str> for #name {
            #[inline]
            fn from(message: &'static str) -> Self {
                Self::Internal { message: ::std::borrow::Cow::Borrowed(message), context: None }
            }
        }

        #(#cfg)*
        impl From<String> for #name {
            #[inline]
            fn from(message: String) -> Self {
                Self::Internal { message: ::std::borrow::Cow::Owned(message), context: None }
            }
        }
    }
}

/// Matches `Option<Cow<'static, str>>` by its last path segments.
fn is_optional_cow_str(ty: &Type) -> bool {
    let Some(cow) = single_generic_type(ty, "Option") else {
        return false;
    };
    let Type::Path(path) = cow else {
        return false;
    };
    let Some(segment) = path.path.segments.last() else {
        return false;
    };
    if segment.ident != "Cow" {
        return false;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return false;
    };

    let mut args = args.args.iter();
    let static_lifetime =
        matches!(args.next(), Some(syn::GenericArgument::Lifetime(lt)) if lt.ident == "static");
    let str_type = matches!(
        args.next(),
        Some(syn::GenericArgument::Type(Type::Path(p)))
            if p.path.segments.last().is_some_and(|s| s.ident == "str")
    );

    static_lifetime && str_type
}

fn single_generic_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        syn::GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
