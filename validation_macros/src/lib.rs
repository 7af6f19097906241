extern crate proc_macro;

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Data, DeriveInput, Expr, Fields, Lit, MetaNameValue, parse_macro_input,
    punctuated::Punctuated, token,
};

/// Derives `easy_validation::Validated`.
///
/// Every named field becomes a property. Rules are declared with one
/// `#[validate(validator = <expr>, ruleset = "<name>")]` attribute per validator;
/// `ruleset` is optional and defaults to the default rule-set. `name = "<name>"` renames
/// the property.
#[proc_macro_derive(Validated, attributes(validate))]
pub fn validated_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

struct Property {
    ident: syn::Ident,
    ty: syn::Type,
    name: String,
    rules: Vec<(String, Expr)>,
}

fn expand(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let label = name.to_string();

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Generic structs are not supported",
        ));
    }
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Only structs with named fields are supported",
                ));
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Only structs are supported")),
    };

    let properties = fields
        .iter()
        .map(parse_property)
        .collect::<syn::Result<Vec<_>>>()?;

    let boxed_any = quote! { ::std::boxed::Box<dyn ::std::any::Any + ::std::marker::Send> };

    let accessors = properties.iter().map(|p| {
        let ident = &p.ident;
        let ty = &p.ty;
        let property_name = &p.name;
        let get = format_ident!("__get_{}", ident);
        let parse = format_ident!("__parse_{}", ident);
        let set = format_ident!("__set_{}", ident);
        quote! {
            fn #get(item: &#name) -> &dyn ::std::any::Any {
                &item.#ident
            }
            fn #parse(
                key: &str,
                raw: &str,
            ) -> ::std::result::Result<#boxed_any, ::easy_validation::ValidationError> {
                <#ty as ::easy_validation::FieldValue>::parse(key, raw)
                    .map(|v| ::std::boxed::Box::new(v) as #boxed_any)
            }
            fn #set(
                item: &mut #name,
                value: #boxed_any,
            ) -> ::std::result::Result<(), ::easy_validation::ValidationError> {
                item.#ident = ::easy_validation::take_value::<#ty>(#property_name, value)?;
                ::std::result::Result::Ok(())
            }
        }
    });

    let descriptors = properties.iter().map(|p| {
        let ty = &p.ty;
        let property_name = &p.name;
        let get = format_ident!("__get_{}", p.ident);
        let parse = format_ident!("__parse_{}", p.ident);
        let set = format_ident!("__set_{}", p.ident);
        quote! {
            ::easy_validation::PropertyDescriptor::new::<#ty>(#property_name, #get, #parse, #set)
        }
    });

    let rules = properties.iter().flat_map(|p| {
        let ty = &p.ty;
        let property_name = &p.name;
        p.rules.iter().map(move |(ruleset, validator)| {
            quote! {
                ::easy_validation::AttributeRule::new::<#ty, _>(
                    #property_name,
                    #ruleset,
                    #validator,
                )
            }
        })
    });

    let lazy = quote! { ::easy_validation::__private::once_cell::sync::Lazy };
    let descriptor = quote! { ::easy_validation::PropertyDescriptor<#name> };

    Ok(quote! {
        impl ::easy_validation::Validated for #name {
            fn type_label() -> &'static str {
                #label
            }

            fn properties() -> &'static [::easy_validation::PropertyDescriptor<Self>] {
                #(#accessors)*
                static PROPERTIES: #lazy<::std::vec::Vec<#descriptor>> =
                    #lazy::new(|| ::std::vec![#(#descriptors),*]);
                &PROPERTIES
            }

            fn attribute_rules() -> &'static [::easy_validation::AttributeRule] {
                static RULES: #lazy<::std::vec::Vec<::easy_validation::AttributeRule>> =
                    #lazy::new(|| ::std::vec![#(#rules),*]);
                &RULES
            }
        }
    })
}

fn parse_property(field: &syn::Field) -> syn::Result<Property> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "Expected a named field"))?;
    let mut property = Property {
        name: ident.to_string(),
        ident,
        ty: field.ty.clone(),
        rules: Vec::new(),
    };

    for attr in &field.attrs {
        if !attr.path().is_ident("validate") {
            continue;
        }
        let parsed_attrs =
            attr.parse_args_with(Punctuated::<MetaNameValue, token::Comma>::parse_terminated)?;

        let mut validator = None;
        let mut ruleset = String::new();
        for nv in parsed_attrs {
            let key = nv
                .path
                .get_ident()
                .ok_or_else(|| syn::Error::new_spanned(&nv.path, "Expected an identifier"))?
                .to_string();
            match key.as_str() {
                "validator" => validator = Some(nv.value.clone()),
                "ruleset" => ruleset = get_string_lit_from_expr(&nv.value)?,
                "name" => property.name = get_string_lit_from_expr(&nv.value)?,
                _ => {
                    return Err(syn::Error::new_spanned(
                        &nv.path,
                        format!("Unknown attribute: {}", key),
                    ));
                }
            }
        }
        if let Some(validator) = validator {
            property.rules.push((ruleset, validator));
        } else if !ruleset.is_empty() {
            return Err(syn::Error::new_spanned(
                attr,
                "`ruleset` needs a `validator` in the same attribute",
            ));
        }
    }

    Ok(property)
}

/// Extracts a `String` from a string literal expression (e.g., `"hello"`).
/// Returns a `syn::Error` if the expression is not a string literal.
fn get_string_lit_from_expr(expr: &Expr) -> syn::Result<String> {
    if let Expr::Lit(expr_lit) = expr
        && let Lit::Str(lit_str) = &expr_lit.lit
    {
        return Ok(lit_str.value());
    }
    Err(syn::Error::new_spanned(expr, "Expected a string literal"))
}
