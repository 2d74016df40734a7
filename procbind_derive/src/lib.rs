use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::ParseStream;
use syn::punctuated::Punctuated;
use syn::{
    Attribute, Data, DeriveInput, Expr, ExprLit, Fields, Ident, Lit, LitStr, Meta, Token,
    parse_macro_input, spanned::Spanned,
};

/// Implements `procbind::DbEntity`.
///
/// Field attribute: `#[db_field("ExternalName", save = false, key)]`.
/// The name may also be given as `name = "..."`, or omitted to use the Rust
/// field name. `read_only` is shorthand for `save = false`. Fields without
/// `#[db_field]` are not bound.
///
/// Type attribute: `#[db_info(save = "dbo.UserSave", delete = "dbo.UserDelete", return_id = "UserID")]`.
#[proc_macro_derive(DbEntity, attributes(db_field, db_info))]
pub fn derive_db_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_db_entity(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct DbFieldOptions {
    external_name: String,
    save: bool,
    key: bool,
}

#[derive(Default)]
struct DbInfoOptions {
    save: String,
    delete: String,
    return_id: String,
}

fn expand_db_entity(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.generics,
            "DbEntity does not support generic structs",
        ));
    }

    let info = parse_db_info_options(&input.attrs)?;

    let data_struct = match input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "DbEntity can only be derived for structs",
            ));
        }
    };

    let named_fields = match data_struct.fields {
        Fields::Named(fields) => fields,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "DbEntity requires named fields",
            ));
        }
    };

    let mut bindings = Vec::<TokenStream2>::new();
    for field in named_fields.named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), "DbEntity requires named fields"))?;
        let Some(options) = parse_db_field_options(&field.attrs, &ident)? else {
            continue;
        };
        bindings.push(field_binding_tokens(&ident, &options));
    }

    let entity_fn = info.map(|info| {
        let DbInfoOptions {
            save,
            delete,
            return_id,
        } = info;
        quote! {
            fn entity() -> ::std::option::Option<::procbind::EntityDescriptor> {
                ::std::option::Option::Some(
                    ::procbind::EntityDescriptor::new(#save)
                        .delete_procedure(#delete)
                        .return_id(#return_id),
                )
            }
        }
    });

    Ok(quote! {
        impl ::procbind::metadata::DbEntity for #struct_name {
            fn fields() -> ::std::vec::Vec<::procbind::FieldBinding<Self>> {
                ::std::vec![#(#bindings),*]
            }

            #entity_fn
        }
    })
}

fn field_binding_tokens(ident: &Ident, options: &DbFieldOptions) -> TokenStream2 {
    let external_name = &options.external_name;
    let field_name = ident.to_string();
    let save = options.save;
    let key = options.key.then(|| quote! { .key() });

    quote! {
        ::procbind::FieldBinding::new(
            ::procbind::FieldDescriptor::new(#external_name).save_eligible(#save) #key,
            #field_name,
            |entity: &Self| ::procbind::ToValue::to_value(&entity.#ident),
            |entity: &mut Self, value: &::procbind::Value| {
                entity.#ident = ::procbind::FromValue::from_value(value)?;
                ::std::result::Result::Ok(())
            },
        )
    }
}

fn parse_db_field_options(
    attrs: &[Attribute],
    ident: &Ident,
) -> syn::Result<Option<DbFieldOptions>> {
    let mut options: Option<DbFieldOptions> = None;

    for attr in attrs {
        if !attr.path().is_ident("db_field") {
            continue;
        }

        if options.is_some() {
            return Err(syn::Error::new(
                attr.span(),
                "Duplicate #[db_field(...)] attribute on field",
            ));
        }

        let mut parsed = DbFieldOptions {
            external_name: ident.to_string(),
            save: true,
            key: false,
        };

        match &attr.meta {
            Meta::Path(_) => {}
            Meta::List(list) => {
                list.parse_args_with(|input: ParseStream| {
                    if input.peek(LitStr) {
                        let lit: LitStr = input.parse()?;
                        parsed.external_name = lit.value();
                        if input.is_empty() {
                            return Ok(());
                        }
                        input.parse::<Token![,]>()?;
                    }

                    for meta in Punctuated::<Meta, Token![,]>::parse_terminated(input)? {
                        apply_db_field_meta(&mut parsed, &meta)?;
                    }
                    Ok(())
                })?;
            }
            Meta::NameValue(_) => {
                return Err(syn::Error::new(
                    attr.span(),
                    "Unsupported #[db_field = ...] syntax. Use #[db_field(\"Name\", save = false, key)]",
                ));
            }
        }

        if parsed.external_name.trim().is_empty() {
            return Err(syn::Error::new(
                attr.span(),
                "#[db_field] external name cannot be empty",
            ));
        }

        options = Some(parsed);
    }

    Ok(options)
}

fn apply_db_field_meta(parsed: &mut DbFieldOptions, meta: &Meta) -> syn::Result<()> {
    match meta {
        Meta::Path(path) if path.is_ident("key") => {
            parsed.key = true;
            Ok(())
        }
        Meta::Path(path) if path.is_ident("read_only") => {
            parsed.save = false;
            Ok(())
        }
        Meta::NameValue(nv) if nv.path.is_ident("name") => {
            parsed.external_name = expect_str(&nv.value)?.value();
            Ok(())
        }
        Meta::NameValue(nv) if nv.path.is_ident("save") => {
            match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Bool(flag),
                    ..
                }) => {
                    parsed.save = flag.value;
                    Ok(())
                }
                other => Err(syn::Error::new(other.span(), "expected `true` or `false`")),
            }
        }
        other => Err(syn::Error::new(
            other.span(),
            "Unsupported #[db_field(...)] option. Supported: \"Name\", name = \"...\", save = <bool>, read_only, key",
        )),
    }
}

fn parse_db_info_options(attrs: &[Attribute]) -> syn::Result<Option<DbInfoOptions>> {
    let mut options: Option<DbInfoOptions> = None;

    for attr in attrs {
        if !attr.path().is_ident("db_info") {
            continue;
        }

        if options.is_some() {
            return Err(syn::Error::new(
                attr.span(),
                "Duplicate #[db_info(...)] attribute on type",
            ));
        }

        let mut parsed = DbInfoOptions::default();
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("save") {
                let lit: LitStr = meta.value()?.parse()?;
                parsed.save = lit.value();
                return Ok(());
            }

            if meta.path.is_ident("delete") {
                let lit: LitStr = meta.value()?.parse()?;
                parsed.delete = lit.value();
                return Ok(());
            }

            if meta.path.is_ident("return_id") {
                let lit: LitStr = meta.value()?.parse()?;
                parsed.return_id = lit.value();
                return Ok(());
            }

            Err(meta.error(
                "Unsupported db_info attribute. Supported: save = \"...\", delete = \"...\", return_id = \"...\"",
            ))
        })?;

        options = Some(parsed);
    }

    Ok(options)
}

fn expect_str(expr: &Expr) -> syn::Result<&LitStr> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(lit), ..
        }) => Ok(lit),
        other => Err(syn::Error::new(other.span(), "expected a string literal")),
    }
}
