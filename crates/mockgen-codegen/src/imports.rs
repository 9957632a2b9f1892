//! Qualification of resolved types in generated code.
//!
//! Items of the output package render as `crate::...`, std items as
//! `::std::...` (prelude items bare, except `Result`, which crates
//! commonly shadow with an alias), and items of any other package
//! through a `use ::crate_name as alias;` declaration, one per package.

use indexmap::IndexMap;
use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;

use mockgen_core::types::STD_PACKAGE;
use mockgen_core::{crate_name_for, Bound, GenericArg, ItemRef, TypeDescriptor};

/// Std items the prelude names.
const PRELUDE: &[&str] = &[
    "option::Option",
    "string::String",
    "vec::Vec",
    "boxed::Box",
    "marker::Send",
    "marker::Sync",
    "marker::Sized",
    "marker::Unpin",
    "clone::Clone",
    "default::Default",
    "ops::Fn",
    "ops::FnMut",
    "ops::FnOnce",
];

/// How lifetimes are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetimes {
    /// As declared, for trait method signatures.
    Keep,
    /// Elided, for hook parameters (which makes hooks higher-ranked).
    Erase,
    /// `'static`, for owned forms stored in recorder state.
    Static,
}

/// Makes an identifier, honouring the `r#` prefix of raw identifiers.
pub fn ident(name: &str) -> Ident {
    match name.strip_prefix("r#") {
        Some(raw) => Ident::new_raw(raw, Span::call_site()),
        None => Ident::new(name, Span::call_site()),
    }
}

/// Per-file qualification state.
#[derive(Debug)]
pub struct Qualifier {
    output: Option<String>,
    /// Package import path to its alias, in first-use order.
    aliases: IndexMap<String, (String, String)>,
}

impl Qualifier {
    /// `output` is the import path of the package the generated file is
    /// compiled into, if known.
    pub fn new(output: Option<String>) -> Self {
        Qualifier {
            output,
            aliases: IndexMap::new(),
        }
    }

    /// The alias a package is imported under, allocating it on first use.
    fn alias(&mut self, package: &str) -> String {
        if let Some((_, alias)) = self.aliases.get(package) {
            return alias.clone();
        }
        let crate_name = crate_name_for(package);
        let taken = |candidate: &str, aliases: &IndexMap<String, (String, String)>| {
            aliases.values().any(|(_, a)| a == candidate)
        };
        let mut alias = crate_name.clone();
        let mut n = 2;
        while taken(&alias, &self.aliases) {
            alias = format!("{crate_name}{n}");
            n += 1;
        }
        tracing::debug!(package, alias = %alias, "allocated import alias");
        self.aliases
            .insert(package.to_string(), (crate_name, alias.clone()));
        alias
    }

    /// `use` declarations for every foreign package referenced so far.
    pub fn use_decls(&self) -> TokenStream {
        let decls = self.aliases.values().map(|(crate_name, alias)| {
            let crate_name = ident(crate_name);
            let alias = ident(alias);
            if crate_name == alias {
                quote! { use ::#crate_name; }
            } else {
                quote! { use ::#crate_name as #alias; }
            }
        });
        quote! { #(#decls)* }
    }

    /// Renders the path of an item.
    pub fn path(&mut self, item: &ItemRef) -> TokenStream {
        let segments: Vec<Ident> = item.segments().map(ident).collect();
        if item.package == STD_PACKAGE {
            if PRELUDE.contains(&item.path.as_str()) {
                let name = ident(item.name());
                return quote! { #name };
            }
            return quote! { ::std #(::#segments)* };
        }
        if self.output.as_deref() == Some(item.package.as_str()) {
            return quote! { crate #(::#segments)* };
        }
        let alias = ident(&self.alias(&item.package));
        quote! { #alias #(::#segments)* }
    }

    /// Renders a type. `self_ty` replaces `Self`; `None` keeps it.
    pub fn ty(&mut self, ty: &TypeDescriptor, lifetimes: Lifetimes, self_ty: Option<&Ident>) -> TokenStream {
        let mut r = TypeRenderer {
            q: self,
            lifetimes,
            self_ty,
        };
        r.ty(ty)
    }
}

struct TypeRenderer<'q, 's> {
    q: &'q mut Qualifier,
    lifetimes: Lifetimes,
    self_ty: Option<&'s Ident>,
}

impl TypeRenderer<'_, '_> {
    fn lifetime(&self, name: &str) -> Option<TokenStream> {
        let lt = |n: &str| syn::Lifetime::new(&format!("'{n}"), Span::call_site());
        match self.lifetimes {
            Lifetimes::Keep => {
                let lt = lt(name);
                Some(quote! { #lt })
            }
            Lifetimes::Erase => None,
            Lifetimes::Static => Some(quote! { 'static }),
        }
    }

    /// A lifetime in generic argument position, where it cannot be omitted.
    fn lifetime_arg(&self, name: &str) -> TokenStream {
        self.lifetime(name).unwrap_or_else(|| quote! { '_ })
    }

    fn ty(&mut self, ty: &TypeDescriptor) -> TokenStream {
        match ty {
            TypeDescriptor::Primitive(p) => {
                let name = ident(p.as_str());
                quote! { #name }
            }
            TypeDescriptor::Named { item, args } => {
                let path = self.q.path(item);
                if args.is_empty() {
                    return path;
                }
                let args: Vec<TokenStream> = args.iter().map(|a| self.arg(a)).collect();
                quote! { #path<#(#args),*> }
            }
            TypeDescriptor::Reference {
                lifetime,
                mutable,
                inner,
            } => {
                let lt = lifetime.as_deref().and_then(|l| self.lifetime(l));
                let inner = self.ty(inner);
                let mutability = mutable.then(|| quote! { mut });
                quote! { & #lt #mutability #inner }
            }
            TypeDescriptor::RawPointer { mutable, inner } => {
                let inner = self.ty(inner);
                if *mutable {
                    quote! { *mut #inner }
                } else {
                    quote! { *const #inner }
                }
            }
            TypeDescriptor::Slice(inner) => {
                let inner = self.ty(inner);
                quote! { [#inner] }
            }
            TypeDescriptor::Array { elem, len } => {
                let elem = self.ty(elem);
                let len = tokens(len);
                quote! { [#elem; #len] }
            }
            TypeDescriptor::Tuple(elems) => {
                let elems: Vec<TokenStream> = elems.iter().map(|e| self.ty(e)).collect();
                quote! { (#(#elems,)*) }
            }
            TypeDescriptor::FnPointer {
                is_unsafe,
                params,
                output,
            } => {
                let unsafety = is_unsafe.then(|| quote! { unsafe });
                let params: Vec<TokenStream> = params.iter().map(|p| self.ty(p)).collect();
                let output = self.output(output);
                quote! { #unsafety fn(#(#params),*) #output }
            }
            TypeDescriptor::TraitObject(bounds) => {
                let bounds: Vec<TokenStream> = bounds.iter().filter_map(|b| self.bound(b)).collect();
                quote! { dyn #(#bounds)+* }
            }
            TypeDescriptor::SelfType => match self.self_ty {
                Some(name) => quote! { #name },
                None => quote! { Self },
            },
            TypeDescriptor::Never => quote! { ! },
            TypeDescriptor::Param(name) => {
                let name = ident(name);
                quote! { #name }
            }
        }
    }

    fn arg(&mut self, arg: &GenericArg) -> TokenStream {
        match arg {
            GenericArg::Type(ty) => self.ty(ty),
            GenericArg::Lifetime(l) => self.lifetime_arg(l),
            GenericArg::Binding { name, ty } => {
                let name = ident(name);
                let ty = self.ty(ty);
                quote! { #name = #ty }
            }
            GenericArg::Const(expr) => tokens(expr),
        }
    }

    fn output(&mut self, output: &TypeDescriptor) -> Option<TokenStream> {
        if output.is_unit() {
            return None;
        }
        let ty = self.ty(output);
        Some(quote! { -> #ty })
    }

    fn bound(&mut self, bound: &Bound) -> Option<TokenStream> {
        match bound {
            Bound::Trait { item, args, sugar } => {
                let path = self.q.path(item);
                if let Some(sugar) = sugar {
                    let inputs: Vec<TokenStream> = sugar.inputs.iter().map(|i| self.ty(i)).collect();
                    let output = self.output(&sugar.output);
                    return Some(quote! { #path(#(#inputs),*) #output });
                }
                if args.is_empty() {
                    return Some(path);
                }
                let args: Vec<TokenStream> = args.iter().map(|a| self.arg(a)).collect();
                Some(quote! { #path<#(#args),*> })
            }
            Bound::Lifetime(l) => self.lifetime(l),
        }
    }
}

/// Re-lexes recorded source text such as an array length.
fn tokens(text: &str) -> TokenStream {
    text.parse().unwrap_or_else(|_| {
        let lit = proc_macro2::Literal::string(text);
        quote! { #lit }
    })
}

#[cfg(test)]
mod tests {
    use mockgen_core::Primitive;

    use super::*;

    fn render(q: &mut Qualifier, ty: &TypeDescriptor, mode: Lifetimes) -> String {
        q.ty(ty, mode, None).to_string()
    }

    fn str_ref(lifetime: Option<&str>) -> TypeDescriptor {
        TypeDescriptor::Reference {
            lifetime: lifetime.map(str::to_string),
            mutable: false,
            inner: Box::new(TypeDescriptor::Primitive(Primitive::Str)),
        }
    }

    #[test]
    fn qualifies_by_package() {
        let mut q = Qualifier::new(Some("example.com/app".into()));
        assert_eq!(q.path(&ItemRef::std("option::Option")).to_string(), "Option");
        assert_eq!(q.path(&ItemRef::std("sync::Arc")).to_string(), ":: std :: sync :: Arc");
        assert_eq!(
            q.path(&ItemRef::new("example.com/app", "model::Row")).to_string(),
            "crate :: model :: Row"
        );
        assert_eq!(
            q.path(&ItemRef::new("example.com/dep", "Thing")).to_string(),
            "dep :: Thing"
        );
        assert_eq!(q.use_decls().to_string(), "use :: dep ;");
    }

    #[test]
    fn same_crate_names_get_suffixed_aliases() {
        let mut q = Qualifier::new(None);
        q.path(&ItemRef::new("example.com/a/model", "A"));
        let second = q.path(&ItemRef::new("example.com/b/model", "B"));
        assert_eq!(second.to_string(), "model2 :: B");
        assert_eq!(
            q.use_decls().to_string(),
            "use :: model ; use :: model as model2 ;"
        );
    }

    #[test]
    fn lifetime_modes() {
        let mut q = Qualifier::new(None);
        let ty = str_ref(Some("a"));
        assert_eq!(render(&mut q, &ty, Lifetimes::Keep), "& 'a str");
        assert_eq!(render(&mut q, &ty, Lifetimes::Erase), "& str");
        assert_eq!(render(&mut q, &ty, Lifetimes::Static), "& 'static str");
    }

    #[test]
    fn one_tuples_keep_their_comma() {
        let mut q = Qualifier::new(None);
        let ty = TypeDescriptor::Tuple(vec![TypeDescriptor::Primitive(Primitive::U8)]);
        assert_eq!(render(&mut q, &ty, Lifetimes::Keep), "(u8 ,)");
        assert_eq!(render(&mut q, &TypeDescriptor::unit(), Lifetimes::Keep), "()");
    }
}
