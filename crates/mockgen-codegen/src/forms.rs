//! Owned forms of signature types.
//!
//! Recorder state outlives every call, so call records and programmed
//! returns hold an *owned form* of each type: `&str` becomes `String`,
//! `&[T]` becomes `Vec<T>`, `&Path` becomes `PathBuf` and `&T` becomes `T`,
//! recursively through `Option`, `Vec`, `Result`, `Box` and tuples. Owned
//! forms must be `Clone`.
//!
//! Three expressions are derived from a type: the snapshot of a borrowed
//! value into its owned form, the production of a declared value from an
//! owned one (references are produced by leaking), and the zero value.

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use mockgen_core::{GenericArg, ItemRef, Primitive, TypeDescriptor};

use crate::imports::{Lifetimes, Qualifier};

/// Std containers whose owned form maps their type arguments.
const CONTAINERS: &[&str] = &["option::Option", "vec::Vec", "result::Result", "boxed::Box"];

/// Std types whose `Default` does not depend on their arguments.
const ALWAYS_DEFAULT: &[&str] = &[
    "string::String",
    "vec::Vec",
    "option::Option",
    "collections::HashMap",
    "collections::HashSet",
    "collections::BTreeMap",
    "collections::BTreeSet",
    "collections::VecDeque",
    "collections::LinkedList",
    "path::PathBuf",
    "ffi::OsString",
    "ffi::CString",
    "time::Duration",
];

/// Std wrappers that are `Default` when their argument is.
const DEFAULT_WRAPPERS: &[&str] = &["boxed::Box", "sync::Arc", "rc::Rc", "cell::RefCell", "sync::Mutex"];

/// The owned counterpart of an unsized std type behind a reference.
const UNSIZED_OWNED: &[(&str, &str, &str)] = &[
    ("path::Path", "path::PathBuf", "into_boxed_path"),
    ("ffi::OsStr", "ffi::OsString", "into_boxed_os_str"),
    ("ffi::CStr", "ffi::CString", "into_boxed_c_str"),
];

/// The owned form of `ty`, or `None` if there is none: trait objects, raw
/// pointers and references inside arbitrary generic types.
pub fn owned(ty: &TypeDescriptor) -> Option<TypeDescriptor> {
    match ty {
        TypeDescriptor::Primitive(Primitive::Str) => Some(std_named("string::String", Vec::new())),
        TypeDescriptor::Primitive(_) | TypeDescriptor::FnPointer { .. } | TypeDescriptor::SelfType => {
            Some(ty.clone())
        }
        TypeDescriptor::Reference { inner, .. } => owned_behind_ref(inner),
        TypeDescriptor::Named { item, args } => {
            if !ty.contains_reference() && !has_unowned(ty) {
                return Some(ty.clone());
            }
            if !item.is_std_item(CONTAINERS) {
                return None;
            }
            let args = args
                .iter()
                .map(|arg| match arg {
                    GenericArg::Type(t) => owned(t).map(GenericArg::Type),
                    other => Some(other.clone()),
                })
                .collect::<Option<Vec<_>>>()?;
            Some(TypeDescriptor::Named {
                item: item.clone(),
                args,
            })
        }
        TypeDescriptor::Slice(elem) => Some(std_named("vec::Vec", vec![GenericArg::Type(owned(elem)?)])),
        TypeDescriptor::Array { .. } => (!ty.contains_reference() && !has_unowned(ty)).then(|| ty.clone()),
        TypeDescriptor::Tuple(elems) => Some(TypeDescriptor::Tuple(
            elems.iter().map(owned).collect::<Option<Vec<_>>>()?,
        )),
        TypeDescriptor::RawPointer { .. }
        | TypeDescriptor::TraitObject(_)
        | TypeDescriptor::Never
        | TypeDescriptor::Param(_) => None,
    }
}

fn owned_behind_ref(inner: &TypeDescriptor) -> Option<TypeDescriptor> {
    if let TypeDescriptor::Named { item, args } = inner {
        if args.is_empty() {
            if let Some((_, to, _)) = UNSIZED_OWNED.iter().find(|(from, _, _)| item.is_std_item(&[from])) {
                return Some(std_named(to, Vec::new()));
            }
        }
    }
    owned(inner)
}

/// Whether a type holds something with no owned form outside references.
fn has_unowned(ty: &TypeDescriptor) -> bool {
    match ty {
        TypeDescriptor::RawPointer { .. } | TypeDescriptor::TraitObject(_) | TypeDescriptor::Never => true,
        TypeDescriptor::Named { args, .. } => args.iter().filter_map(GenericArg::ty).any(has_unowned),
        TypeDescriptor::Reference { inner, .. } | TypeDescriptor::Slice(inner) => has_unowned(inner),
        TypeDescriptor::Array { elem, .. } => has_unowned(elem),
        TypeDescriptor::Tuple(elems) => elems.iter().any(has_unowned),
        _ => false,
    }
}

/// Whether `Self` appears anywhere in the type.
pub fn mentions_self(ty: &TypeDescriptor) -> bool {
    match ty {
        TypeDescriptor::SelfType => true,
        TypeDescriptor::Named { args, .. } => args.iter().filter_map(GenericArg::ty).any(mentions_self),
        TypeDescriptor::Reference { inner, .. }
        | TypeDescriptor::RawPointer { inner, .. }
        | TypeDescriptor::Slice(inner) => mentions_self(inner),
        TypeDescriptor::Array { elem, .. } => mentions_self(elem),
        TypeDescriptor::Tuple(elems) => elems.iter().any(mentions_self),
        TypeDescriptor::FnPointer { params, output, .. } => {
            params.iter().any(mentions_self) || mentions_self(output)
        }
        _ => false,
    }
}

/// The owned std type and its boxing method for an unsized std type.
fn unsized_owner(ty: &TypeDescriptor) -> Option<(&'static str, &'static str)> {
    UNSIZED_OWNED
        .iter()
        .find(|(from, _, _)| is_std(ty, from))
        .map(|(_, to, method)| (*to, *method))
}

fn std_named(path: &str, args: Vec<GenericArg>) -> TypeDescriptor {
    TypeDescriptor::Named {
        item: ItemRef::std(path),
        args,
    }
}

fn type_arg(ty: &TypeDescriptor, index: usize) -> Option<&TypeDescriptor> {
    match ty {
        TypeDescriptor::Named { args, .. } => args.iter().filter_map(GenericArg::ty).nth(index),
        _ => None,
    }
}

fn is_std(ty: &TypeDescriptor, path: &str) -> bool {
    matches!(ty, TypeDescriptor::Named { item, .. } if item.is_std_item(&[path]))
}

/// Expression builder for one generated file.
pub struct FormCx<'c> {
    pub q: &'c mut Qualifier,
    /// The holder type, standing in for `Self` outside trait impls.
    pub holder: &'c Ident,
    /// Module holding the zero-value fallback, emitted when `uses_support`.
    pub support: &'c Ident,
    pub uses_support: bool,
}

impl FormCx<'_> {
    /// Renders an owned form.
    pub fn owned_ty(&mut self, owned: &TypeDescriptor) -> TokenStream {
        self.q.ty(owned, Lifetimes::Static, Some(self.holder))
    }

    /// Converts `e`, an expression of type `&ty`, into the owned form of
    /// `ty`. The caller has checked that the owned form exists.
    pub fn snapshot(&self, ty: &TypeDescriptor, e: TokenStream) -> TokenStream {
        if !ty.contains_reference() {
            return quote! { ::std::clone::Clone::clone(#e) };
        }
        match ty {
            TypeDescriptor::Reference { inner, .. } => {
                let unsized_std = matches!(**inner, TypeDescriptor::Primitive(Primitive::Str))
                    || UNSIZED_OWNED.iter().any(|(from, _, _)| is_std(inner, from));
                match &**inner {
                    _ if unsized_std => quote! { ::std::borrow::ToOwned::to_owned(&**#e) },
                    TypeDescriptor::Slice(elem) if !elem.contains_reference() => {
                        quote! { ::std::borrow::ToOwned::to_owned(&**#e) }
                    }
                    TypeDescriptor::Slice(elem) => {
                        let item = self.snapshot(elem, quote! { v });
                        quote! { (#e).iter().map(|v| #item).collect::<::std::vec::Vec<_>>() }
                    }
                    other => self.snapshot(other, quote! { &**#e }),
                }
            }
            TypeDescriptor::Named { item, .. } if item.is_std_item(&["option::Option"]) => {
                let inner = self.snapshot_arg(ty, 0);
                quote! { (#e).as_ref().map(|v| #inner) }
            }
            TypeDescriptor::Named { item, .. } if item.is_std_item(&["vec::Vec"]) => {
                let inner = self.snapshot_arg(ty, 0);
                quote! { (#e).iter().map(|v| #inner).collect::<::std::vec::Vec<_>>() }
            }
            TypeDescriptor::Named { item, .. } if item.is_std_item(&["result::Result"]) => {
                let ok = self.snapshot_arg(ty, 0);
                let err = self.snapshot_arg(ty, 1);
                quote! { (#e).as_ref().map(|v| #ok).map_err(|v| #err) }
            }
            TypeDescriptor::Named { item, .. } if item.is_std_item(&["boxed::Box"]) => {
                let inner = match type_arg(ty, 0) {
                    Some(inner) => self.snapshot(inner, quote! { &**#e }),
                    None => quote! { ::std::clone::Clone::clone(#e) },
                };
                quote! { ::std::boxed::Box::new(#inner) }
            }
            TypeDescriptor::Tuple(elems) => {
                let parts = elems.iter().enumerate().map(|(i, elem)| {
                    let index = syn::Index::from(i);
                    self.snapshot(elem, quote! { &(#e).#index })
                });
                quote! { (#(#parts,)*) }
            }
            _ => quote! { ::std::clone::Clone::clone(#e) },
        }
    }

    fn snapshot_arg(&self, ty: &TypeDescriptor, index: usize) -> TokenStream {
        match type_arg(ty, index) {
            Some(arg) => self.snapshot(arg, quote! { v }),
            None => quote! { ::std::clone::Clone::clone(v) },
        }
    }

    /// Converts `x`, a value of the owned form of `ty`, into a value of
    /// `ty`. References are produced by leaking the owned value.
    pub fn produce(&self, ty: &TypeDescriptor, x: TokenStream) -> TokenStream {
        self.produce_at(ty, x, 0)
    }

    fn produce_at(&self, ty: &TypeDescriptor, x: TokenStream, depth: usize) -> TokenStream {
        if !ty.contains_reference() {
            return x;
        }
        let v = format_ident!("v{}", depth);
        match ty {
            TypeDescriptor::Reference { mutable, inner, .. } => {
                let leaked = match (&**inner, unsized_owner(inner)) {
                    (_, Some((to, method))) => {
                        let owner: Vec<Ident> = to.split("::").map(|s| format_ident!("{}", s)).collect();
                        let method = format_ident!("{}", method);
                        quote! { ::std::boxed::Box::leak(::std #(::#owner)*::#method(#x)) }
                    }
                    (TypeDescriptor::Primitive(Primitive::Str), None) => {
                        quote! { ::std::boxed::Box::leak(::std::string::String::into_boxed_str(#x)) }
                    }
                    (TypeDescriptor::Slice(elem), None) => {
                        let vec = if elem.contains_reference() {
                            let item = self.produce_at(elem, quote! { #v }, depth + 1);
                            quote! { (#x).into_iter().map(|#v| #item).collect::<::std::vec::Vec<_>>() }
                        } else {
                            x
                        };
                        quote! { ::std::boxed::Box::leak(::std::vec::Vec::into_boxed_slice(#vec)) }
                    }
                    (other, None) => {
                        let value = self.produce_at(other, x, depth + 1);
                        quote! { ::std::boxed::Box::leak(::std::boxed::Box::new(#value)) }
                    }
                };
                if *mutable {
                    leaked
                } else {
                    quote! { &*#leaked }
                }
            }
            TypeDescriptor::Named { item, .. } if item.is_std_item(&["option::Option"]) => {
                let inner = self.produce_arg(ty, 0, &v, depth);
                quote! { (#x).map(|#v| #inner) }
            }
            TypeDescriptor::Named { item, .. } if item.is_std_item(&["vec::Vec"]) => {
                let inner = self.produce_arg(ty, 0, &v, depth);
                quote! { (#x).into_iter().map(|#v| #inner).collect::<::std::vec::Vec<_>>() }
            }
            TypeDescriptor::Named { item, .. } if item.is_std_item(&["result::Result"]) => {
                let ok = self.produce_arg(ty, 0, &v, depth);
                let err = self.produce_arg(ty, 1, &v, depth);
                quote! { (#x).map(|#v| #ok).map_err(|#v| #err) }
            }
            TypeDescriptor::Named { item, .. } if item.is_std_item(&["boxed::Box"]) => {
                let inner = match type_arg(ty, 0) {
                    Some(inner) => self.produce_at(inner, quote! { *#x }, depth + 1),
                    None => quote! { *#x },
                };
                quote! { ::std::boxed::Box::new(#inner) }
            }
            TypeDescriptor::Tuple(elems) => {
                let names: Vec<Ident> = (0..elems.len()).map(|i| format_ident!("v{}_{}", depth, i)).collect();
                let parts = elems
                    .iter()
                    .zip(&names)
                    .map(|(elem, name)| self.produce_at(elem, quote! { #name }, depth + 1));
                quote! {{
                    let (#(#names,)*) = #x;
                    (#(#parts,)*)
                }}
            }
            _ => x,
        }
    }

    fn produce_arg(&self, ty: &TypeDescriptor, index: usize, v: &Ident, depth: usize) -> TokenStream {
        match type_arg(ty, index) {
            Some(arg) => self.produce_at(arg, quote! { #v }, depth + 1),
            None => quote! { #v },
        }
    }

    /// The zero value of an owned form. Types not known to be `Default`
    /// go through the file's fallback, which panics with `missing` when the
    /// type has no `Default` impl.
    pub fn zero(&mut self, owned: &TypeDescriptor, missing: &str) -> TokenStream {
        if let Some((ok, _)) = owned.as_result() {
            let ok = self.zero(ok, missing);
            return quote! { ::std::result::Result::Ok(#ok) };
        }
        if let TypeDescriptor::Tuple(elems) = owned {
            if !elems.is_empty() && !elems.iter().all(known_default) {
                let parts: Vec<TokenStream> = elems.iter().map(|e| self.zero(e, missing)).collect();
                return quote! { (#(#parts,)*) };
            }
        }
        if known_default(owned) {
            return quote! { ::std::default::Default::default() };
        }

        self.uses_support = true;
        let support = self.support;
        let ty = self.owned_ty(owned);
        // Only one of the two traits ends up selected for a given type.
        quote! {{
            #[allow(unused_imports)]
            use self::#support::{Fallback as _, ViaDefault as _};
            match (&self::#support::Zero::<#ty>(::std::marker::PhantomData)).zero() {
                ::std::option::Option::Some(value) => value,
                ::std::option::Option::None => panic!(#missing),
            }
        }}
    }
}

/// Whether an owned form is `Default` regardless of user types.
fn known_default(ty: &TypeDescriptor) -> bool {
    match ty {
        TypeDescriptor::Primitive(p) => !matches!(p, Primitive::Str),
        TypeDescriptor::Tuple(elems) => elems.len() <= 12 && elems.iter().all(known_default),
        TypeDescriptor::SelfType => true,
        TypeDescriptor::Named { item, .. } if item.is_std_item(ALWAYS_DEFAULT) => true,
        TypeDescriptor::Named { item, .. } if item.is_std_item(DEFAULT_WRAPPERS) => {
            type_arg(ty, 0).is_some_and(known_default)
        }
        _ => false,
    }
}

/// The fallback used for zero values of types that may lack `Default`.
/// Method resolution picks `ViaDefault` when the type implements `Default`
/// and the autoref'd `Fallback` otherwise.
pub fn support_module(name: &Ident) -> TokenStream {
    quote! {
        #[doc(hidden)]
        #[allow(dead_code)]
        mod #name {
            pub struct Zero<T>(pub ::std::marker::PhantomData<T>);

            pub trait ViaDefault<T> {
                fn zero(&self) -> ::std::option::Option<T>;
            }

            impl<T: ::std::default::Default> ViaDefault<T> for Zero<T> {
                fn zero(&self) -> ::std::option::Option<T> {
                    ::std::option::Option::Some(T::default())
                }
            }

            pub trait Fallback<T> {
                fn zero(&self) -> ::std::option::Option<T>;
            }

            impl<T> Fallback<T> for &Zero<T> {
                fn zero(&self) -> ::std::option::Option<T> {
                    ::std::option::Option::None
                }
            }
        }
    }
}
