//! The synthesis model: every name, type and expression a mock needs,
//! resolved once per interface before any step runs.

use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote};

use mockgen_core::{InterfaceDescriptor, ItemRef, MethodDescriptor, Receiver, TypeDescriptor};

use crate::error::CodegenError;
use crate::forms::{self, FormCx};
use crate::imports::{ident, Lifetimes};
use crate::naming::{mock_base, title_case, NameAllocator};

/// A trait the holder implements, with its rendered path.
pub struct ImplModel {
    pub item: ItemRef,
    pub path: TokenStream,
    pub is_unsafe: bool,
}

/// One interface.
pub struct Model {
    pub holder: Ident,
    pub outcome: Ident,
    pub state: Ident,
    /// The path of the requested trait, for `from_impl` bounds.
    pub trait_path: TokenStream,
    pub impls: Vec<ImplModel>,
    pub methods: Vec<MethodModel>,
    /// Whether `from_impl` wraps the implementation in a mutex.
    pub locks_inner: bool,
    /// The declaring trait and package, for doc comments.
    pub origin: String,
}

/// One method parameter, `argN`.
pub struct ParamModel {
    pub arg: Ident,
    /// As declared, for the trait impl signature.
    pub declared: TokenStream,
    /// With lifetimes erased, for hooks.
    pub hook_ty: TokenStream,
    /// The owned form stored in call records; `()` when there is none.
    pub record_ty: TokenStream,
    pub opaque: bool,
    /// Snapshot of `argN` into `record_ty`.
    pub record: TokenStream,
    /// The type and expression `args()` yields for this parameter.
    pub view_ty: TokenStream,
    pub view: TokenStream,
}

/// One result, `resultN`.
pub struct ResultModel {
    pub field: Ident,
    pub owned_ty: TokenStream,
    /// Copy of the matching part of the hook's `result`.
    pub record: TokenStream,
}

/// One flattened method.
pub struct MethodModel {
    pub name: Ident,
    pub owner: ItemRef,
    pub field: Ident,
    pub func: Ident,
    pub call: Ident,
    pub hook: Ident,
    /// `MockStore.get`, for panic messages.
    pub label: String,
    pub generics: Option<TokenStream>,
    pub receiver: TokenStream,
    pub is_mut: bool,
    pub is_unsafe: bool,
    pub params: Vec<ParamModel>,
    /// The declared return type; `None` for unit.
    pub output: Option<TokenStream>,
    pub results: Vec<ResultModel>,
    /// What hooks and programmed returns yield: the owned results, as a
    /// tuple when there are several.
    pub hook_output: TokenStream,
    pub zero: TokenStream,
    /// Converts the hook's `result` into the declared return value.
    pub produce: TokenStream,
    /// Converts a declared `result` of the wrapped implementation into
    /// `hook_output`. `None` when the method cannot be delegated.
    pub delegate: Option<TokenStream>,
}

impl MethodModel {
    pub fn args(&self) -> impl Iterator<Item = &Ident> {
        self.params.iter().map(|p| &p.arg)
    }

    pub fn hook_params(&self) -> impl Iterator<Item = &TokenStream> {
        self.params.iter().map(|p| &p.hook_ty)
    }
}

impl Model {
    /// Builds the model of one interface, allocating its names from `names`.
    pub fn build(
        interface: &InterfaceDescriptor,
        names: &mut NameAllocator,
        cx: &mut FormCx<'_>,
        holder: Ident,
    ) -> Result<Model, CodegenError> {
        let base = holder.to_string();
        let outcome = format_ident!("{}", names.allocate(&format!("{base}Outcome")));
        let state = format_ident!("{}", names.allocate(&format!("{base}State")));

        let trait_path = cx.q.path(&interface.trait_ref);
        let impls = interface
            .implements
            .iter()
            .map(|t| ImplModel {
                item: t.item.clone(),
                path: cx.q.path(&t.item),
                is_unsafe: t.is_unsafe,
            })
            .collect();

        let methods = interface
            .methods
            .iter()
            .map(|m| method_model(interface, m, &base, names, cx))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Model {
            holder,
            outcome,
            state,
            trait_path,
            impls,
            methods,
            locks_inner: interface.has_mut_receiver(),
            origin: format!("{} (from the package {})", interface.name, interface.package),
        })
    }
}

/// Allocates the holder name of an interface.
pub fn holder_name(interface: &InterfaceDescriptor, names: &mut NameAllocator) -> Ident {
    format_ident!("{}", names.allocate(&mock_base(interface.prefix.as_deref(), &interface.name)))
}

fn method_model(
    interface: &InterfaceDescriptor,
    method: &MethodDescriptor,
    base: &str,
    names: &mut NameAllocator,
    cx: &mut FormCx<'_>,
) -> Result<MethodModel, CodegenError> {
    let title = title_case(&method.name);
    let func = format_ident!("{}", names.allocate(&format!("{base}{title}Func")));
    let call = format_ident!("{}", names.allocate(&format!("{func}Call")));
    let hook = format_ident!("{}", names.allocate(&format!("{base}{title}Hook")));
    let label = format!("{base}.{}", method.name.trim_start_matches("r#"));

    let params = method
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| param_model(i, &p.ty, p.variadic, cx))
        .collect();

    let unsupported = |ty: &TypeDescriptor, cx: &mut FormCx<'_>| CodegenError::UnsupportedType {
        interface: interface.name.clone(),
        method: method.name.clone(),
        ty: cx.q.ty(ty, Lifetimes::Keep, None).to_string(),
    };
    let mut owned_results = Vec::with_capacity(method.results.len());
    for ty in &method.results {
        match forms::owned(ty) {
            Some(owned) => owned_results.push(owned),
            None => return Err(unsupported(ty, cx)),
        }
    }

    let many = owned_results.len() > 1;
    let results = owned_results
        .iter()
        .enumerate()
        .map(|(i, owned)| {
            let record = if many {
                let index = syn::Index::from(i);
                quote! { ::std::clone::Clone::clone(&result.#index) }
            } else {
                quote! { ::std::clone::Clone::clone(&result) }
            };
            ResultModel {
                field: format_ident!("result{}", i),
                owned_ty: cx.owned_ty(owned),
                record,
            }
        })
        .collect::<Vec<_>>();

    let owned_output = match owned_results.as_slice() {
        [single] => single.clone(),
        many => TypeDescriptor::Tuple(many.to_vec()),
    };
    let hook_output = cx.owned_ty(&owned_output);
    let zero = cx.zero(
        &owned_output,
        &format!("no zero value for the result of {label}; configure a hook or return value"),
    );

    let output_ty = method.output();
    let output = (!output_ty.is_unit()).then(|| cx.q.ty(&output_ty, Lifetimes::Keep, None));
    let produce = cx.produce(&output_ty, quote! { result });

    let delegable = !method.params.iter().any(|p| forms::mentions_self(&p.ty))
        && !forms::mentions_self(&output_ty);
    let delegate = delegable.then(|| {
        if output_ty.contains_reference() {
            cx.snapshot(&output_ty, quote! { &result })
        } else {
            quote! { result }
        }
    });

    let generics = (!method.lifetimes.is_empty()).then(|| {
        let params = method.lifetimes.iter().map(|lt| {
            let name = lifetime(&lt.name);
            let bounds: Vec<syn::Lifetime> = lt.bounds.iter().map(|b| lifetime(b)).collect();
            if bounds.is_empty() {
                quote! { #name }
            } else {
                quote! { #name: #(#bounds)+* }
            }
        });
        quote! { <#(#params),*> }
    });

    let receiver = match &method.receiver {
        Receiver::Ref { lifetime: lt } => {
            let lt = lt.as_deref().map(lifetime);
            quote! { &#lt self }
        }
        Receiver::RefMut { lifetime: lt } => {
            let lt = lt.as_deref().map(lifetime);
            quote! { &#lt mut self }
        }
    };

    let name = ident(&method.name);
    let field = format_ident!("{}_func", method.name.trim_start_matches("r#"));

    Ok(MethodModel {
        name,
        owner: method.owner.clone(),
        field,
        func,
        call,
        hook,
        label,
        generics,
        receiver,
        is_mut: method.receiver.is_mut(),
        is_unsafe: method.is_unsafe,
        params,
        output,
        results,
        hook_output,
        zero,
        produce,
        delegate,
    })
}

fn param_model(index: usize, ty: &TypeDescriptor, variadic: bool, cx: &mut FormCx<'_>) -> ParamModel {
    let arg = format_ident!("arg{}", index);
    let declared = cx.q.ty(ty, Lifetimes::Keep, None);
    let hook_ty = cx.q.ty(ty, Lifetimes::Erase, Some(cx.holder));

    let Some(owned) = forms::owned(ty) else {
        return ParamModel {
            record_ty: quote! { () },
            opaque: true,
            record: quote! { () },
            view_ty: quote! { &() },
            view: quote! { &self.#arg },
            arg,
            declared,
            hook_ty,
        };
    };

    let record_ty = cx.owned_ty(&owned);
    let record = cx.snapshot(ty, quote! { &#arg });
    let (view_ty, view) = match owned.as_std_wrapper("vec::Vec").filter(|_| variadic) {
        Some(elem) => {
            let elem = cx.owned_ty(elem);
            (quote! { &[#elem] }, quote! { self.#arg.as_slice() })
        }
        None => (quote! { &#record_ty }, quote! { &self.#arg }),
    };

    ParamModel {
        arg,
        declared,
        hook_ty,
        record_ty,
        opaque: false,
        record,
        view_ty,
        view,
    }
}

fn lifetime(name: &str) -> syn::Lifetime {
    syn::Lifetime::new(&format!("'{name}"), Span::call_site())
}
