//! The holder struct, its shared recorder state and its constructors.

use proc_macro2::TokenStream;
use quote::quote;

use crate::model::{MethodModel, Model};
use crate::pipeline::Synthesis;

use super::hook_return;

pub fn holder_struct(model: &Model, mut s: Synthesis) -> Synthesis {
    let holder = &model.holder;
    let name = holder.to_string();
    let doc = format!(" {name} is a mock implementation of the {} trait used for unit testing.", model.origin);
    let fields = model.methods.iter().map(|m| {
        let field = &m.field;
        let func = &m.func;
        let doc = format!(" Controls and records calls of `{}`.", m.name);
        quote! {
            #[doc = #doc]
            pub #field: #func,
        }
    });

    s.holder.push(quote! {
        #[doc = #doc]
        #[derive(Clone)]
        pub struct #holder {
            #(#fields)*
        }

        impl ::std::fmt::Debug for #holder {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(#name).finish_non_exhaustive()
            }
        }

        impl ::std::default::Default for #holder {
            fn default() -> Self {
                Self::new()
            }
        }
    });

    if !model.methods.is_empty() {
        s.holder.push(shared_state(model));
    }
    s
}

/// The outcome enum and the generic state behind every recorder of the
/// holder.
fn shared_state(model: &Model) -> TokenStream {
    let outcome = &model.outcome;
    let state = &model.state;
    quote! {
        enum #outcome<H, R> {
            Hook(H),
            Return(R),
            Zero,
            Strict,
        }

        struct #state<H, R, C> {
            strict: bool,
            hooks: ::std::collections::VecDeque<H>,
            default_hook: Option<H>,
            returns: ::std::collections::VecDeque<R>,
            default_return: Option<R>,
            delegate: Option<H>,
            history: Vec<C>,
        }

        impl<H: Clone, R: Clone, C> #state<H, R, C> {
            fn new(strict: bool, delegate: Option<H>) -> Self {
                Self {
                    strict,
                    hooks: ::std::collections::VecDeque::new(),
                    default_hook: None,
                    returns: ::std::collections::VecDeque::new(),
                    default_return: None,
                    delegate,
                    history: Vec::new(),
                }
            }

            fn next(&mut self) -> #outcome<H, R> {
                if let Some(hook) = self.hooks.pop_front() {
                    return #outcome::Hook(hook);
                }
                if let Some(hook) = &self.default_hook {
                    return #outcome::Hook(hook.clone());
                }
                if let Some(result) = self.returns.pop_front() {
                    return #outcome::Return(result);
                }
                if let Some(result) = &self.default_return {
                    return #outcome::Return(result.clone());
                }
                if let Some(hook) = &self.delegate {
                    return #outcome::Hook(hook.clone());
                }
                if self.strict {
                    #outcome::Strict
                } else {
                    #outcome::Zero
                }
            }
        }
    }
}

fn unconfigured(model: &Model, strict: bool) -> TokenStream {
    let fields = model.methods.iter().map(|m| {
        let field = &m.field;
        let func = &m.func;
        quote! { #field: #func::new(#strict, None), }
    });
    quote! {
        Self {
            #(#fields)*
        }
    }
}

pub fn zero_constructor(model: &Model, mut s: Synthesis) -> Synthesis {
    let body = unconfigured(model, false);
    s.constructors.push(quote! {
        /// Creates a mock whose methods return zero values until configured.
        pub fn new() -> Self {
            #body
        }
    });
    s
}

pub fn strict_constructor(model: &Model, mut s: Synthesis) -> Synthesis {
    let body = unconfigured(model, true);
    s.constructors.push(quote! {
        /// Creates a mock whose unconfigured methods panic when called.
        pub fn strict() -> Self {
            #body
        }
    });
    s
}

pub fn delegating_constructor(model: &Model, mut s: Synthesis) -> Synthesis {
    let trait_path = &model.trait_path;
    let wrapped = if model.locks_inner {
        quote! { ::std::sync::Arc::new(::std::sync::Mutex::new(inner)) }
    } else {
        quote! { ::std::sync::Arc::new(inner) }
    };
    let fields = model.methods.iter().map(|m| {
        let field = &m.field;
        let func = &m.func;
        match delegate(model, m) {
            Some(hook) => quote! { #field: #func::new(false, Some(#hook)), },
            None => quote! { #field: #func::new(false, None), },
        }
    });
    let (param, setup) = if model.methods.is_empty() {
        (quote! { _inner }, None)
    } else {
        (quote! { inner }, Some(quote! { let inner = #wrapped; }))
    };

    s.constructors.push(quote! {
        /// Creates a mock whose unconfigured methods call through to `inner`.
        pub fn from_impl<T>(#param: T) -> Self
        where
            T: #trait_path + Send + Sync + 'static,
        {
            #setup
            Self {
                #(#fields)*
            }
        }
    });
    s
}

/// A hook calling the wrapped implementation, or `None` when the method's
/// signature cannot be forwarded.
fn delegate(model: &Model, method: &MethodModel) -> Option<TokenStream> {
    let snapshot = method.delegate.as_ref()?;
    let owner = &model.impls.iter().find(|i| i.item == method.owner)?.path;
    let name = &method.name;
    let hook = &method.hook;
    let params = method.params.iter().map(|p| {
        let arg = &p.arg;
        let ty = &p.hook_ty;
        quote! { #arg: #ty }
    });
    let args = method.args();

    let (lock, receiver) = match (model.locks_inner, method.is_mut) {
        (true, true) => (
            Some(quote! { let mut guard = inner.lock().unwrap_or_else(::std::sync::PoisonError::into_inner); }),
            quote! { &mut *guard },
        ),
        (true, false) => (
            Some(quote! { let guard = inner.lock().unwrap_or_else(::std::sync::PoisonError::into_inner); }),
            quote! { &*guard },
        ),
        (false, _) => (None, quote! { &*inner }),
    };
    let mut invocation = quote! { <T as #owner>::#name(#receiver, #(#args),*) };
    if method.is_unsafe {
        invocation = quote! { unsafe { #invocation } };
    }
    let ret = hook_return(method);
    let body = if method.results.is_empty() {
        quote! { #invocation; }
    } else {
        quote! {
            let result = #invocation;
            let owned = #snapshot;
            owned
        }
    };

    Some(quote! {{
        let inner = ::std::sync::Arc::clone(&inner);
        let hook: #hook = ::std::sync::Arc::new(move |#(#params),*| #ret {
            #lock
            #body
        });
        hook
    }})
}
