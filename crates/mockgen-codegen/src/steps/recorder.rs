//! Per-method recorders: the hook alias, the recorder struct and its
//! configuration and inspection methods.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::model::{MethodModel, Model};
use crate::pipeline::Synthesis;

use super::hook_bound;

pub fn recorder_struct(model: &Model, method: &MethodModel, mut s: Synthesis) -> Synthesis {
    let holder = &model.holder;
    let state = &model.state;
    let (func, call, hook) = (&method.func, &method.call, &method.hook);
    let output = &method.hook_output;
    let bound = hook_bound(method);
    let hook_doc = format!(" The hook type of `{}`; hooks return the owned form of its results.", method.name);
    let func_doc = format!(
        " {func} describes the behavior when the `{}` method of the parent {holder} instance is invoked.",
        method.name
    );

    let section = s.recorder(method);
    section.items.push(quote! {
        #[doc = #hook_doc]
        pub type #hook = ::std::sync::Arc<dyn #bound>;

        #[doc = #func_doc]
        #[derive(Clone)]
        pub struct #func {
            state: ::std::sync::Arc<::std::sync::Mutex<#state<#hook, #output, #call>>>,
        }
    });
    section.func_methods.push(quote! {
        fn new(strict: bool, delegate: Option<#hook>) -> Self {
            Self {
                state: ::std::sync::Arc::new(::std::sync::Mutex::new(#state::new(strict, delegate))),
            }
        }

        fn lock(&self) -> ::std::sync::MutexGuard<'_, #state<#hook, #output, #call>> {
            self.state.lock().unwrap_or_else(::std::sync::PoisonError::into_inner)
        }
    });
    s
}

pub fn set_default_hook(_: &Model, method: &MethodModel, mut s: Synthesis) -> Synthesis {
    let hook = &method.hook;
    let bound = hook_bound(method);
    s.recorder(method).func_methods.push(quote! {
        /// Sets the function to call when no one-shot hook is queued.
        pub fn set_default_hook(&self, hook: impl #bound + 'static) {
            let hook: #hook = ::std::sync::Arc::new(hook);
            self.lock().default_hook = Some(hook);
        }
    });
    s
}

pub fn push_hook(_: &Model, method: &MethodModel, mut s: Synthesis) -> Synthesis {
    let hook = &method.hook;
    let bound = hook_bound(method);
    s.recorder(method).func_methods.push(quote! {
        /// Queues a function to handle the next call only. Queued hooks run
        /// in the order they were pushed, before the default hook.
        pub fn push_hook(&self, hook: impl #bound + 'static) {
            let hook: #hook = ::std::sync::Arc::new(hook);
            self.lock().hooks.push_back(hook);
        }
    });
    s
}

/// Parameters and the stored value of a programmed return.
fn return_values(method: &MethodModel) -> (Vec<TokenStream>, TokenStream) {
    let names: Vec<_> = (0..method.results.len()).map(|i| format_ident!("r{}", i)).collect();
    let params = method
        .results
        .iter()
        .zip(&names)
        .map(|(r, name)| {
            let ty = &r.owned_ty;
            quote! { #name: #ty }
        })
        .collect();
    let value = match names.as_slice() {
        [single] => quote! { #single },
        many => quote! { (#(#many,)*) },
    };
    (params, value)
}

pub fn set_default_return(_: &Model, method: &MethodModel, mut s: Synthesis) -> Synthesis {
    let (params, value) = return_values(method);
    s.recorder(method).func_methods.push(quote! {
        /// Sets the values returned when no hook is configured and no
        /// one-shot return is queued.
        pub fn set_default_return(&self, #(#params),*) {
            self.lock().default_return = Some(#value);
        }
    });
    s
}

pub fn push_return(_: &Model, method: &MethodModel, mut s: Synthesis) -> Synthesis {
    let (params, value) = return_values(method);
    s.recorder(method).func_methods.push(quote! {
        /// Queues values to return from the next call only.
        pub fn push_return(&self, #(#params),*) {
            self.lock().returns.push_back(#value);
        }
    });
    s
}

pub fn next_hook(model: &Model, method: &MethodModel, mut s: Synthesis) -> Synthesis {
    let outcome = &model.outcome;
    let hook = &method.hook;
    let output = &method.hook_output;
    s.recorder(method).func_methods.push(quote! {
        fn next_hook(&self) -> #outcome<#hook, #output> {
            self.lock().next()
        }
    });
    s
}

pub fn append_call(_: &Model, method: &MethodModel, mut s: Synthesis) -> Synthesis {
    let call = &method.call;
    s.recorder(method).func_methods.push(quote! {
        fn append_call(&self, call: #call) {
            self.lock().history.push(call);
        }
    });
    s
}

pub fn history(_: &Model, method: &MethodModel, mut s: Synthesis) -> Synthesis {
    let call = &method.call;
    s.recorder(method).func_methods.push(quote! {
        /// Returns a copy of the calls made so far, in call order.
        pub fn history(&self) -> Vec<#call> {
            self.lock().history.clone()
        }
    });
    s
}
