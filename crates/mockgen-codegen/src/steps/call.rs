//! Call records.

use quote::quote;

use crate::model::{MethodModel, Model};
use crate::pipeline::Synthesis;

/// English ordinal of a zero-based position: `0` gives `1st`.
fn ordinal(index: usize) -> String {
    let n = index + 1;
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

pub fn call_struct(model: &Model, method: &MethodModel, mut s: Synthesis) -> Synthesis {
    let call = &method.call;
    let doc = format!(
        " {call} describes one invocation of the `{}` method on an instance of {}.",
        method.name, model.holder
    );
    let args = method.params.iter().enumerate().map(|(i, p)| {
        let arg = &p.arg;
        let ty = &p.record_ty;
        let doc = if p.opaque {
            format!(" Placeholder for the {} argument, whose type cannot be recorded.", ordinal(i))
        } else {
            format!(" The {} argument of this invocation.", ordinal(i))
        };
        quote! {
            #[doc = #doc]
            pub #arg: #ty,
        }
    });
    let results = method.results.iter().enumerate().map(|(i, r)| {
        let field = &r.field;
        let ty = &r.owned_ty;
        let doc = format!(" The {} result of this invocation.", ordinal(i));
        quote! {
            #[doc = #doc]
            pub #field: #ty,
        }
    });

    s.recorder(method).call_items.push(quote! {
        #[doc = #doc]
        #[derive(Clone)]
        pub struct #call {
            #(#args)*
            #(#results)*
        }
    });
    s
}

pub fn args(_: &Model, method: &MethodModel, mut s: Synthesis) -> Synthesis {
    let types = method.params.iter().map(|p| &p.view_ty);
    let values = method.params.iter().map(|p| &p.view);
    s.recorder(method).call_methods.push(quote! {
        /// Returns the arguments of this invocation; a trailing slice
        /// argument is yielded as a slice of its recorded elements.
        pub fn args(&self) -> (#(#types,)*) {
            (#(#values,)*)
        }
    });
    s
}

pub fn results(_: &Model, method: &MethodModel, mut s: Synthesis) -> Synthesis {
    let types = method.results.iter().map(|r| {
        let ty = &r.owned_ty;
        quote! { &#ty }
    });
    let values = method.results.iter().map(|r| {
        let field = &r.field;
        quote! { &self.#field }
    });
    s.recorder(method).call_methods.push(quote! {
        /// Returns the results of this invocation.
        pub fn results(&self) -> (#(#types,)*) {
            (#(#values,)*)
        }
    });
    s
}
