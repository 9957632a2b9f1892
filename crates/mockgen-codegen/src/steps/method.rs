//! Trait impl methods. Each one takes the next outcome from its recorder,
//! runs it with the recorder unlocked, then records the call.

use quote::{format_ident, quote};

use crate::model::{MethodModel, Model};
use crate::pipeline::Synthesis;

pub fn interface_method(model: &Model, method: &MethodModel, mut s: Synthesis) -> Synthesis {
    let outcome = &model.outcome;
    let (name, field, call) = (&method.name, &method.field, &method.call);
    let generics = &method.generics;
    let receiver = &method.receiver;
    let unsafety = method.is_unsafe.then(|| quote! { unsafe });
    let output = method.output.as_ref().map(|ty| quote! { -> #ty });

    let params = method.params.iter().map(|p| {
        let arg = &p.arg;
        let ty = &p.declared;
        quote! { #arg: #ty }
    });
    let snapshots = method.params.iter().filter(|p| !p.opaque).map(|p| {
        let record = format_ident!("record_{}", p.arg);
        let expr = &p.record;
        quote! { let #record = #expr; }
    });
    let arg_fields = method.params.iter().map(|p| {
        let arg = &p.arg;
        if p.opaque {
            quote! { #arg: () }
        } else {
            let record = format_ident!("record_{}", p.arg);
            quote! { #arg: #record }
        }
    });
    let result_fields = method.results.iter().map(|r| {
        let field = &r.field;
        let record = &r.record;
        quote! { #field: #record }
    });
    let args = method.args();
    let message = format!("unexpected call to {}\n{{}}", method.label);
    let strict = quote! {
        panic!(#message, ::std::backtrace::Backtrace::force_capture())
    };

    let body = if method.results.is_empty() {
        quote! {
            #(#snapshots)*
            match self.#field.next_hook() {
                #outcome::Hook(hook) => hook(#(#args),*),
                #outcome::Return(()) | #outcome::Zero => {}
                #outcome::Strict => #strict,
            }
            self.#field.append_call(#call {
                #(#arg_fields,)*
            });
        }
    } else {
        let zero = &method.zero;
        let produce = &method.produce;
        quote! {
            #(#snapshots)*
            let result = match self.#field.next_hook() {
                #outcome::Hook(hook) => hook(#(#args),*),
                #outcome::Return(result) => result,
                #outcome::Zero => #zero,
                #outcome::Strict => #strict,
            };
            self.#field.append_call(#call {
                #(#arg_fields,)*
                #(#result_fields,)*
            });
            #produce
        }
    };

    s.trait_methods
        .entry(method.owner.clone())
        .or_default()
        .push(quote! {
            #unsafety fn #name #generics (#receiver, #(#params),*) #output {
                #body
            }
        });
    s
}
