//! The synthesis pipeline: a fixed table of named steps, each a pure
//! function of the model and the synthesis built so far.
//!
//! Interface steps run first, then every method step for each method in
//! flattened order. [`Synthesis::assemble`] lays the collected items out as
//! holder, constructors, trait impls and then one recorder section per
//! method.

use indexmap::IndexMap;
use proc_macro2::TokenStream;
use quote::quote;

use mockgen_core::ItemRef;

use crate::model::{MethodModel, Model};
use crate::steps::{call, holder, method, recorder};

pub type InterfaceStep = fn(&Model, Synthesis) -> Synthesis;
pub type MethodStep = fn(&Model, &MethodModel, Synthesis) -> Synthesis;

pub const INTERFACE_STEPS: [(&str, InterfaceStep); 4] = [
    ("holder struct", holder::holder_struct),
    ("zero constructor", holder::zero_constructor),
    ("strict constructor", holder::strict_constructor),
    ("delegating constructor", holder::delegating_constructor),
];

pub const METHOD_STEPS: [(&str, MethodStep); 12] = [
    ("recorder struct", recorder::recorder_struct),
    ("interface method", method::interface_method),
    ("set_default_hook", recorder::set_default_hook),
    ("push_hook", recorder::push_hook),
    ("set_default_return", recorder::set_default_return),
    ("push_return", recorder::push_return),
    ("next_hook", recorder::next_hook),
    ("append_call", recorder::append_call),
    ("history", recorder::history),
    ("call-record struct", call::call_struct),
    ("args", call::args),
    ("results", call::results),
];

/// Items of one method's recorder and call record.
#[derive(Default)]
pub struct RecorderSection {
    pub items: Vec<TokenStream>,
    pub func_methods: Vec<TokenStream>,
    pub call_items: Vec<TokenStream>,
    pub call_methods: Vec<TokenStream>,
}

/// The items synthesized for one interface so far.
#[derive(Default)]
pub struct Synthesis {
    pub holder: Vec<TokenStream>,
    pub constructors: Vec<TokenStream>,
    pub trait_methods: IndexMap<ItemRef, Vec<TokenStream>>,
    /// Keyed by method name, in flattened order.
    pub recorders: IndexMap<String, RecorderSection>,
}

impl Synthesis {
    pub fn recorder(&mut self, method: &MethodModel) -> &mut RecorderSection {
        self.recorders.entry(method.name.to_string()).or_default()
    }

    /// Lays out the collected items of `model`.
    pub fn assemble(self, model: &Model) -> TokenStream {
        let holder = &model.holder;
        let items = self.holder;
        let constructors = self.constructors;

        let mut trait_methods = self.trait_methods;
        let impls = model.impls.iter().map(|imp| {
            let path = &imp.path;
            let methods = trait_methods.shift_remove(&imp.item).unwrap_or_default();
            let unsafety = imp.is_unsafe.then(|| quote! { unsafe });
            quote! {
                #unsafety impl #path for #holder {
                    #(#methods)*
                }
            }
        });
        let impls: Vec<TokenStream> = impls.collect();

        let recorders = model.methods.iter().zip(self.recorders.into_values()).map(|(m, section)| {
            let func = &m.func;
            let call = &m.call;
            let RecorderSection {
                items,
                func_methods,
                call_items,
                call_methods,
            } = section;
            quote! {
                #(#items)*
                impl #func {
                    #(#func_methods)*
                }
                #(#call_items)*
                impl #call {
                    #(#call_methods)*
                }
            }
        });

        quote! {
            #(#items)*
            impl #holder {
                #(#constructors)*
            }
            #(#impls)*
            #(#recorders)*
        }
    }
}

/// Runs every step over `model`.
pub fn run(model: &Model) -> TokenStream {
    let mut synthesis = Synthesis::default();
    for (name, step) in INTERFACE_STEPS {
        tracing::trace!(holder = %model.holder, step = name, "running interface step");
        synthesis = step(model, synthesis);
    }
    for method in &model.methods {
        for (name, step) in METHOD_STEPS {
            tracing::trace!(holder = %model.holder, method = %method.name, step = name, "running method step");
            synthesis = step(model, method, synthesis);
        }
    }
    synthesis.assemble(model)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn step_names_are_unique() {
        let interface: HashSet<_> = INTERFACE_STEPS.iter().map(|(n, _)| *n).collect();
        let method: HashSet<_> = METHOD_STEPS.iter().map(|(n, _)| *n).collect();
        assert_eq!(interface.len(), INTERFACE_STEPS.len());
        assert_eq!(method.len(), METHOD_STEPS.len());
    }
}
